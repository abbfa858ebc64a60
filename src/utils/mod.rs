pub mod settings;

pub use settings::{StreamingSettings, WorkerSettings, WorldSettings, load_settings, save_settings};
