// Core module with fundamental types
pub mod core;

// World module with generation, caching and streaming
pub mod world;

// Settings and other helpers
pub mod utils;

// Other modules
pub mod constants;
pub mod error;

// Re-exports
pub use constants::*;
pub use core::{Biome, Chunk, ChunkCoord, ChunkView, TileData};
pub use error::{ConfigError, GenerationError, WorldError};
pub use utils::{WorldSettings, load_settings, save_settings};
pub use world::{ChunkSource, TerrainSynthesizer, WorldGenerator, WorldStats};
