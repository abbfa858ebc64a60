//! World generation and streaming modules
//! Contains noise sampling, chunk synthesis, the worker pool, the chunk cache
//! and the observer-driven streaming that ties them together.

pub mod cache;
pub mod engine;
pub mod generator;
pub mod loader;
pub mod noise;
pub mod streaming;

// Re-export commonly used types
pub use cache::{CacheStats, ChunkCache, RequestOutcome};
pub use engine::{WorldGenerator, WorldStats};
pub use generator::{ChunkSource, TerrainSynthesizer};
pub use loader::{Completion, GenerationQueue, GenerationScheduler, GenerationTask};
pub use noise::NoiseField;
pub use streaming::{StreamingCoordinator, StreamingReport};
