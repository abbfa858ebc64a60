//! Core data structures for the engine
//! Contains biomes, chunk coordinates, tiles and chunks.

pub mod biome;
pub mod chunk;

// Re-export commonly used types
pub use biome::Biome;
pub use chunk::{Chunk, ChunkCoord, ChunkView, TileData};
