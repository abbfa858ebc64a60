//! Thread-safe chunk synthesis from seeded noise
//!
//! This module turns a chunk coordinate into terrain tiles. It has no
//! knowledge of the cache or the scheduler and can run on any worker thread.

use crate::constants::*;
use crate::core::chunk::{Chunk, ChunkCoord, TileData};
use crate::error::GenerationError;
use crate::world::noise::NoiseField;

/// Anything that can produce the chunk for a coordinate.
///
/// Implementations must be pure: the same coordinate always yields the same
/// chunk content.
pub trait ChunkSource: Send + Sync {
    fn generate(&self, coord: ChunkCoord) -> Result<Chunk, GenerationError>;

    fn chunk_side(&self) -> u32;
}

/// Fractal-noise terrain with height, moisture and biome per tile.
pub struct TerrainSynthesizer {
    height_noise: NoiseField,
    moisture_noise: NoiseField,
    chunk_side: u32,
    seed: u64,
}

impl TerrainSynthesizer {
    pub fn new(seed: u64, chunk_side: u32) -> Self {
        TerrainSynthesizer {
            height_noise: NoiseField::new(seed),
            moisture_noise: NoiseField::new(seed ^ MOISTURE_SEED_SALT),
            chunk_side,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Height and moisture for a single world-space tile.
    pub fn sample_tile(&self, world_x: i64, world_y: i64) -> TileData {
        let fx = world_x as f64;
        let fy = world_y as f64;

        let height = self.height_noise.fractal(
            fx,
            fy,
            HEIGHT_OCTAVES,
            HEIGHT_BASE_FREQUENCY,
            FRACTAL_LACUNARITY,
            FRACTAL_GAIN,
        );
        let moisture = self.moisture_noise.fractal(
            fx,
            fy,
            MOISTURE_OCTAVES,
            MOISTURE_BASE_FREQUENCY,
            FRACTAL_LACUNARITY,
            FRACTAL_GAIN,
        );

        TileData::new(normalize(height), normalize(moisture))
    }

    /// Generate the complete chunk at `coord`.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Result<Chunk, GenerationError> {
        let side = self.chunk_side;
        let (base_x, base_y) = coord.world_origin(side);
        let mut tiles = Vec::with_capacity(side as usize * side as usize);

        for ly in 0..side {
            for lx in 0..side {
                let tile = self.sample_tile(base_x + lx as i64, base_y + ly as i64);
                if !tile.height.is_finite() {
                    return Err(GenerationError::NonFinite {
                        coord,
                        field: "height",
                    });
                }
                if !tile.moisture.is_finite() {
                    return Err(GenerationError::NonFinite {
                        coord,
                        field: "moisture",
                    });
                }
                tiles.push(tile);
            }
        }

        Ok(Chunk::from_tiles(coord, side, tiles))
    }
}

impl ChunkSource for TerrainSynthesizer {
    fn generate(&self, coord: ChunkCoord) -> Result<Chunk, GenerationError> {
        self.generate_chunk(coord)
    }

    fn chunk_side(&self) -> u32 {
        self.chunk_side
    }
}

/// Map `[-1, 1]` noise onto `[0, 1]`. NaN passes through so it can be caught.
fn normalize(v: f32) -> f32 {
    ((v + 1.0) * 0.5).clamp(0.0, 1.0)
}
