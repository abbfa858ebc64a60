use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::biome::Biome;

/// Position of a chunk in chunk-grid space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Chunk containing the world-space point, rounding toward negative infinity.
    /// Points past the edge of the `i32` chunk grid clamp to that edge.
    pub fn from_world(x: f32, y: f32, chunk_side: u32) -> Self {
        let side = chunk_side as f64;
        Self {
            cx: grid_index(x as f64 / side),
            cy: grid_index(y as f64 / side),
        }
    }

    /// Square-ring distance, the metric used for streaming radii.
    pub fn chebyshev(&self, other: ChunkCoord) -> u32 {
        let dx = self.cx.abs_diff(other.cx);
        let dy = self.cy.abs_diff(other.cy);
        dx.max(dy)
    }

    pub fn manhattan(&self, other: ChunkCoord) -> u32 {
        self.cx.abs_diff(other.cx) + self.cy.abs_diff(other.cy)
    }

    /// Neighbouring coordinate, `None` when it would leave the grid.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.cx.checked_add(dx)?, self.cy.checked_add(dy)?))
    }

    /// World-space coordinates of the chunk's first tile.
    pub fn world_origin(&self, chunk_side: u32) -> (i64, i64) {
        let side = chunk_side as i64;
        (self.cx as i64 * side, self.cy as i64 * side)
    }
}

fn grid_index(v: f64) -> i32 {
    v.floor().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.cx, self.cy)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct TileData {
    /// Normalized elevation in `[0, 1]`.
    pub height: f32,
    /// Normalized moisture in `[0, 1]`.
    pub moisture: f32,
    pub biome: Biome,
}

impl TileData {
    pub fn new(height: f32, moisture: f32) -> Self {
        Self {
            height,
            moisture,
            biome: Biome::classify(height, moisture),
        }
    }
}

/// A square grid of generated tiles.
///
/// Tiles are stored row-major: index `ly * side + lx`. A chunk never changes
/// after the synthesizer hands it out.
#[derive(Clone, PartialEq, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    side: u32,
    tiles: Box<[TileData]>,
}

impl Chunk {
    pub fn from_tiles(coord: ChunkCoord, side: u32, tiles: Vec<TileData>) -> Self {
        debug_assert_eq!(tiles.len(), side as usize * side as usize);
        Chunk {
            coord,
            side,
            tiles: tiles.into_boxed_slice(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn tile(&self, lx: u32, ly: u32) -> Option<TileData> {
        if lx < self.side && ly < self.side {
            Some(self.tiles[ly as usize * self.side as usize + lx as usize])
        } else {
            None
        }
    }

    pub fn tiles(&self) -> &[TileData] {
        &self.tiles
    }
}

/// Read-only borrow of a resident chunk.
///
/// The view borrows the cache, so it cannot outlive an eviction.
#[derive(Clone, Copy, Debug)]
pub struct ChunkView<'a> {
    chunk: &'a Chunk,
    generated_tick: u64,
}

impl<'a> ChunkView<'a> {
    pub(crate) fn new(chunk: &'a Chunk, generated_tick: u64) -> Self {
        Self {
            chunk,
            generated_tick,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.chunk.coord
    }

    pub fn side(&self) -> u32 {
        self.chunk.side
    }

    /// Tick at which the chunk was ingested into the cache.
    pub fn generated_tick(&self) -> u64 {
        self.generated_tick
    }

    pub fn tile(&self, lx: u32, ly: u32) -> Option<TileData> {
        self.chunk.tile(lx, ly)
    }

    pub fn tiles(&self) -> &'a [TileData] {
        let chunk: &'a Chunk = self.chunk;
        &chunk.tiles
    }

    /// Iterate `(lx, ly, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, TileData)> + 'a {
        let chunk: &'a Chunk = self.chunk;
        let side = chunk.side;
        chunk
            .tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (i as u32 % side, i as u32 / side, *tile))
    }

    pub fn world_origin(&self) -> (i64, i64) {
        self.chunk.coord.world_origin(self.chunk.side)
    }

    /// Owned copy for collaborators that need the data past the borrow.
    pub fn to_owned_chunk(&self) -> Chunk {
        self.chunk.clone()
    }
}
