//! `WorldGenerator`: the façade the game loop talks to.
//!
//! ```text
//! WorldGenerator  (engine.rs)
//!   ├── StreamingCoordinator  (streaming.rs)  ← observer → wanted chunks
//!   └── ChunkCache            (cache.rs)      ← sole owner of chunk data
//!         └── GenerationScheduler  (loader.rs) ← worker pool
//!               └── TerrainSynthesizer  (generator.rs) → NoiseField (noise.rs)
//! ```
//!
//! Each [`WorldGenerator::tick`] first ingests the completions that arrived
//! since the previous tick, then runs the streaming pass. Completions that
//! land while the pass runs wait for the next tick.

use std::sync::Arc;

use glam::Vec2;
use serde::Serialize;

use crate::core::chunk::{ChunkCoord, ChunkView, TileData};
use crate::error::WorldError;
use crate::utils::settings::WorldSettings;
use crate::world::cache::ChunkCache;
use crate::world::generator::{ChunkSource, TerrainSynthesizer};
use crate::world::loader::{Completion, GenerationScheduler};
use crate::world::streaming::{StreamingCoordinator, StreamingReport};

#[derive(Debug, Clone, Serialize)]
pub struct WorldStats {
    pub tick: u64,
    pub resident: usize,
    pub pending: usize,
    pub queued: usize,
    pub max_resident: usize,
    pub workers: usize,
    pub requested: u64,
    pub completed: u64,
    pub evicted: u64,
    pub failed: u64,
    pub discarded: u64,
}

pub struct WorldGenerator {
    seed: u64,
    chunk_side: u32,
    cache: ChunkCache<GenerationScheduler>,
    coordinator: StreamingCoordinator,
    max_completions_per_tick: usize,
    tick_count: u64,
    last_report: StreamingReport,
}

impl WorldGenerator {
    /// Engine with default streaming and worker settings.
    pub fn new(seed: u64, chunk_side: u32, max_resident_chunks: u32) -> Result<Self, WorldError> {
        Self::with_settings(&WorldSettings {
            seed,
            chunk_side,
            max_resident_chunks,
            ..Default::default()
        })
    }

    pub fn with_settings(settings: &WorldSettings) -> Result<Self, WorldError> {
        settings.validate()?;
        let synthesizer = Arc::new(TerrainSynthesizer::new(settings.seed, settings.chunk_side));
        Self::with_source(synthesizer, settings)
    }

    /// Engine backed by a custom chunk source. The source's chunk side wins
    /// over `settings.chunk_side`.
    pub fn with_source(
        source: Arc<dyn ChunkSource>,
        settings: &WorldSettings,
    ) -> Result<Self, WorldError> {
        let settings = WorldSettings {
            chunk_side: source.chunk_side(),
            ..settings.clone()
        };
        settings.validate()?;

        let workers = settings.workers.resolved_worker_count();
        let scheduler = GenerationScheduler::new(source, workers)?;

        tracing::info!(
            "World generator ready (seed={}, chunk_side={}, max_resident={}, workers={})",
            settings.seed,
            settings.chunk_side,
            settings.max_resident_chunks,
            workers
        );

        Ok(WorldGenerator {
            seed: settings.seed,
            chunk_side: settings.chunk_side,
            cache: ChunkCache::new(scheduler, settings.max_resident_chunks),
            coordinator: StreamingCoordinator::new(
                settings.chunk_side,
                settings.streaming.retry_cooldown_ticks,
            ),
            max_completions_per_tick: settings.workers.max_completions_per_tick,
            tick_count: 0,
            last_report: StreamingReport::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// Advance streaming by one frame. Never blocks on generation.
    pub fn tick(&mut self, observer: Vec2, view_radius: u32, retention_radius: u32) {
        self.tick_count += 1;
        self.cache.set_clock(self.tick_count);

        let ingested = self.ingest_completions();

        let report = self
            .coordinator
            .update(&mut self.cache, observer, view_radius, retention_radius);

        if ingested > 0 || report.requested > 0 || report.evicted > 0 {
            tracing::debug!(
                "tick {}: ingested={} requested={} evicted={} deferred={} resident={} pending={}",
                self.tick_count,
                ingested,
                report.requested,
                report.evicted,
                report.deferred,
                self.cache.ready_count(),
                self.cache.pending_count()
            );
        }
        self.last_report = report;
    }

    /// Single ingestion point for worker output.
    fn ingest_completions(&mut self) -> usize {
        let completions = self
            .cache
            .queue_mut()
            .drain_completions(self.max_completions_per_tick);
        let count = completions.len();

        for completion in completions {
            match completion {
                Completion::Generated { coord, chunk } => self.cache.complete(coord, chunk),
                Completion::Failed(err) => self.cache.fail(&err),
            }
        }

        count
    }

    // -----------------------------------------------------------------------
    // Read access for collaborators
    // -----------------------------------------------------------------------

    /// View of a generated chunk; `None` while absent or still generating.
    pub fn chunk_at(&self, coord: ChunkCoord) -> Option<ChunkView<'_>> {
        self.cache.get(coord)
    }

    /// Tile under a world-space point, if its chunk is resident.
    pub fn tile_at(&self, world_x: f32, world_y: f32) -> Option<TileData> {
        let coord = ChunkCoord::from_world(world_x, world_y, self.chunk_side);
        let (origin_x, origin_y) = coord.world_origin(self.chunk_side);
        let lx = u32::try_from((world_x as f64).floor() as i64 - origin_x).ok()?;
        let ly = u32::try_from((world_y as f64).floor() as i64 - origin_y).ok()?;

        self.chunk_at(coord)?.tile(lx, ly)
    }

    /// Mark a chunk as recently used, e.g. by a minimap outside the view square.
    pub fn touch(&mut self, coord: ChunkCoord) -> bool {
        self.cache.touch(coord)
    }

    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.cache.is_pending(coord)
    }

    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        self.cache.resident_coords()
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> WorldStats {
        let cache = self.cache.stats();
        WorldStats {
            tick: self.tick_count,
            resident: cache.ready,
            pending: cache.pending,
            queued: self.cache.queue().queued_count(),
            max_resident: self.cache.max_resident(),
            workers: self.cache.queue().worker_count(),
            requested: cache.requested,
            completed: cache.completed,
            evicted: cache.evicted,
            failed: cache.failed,
            discarded: cache.discarded,
        }
    }

    pub fn last_report(&self) -> StreamingReport {
        self.last_report
    }

    pub fn observer_chunk(&self) -> Option<ChunkCoord> {
        self.coordinator.last_center()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn chunk_side(&self) -> u32 {
        self.chunk_side
    }

    pub fn current_tick(&self) -> u64 {
        self.tick_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::thread;
    use std::time::{Duration, Instant};

    fn settle(world: &mut WorldGenerator, observer: Vec2, view: u32, retention: u32) {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            world.tick(observer, view, retention);
            if world.stats().pending == 0 || Instant::now() > deadline {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn rejects_zero_parameters() {
        assert!(matches!(
            WorldGenerator::new(1, 0, 10),
            Err(WorldError::Config(ConfigError::ZeroChunkSide))
        ));
        assert!(matches!(
            WorldGenerator::new(1, 16, 0),
            Err(WorldError::Config(ConfigError::ZeroMaxResident))
        ));
    }

    #[test]
    fn first_tick_only_requests() {
        let mut world = WorldGenerator::new(42, 16, 32).unwrap();
        world.tick(Vec2::ZERO, 1, 1);
        assert_eq!(world.current_tick(), 1);
        assert_eq!(world.stats().requested, 9);
        assert_eq!(world.observer_chunk(), Some(ChunkCoord::new(0, 0)));
        assert!(world.chunk_at(ChunkCoord::new(0, 0)).is_none());
        assert!(world.is_pending(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn tile_at_matches_synthesizer() {
        let mut world = WorldGenerator::new(7, 8, 32).unwrap();
        settle(&mut world, Vec2::new(-3.5, 2.0), 1, 1);

        let synth = TerrainSynthesizer::new(7, 8);
        for (x, y) in [(-3.5f32, 2.0f32), (0.0, 0.0), (-8.0, -8.0), (7.9, 15.2)] {
            let tile = world.tile_at(x, y).unwrap();
            let expected = synth.sample_tile(x.floor() as i64, y.floor() as i64);
            assert_eq!(tile, expected);
        }
        assert!(world.tile_at(1000.0, 1000.0).is_none());
    }

    #[test]
    fn observer_at_the_grid_edge_streams_what_fits() {
        let mut world = WorldGenerator::new(42, 16, 32).unwrap();
        world.tick(Vec2::new(1.0e11, 0.0), 1, 1);

        let center = ChunkCoord::new(i32::MAX, 0);
        assert_eq!(world.observer_chunk(), Some(center));
        // The column east of the edge does not exist.
        assert_eq!(world.stats().requested, 6);
        assert!(world.is_pending(center));
        assert!(world.tile_at(1.0e11, 0.0).is_none());
    }

    #[test]
    fn oversized_chunk_side_is_rejected() {
        assert!(matches!(
            WorldGenerator::new(1, 70_000, 4),
            Err(WorldError::Config(ConfigError::ChunkSideTooLarge { side: 70_000, .. }))
        ));
    }

    #[test]
    fn stats_track_generation() {
        let mut world = WorldGenerator::new(42, 16, 32).unwrap();
        settle(&mut world, Vec2::ZERO, 1, 1);
        let stats = world.stats();
        assert_eq!(stats.resident, 9);
        assert_eq!(stats.completed, 9);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.max_resident, 32);
        assert!(stats.workers >= 1);
    }
}
