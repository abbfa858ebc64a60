//! Observer-driven chunk streaming.
//!
//! Once per tick the coordinator maps the observer onto the chunk grid,
//! requests every missing chunk inside the view square (nearest first) and
//! evicts whatever lies outside the retention square.

use glam::Vec2;

use crate::core::chunk::ChunkCoord;
use crate::world::cache::{ChunkCache, RequestOutcome};
use crate::world::loader::GenerationQueue;

/// What a single [`StreamingCoordinator::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingReport {
    pub center: ChunkCoord,
    pub center_changed: bool,
    pub requested: usize,
    pub evicted: usize,
    /// Pending slots outside retention, dropped when their chunk arrives.
    pub deferred: usize,
    /// In-view chunks skipped because they failed recently.
    pub cooling_down: usize,
}

pub struct StreamingCoordinator {
    chunk_side: u32,
    retry_cooldown: u64,
    last_center: Option<ChunkCoord>,
    ring: Vec<(i32, i32)>,
    ring_radius: Option<u32>,
}

impl StreamingCoordinator {
    pub fn new(chunk_side: u32, retry_cooldown: u64) -> Self {
        Self {
            chunk_side,
            retry_cooldown,
            last_center: None,
            ring: Vec::new(),
            ring_radius: None,
        }
    }

    pub fn last_center(&self) -> Option<ChunkCoord> {
        self.last_center
    }

    /// Offsets of the `(2r + 1)²` view square, nearest to the centre first.
    pub fn view_offsets(radius: u32) -> Vec<(i32, i32)> {
        let r = radius as i32;
        let mut offsets = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for dy in -r..=r {
            for dx in -r..=r {
                offsets.push((dx, dy));
            }
        }
        offsets.sort_by_key(|&(dx, dy)| {
            (
                dx.unsigned_abs().max(dy.unsigned_abs()),
                dx.unsigned_abs() + dy.unsigned_abs(),
                dy,
                dx,
            )
        });
        offsets
    }

    fn ensure_ring(&mut self, radius: u32) {
        if self.ring_radius != Some(radius) {
            self.ring = Self::view_offsets(radius);
            self.ring_radius = Some(radius);
        }
    }

    pub fn update<Q: GenerationQueue>(
        &mut self,
        cache: &mut ChunkCache<Q>,
        observer: Vec2,
        view_radius: u32,
        retention_radius: u32,
    ) -> StreamingReport {
        let retention = if retention_radius < view_radius {
            tracing::warn!(
                "Retention radius {} is below view radius {}, using {}",
                retention_radius,
                view_radius,
                view_radius
            );
            view_radius
        } else {
            retention_radius
        };

        let center = ChunkCoord::from_world(observer.x, observer.y, self.chunk_side);
        let center_changed = self.last_center != Some(center);
        if center_changed {
            tracing::debug!("Observer entered chunk {}", center);
            cache.set_focus(center);
            cache.queue_mut().reprioritize(center);
            self.last_center = Some(center);
        }

        let mut report = StreamingReport {
            center,
            center_changed,
            ..Default::default()
        };

        self.ensure_ring(view_radius);
        cache.prune_failures(self.retry_cooldown);

        for &(dx, dy) in &self.ring {
            let Some(coord) = center.offset(dx, dy) else {
                continue;
            };
            if cache.get(coord).is_some() {
                cache.touch(coord);
                continue;
            }
            if cache.failed_recently(coord, self.retry_cooldown) {
                report.cooling_down += 1;
                continue;
            }
            if cache.request(coord) == RequestOutcome::Started {
                tracing::trace!("Requested chunk {}", coord);
                report.requested += 1;
            }
        }

        for coord in cache.coords_beyond(center, retention) {
            if cache.evict(coord) {
                report.evicted += 1;
            } else {
                report.deferred += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::generator::TerrainSynthesizer;
    use crate::world::loader::GenerationTask;

    #[derive(Default)]
    struct RecordingQueue {
        submitted: Vec<GenerationTask>,
        recentered: Vec<ChunkCoord>,
    }

    impl GenerationQueue for RecordingQueue {
        fn submit(&mut self, task: GenerationTask) {
            self.submitted.push(task);
        }

        fn reprioritize(&mut self, center: ChunkCoord) {
            self.recentered.push(center);
        }
    }

    fn finish_all(cache: &mut ChunkCache<RecordingQueue>, synth: &TerrainSynthesizer) {
        let tasks: Vec<_> = cache.queue_mut().submitted.drain(..).collect();
        for task in tasks {
            if cache.is_pending(task.coord) {
                cache.complete(task.coord, synth.generate_chunk(task.coord).unwrap());
            }
        }
    }

    #[test]
    fn offsets_are_nearest_first() {
        let offsets = StreamingCoordinator::view_offsets(2);
        assert_eq!(offsets.len(), 25);
        assert_eq!(offsets[0], (0, 0));
        let rings: Vec<u32> = offsets
            .iter()
            .map(|(dx, dy)| dx.unsigned_abs().max(dy.unsigned_abs()))
            .collect();
        assert!(rings.windows(2).all(|w| w[0] <= w[1]));
        assert!(offsets[1..9].iter().all(|(dx, dy)| dx.abs() <= 1 && dy.abs() <= 1));
    }

    #[test]
    fn requests_view_square_nearest_first() {
        let mut cache = ChunkCache::new(RecordingQueue::default(), 64);
        let mut coordinator = StreamingCoordinator::new(16, 10);

        let report = coordinator.update(&mut cache, Vec2::new(8.0, 8.0), 1, 2);
        assert_eq!(report.center, ChunkCoord::new(0, 0));
        assert!(report.center_changed);
        assert_eq!(report.requested, 9);

        let submitted = &cache.queue().submitted;
        assert_eq!(submitted[0].coord, ChunkCoord::new(0, 0));
        assert!(submitted.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(cache.queue().recentered, vec![ChunkCoord::new(0, 0)]);

        // Nothing new on a repeated tick.
        let again = coordinator.update(&mut cache, Vec2::new(9.0, 8.0), 1, 2);
        assert_eq!(again.requested, 0);
        assert!(!again.center_changed);
        assert_eq!(cache.queue().submitted.len(), 9);
    }

    #[test]
    fn evicts_outside_retention_only() {
        let synth = TerrainSynthesizer::new(42, 16);
        let mut cache = ChunkCache::new(RecordingQueue::default(), 64);
        let mut coordinator = StreamingCoordinator::new(16, 10);

        coordinator.update(&mut cache, Vec2::ZERO, 1, 2);
        finish_all(&mut cache, &synth);
        assert_eq!(cache.ready_count(), 9);

        // One chunk east: the western column is at distance 2, still retained.
        let report = coordinator.update(&mut cache, Vec2::new(20.0, 0.0), 1, 2);
        assert_eq!(report.evicted, 0);
        assert_eq!(report.requested, 3);
        finish_all(&mut cache, &synth);

        // Three chunks east: everything west of cx = 1 is dropped.
        let report = coordinator.update(&mut cache, Vec2::new(52.0, 0.0), 1, 2);
        let center = report.center;
        assert_eq!(center, ChunkCoord::new(3, 0));
        for coord in cache.resident_coords() {
            assert!(coord.chebyshev(center) <= 2, "{} should be evicted", coord);
        }
        assert_eq!(report.evicted, 6);
    }

    #[test]
    fn pending_chunks_outside_retention_are_deferred() {
        let synth = TerrainSynthesizer::new(42, 16);
        let mut cache = ChunkCache::new(RecordingQueue::default(), 64);
        let mut coordinator = StreamingCoordinator::new(16, 10);

        coordinator.update(&mut cache, Vec2::ZERO, 1, 1);
        let report = coordinator.update(&mut cache, Vec2::new(160.0, 0.0), 1, 1);
        assert_eq!(report.deferred, 9);
        assert_eq!(report.evicted, 0);

        finish_all(&mut cache, &synth);
        assert_eq!(cache.stats().discarded, 9);
        for coord in cache.resident_coords() {
            assert!(coord.chebyshev(report.center) <= 1);
        }
    }

    #[test]
    fn retention_below_view_is_raised() {
        let synth = TerrainSynthesizer::new(42, 16);
        let mut cache = ChunkCache::new(RecordingQueue::default(), 64);
        let mut coordinator = StreamingCoordinator::new(16, 10);

        coordinator.update(&mut cache, Vec2::ZERO, 2, 0);
        finish_all(&mut cache, &synth);
        let report = coordinator.update(&mut cache, Vec2::ZERO, 2, 0);
        assert_eq!(report.evicted, 0);
        assert_eq!(cache.ready_count(), 25);
    }

    #[test]
    fn failed_chunks_wait_for_cooldown() {
        let mut cache = ChunkCache::new(RecordingQueue::default(), 64);
        let mut coordinator = StreamingCoordinator::new(16, 10);
        let origin = ChunkCoord::new(0, 0);

        cache.set_clock(1);
        coordinator.update(&mut cache, Vec2::ZERO, 0, 0);
        cache.fail(&crate::error::GenerationError::Panicked {
            coord: origin,
            message: "boom".into(),
        });

        cache.set_clock(5);
        let report = coordinator.update(&mut cache, Vec2::ZERO, 0, 0);
        assert_eq!(report.requested, 0);
        assert_eq!(report.cooling_down, 1);

        cache.set_clock(11);
        let report = coordinator.update(&mut cache, Vec2::ZERO, 0, 0);
        assert_eq!(report.requested, 1);
        assert!(cache.is_pending(origin));
    }
}
