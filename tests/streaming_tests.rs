use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;

use terrastream::{
    Chunk, ChunkCoord, ChunkSource, GenerationError, TerrainSynthesizer, WorldGenerator,
    WorldSettings,
};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tick until nothing is pending or the timeout expires.
fn settle(world: &mut WorldGenerator, observer: Vec2, view: u32, retention: u32) {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    loop {
        world.tick(observer, view, retention);
        if world.stats().pending == 0 || Instant::now() > deadline {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

fn square(center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
    let mut coords = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            coords.extend(center.offset(dx, dy));
        }
    }
    coords
}

#[test]
fn observer_move_replaces_the_view_square() {
    let mut world = WorldGenerator::new(42, 16, 9).unwrap();

    settle(&mut world, Vec2::ZERO, 1, 1);
    let origin = ChunkCoord::new(0, 0);
    assert_eq!(world.stats().resident, 9);
    for coord in square(origin, 1) {
        assert!(world.chunk_at(coord).is_some(), "{} should be resident", coord);
    }

    world.tick(Vec2::new(400.0, 0.0), 1, 1);
    let far = ChunkCoord::new(25, 0);
    assert_eq!(world.observer_chunk(), Some(far));
    for coord in square(origin, 1) {
        assert!(world.chunk_at(coord).is_none(), "{} should be evicted", coord);
        assert!(!world.is_pending(coord));
    }
    for coord in square(far, 1) {
        assert!(
            world.is_pending(coord) || world.chunk_at(coord).is_some(),
            "{} should be requested",
            coord
        );
    }

    settle(&mut world, Vec2::new(400.0, 0.0), 1, 1);
    assert_eq!(world.stats().resident, 9);
    for coord in square(far, 1) {
        assert!(world.chunk_at(coord).is_some(), "{} should be resident", coord);
    }
}

#[test]
fn resident_chunks_stay_inside_retention() {
    let mut world = WorldGenerator::new(3, 8, 256).unwrap();
    let mut observer = Vec2::ZERO;

    for _ in 0..40 {
        observer += Vec2::new(5.0, 3.0);
        world.tick(observer, 2, 3);

        let center = world.observer_chunk().unwrap();
        for coord in world.resident_coords() {
            assert!(coord.chebyshev(center) <= 3, "{} outside retention of {}", coord, center);
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn residency_never_exceeds_the_limit() {
    let mut world = WorldGenerator::new(11, 16, 4).unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);

    while Instant::now() < deadline {
        world.tick(Vec2::new(4.0, -9.0), 2, 2);
        assert!(world.stats().resident <= 4);
        thread::sleep(Duration::from_millis(2));
    }
    assert!(world.stats().completed > 0);
}

#[test]
fn identical_seeds_stream_identical_worlds() {
    let mut a = WorldGenerator::new(1234, 16, 64).unwrap();
    let mut b = WorldGenerator::new(1234, 16, 64).unwrap();
    let observer = Vec2::new(-37.0, 81.0);

    settle(&mut a, observer, 1, 1);
    settle(&mut b, observer, 1, 1);

    let synth = TerrainSynthesizer::new(1234, 16);
    let center = ChunkCoord::from_world(observer.x, observer.y, 16);
    for coord in square(center, 1) {
        let tiles_a = a.chunk_at(coord).unwrap().tiles().to_vec();
        let tiles_b = b.chunk_at(coord).unwrap().tiles().to_vec();
        assert_eq!(tiles_a, tiles_b);
        assert_eq!(tiles_a, synth.generate_chunk(coord).unwrap().tiles().to_vec());
    }
}

struct FlakySource {
    inner: TerrainSynthesizer,
    broken: ChunkCoord,
}

impl ChunkSource for FlakySource {
    fn generate(&self, coord: ChunkCoord) -> Result<Chunk, GenerationError> {
        if coord == self.broken {
            panic!("corrupt noise at {}", coord);
        }
        self.inner.generate(coord)
    }

    fn chunk_side(&self) -> u32 {
        self.inner.chunk_side()
    }
}

#[test]
fn failed_chunk_does_not_stall_its_neighbours() {
    let broken = ChunkCoord::new(1, 0);
    let source = Arc::new(FlakySource {
        inner: TerrainSynthesizer::new(5, 16),
        broken,
    });
    let mut world = WorldGenerator::with_source(source, &WorldSettings::default()).unwrap();

    let deadline = Instant::now() + SETTLE_TIMEOUT;
    while (world.stats().resident < 8 || world.stats().failed == 0) && Instant::now() < deadline {
        world.tick(Vec2::ZERO, 1, 1);
        thread::sleep(Duration::from_millis(2));
    }

    let stats = world.stats();
    assert_eq!(stats.resident, 8);
    assert!(stats.failed >= 1);
    assert!(world.chunk_at(broken).is_none());
    for coord in square(ChunkCoord::new(0, 0), 1) {
        if coord != broken {
            assert!(world.chunk_at(coord).is_some());
        }
    }
}
