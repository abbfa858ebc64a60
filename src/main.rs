//! Terrastream headless driver
//!
//! Walks an observer across the world at a fixed tick rate, logs streaming
//! stats and prints an ASCII biome map around the final position.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;

use terrastream::{ChunkCoord, WorldGenerator, WorldSettings, load_settings, save_settings};

/// Stream procedurally generated terrain around a moving observer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Load world settings from this file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to this file and continue
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// World seed
    #[arg(long)]
    seed: Option<u64>,

    /// Tiles per chunk edge
    #[arg(long)]
    chunk_side: Option<u32>,

    /// Maximum number of generated chunks kept in memory
    #[arg(long)]
    max_resident: Option<u32>,

    /// Chunks requested around the observer (Chebyshev radius)
    #[arg(long)]
    view_radius: Option<u32>,

    /// Chunks kept around the observer before eviction (Chebyshev radius)
    #[arg(long)]
    retention_radius: Option<u32>,

    /// Generation worker threads (0 = auto)
    #[arg(long)]
    workers: Option<usize>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Ticks per second
    #[arg(long, default_value_t = 60)]
    tick_rate_hz: u32,

    /// Observer speed in tiles per tick
    #[arg(long, default_value_t = 2.0)]
    speed: f32,

    /// Observer heading in degrees, 0 = +x
    #[arg(long, default_value_t = 0.0)]
    heading_deg: f32,

    /// Radius in chunks of the map printed at the end
    #[arg(long, default_value_t = 2)]
    map_radius: u32,
}

impl Args {
    fn world_settings(&self) -> Result<WorldSettings> {
        let mut settings = match &self.settings {
            Some(path) => load_settings(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => WorldSettings::default(),
        };

        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(side) = self.chunk_side {
            settings.chunk_side = side;
        }
        if let Some(max) = self.max_resident {
            settings.max_resident_chunks = max;
        }
        if let Some(view) = self.view_radius {
            settings.streaming.view_radius = view;
            settings.streaming.retention_radius = settings.streaming.retention_radius.max(view);
        }
        if let Some(retention) = self.retention_radius {
            settings.streaming.retention_radius = retention;
        }
        if let Some(workers) = self.workers {
            settings.workers.worker_count = workers;
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = args.world_settings()?;

    if let Some(path) = &args.save_settings {
        save_settings(&settings, path)
            .with_context(|| format!("saving settings to {}", path.display()))?;
        tracing::info!("Settings saved to {}", path.display());
    }

    let mut world = WorldGenerator::with_settings(&settings)?;
    let view = settings.streaming.view_radius;
    let retention = settings.streaming.retention_radius;

    let heading = args.heading_deg.to_radians();
    let velocity = Vec2::new(heading.cos(), heading.sin()) * args.speed;
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate_hz.max(1)));
    let stats_every = u64::from(args.tick_rate_hz.max(1));

    tracing::info!(
        "Streaming {} ticks at {} Hz (view={}, retention={})",
        args.ticks,
        args.tick_rate_hz,
        view,
        retention
    );

    let mut observer = Vec2::ZERO;
    let started = Instant::now();
    for tick in 1..=args.ticks {
        let frame_start = Instant::now();

        world.tick(observer, view, retention);
        observer += velocity;

        if tick % stats_every == 0 {
            let stats = world.stats();
            tracing::info!(
                "tick {}: resident={}/{} pending={} queued={} evicted={} failed={}",
                stats.tick,
                stats.resident,
                stats.max_resident,
                stats.pending,
                stats.queued,
                stats.evicted,
                stats.failed
            );
        }

        let elapsed = frame_start.elapsed();
        if elapsed < tick_duration {
            thread::sleep(tick_duration - elapsed);
        }
    }

    let stats = world.stats();
    tracing::info!(
        "Done in {:.2?}: requested={} completed={} evicted={} discarded={} failed={}",
        started.elapsed(),
        stats.requested,
        stats.completed,
        stats.evicted,
        stats.discarded,
        stats.failed
    );

    print_map(&world, observer, args.map_radius);
    Ok(())
}

/// One glyph per tile, blank where the chunk is not resident.
fn print_map(world: &WorldGenerator, observer: Vec2, radius: u32) {
    let side = world.chunk_side() as i64;
    let center = ChunkCoord::from_world(observer.x, observer.y, world.chunk_side());
    let reach = radius.min(i32::MAX as u32) as i32;
    let corner = center.offset(-reach, -reach).unwrap_or(center);
    let (origin_x, origin_y) = corner.world_origin(world.chunk_side());
    let extent = (2 * radius as i64 + 1) * side;

    println!("seed {} around chunk {}", world.seed(), center);
    for y in 0..extent {
        let row: String = (0..extent)
            .map(|x| {
                world
                    .tile_at((origin_x + x) as f32, (origin_y + y) as f32)
                    .map_or(' ', |tile| tile.biome.glyph())
            })
            .collect();
        println!("{}", row);
    }
}
