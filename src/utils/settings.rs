use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::constants::*;
use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorldSettings {
    pub seed: u64,
    pub chunk_side: u32,
    pub max_resident_chunks: u32,
    pub streaming: StreamingSettings,
    pub workers: WorkerSettings,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            chunk_side: CHUNK_SIZE,
            max_resident_chunks: MAX_RESIDENT_CHUNKS,
            streaming: StreamingSettings::default(),
            workers: WorkerSettings::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StreamingSettings {
    pub view_radius: u32,
    pub retention_radius: u32,
    pub retry_cooldown_ticks: u64,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            view_radius: VIEW_DISTANCE,
            retention_radius: CHUNK_UNLOAD_DISTANCE,
            retry_cooldown_ticks: FAILED_RETRY_COOLDOWN_TICKS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkerSettings {
    pub worker_count: usize, // 0 = pick from the number of cores
    pub max_completions_per_tick: usize, // 0 = drain everything
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            worker_count: 0,
            max_completions_per_tick: MAX_COMPLETIONS_PER_TICK,
        }
    }
}

impl WorkerSettings {
    /// Leave one core for the tick loop, never more than the configured cap.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        num_cpus::get()
            .saturating_sub(1)
            .clamp(1, ASYNC_WORKER_COUNT)
    }
}

impl WorldSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_side == 0 {
            return Err(ConfigError::ZeroChunkSide);
        }
        if self.chunk_side > MAX_CHUNK_SIDE {
            return Err(ConfigError::ChunkSideTooLarge {
                side: self.chunk_side,
                max: MAX_CHUNK_SIDE,
            });
        }
        if self.max_resident_chunks == 0 {
            return Err(ConfigError::ZeroMaxResident);
        }
        if self.streaming.retention_radius < self.streaming.view_radius {
            return Err(ConfigError::RetentionBelowView {
                view: self.streaming.view_radius,
                retention: self.streaming.retention_radius,
            });
        }
        Ok(())
    }
}

pub fn save_settings(settings: &WorldSettings, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, settings)?;
    writer.flush()?;
    Ok(())
}

pub fn load_settings(path: impl AsRef<Path>) -> Result<WorldSettings, ConfigError> {
    let reader = BufReader::new(File::open(path)?);
    let settings: WorldSettings = bincode::deserialize_from(reader)?;
    settings.validate()?;
    Ok(settings)
}
