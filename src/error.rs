//! Error taxonomy for the engine.
//!
//! Configuration errors are fatal and surface at construction. Generation
//! errors are per-chunk: the slot goes back to absent and the failure is
//! logged, and the chunk is requested again once its cooldown has passed.

use std::io;

use thiserror::Error;

use crate::core::chunk::ChunkCoord;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunk side must be positive")]
    ZeroChunkSide,
    #[error("chunk side {side} exceeds the maximum of {max}")]
    ChunkSideTooLarge { side: u32, max: u32 },
    #[error("max resident chunk count must be positive")]
    ZeroMaxResident,
    #[error("worker pool needs at least one thread")]
    ZeroWorkers,
    #[error("retention radius {retention} is smaller than view radius {view}")]
    RetentionBelowView { view: u32, retention: u32 },
    #[error("failed to access settings file: {0}")]
    SettingsIo(#[from] io::Error),
    #[error("failed to encode or decode settings: {0}")]
    SettingsCodec(#[from] bincode::Error),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    #[error("non-finite {field} sample in chunk {coord}")]
    NonFinite {
        coord: ChunkCoord,
        field: &'static str,
    },
    #[error("generation of chunk {coord} panicked: {message}")]
    Panicked { coord: ChunkCoord, message: String },
}

impl GenerationError {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            GenerationError::NonFinite { coord, .. } => *coord,
            GenerationError::Panicked { coord, .. } => *coord,
        }
    }
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn chunk generation worker: {0}")]
    WorkerSpawn(#[from] io::Error),
}
