//! Error types for patchhost-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::InstanceId;

/// Failures reported by the engine call surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Engine construction failed: {0}")]
    Construction(String),

    #[error("No engine instance selected")]
    NoCurrentInstance,

    #[error("Unknown engine instance {0:?}")]
    UnknownInstance(InstanceId),

    #[error("Patch not found: {}", path.display())]
    PatchNotFound { path: PathBuf },

    #[error("No receiver bound to '{0}'")]
    NoReceiver(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i32 },

    #[error("Audio settings rejected: {0}")]
    AudioSettings(String),

    #[error("Stale or unknown engine handle")]
    InvalidHandle,
}

/// Error type for patchhost-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
