//! Error types for MIDI translation.

use patchhost_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("MIDI {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i32 },

    #[error("MIDI port {port} exceeds the {ports} configured ports")]
    PortOutOfRange { port: i32, ports: u16 },

    #[error("MIDI parse error: {0}")]
    Parse(String),

    #[error("Unsupported MIDI message: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, Error>;
