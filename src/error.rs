//! Centralized error type for the patchhost umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use patchhost_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] patchhost_core::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("MIDI: {0}")]
    Midi(#[from] patchhost_midi::Error),

    #[error("Block size {block_size} is not a non-zero multiple of the engine sub-block ({sub_block})")]
    BlockSize { block_size: usize, sub_block: usize },

    #[error("{direction} channel count {count} exceeds the limit of {max}")]
    ChannelCount {
        direction: &'static str,
        count: usize,
        max: usize,
    },

    #[error("{direction} buffer for channel {channel} holds {len} samples, {needed} needed")]
    BufferTooShort {
        direction: &'static str,
        channel: usize,
        len: usize,
        needed: usize,
    },

    #[error("No patch loaded")]
    NoPatch,

    #[error("Unknown parameter index {0}")]
    UnknownParameter(usize),

    #[error("Parameter '{name}' has no {which} symbol")]
    MissingSymbol { name: String, which: &'static str },

    #[error("Receive symbol '{symbol}' of parameter '{rejected}' is already used by '{existing}'")]
    DuplicateReceive {
        symbol: String,
        existing: String,
        rejected: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
