//! Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Capacities and limits for one instance bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Generic message queue capacity.
    pub message_capacity: usize,
    /// MIDI event queue capacity.
    pub midi_capacity: usize,
    /// Print line queue capacity.
    pub print_capacity: usize,
    /// Lines retained by a console history.
    pub console_history: usize,
    /// Upper bound for input and output channel counts.
    pub max_channels: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            message_capacity: 1024,
            midi_capacity: 2048,
            print_capacity: 256,
            console_history: 512,
            max_channels: 32,
        }
    }
}

pub const MIN_SAMPLE_RATE: f64 = 8000.0;
pub const MAX_SAMPLE_RATE: f64 = 384000.0;

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("message_capacity", self.message_capacity),
            ("midi_capacity", self.midi_capacity),
            ("print_capacity", self.print_capacity),
            ("max_channels", self.max_channels),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{} must be non-zero", name)));
            }
        }
        if self.max_channels > 256 {
            return Err(Error::InvalidConfig(format!(
                "max_channels {} out of range (1-256)",
                self.max_channels
            )));
        }
        Ok(())
    }

    pub fn validate_sample_rate(sample_rate: f64) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                sample_rate
            )));
        }
        Ok(())
    }
}
