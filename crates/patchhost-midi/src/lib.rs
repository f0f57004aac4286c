//! MIDI for the patchhost instance bridge.
//!
//! - [`HostMidiEvent`] - what a plugin host puts in its MIDI buffers
//! - [`MidiTranslator`] - range-checked conversion to and from the engine's per-event calls
//! - [`MidiCollector`] - turns drained engine MIDI into host events

pub mod collector;
pub mod error;
pub mod event;
pub mod translate;

pub use collector::MidiCollector;
pub use error::{Error, Result};
pub use event::{HostMidiData, HostMidiEvent};
pub use translate::{EngineMidiVec, MidiTranslator};

pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};
