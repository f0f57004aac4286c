//! Core types for the patchhost instance bridge.
//!
//! - [`Atom`], [`Symbol`], [`Message`] - engine message values
//! - [`MidiEvent`] - engine-side MIDI, fixed-size and `Copy`
//! - [`PrintEntry`], [`Severity`] - console lines and their classification
//! - [`queue`] - bounded SPSC queues between the engine callback context and the pump
//! - [`MessageReceiver`], [`MidiReceiver`], [`PrintReceiver`] - typed drain targets
//! - [`PatchEngine`], [`EngineCallbacks`] - the embedded engine's call surface

pub mod atom;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod lockfree;
pub mod message;
pub mod midi;
pub mod print;
pub mod queue;

pub use atom::{Atom, AtomVec, Symbol};
pub use config::BridgeConfig;
pub use dispatch::{MessageReceiver, MidiReceiver, PrintReceiver};
pub use engine::{EngineCallbacks, InstanceId, PatchEngine, PatchPtr, ReceiverPtr};
pub use error::{EngineError, Error, Result};
pub use lockfree::{AtomicFlag, AtomicFloat};
pub use message::{Message, MessageKind};
pub use midi::{MidiEvent, MidiKind};
pub use print::{PrintAssembler, PrintEntry, Severity};
pub use queue::{event_queues, EventConsumers, EventProducers, QueueConsumer, QueueProducer};
