//! # patchhost - Instance Bridge for an embedded patch engine
//!
//! Drives a non-reentrant, single-current-instance patch engine from a host
//! plugin: a real-time audio thread ticks the engine while a control thread
//! loads patches, sends messages and pumps engine events.
//!
//! ## Architecture
//!
//! patchhost is an umbrella crate that coordinates:
//! - **patchhost-core** - Atoms, messages, engine MIDI, print lines, SPSC event queues,
//!   receiver traits and the engine call surface
//! - **patchhost-midi** - Host MIDI events and the range-checked MIDI translator
//!
//! and adds the bridge itself:
//! - [`EngineRuntime`] / [`EngineContext`] - the process-wide lock and instance selection
//! - [`AudioBridge`] - host blocks to fixed engine sub-blocks
//! - [`ReceiverRegistry`] - named receiver bindings
//! - [`PatchHandle`] - patch lifetime and discovery
//! - [`PatchInstance`] - all of the above for one plugin instance
//!
//! ## Quick Start
//!
//! ```ignore
//! use patchhost::prelude::*;
//!
//! let runtime = EngineRuntime::new(SimEngine::new());
//! let instance = PatchInstance::builder(&runtime).build()?;
//!
//! instance.prepare_audio(2, 2, 512, 48000.0)?;
//! instance.load_patch("main.pd", "/patches")?;
//! instance.bind("level")?;
//!
//! // Audio thread
//! instance.process_audio(512, &inputs, &mut outputs);
//!
//! // Control thread, once per UI tick
//! instance.drain_messages(&mut params);
//! instance.drain_prints(&mut console);
//! ```

/// Re-export of patchhost-core for direct access
pub use patchhost_core as core;

/// Re-export of patchhost-midi for direct access
pub use patchhost_midi as midi;

pub use patchhost_core::{
    Atom, AtomVec, AtomicFlag, AtomicFloat, BridgeConfig, EngineCallbacks, EngineError,
    InstanceId, Message, MessageKind, MessageReceiver, MidiEvent, MidiKind, MidiReceiver,
    PatchEngine, PrintEntry, PrintReceiver, Severity, Symbol,
};

pub use patchhost_midi::{HostMidiEvent, MidiCollector, MidiTranslator};

mod audio;
mod builder;
mod console;
mod context;
mod error;
mod hooks;
mod instance;
mod params;
mod patch;
mod receivers;
pub mod sim;
mod state;

pub use audio::AudioBridge;
pub use builder::PatchInstanceBuilder;
pub use console::{ConsoleHistory, ConsoleLine};
pub use context::{EngineContext, EngineRuntime};
pub use error::{Error, Result};
pub use instance::{PatchInstance, QueueLevels};
pub use params::{Parameter, ParameterSet, ParameterSpec};
pub use patch::{PatchHandle, PatchInfo, PatchObserver, PatchState};
pub use receivers::ReceiverRegistry;
pub use sim::SimEngine;
pub use state::PersistedState;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        Atom, BridgeConfig, ConsoleHistory, EngineRuntime, Error, HostMidiEvent, Message,
        MessageReceiver, MidiCollector, MidiEvent, MidiReceiver, ParameterSet, ParameterSpec,
        PatchEngine, PatchInfo, PatchInstance, PatchState, PersistedState, PrintEntry,
        PrintReceiver, Result, Severity, SimEngine,
    };
}
