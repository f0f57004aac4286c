//! The embedded engine's call surface.
//!
//! The engine is one process-wide, non-reentrant service. Its API is not
//! instance-parameterized: every call targets whichever instance was last
//! selected with [`PatchEngine::set_instance`]. Callers reach it only through
//! the bridge's context gate, which serializes calls and selects the instance
//! first.

use std::fmt;
use std::path::Path;

use crate::atom::Atom;
use crate::error::EngineError;

/// Opaque engine instance id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// Opaque pointer to an open patch inside the engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchPtr(pub u64);

/// Opaque pointer to an engine-side receiver object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverPtr(pub u64);

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

impl fmt::Debug for PatchPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch@{:#x}", self.0)
    }
}

impl fmt::Debug for ReceiverPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "receiver@{:#x}", self.0)
    }
}

/// Hooks the engine invokes synchronously, on whatever thread is driving it.
///
/// One set is installed per instance. Implementations run on the audio thread
/// and must not block.
pub trait EngineCallbacks: Send {
    fn bang(&mut self, source: &str);

    fn float(&mut self, source: &str, value: f32);

    fn symbol(&mut self, source: &str, symbol: &str);

    fn list(&mut self, source: &str, atoms: &[Atom]);

    fn message(&mut self, source: &str, selector: &str, atoms: &[Atom]);

    fn note_on(&mut self, channel: i32, pitch: i32, velocity: i32);

    fn control_change(&mut self, channel: i32, controller: i32, value: i32);

    fn program_change(&mut self, channel: i32, program: i32);

    fn pitch_bend(&mut self, channel: i32, value: i32);

    fn aftertouch(&mut self, channel: i32, value: i32);

    fn poly_aftertouch(&mut self, channel: i32, pitch: i32, value: i32);

    fn midi_byte(&mut self, port: i32, byte: i32);

    /// Possibly a fragment of a line.
    fn print(&mut self, text: &str);
}

/// The engine's C-style call surface.
///
/// All methods except `block_size`, `new_instance` and `set_instance` act on
/// the current instance and fail with [`EngineError::NoCurrentInstance`] if
/// none is selected.
pub trait PatchEngine: Send + 'static {
    /// Fixed sub-block size in frames.
    fn block_size(&self) -> usize;

    fn new_instance(&mut self) -> Result<InstanceId, EngineError>;

    fn free_instance(&mut self, instance: InstanceId) -> Result<(), EngineError>;

    fn set_instance(&mut self, instance: InstanceId) -> Result<(), EngineError>;

    fn set_callbacks(&mut self, callbacks: Box<dyn EngineCallbacks>) -> Result<(), EngineError>;

    /// Forces a DSP restart in the engine.
    fn init_audio(
        &mut self,
        inputs: usize,
        outputs: usize,
        sample_rate: f64,
    ) -> Result<(), EngineError>;

    fn set_dsp(&mut self, on: bool) -> Result<(), EngineError>;

    /// Process `ticks` sub-blocks. Buffers are interleaved by frame:
    /// `input[frame * inputs + channel]`.
    fn process_float(
        &mut self,
        ticks: usize,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<(), EngineError>;

    fn open_patch(&mut self, name: &str, dir: &Path) -> Result<PatchPtr, EngineError>;

    fn close_patch(&mut self, patch: PatchPtr) -> Result<(), EngineError>;

    /// The patch's unique `$0` value.
    fn dollar_zero(&self, patch: PatchPtr) -> Result<i32, EngineError>;

    fn bind(&mut self, symbol: &str) -> Result<ReceiverPtr, EngineError>;

    fn unbind(&mut self, receiver: ReceiverPtr) -> Result<(), EngineError>;

    fn send_bang(&mut self, dest: &str) -> Result<(), EngineError>;

    fn send_float(&mut self, dest: &str, value: f32) -> Result<(), EngineError>;

    fn send_symbol(&mut self, dest: &str, symbol: &str) -> Result<(), EngineError>;

    fn send_list(&mut self, dest: &str, atoms: &[Atom]) -> Result<(), EngineError>;

    fn send_message(&mut self, dest: &str, selector: &str, atoms: &[Atom])
        -> Result<(), EngineError>;

    fn note_on(&mut self, channel: i32, pitch: i32, velocity: i32) -> Result<(), EngineError>;

    fn control_change(
        &mut self,
        channel: i32,
        controller: i32,
        value: i32,
    ) -> Result<(), EngineError>;

    fn program_change(&mut self, channel: i32, program: i32) -> Result<(), EngineError>;

    fn pitch_bend(&mut self, channel: i32, value: i32) -> Result<(), EngineError>;

    fn aftertouch(&mut self, channel: i32, value: i32) -> Result<(), EngineError>;

    fn poly_aftertouch(&mut self, channel: i32, pitch: i32, value: i32)
        -> Result<(), EngineError>;

    fn midi_byte(&mut self, port: i32, byte: i32) -> Result<(), EngineError>;

    /// Write one line to the engine console; it comes back through the print hook.
    fn post(&mut self, text: &str);
}
