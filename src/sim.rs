//! Deterministic in-process reference engine.
//!
//! `SimEngine` implements the full [`PatchEngine`] surface with the same
//! single-current-instance discipline as the real engine, but no patch
//! language: an open patch passes audio straight through while DSP is on,
//! sends reach bound receivers through the callback hooks, and MIDI input is
//! echoed to MIDI output. Used by the test suites and for offline checks of
//! host integration code.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use patchhost_core::midi::{PITCH_BEND_MAX, PITCH_BEND_MIN};
use patchhost_core::{
    Atom, EngineCallbacks, EngineError, InstanceId, MidiEvent, PatchEngine, PatchPtr,
    ReceiverPtr,
};

/// Default engine sub-block size.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

const DSP_RECEIVER: &str = "pd";

struct SimPatch {
    path: PathBuf,
    dollar_zero: i32,
}

#[derive(Default)]
struct SimInstance {
    callbacks: Option<Box<dyn EngineCallbacks>>,
    inputs: usize,
    outputs: usize,
    sample_rate: f64,
    dsp: bool,
    ticks: u64,
    audio_inits: u64,
    patches: HashMap<PatchPtr, SimPatch>,
    receivers: HashMap<ReceiverPtr, String>,
    midi_log: Vec<(u64, MidiEvent)>,
}

impl SimInstance {
    fn is_bound(&self, dest: &str) -> bool {
        self.receivers.values().any(|name| name == dest)
    }

    fn callbacks(&mut self) -> Option<&mut (dyn EngineCallbacks + 'static)> {
        self.callbacks.as_deref_mut()
    }
}

/// Reference engine. See the module docs.
pub struct SimEngine {
    block_size: usize,
    instances: HashMap<InstanceId, SimInstance>,
    current: Option<InstanceId>,
    next_id: u64,
    next_handle: u64,
    next_dollar_zero: i32,
    fail_construction: bool,
    context_switches: u64,
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEngine {
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            instances: HashMap::new(),
            current: None,
            next_id: 1,
            next_handle: 0x1000,
            next_dollar_zero: 1000,
            fail_construction: false,
            context_switches: 0,
        }
    }

    /// Make `new_instance` fail, as on allocation failure.
    pub fn set_fail_construction(&mut self, fail: bool) {
        self.fail_construction = fail;
    }

    pub fn current(&self) -> Option<InstanceId> {
        self.current
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of `set_instance` calls so far.
    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    /// Sub-block ticks processed by `instance`.
    pub fn ticks(&self, instance: InstanceId) -> u64 {
        self.instances.get(&instance).map_or(0, |i| i.ticks)
    }

    pub fn dsp_enabled(&self, instance: InstanceId) -> bool {
        self.instances.get(&instance).is_some_and(|i| i.dsp)
    }

    /// (inputs, outputs, sample rate) from the last `init_audio`.
    pub fn audio_settings(&self, instance: InstanceId) -> Option<(usize, usize, f64)> {
        self.instances
            .get(&instance)
            .map(|i| (i.inputs, i.outputs, i.sample_rate))
    }

    pub fn audio_inits(&self, instance: InstanceId) -> u64 {
        self.instances.get(&instance).map_or(0, |i| i.audio_inits)
    }

    /// MIDI input received by `instance`, tagged with the tick count at
    /// arrival.
    pub fn midi_log(&self, instance: InstanceId) -> Vec<(u64, MidiEvent)> {
        self.instances
            .get(&instance)
            .map_or_else(Vec::new, |i| i.midi_log.clone())
    }

    pub fn receiver_count(&self, instance: InstanceId) -> usize {
        self.instances.get(&instance).map_or(0, |i| i.receivers.len())
    }

    pub fn open_patches(&self, instance: InstanceId) -> Vec<PathBuf> {
        self.instances.get(&instance).map_or_else(Vec::new, |i| {
            i.patches.values().map(|p| p.path.clone()).collect()
        })
    }

    fn instance_mut(&mut self) -> Result<&mut SimInstance, EngineError> {
        let id = self.current.ok_or(EngineError::NoCurrentInstance)?;
        self.instances
            .get_mut(&id)
            .ok_or(EngineError::UnknownInstance(id))
    }

    fn instance(&self) -> Result<&SimInstance, EngineError> {
        let id = self.current.ok_or(EngineError::NoCurrentInstance)?;
        self.instances
            .get(&id)
            .ok_or(EngineError::UnknownInstance(id))
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 0x10;
        h
    }

    /// Route a send to bound receivers, or report that nothing listens.
    fn route(
        &mut self,
        dest: &str,
        deliver: impl FnOnce(&mut dyn EngineCallbacks),
    ) -> Result<(), EngineError> {
        let inst = self.instance_mut()?;
        if !inst.is_bound(dest) {
            return Err(EngineError::NoReceiver(dest.to_string()));
        }
        if let Some(cb) = inst.callbacks() {
            deliver(cb);
        }
        Ok(())
    }

    fn midi_thru(
        &mut self,
        checks: &[(&'static str, i32, i32, i32)],
        event: MidiEvent,
        deliver: impl FnOnce(&mut dyn EngineCallbacks),
    ) -> Result<(), EngineError> {
        for &(field, value, min, max) in checks {
            if value < min || value > max {
                return Err(EngineError::OutOfRange { field, value });
            }
        }
        let inst = self.instance_mut()?;
        inst.midi_log.push((inst.ticks, event));
        if let Some(cb) = inst.callbacks() {
            deliver(cb);
        }
        Ok(())
    }
}

const CHANNEL_MAX: i32 = i32::MAX;

impl PatchEngine for SimEngine {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn new_instance(&mut self) -> Result<InstanceId, EngineError> {
        if self.fail_construction {
            return Err(EngineError::Construction(
                "allocation of engine instance failed".to_string(),
            ));
        }
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.insert(id, SimInstance::default());
        Ok(id)
    }

    fn free_instance(&mut self, instance: InstanceId) -> Result<(), EngineError> {
        self.instances
            .remove(&instance)
            .ok_or(EngineError::UnknownInstance(instance))?;
        if self.current == Some(instance) {
            self.current = None;
        }
        Ok(())
    }

    fn set_instance(&mut self, instance: InstanceId) -> Result<(), EngineError> {
        if !self.instances.contains_key(&instance) {
            return Err(EngineError::UnknownInstance(instance));
        }
        self.current = Some(instance);
        self.context_switches += 1;
        Ok(())
    }

    fn set_callbacks(&mut self, callbacks: Box<dyn EngineCallbacks>) -> Result<(), EngineError> {
        self.instance_mut()?.callbacks = Some(callbacks);
        Ok(())
    }

    fn init_audio(
        &mut self,
        inputs: usize,
        outputs: usize,
        sample_rate: f64,
    ) -> Result<(), EngineError> {
        if sample_rate.is_nan() || sample_rate <= 0.0 {
            return Err(EngineError::AudioSettings(format!(
                "invalid sample rate {}",
                sample_rate
            )));
        }
        let inst = self.instance_mut()?;
        inst.inputs = inputs;
        inst.outputs = outputs;
        inst.sample_rate = sample_rate;
        inst.audio_inits += 1;
        // Re-initializing audio restarts DSP
        inst.dsp = false;
        Ok(())
    }

    fn set_dsp(&mut self, on: bool) -> Result<(), EngineError> {
        self.instance_mut()?.dsp = on;
        Ok(())
    }

    fn process_float(
        &mut self,
        ticks: usize,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<(), EngineError> {
        let frames = ticks * self.block_size;
        let inst = self.instance_mut()?;
        let (ins, outs) = (inst.inputs, inst.outputs);
        if input.len() < frames * ins || output.len() < frames * outs {
            return Err(EngineError::AudioSettings(format!(
                "buffers too short for {} ticks of {}x{} channels",
                ticks, ins, outs
            )));
        }

        let running = inst.dsp && !inst.patches.is_empty();
        for frame in 0..frames {
            for ch in 0..outs {
                output[frame * outs + ch] = if running && ch < ins {
                    input[frame * ins + ch]
                } else {
                    0.0
                };
            }
        }
        inst.ticks += ticks as u64;
        Ok(())
    }

    fn open_patch(&mut self, name: &str, dir: &Path) -> Result<PatchPtr, EngineError> {
        self.instance()?;
        let path = dir.join(name);
        if !path.is_file() {
            return Err(EngineError::PatchNotFound { path });
        }
        let ptr = PatchPtr(self.handle());
        let dollar_zero = self.next_dollar_zero;
        self.next_dollar_zero += 1;
        self.instance_mut()?
            .patches
            .insert(ptr, SimPatch { path, dollar_zero });
        Ok(ptr)
    }

    fn close_patch(&mut self, patch: PatchPtr) -> Result<(), EngineError> {
        self.instance_mut()?
            .patches
            .remove(&patch)
            .map(|_| ())
            .ok_or(EngineError::InvalidHandle)
    }

    fn dollar_zero(&self, patch: PatchPtr) -> Result<i32, EngineError> {
        self.instance()?
            .patches
            .get(&patch)
            .map(|p| p.dollar_zero)
            .ok_or(EngineError::InvalidHandle)
    }

    fn bind(&mut self, symbol: &str) -> Result<ReceiverPtr, EngineError> {
        self.instance()?;
        let ptr = ReceiverPtr(self.handle());
        self.instance_mut()?
            .receivers
            .insert(ptr, symbol.to_string());
        Ok(ptr)
    }

    fn unbind(&mut self, receiver: ReceiverPtr) -> Result<(), EngineError> {
        self.instance_mut()?
            .receivers
            .remove(&receiver)
            .map(|_| ())
            .ok_or(EngineError::InvalidHandle)
    }

    fn send_bang(&mut self, dest: &str) -> Result<(), EngineError> {
        self.route(dest, |cb| cb.bang(dest))
    }

    fn send_float(&mut self, dest: &str, value: f32) -> Result<(), EngineError> {
        self.route(dest, |cb| cb.float(dest, value))
    }

    fn send_symbol(&mut self, dest: &str, symbol: &str) -> Result<(), EngineError> {
        self.route(dest, |cb| cb.symbol(dest, symbol))
    }

    fn send_list(&mut self, dest: &str, atoms: &[Atom]) -> Result<(), EngineError> {
        self.route(dest, |cb| cb.list(dest, atoms))
    }

    fn send_message(
        &mut self,
        dest: &str,
        selector: &str,
        atoms: &[Atom],
    ) -> Result<(), EngineError> {
        if dest == DSP_RECEIVER && selector == "dsp" {
            let on = atoms.first().and_then(Atom::as_float).unwrap_or(0.0) != 0.0;
            return self.set_dsp(on);
        }
        self.route(dest, |cb| cb.message(dest, selector, atoms))
    }

    fn note_on(&mut self, channel: i32, pitch: i32, velocity: i32) -> Result<(), EngineError> {
        self.midi_thru(
            &[
                ("channel", channel, 0, CHANNEL_MAX),
                ("pitch", pitch, 0, 127),
                ("velocity", velocity, 0, 127),
            ],
            MidiEvent::NoteOn {
                channel,
                pitch,
                velocity,
            },
            |cb| cb.note_on(channel, pitch, velocity),
        )
    }

    fn control_change(
        &mut self,
        channel: i32,
        controller: i32,
        value: i32,
    ) -> Result<(), EngineError> {
        self.midi_thru(
            &[
                ("channel", channel, 0, CHANNEL_MAX),
                ("controller", controller, 0, 127),
                ("value", value, 0, 127),
            ],
            MidiEvent::ControlChange {
                channel,
                controller,
                value,
            },
            |cb| cb.control_change(channel, controller, value),
        )
    }

    fn program_change(&mut self, channel: i32, program: i32) -> Result<(), EngineError> {
        self.midi_thru(
            &[
                ("channel", channel, 0, CHANNEL_MAX),
                ("program", program, 0, 127),
            ],
            MidiEvent::ProgramChange { channel, program },
            |cb| cb.program_change(channel, program),
        )
    }

    fn pitch_bend(&mut self, channel: i32, value: i32) -> Result<(), EngineError> {
        self.midi_thru(
            &[
                ("channel", channel, 0, CHANNEL_MAX),
                ("bend", value, PITCH_BEND_MIN, PITCH_BEND_MAX),
            ],
            MidiEvent::PitchBend { channel, value },
            |cb| cb.pitch_bend(channel, value),
        )
    }

    fn aftertouch(&mut self, channel: i32, value: i32) -> Result<(), EngineError> {
        self.midi_thru(
            &[
                ("channel", channel, 0, CHANNEL_MAX),
                ("pressure", value, 0, 127),
            ],
            MidiEvent::Aftertouch { channel, value },
            |cb| cb.aftertouch(channel, value),
        )
    }

    fn poly_aftertouch(
        &mut self,
        channel: i32,
        pitch: i32,
        value: i32,
    ) -> Result<(), EngineError> {
        self.midi_thru(
            &[
                ("channel", channel, 0, CHANNEL_MAX),
                ("pitch", pitch, 0, 127),
                ("pressure", value, 0, 127),
            ],
            MidiEvent::PolyAftertouch {
                channel,
                pitch,
                value,
            },
            |cb| cb.poly_aftertouch(channel, pitch, value),
        )
    }

    fn midi_byte(&mut self, port: i32, byte: i32) -> Result<(), EngineError> {
        self.midi_thru(
            &[("port", port, 0, 0x0fff), ("byte", byte, 0, 255)],
            MidiEvent::Byte { port, byte },
            |cb| cb.midi_byte(port, byte),
        )
    }

    fn post(&mut self, text: &str) {
        if let Ok(inst) = self.instance_mut() {
            if let Some(cb) = inst.callbacks() {
                cb.print(text);
                cb.print("\n");
            }
        }
    }
}
