//! The instance bridge: one engine instance driven from a host plugin.
//!
//! Lock order is `control -> context` for control operations and
//! `audio -> context` for the audio path. The consumer halves of the event
//! queues sit behind their own mutexes, taken last (the patch-scoped purge
//! takes them inside the context section). The pump only holds a consumer
//! lock while popping a single entry, never while a receiver runs, so
//! receivers may call back into the instance.

use std::path::Path;

use parking_lot::Mutex;
use patchhost_core::{
    Atom, AtomicFlag, BridgeConfig, EngineError, EventConsumers, Message, MessageReceiver,
    MidiEvent, MidiReceiver, PatchEngine, PrintEntry, PrintReceiver, QueueConsumer,
};
use patchhost_midi::{HostMidiEvent, MidiTranslator};

use crate::audio::{write_silence, AudioBridge};
use crate::builder::PatchInstanceBuilder;
use crate::context::{EngineContext, EngineRuntime};
use crate::error::{Error, Result};
use crate::params::ParameterSet;
use crate::patch::{PatchHandle, PatchInfo, PatchObserver, PatchState, PatchStateCell};
use crate::receivers::ReceiverRegistry;

struct AudioState {
    bridge: AudioBridge,
    /// An audio error was already posted for the current configuration.
    reported: bool,
}

pub(crate) struct ControlState {
    receivers: ReceiverRegistry,
    patch: Option<PatchHandle>,
    observer: Option<Box<dyn PatchObserver>>,
    generation: u64,
}

/// Entries waiting in each event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueLevels {
    pub messages: usize,
    pub midi: usize,
    pub prints: usize,
}

impl QueueLevels {
    pub fn is_empty(&self) -> bool {
        self.messages == 0 && self.midi == 0 && self.prints == 0
    }
}

/// One engine instance with its audio adapter, event queues, receiver
/// bindings and patch slot.
///
/// `Sync`: the audio thread calls `process_audio*` while a control thread
/// loads patches, sends messages and pumps the queues.
pub struct PatchInstance<E: PatchEngine> {
    config: BridgeConfig,
    audio: Mutex<AudioState>,
    control: Mutex<ControlState>,
    state: PatchStateCell,
    prepared: AtomicFlag,
    messages: Mutex<QueueConsumer<Message>>,
    midi: Mutex<QueueConsumer<MidiEvent>>,
    prints: Mutex<QueueConsumer<PrintEntry>>,
    translator: MidiTranslator,
    // Dropped last: the Drop impl releases the patch and bindings through it.
    context: EngineContext<E>,
}

impl<E: PatchEngine> PatchInstance<E> {
    pub fn builder(runtime: &EngineRuntime<E>) -> PatchInstanceBuilder<E> {
        PatchInstanceBuilder::new(runtime.clone())
    }

    pub(crate) fn from_parts(
        config: BridgeConfig,
        context: EngineContext<E>,
        consumers: EventConsumers,
        translator: MidiTranslator,
        observer: Option<Box<dyn PatchObserver>>,
    ) -> Self {
        let sub_block = context.runtime().block_size();
        Self {
            config,
            audio: Mutex::new(AudioState {
                bridge: AudioBridge::new(sub_block),
                reported: false,
            }),
            control: Mutex::new(ControlState {
                receivers: ReceiverRegistry::new(),
                patch: None,
                observer,
                generation: 0,
            }),
            state: PatchStateCell::default(),
            prepared: AtomicFlag::new(false),
            messages: Mutex::new(consumers.messages),
            midi: Mutex::new(consumers.midi),
            prints: Mutex::new(consumers.prints),
            translator,
            context,
        }
    }

    #[inline]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[inline]
    pub fn context(&self) -> &EngineContext<E> {
        &self.context
    }

    #[inline]
    pub fn translator(&self) -> &MidiTranslator {
        &self.translator
    }

    /// Engine sub-block size in frames.
    pub fn sub_block(&self) -> usize {
        self.audio.lock().bridge.sub_block()
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared.get()
    }

    // ---------------------------------------------------------------
    // Audio
    // ---------------------------------------------------------------

    /// Configure audio and start DSP.
    ///
    /// `block_size` is the largest host block that will be processed and
    /// must be a multiple of the engine sub-block. A rejected layout leaves
    /// the current configuration running and posts an `error: audio:` line.
    pub fn prepare_audio(
        &self,
        inputs: usize,
        outputs: usize,
        block_size: usize,
        sample_rate: f64,
    ) -> Result<()> {
        let mut audio = self.audio.lock();
        let checked = BridgeConfig::validate_sample_rate(sample_rate)
            .map_err(Error::from)
            .and_then(|()| {
                audio.bridge.prepare(
                    inputs,
                    outputs,
                    block_size,
                    sample_rate,
                    self.config.max_channels,
                )
            });
        if let Err(e) = checked {
            tracing::warn!(
                "Audio layout rejected for {:?}: {}",
                self.context.instance_id(),
                e
            );
            self.post_audio_error(&e);
            return Err(e);
        }
        self.prepared.set(false);
        audio.reported = false;

        let started = self.context.with_context(|engine| {
            engine.init_audio(inputs, outputs, sample_rate)?;
            engine.set_dsp(true)
        });
        match started.and_then(|r| r) {
            Ok(()) => {
                self.prepared.set(true);
                tracing::info!(
                    "Audio prepared for {:?}: {} in, {} out, block {}, {} Hz",
                    self.context.instance_id(),
                    inputs,
                    outputs,
                    block_size,
                    sample_rate
                );
                Ok(())
            }
            Err(e) => {
                audio.bridge.release();
                tracing::error!("Audio prepare failed for {:?}: {}", self.context.instance_id(), e);
                let e = Error::from(e);
                self.post_audio_error(&e);
                Err(e)
            }
        }
    }

    /// Report a configuration error through the print queue.
    fn post_audio_error(&self, error: &Error) {
        let posted = self
            .context
            .with_context(|engine| engine.post(&format!("error: audio: {}", error)));
        if let Err(e) = posted {
            tracing::warn!("Could not post audio error: {}", e);
        }
    }

    /// Stop DSP and drop the audio buffers. Later blocks render silence.
    pub fn release_audio(&self) {
        let mut audio = self.audio.lock();
        self.prepared.set(false);
        if let Err(e) = self
            .context
            .with_context(|engine| engine.set_dsp(false))
            .and_then(|r| r)
        {
            tracing::warn!("DSP stop failed for {:?}: {}", self.context.instance_id(), e);
        }
        audio.bridge.release();
        tracing::debug!("Audio released for {:?}", self.context.instance_id());
    }

    /// Process one host block. Returns the number of engine ticks run.
    ///
    /// Never fails: on a bad block or engine error the outputs are silenced
    /// and an `error:` line is posted to the print queue once per audio
    /// configuration. Formatting that line is the only allocation on this
    /// path and happens only on error.
    pub fn process_audio(
        &self,
        num_samples: usize,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
    ) -> usize {
        self.process_audio_with_midi(num_samples, inputs, outputs, &[])
    }

    /// Process one host block, delivering `midi` ahead of the sub-block that
    /// contains each event's frame offset.
    ///
    /// Events are expected in frame order; offsets at or past `num_samples`
    /// go in before the last sub-block. Events the engine can't represent
    /// are dropped with an `error:` line.
    pub fn process_audio_with_midi(
        &self,
        num_samples: usize,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        midi: &[HostMidiEvent],
    ) -> usize {
        if !self.prepared.get() {
            write_silence(outputs, num_samples);
            return 0;
        }

        let mut audio = self.audio.lock();
        let AudioState { bridge, reported } = &mut *audio;
        if !bridge.is_prepared() {
            write_silence(outputs, num_samples);
            return 0;
        }

        let translator = &self.translator;
        let outcome = self.context.with_context(|engine| {
            let mut next = 0;
            let result = bridge.process(
                engine,
                num_samples,
                inputs,
                outputs,
                |engine, _start, end| {
                    while let Some(event) = midi.get(next) {
                        if event.frame_offset >= end && end < num_samples {
                            break;
                        }
                        if let Err(e) = translator.send(engine, event) {
                            engine.post(&format!("error: midi: {}", e));
                        }
                        next += 1;
                    }
                },
            );
            if let Err(e) = &result {
                if !*reported {
                    *reported = true;
                    engine.post(&format!("error: audio: {}", e));
                }
            }
            result
        });

        match outcome {
            Ok(Ok(ticks)) => ticks,
            _ => {
                write_silence(outputs, num_samples);
                0
            }
        }
    }

    // ---------------------------------------------------------------
    // Patch lifecycle
    // ---------------------------------------------------------------

    /// Open `name` from `dir`, replacing any loaded patch.
    ///
    /// On failure the slot is left empty and an `error:` line is posted.
    pub fn load_patch(&self, name: &str, dir: impl AsRef<Path>) -> Result<PatchInfo> {
        let dir = dir.as_ref();
        let mut control = self.control.lock();
        self.state.set(PatchState::Loading);
        tracing::info!("Loading patch '{}' from {}", name, dir.display());
        self.swap_patch(&mut control, Some((name, dir)))?
            .ok_or(Error::NoPatch)
    }

    /// Close the loaded patch, if any. Discovery runs either way so the
    /// observer always ends up with the empty state.
    pub fn close_patch(&self) -> Result<()> {
        let mut control = self.control.lock();
        if control.patch.is_none() {
            if let Some(observer) = control.observer.as_mut() {
                observer.patch_changed(None);
            }
            return Ok(());
        }
        tracing::info!("Closing patch for {:?}", self.context.instance_id());
        self.swap_patch(&mut control, None).map(|_| ())
    }

    /// Close and reopen the loaded patch in one gated section.
    pub fn reload_patch(&self) -> Result<PatchInfo> {
        let mut control = self.control.lock();
        let (name, dir) = match &control.patch {
            Some(patch) => (patch.name().to_string(), patch.dir().to_path_buf()),
            None => return Err(Error::NoPatch),
        };
        self.state.set(PatchState::Reloading);
        tracing::info!("Reloading patch '{}'", name);
        self.swap_patch(&mut control, Some((name.as_str(), dir.as_path())))?
            .ok_or(Error::NoPatch)
    }

    /// Close the current patch and open `target` (if any) inside one
    /// context section, then run discovery.
    fn swap_patch(
        &self,
        control: &mut ControlState,
        target: Option<(&str, &Path)>,
    ) -> Result<Option<PatchInfo>> {
        let generation = control.generation + 1;
        let prepared = self.prepared.get();
        let old = control.patch.take();

        let outcome = self.context.with_context(|engine| {
            if let Err(e) = engine.set_dsp(false) {
                tracing::warn!("DSP stop failed: {}", e);
            }
            let closed = match old {
                Some(patch) => patch.close(engine),
                None => Ok(()),
            };
            self.purge_patch_events();

            let opened = match target {
                Some((name, dir)) => match PatchHandle::open(engine, name, dir, generation) {
                    Ok(handle) => Ok(Some(handle)),
                    Err(e) => {
                        engine.post(&format!("error: {}: {}", name, e));
                        Err(e)
                    }
                },
                None => Ok(None),
            };

            if prepared {
                if let Err(e) = engine.set_dsp(true) {
                    tracing::warn!("DSP restart failed: {}", e);
                }
            }
            (closed, opened)
        });

        let (closed, opened) = match outcome {
            Ok(pair) => pair,
            Err(e) => {
                self.state.set(PatchState::Unloaded);
                return Err(e.into());
            }
        };
        if let Err(e) = closed {
            tracing::warn!("Closing previous patch failed: {}", e);
        }

        let result = match opened {
            Ok(Some(handle)) => {
                control.generation = generation;
                let info = handle.info().clone();
                control.patch = Some(handle);
                self.state.set(PatchState::Loaded);
                tracing::info!(
                    "Patch '{}' loaded ($0 = {}, generation {})",
                    info.name,
                    info.dollar_zero,
                    info.generation
                );
                Ok(Some(info))
            }
            Ok(None) => {
                self.state.set(PatchState::Unloaded);
                Ok(None)
            }
            Err(e) => {
                self.state.set(PatchState::Unloaded);
                tracing::error!("Patch load failed: {}", e);
                Err(e.into())
            }
        };

        let ControlState {
            patch, observer, ..
        } = control;
        if let Some(observer) = observer {
            observer.patch_changed(patch.as_ref().map(PatchHandle::info));
        }
        result
    }

    /// Discard queued messages and MIDI left by the outgoing patch.
    /// Print lines are kept.
    fn purge_patch_events(&self) {
        let messages = self.messages.lock().clear();
        let midi = self.midi.lock().clear();
        if messages + midi > 0 {
            tracing::debug!("Purged {} messages and {} MIDI events", messages, midi);
        }
    }

    /// Snapshot of the loaded patch.
    pub fn patch(&self) -> Option<PatchInfo> {
        self.control.lock().patch.as_ref().map(|p| p.info().clone())
    }

    /// Lock-free view of the patch slot.
    #[inline]
    pub fn patch_state(&self) -> PatchState {
        self.state.get()
    }

    /// Whether `info` still describes the loaded patch.
    pub fn is_current(&self, info: &PatchInfo) -> bool {
        self.control
            .lock()
            .patch
            .as_ref()
            .is_some_and(|p| p.info().generation == info.generation)
    }

    /// Replace the discovery hook. It runs with the control lock held, so it
    /// must not call patch or binding operations on this instance.
    pub fn set_observer(&self, observer: Option<Box<dyn PatchObserver>>) {
        self.control.lock().observer = observer;
    }

    // ---------------------------------------------------------------
    // Host -> engine messages
    // ---------------------------------------------------------------

    pub fn send_bang(&self, dest: &str) -> Result<()> {
        self.gated(|engine| engine.send_bang(dest))
    }

    pub fn send_float(&self, dest: &str, value: f32) -> Result<()> {
        self.gated(|engine| engine.send_float(dest, value))
    }

    pub fn send_symbol(&self, dest: &str, symbol: &str) -> Result<()> {
        self.gated(|engine| engine.send_symbol(dest, symbol))
    }

    pub fn send_list(&self, dest: &str, atoms: &[Atom]) -> Result<()> {
        self.gated(|engine| engine.send_list(dest, atoms))
    }

    pub fn send_message(&self, dest: &str, selector: &str, atoms: &[Atom]) -> Result<()> {
        self.gated(|engine| engine.send_message(dest, selector, atoms))
    }

    /// Deliver a host MIDI event outside the audio path.
    pub fn send_midi(&self, event: &HostMidiEvent) -> Result<usize> {
        let translator = &self.translator;
        Ok(self
            .context
            .with_context(|engine| translator.send(engine, event))??)
    }

    /// Post a line to the engine console (ends up in the print queue).
    pub fn post(&self, text: &str) -> Result<()> {
        Ok(self.context.with_context(|engine| engine.post(text))?)
    }

    fn gated(&self, f: impl FnOnce(&mut E) -> std::result::Result<(), EngineError>) -> Result<()> {
        Ok(self.context.with_context(f)??)
    }

    // ---------------------------------------------------------------
    // Receivers
    // ---------------------------------------------------------------

    /// Bind `name` so engine sends to it reach the message queue.
    /// Returns `false` if it was already bound.
    pub fn bind(&self, name: &str) -> Result<bool> {
        let mut control = self.control.lock();
        let created = self
            .context
            .with_context(|engine| control.receivers.bind(engine, name))??;
        if created {
            tracing::debug!("Bound '{}' on {:?}", name, self.context.instance_id());
        }
        Ok(created)
    }

    /// Unbind `name`. Unknown names are a no-op returning `false`.
    pub fn unbind(&self, name: &str) -> Result<bool> {
        let mut control = self.control.lock();
        if !control.receivers.contains(name) {
            return Ok(false);
        }
        let removed = self
            .context
            .with_context(|engine| control.receivers.unbind(engine, name))??;
        tracing::debug!("Unbound '{}' on {:?}", name, self.context.instance_id());
        Ok(removed)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.control.lock().receivers.contains(name)
    }

    pub fn bound_count(&self) -> usize {
        self.control.lock().receivers.len()
    }

    /// Bind every receive symbol of `params`. Returns how many were new.
    pub fn bind_parameters(&self, params: &ParameterSet) -> Result<usize> {
        let mut control = self.control.lock();
        let created = self.context.with_context(|engine| {
            let mut created = 0;
            for symbol in params.receive_symbols() {
                if control.receivers.bind(engine, symbol)? {
                    created += 1;
                }
            }
            Ok::<_, EngineError>(created)
        })??;
        tracing::debug!("Bound {} parameter receivers", created);
        Ok(created)
    }

    /// Push parameter `index`'s current value to its send symbol.
    pub fn send_parameter(&self, params: &ParameterSet, index: usize) -> Result<()> {
        let param = params.get(index).ok_or(Error::UnknownParameter(index))?;
        let send = param.spec().send.as_deref().ok_or_else(|| Error::MissingSymbol {
            name: param.name().to_string(),
            which: "send",
        })?;
        self.send_float(send, param.value())
    }

    // ---------------------------------------------------------------
    // Pump
    // ---------------------------------------------------------------

    /// Dispatch queued messages to `receiver`. Non-blocking; returns the
    /// number dispatched.
    pub fn drain_messages(&self, receiver: &mut impl MessageReceiver) -> usize {
        pump(&self.messages, |message| receiver.receive(&message))
    }

    /// Dispatch queued engine MIDI to `receiver`.
    pub fn drain_midi(&self, receiver: &mut impl MidiReceiver) -> usize {
        pump(&self.midi, |event| receiver.receive_midi(event))
    }

    /// Classify and dispatch queued print lines.
    pub fn drain_prints(&self, receiver: &mut impl PrintReceiver) -> usize {
        pump(&self.prints, |entry| {
            let severity = entry.severity();
            receiver.receive_print(&entry, severity)
        })
    }

    /// Current queue fill levels. Zero for a queue that is mid-drain.
    pub fn queue_levels(&self) -> QueueLevels {
        fn level<T>(queue: &Mutex<QueueConsumer<T>>) -> usize {
            queue.try_lock().map_or(0, |q| q.pending_count())
        }
        QueueLevels {
            messages: level(&self.messages),
            midi: level(&self.midi),
            prints: level(&self.prints),
        }
    }
}

/// Pop at most what was pending at the start, one entry per lock. Stops if
/// another pump holds the queue.
fn pump<T>(queue: &Mutex<QueueConsumer<T>>, mut f: impl FnMut(T)) -> usize {
    let pending = match queue.try_lock() {
        Some(q) => q.pending_count(),
        None => return 0,
    };
    let mut count = 0;
    while count < pending {
        let item = match queue.try_lock() {
            Some(mut q) => q.pop(),
            None => break,
        };
        match item {
            Some(item) => {
                f(item);
                count += 1;
            }
            None => break,
        }
    }
    count
}

impl<E: PatchEngine> Drop for PatchInstance<E> {
    fn drop(&mut self) {
        let control = self.control.get_mut();
        let instance = self.context.instance_id();
        let patch = control.patch.take();
        let receivers = &mut control.receivers;

        let released = self.context.with_context(|engine| {
            if let Err(e) = engine.set_dsp(false) {
                tracing::warn!("DSP stop failed during teardown: {}", e);
            }
            if let Some(patch) = patch {
                if let Err(e) = patch.close(engine) {
                    tracing::warn!("Closing patch during teardown failed: {}", e);
                }
            }
            receivers.unbind_all(engine)
        });
        match released {
            Ok(Ok(n)) => tracing::debug!("Released {} receivers of {:?}", n, instance),
            Ok(Err(e)) => tracing::warn!("Unbinding during teardown failed for {:?}: {}", instance, e),
            Err(e) => tracing::warn!("Teardown of {:?} could not enter context: {}", instance, e),
        }
        self.state.set(PatchState::Unloaded);
    }
}
