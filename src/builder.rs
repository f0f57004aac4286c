//! Builder for configuring and constructing a `PatchInstance`.

use patchhost_core::{event_queues, BridgeConfig, PatchEngine};
use patchhost_midi::MidiTranslator;

use crate::context::EngineRuntime;
use crate::hooks::CallbackSink;
use crate::patch::PatchObserver;
use crate::{PatchInstance, Result};

/// Every instance built from clones of one [`EngineRuntime`] shares its
/// process-wide lock.
///
/// # Example
///
/// ```ignore
/// use patchhost::prelude::*;
///
/// let runtime = EngineRuntime::new(SimEngine::new());
/// let instance = PatchInstance::builder(&runtime)
///     .config(BridgeConfig::default())
///     .observer(|patch: Option<&PatchInfo>| println!("patch: {:?}", patch))
///     .build()?;
///
/// instance.prepare_audio(2, 2, 512, 48000.0)?;
/// instance.load_patch("main.pd", "/patches")?;
/// ```
pub struct PatchInstanceBuilder<E: PatchEngine> {
    runtime: EngineRuntime<E>,
    config: BridgeConfig,
    midi_ports: u16,
    observer: Option<Box<dyn PatchObserver>>,
}

impl<E: PatchEngine> PatchInstanceBuilder<E> {
    pub(crate) fn new(runtime: EngineRuntime<E>) -> Self {
        Self {
            runtime,
            config: BridgeConfig::default(),
            midi_ports: MidiTranslator::default().ports(),
            observer: None,
        }
    }

    /// Queue capacities and channel limits.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of 16-channel MIDI ports mapped onto engine channels.
    pub fn midi_ports(mut self, ports: u16) -> Self {
        self.midi_ports = ports;
        self
    }

    /// Discovery hook run after every patch load, close and reload.
    pub fn observer(mut self, observer: impl PatchObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Create the engine instance.
    ///
    /// Fails without leaving an engine instance behind if the config is
    /// invalid or the engine can't construct one.
    pub fn build(self) -> Result<PatchInstance<E>> {
        self.config.validate()?;

        let (producers, consumers) = event_queues(&self.config);
        let context = match self
            .runtime
            .create_context(Box::new(CallbackSink::new(producers)))
        {
            Ok(context) => context,
            Err(e) => {
                tracing::error!("Engine construction failed: {}", e);
                return Err(e.into());
            }
        };

        tracing::info!(
            "Created patch instance {:?} (sub-block {})",
            context.instance_id(),
            self.runtime.block_size()
        );
        Ok(PatchInstance::from_parts(
            self.config,
            context,
            consumers,
            MidiTranslator::new(self.midi_ports),
            self.observer,
        ))
    }
}
