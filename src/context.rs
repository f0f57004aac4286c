//! The context gate: one process-wide lock plus current-instance selection.
//!
//! The engine keeps its routing tables and audio state as global mutable
//! state reached through a "current instance". Every call into it goes
//! through [`EngineContext::with_context`], which takes the process-wide lock
//! and selects this instance before running the closure.

use std::sync::Arc;

use parking_lot::Mutex;
use patchhost_core::{EngineCallbacks, EngineError, InstanceId, PatchEngine};

/// Shared handle to the process-wide engine.
///
/// Clone is cheap (Arc-based). All bridges driving the same engine must be
/// built from clones of one runtime.
pub struct EngineRuntime<E: PatchEngine> {
    engine: Arc<Mutex<E>>,
}

impl<E: PatchEngine> Clone for EngineRuntime<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: PatchEngine> EngineRuntime<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Engine sub-block size in frames.
    pub fn block_size(&self) -> usize {
        self.engine.lock().block_size()
    }

    /// Read engine state under the lock without selecting an instance.
    pub fn inspect<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.engine.lock())
    }

    /// Create an engine instance and install its callbacks.
    ///
    /// Atomic: if any step fails the instance is freed again and no context
    /// is returned.
    pub fn create_context(
        &self,
        callbacks: Box<dyn EngineCallbacks>,
    ) -> Result<EngineContext<E>, EngineError> {
        let mut engine = self.engine.lock();
        let instance = engine.new_instance()?;

        let installed = engine
            .set_instance(instance)
            .and_then(|_| engine.set_callbacks(callbacks));
        if let Err(e) = installed {
            if let Err(free_err) = engine.free_instance(instance) {
                tracing::warn!("Failed to free half-built {:?}: {}", instance, free_err);
            }
            return Err(e);
        }

        tracing::debug!("Created engine {:?}", instance);
        Ok(EngineContext {
            runtime: self.clone(),
            instance,
        })
    }
}

/// One engine instance, reachable only through the gate.
///
/// Dropping the context frees the engine instance. Anything that can still
/// call back into the instance (bindings, the open patch) must be released
/// before that.
pub struct EngineContext<E: PatchEngine> {
    runtime: EngineRuntime<E>,
    instance: InstanceId,
}

impl<E: PatchEngine> EngineContext<E> {
    #[inline]
    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    #[inline]
    pub fn runtime(&self) -> &EngineRuntime<E> {
        &self.runtime
    }

    /// Lock, select this instance, run `f`, unlock.
    ///
    /// Keep `f` short: the audio thread contends for the same lock every block.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut E) -> R) -> Result<R, EngineError> {
        let mut engine = self.runtime.engine.lock();
        engine.set_instance(self.instance)?;
        Ok(f(&mut engine))
    }
}

impl<E: PatchEngine> Drop for EngineContext<E> {
    fn drop(&mut self) {
        let mut engine = self.runtime.engine.lock();
        match engine.free_instance(self.instance) {
            Ok(()) => tracing::debug!("Freed engine {:?}", self.instance),
            Err(e) => tracing::warn!("Failed to free engine {:?}: {}", self.instance, e),
        }
    }
}
