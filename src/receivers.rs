//! Named receiver bindings for one engine instance.
//!
//! The registry only tracks names and engine receiver pointers. Callers
//! perform the engine side (`PatchEngine::bind` / `unbind`) inside the
//! context gate and record the outcome here, so a name is present exactly
//! when its engine receiver exists.

use std::collections::HashMap;

use patchhost_core::{EngineError, PatchEngine, ReceiverPtr};

#[derive(Default)]
pub struct ReceiverRegistry {
    bindings: HashMap<String, ReceiverPtr>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` through `engine` unless it is already bound.
    ///
    /// Returns `true` if a new receiver was created.
    pub fn bind<E: PatchEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        name: &str,
    ) -> Result<bool, EngineError> {
        if self.bindings.contains_key(name) {
            return Ok(false);
        }
        let receiver = engine.bind(name)?;
        self.bindings.insert(name.to_string(), receiver);
        Ok(true)
    }

    /// Unbind `name`. Unknown names are ignored.
    ///
    /// Returns `true` if a receiver was destroyed.
    pub fn unbind<E: PatchEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        name: &str,
    ) -> Result<bool, EngineError> {
        let receiver = match self.bindings.get(name) {
            Some(receiver) => *receiver,
            None => return Ok(false),
        };
        engine.unbind(receiver)?;
        self.bindings.remove(name);
        Ok(true)
    }

    /// Unbind everything. Keeps going past engine errors and returns the
    /// first one.
    pub fn unbind_all<E: PatchEngine + ?Sized>(&mut self, engine: &mut E) -> Result<usize, EngineError> {
        let mut first_err = None;
        let mut count = 0;
        for (_, receiver) in self.bindings.drain() {
            match engine.unbind(receiver) {
                Ok(()) => count += 1,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}
