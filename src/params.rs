//! Host parameters mirrored onto engine receive/send symbols.
//!
//! Each parameter holds a normalized value (0..=1) in a lock-free atomic so
//! the host can read it from the audio thread. Engine floats arriving on a
//! parameter's receive symbol update it; host changes go out on the send
//! symbol through [`PatchInstance::send_parameter`](crate::PatchInstance::send_parameter).

use std::collections::HashMap;

use patchhost_core::{AtomicFloat, MessageReceiver};

use crate::error::{Error, Result};

/// Static description of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    /// Symbol the patch sends to when the value changes inside the patch.
    pub receive: Option<String>,
    /// Symbol the host sends to when the value changes outside the patch.
    pub send: Option<String>,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receive: None,
            send: None,
            min: 0.0,
            max: 1.0,
            default: 0.0,
        }
    }

    pub fn receive(mut self, symbol: impl Into<String>) -> Self {
        self.receive = Some(symbol.into());
        self
    }

    pub fn send(mut self, symbol: impl Into<String>) -> Self {
        self.send = Some(symbol.into());
        self
    }

    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn default_value(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    /// Map a value in `min..=max` to `0..=1`.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }
}

/// A registered parameter and its current normalized value.
#[derive(Debug)]
pub struct Parameter {
    spec: ParameterSpec,
    value: AtomicFloat,
}

impl Parameter {
    #[inline]
    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[inline]
    pub fn normalized(&self) -> f32 {
        self.value.get()
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.spec.denormalize(self.value.get())
    }
}

/// Ordered parameter list with a receive-symbol index.
#[derive(Debug, Default)]
pub struct ParameterSet {
    params: Vec<Parameter>,
    by_receive: HashMap<String, usize>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter and return its index.
    ///
    /// A receive symbol already claimed by an earlier parameter is rejected;
    /// the earlier one keeps it.
    pub fn add(&mut self, spec: ParameterSpec) -> Result<usize> {
        if let Some(symbol) = &spec.receive {
            if let Some(&existing) = self.by_receive.get(symbol) {
                let existing = self.params[existing].spec.name.clone();
                tracing::warn!(
                    "Parameter '{}' rejected: receive symbol '{}' already used by '{}'",
                    spec.name,
                    symbol,
                    existing
                );
                return Err(Error::DuplicateReceive {
                    symbol: symbol.clone(),
                    existing,
                    rejected: spec.name,
                });
            }
        }

        let index = self.params.len();
        if let Some(symbol) = &spec.receive {
            self.by_receive.insert(symbol.clone(), index);
        }
        let value = AtomicFloat::new(spec.normalize(spec.default));
        self.params.push(Parameter { spec, value });
        Ok(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.spec.name == name)
    }

    pub fn index_of_receive(&self, symbol: &str) -> Option<usize> {
        self.by_receive.get(symbol).copied()
    }

    /// All receive symbols, in registration order.
    pub fn receive_symbols(&self) -> impl Iterator<Item = &str> {
        self.params.iter().filter_map(|p| p.spec.receive.as_deref())
    }

    pub fn set_normalized(&self, index: usize, normalized: f32) -> Result<()> {
        let param = self.params.get(index).ok_or(Error::UnknownParameter(index))?;
        param.value.set_normalized(normalized);
        Ok(())
    }

    pub fn normalized(&self, index: usize) -> Result<f32> {
        self.params
            .get(index)
            .map(Parameter::normalized)
            .ok_or(Error::UnknownParameter(index))
    }

    /// Reset every parameter to its default.
    pub fn reset(&self) {
        for param in &self.params {
            param.value.set(param.spec.normalize(param.spec.default));
        }
    }

    /// Apply a value coming from the engine on `symbol`.
    ///
    /// Returns the index of the updated parameter.
    pub fn apply_engine_value(&self, symbol: &str, value: f32) -> Option<usize> {
        let index = self.index_of_receive(symbol)?;
        let param = &self.params[index];
        param.value.set_normalized(param.spec.normalize(value));
        Some(index)
    }
}

impl MessageReceiver for &ParameterSet {
    fn receive_float(&mut self, dest: &str, value: f32) {
        self.apply_engine_value(dest, value);
    }
}

impl MessageReceiver for ParameterSet {
    fn receive_float(&mut self, dest: &str, value: f32) {
        self.apply_engine_value(dest, value);
    }
}
