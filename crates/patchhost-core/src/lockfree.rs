//! Atomics read on the audio thread without taking any lock.
//!
//! [`AtomicFloat`] holds a parameter's normalized value: the host reads it
//! from its audio or automation thread while the message pump writes values
//! coming back from the engine. [`AtomicFlag`] is the instance's "audio
//! prepared" gate checked at the top of every host block.

use std::sync::atomic::{AtomicBool, Ordering};

use atomic_float::AtomicF32;

/// Shared f32 cell, padded to its own cache line so neighbouring parameters
/// don't contend.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }

    /// Store `value` clamped to `0.0..=1.0`. NaN stores `0.0`.
    #[inline]
    pub fn set_normalized(&self, value: f32) {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        self.set(value);
    }
}

impl Clone for AtomicFloat {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// One-bit state flipped by the control thread and polled by the audio
/// thread.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }
}
