//! Tolerance constants for audio testing.

/// Floating point rounding errors (passthrough, exact gain).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Parameter normalization round trips.
pub const PARAM_EPSILON: f32 = 1e-5;
