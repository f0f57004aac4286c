//! Integration test modules for patchhost
//!
//! - lifecycle: construction, patch state machine, teardown
//! - audio: host block processing through the engine
//! - messaging: host/engine messages, receivers, pump
//! - multi_instance: shared runtime, context selection

pub mod audio;
pub mod lifecycle;
pub mod messaging;
pub mod multi_instance;
