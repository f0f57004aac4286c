//! Test helpers and fixtures for patchhost integration tests
//!
//! Fixtures run against the deterministic `SimEngine`: patches are empty
//! files in a temp directory, audio passes straight through while a patch is
//! open and DSP is on, and MIDI input is echoed to MIDI output.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)
//! - `PARAM_EPSILON` (1e-5): Parameter normalization

#![allow(dead_code)]

pub mod tolerances;

use std::path::Path;

use patchhost::prelude::*;
use patchhost::{EngineRuntime, Symbol};
use tempfile::TempDir;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Engine sub-block used by the fixtures.
pub const TEST_SUB_BLOCK: usize = 64;

/// Standard host buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Name of the patch written by [`patch_dir`].
pub const MAIN_PATCH: &str = "main.pd";

/// Temp directory holding the given (empty) patch files.
pub fn patch_dir_with(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for name in names {
        std::fs::write(dir.path().join(name), "#N canvas 0 0 450 300 12;\n")
            .expect("Failed to write patch file");
    }
    dir
}

/// Temp directory holding `main.pd`.
pub fn patch_dir() -> TempDir {
    patch_dir_with(&[MAIN_PATCH])
}

/// Route `tracing` output through the test harness. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_runtime() -> EngineRuntime<SimEngine> {
    init_tracing();
    EngineRuntime::new(SimEngine::with_block_size(TEST_SUB_BLOCK))
}

pub fn test_instance(runtime: &EngineRuntime<SimEngine>) -> PatchInstance<SimEngine> {
    PatchInstance::builder(runtime)
        .build()
        .expect("Failed to create test instance")
}

/// Stereo instance, prepared for `TEST_BUFFER_SIZE` and running `main.pd`.
pub fn running_instance(
    runtime: &EngineRuntime<SimEngine>,
    dir: &Path,
) -> PatchInstance<SimEngine> {
    let instance = test_instance(runtime);
    instance
        .prepare_audio(2, 2, TEST_BUFFER_SIZE, TEST_SAMPLE_RATE)
        .expect("Failed to prepare audio");
    instance
        .load_patch(MAIN_PATCH, dir)
        .expect("Failed to load test patch");
    instance
}

/// Engine ticks performed so far by `instance`.
pub fn ticks(instance: &PatchInstance<SimEngine>) -> u64 {
    let id = instance.context().instance_id();
    instance.context().runtime().inspect(|e| e.ticks(id))
}

/// Run one block with per-channel vectors.
pub fn process(
    instance: &PatchInstance<SimEngine>,
    inputs: &[Vec<f32>],
    outputs: &mut [Vec<f32>],
    num_samples: usize,
) -> usize {
    let ins: Vec<&[f32]> = inputs.iter().map(Vec::as_slice).collect();
    let mut outs: Vec<&mut [f32]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
    instance.process_audio(num_samples, &ins, &mut outs)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Drain every print line currently queued.
pub fn drain_prints(instance: &PatchInstance<SimEngine>) -> Vec<(Severity, String)> {
    let mut lines = Vec::new();
    instance.drain_prints(&mut lines);
    lines
}

/// One typed callback observed by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Bang(String),
    Float(String, f32),
    Symbol(String, String),
    List(String, Vec<Atom>),
    Message(String, String, Vec<Atom>),
}

/// Records message dispatch through the typed hooks.
#[derive(Debug, Default)]
pub struct Recorder {
    pub received: Vec<Received>,
}

impl MessageReceiver for Recorder {
    fn receive_bang(&mut self, dest: &str) {
        self.received.push(Received::Bang(dest.to_string()));
    }

    fn receive_float(&mut self, dest: &str, value: f32) {
        self.received.push(Received::Float(dest.to_string(), value));
    }

    fn receive_symbol(&mut self, dest: &str, symbol: &Symbol) {
        self.received
            .push(Received::Symbol(dest.to_string(), symbol.to_string()));
    }

    fn receive_list(&mut self, dest: &str, atoms: &[Atom]) {
        self.received
            .push(Received::List(dest.to_string(), atoms.to_vec()));
    }

    fn receive_message(&mut self, dest: &str, selector: &Symbol, args: &[Atom]) {
        self.received.push(Received::Message(
            dest.to_string(),
            selector.to_string(),
            args.to_vec(),
        ));
    }
}
