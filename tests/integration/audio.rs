//! Host block processing through the engine.

use approx::assert_relative_eq;
use patchhost::prelude::*;

use crate::helpers::*;

#[test]
fn test_block_of_k_sub_blocks_runs_k_ticks() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());

    for k in [1usize, 2, 8] {
        let n = k * TEST_SUB_BLOCK;
        let before = ticks(&instance);
        let inputs = vec![generate_sine(440.0, TEST_SAMPLE_RATE, n); 2];
        let mut outputs = vec![vec![0.0f32; n]; 2];

        let ran = process(&instance, &inputs, &mut outputs, n);

        assert_eq!(ran, k);
        assert_eq!(ticks(&instance) - before, k as u64);
        for output in &outputs {
            assert_eq!(output.len(), n);
        }
    }
}

#[test]
fn test_passthrough_preserves_channels() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());

    let left = generate_sine(440.0, TEST_SAMPLE_RATE, TEST_BUFFER_SIZE);
    let right = generate_sine(1000.0, TEST_SAMPLE_RATE, TEST_BUFFER_SIZE);
    let inputs = vec![left.clone(), right.clone()];
    let mut outputs = vec![vec![0.0f32; TEST_BUFFER_SIZE]; 2];

    process(&instance, &inputs, &mut outputs, TEST_BUFFER_SIZE);

    for i in 0..TEST_BUFFER_SIZE {
        assert_relative_eq!(outputs[0][i], left[i], epsilon = tolerances::FLOAT_EPSILON);
        assert_relative_eq!(outputs[1][i], right[i], epsilon = tolerances::FLOAT_EPSILON);
    }
}

#[test]
fn test_non_multiple_block_is_silenced_and_reported() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());
    drain_prints(&instance);

    let n = TEST_SUB_BLOCK + 1;
    let inputs = vec![vec![1.0f32; n]; 2];
    let mut outputs = vec![vec![1.0f32; n]; 2];

    assert_eq!(process(&instance, &inputs, &mut outputs, n), 0);
    assert_eq!(process(&instance, &inputs, &mut outputs, n), 0);
    assert!(peak(&outputs[0]) < tolerances::SILENCE_THRESHOLD);
    assert!(peak(&outputs[1]) < tolerances::SILENCE_THRESHOLD);

    let prints = drain_prints(&instance);
    assert_eq!(prints.len(), 1, "one report per configuration: {:?}", prints);
    assert_eq!(prints[0].0, Severity::Error);

    // Re-preparing re-arms the report
    instance
        .prepare_audio(2, 2, TEST_BUFFER_SIZE, TEST_SAMPLE_RATE)
        .unwrap();
    process(&instance, &inputs, &mut outputs, n);
    assert_eq!(drain_prints(&instance).len(), 1);
}

#[test]
fn test_prepare_rejects_non_multiple_block_size() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    let result = instance.prepare_audio(2, 2, 500, TEST_SAMPLE_RATE);
    assert!(matches!(result, Err(Error::BlockSize { block_size: 500, .. })));
    assert!(!instance.is_prepared());

    let prints = drain_prints(&instance);
    assert_eq!(prints.len(), 1, "{:?}", prints);
    assert_eq!(prints[0].0, Severity::Error);
    assert!(prints[0].1.starts_with("error: audio:"));
}

#[test]
fn test_rejected_prepare_keeps_running_configuration() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());
    let id = instance.context().instance_id();
    drain_prints(&instance);

    let inputs = vec![vec![0.5f32; TEST_BUFFER_SIZE]; 2];
    let mut outputs = vec![vec![0.0f32; TEST_BUFFER_SIZE]; 2];
    assert_eq!(process(&instance, &inputs, &mut outputs, TEST_BUFFER_SIZE), 8);

    assert!(instance.prepare_audio(2, 2, 100, TEST_SAMPLE_RATE).is_err());
    assert!(instance.prepare_audio(2, 2, TEST_BUFFER_SIZE, 0.0).is_err());
    assert!(instance.is_prepared());
    assert!(runtime.inspect(|e| e.dsp_enabled(id)));
    assert_eq!(
        runtime.inspect(|e| e.audio_settings(id)),
        Some((2, 2, TEST_SAMPLE_RATE))
    );

    let prints = drain_prints(&instance);
    assert_eq!(prints.len(), 2, "one report per rejection: {:?}", prints);
    assert!(prints.iter().all(|(severity, _)| *severity == Severity::Error));

    let mut outputs = vec![vec![0.0f32; TEST_BUFFER_SIZE]; 2];
    assert_eq!(process(&instance, &inputs, &mut outputs, TEST_BUFFER_SIZE), 8);
    assert_relative_eq!(outputs[0][0], 0.5, epsilon = tolerances::FLOAT_EPSILON);
    assert_relative_eq!(outputs[1][TEST_BUFFER_SIZE - 1], 0.5, epsilon = tolerances::FLOAT_EPSILON);
}

#[test]
fn test_prepare_rejects_too_many_channels() {
    let runtime = test_runtime();
    let instance = PatchInstance::builder(&runtime)
        .config(BridgeConfig {
            max_channels: 2,
            ..Default::default()
        })
        .build()
        .unwrap();
    assert!(matches!(
        instance.prepare_audio(2, 4, TEST_BUFFER_SIZE, TEST_SAMPLE_RATE),
        Err(Error::ChannelCount { direction: "output", count: 4, max: 2 })
    ));
}

#[test]
fn test_release_renders_silence_and_stops_dsp() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());
    let id = instance.context().instance_id();

    instance.release_audio();
    assert!(!instance.is_prepared());
    assert!(!runtime.inspect(|e| e.dsp_enabled(id)));

    let inputs = vec![vec![1.0f32; TEST_BUFFER_SIZE]; 2];
    let mut outputs = vec![vec![1.0f32; TEST_BUFFER_SIZE]; 2];
    let before = ticks(&instance);
    assert_eq!(process(&instance, &inputs, &mut outputs, TEST_BUFFER_SIZE), 0);
    assert_eq!(ticks(&instance), before);
    assert!(peak(&outputs[0]) < tolerances::SILENCE_THRESHOLD);
}

#[test]
fn test_no_patch_outputs_silence_but_ticks() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance
        .prepare_audio(2, 2, TEST_BUFFER_SIZE, TEST_SAMPLE_RATE)
        .unwrap();

    let inputs = vec![generate_sine(440.0, TEST_SAMPLE_RATE, TEST_BUFFER_SIZE); 2];
    let mut outputs = vec![vec![1.0f32; TEST_BUFFER_SIZE]; 2];
    assert_eq!(process(&instance, &inputs, &mut outputs, TEST_BUFFER_SIZE), 8);
    assert!(peak(&outputs[0]) < tolerances::SILENCE_THRESHOLD);
}

#[test]
fn test_prepare_reinitializes_engine_audio() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    let id = instance.context().instance_id();

    instance.prepare_audio(1, 2, 256, 44100.0).unwrap();
    instance.prepare_audio(2, 2, 512, 96000.0).unwrap();

    assert_eq!(runtime.inspect(|e| e.audio_inits(id)), 2);
    assert_eq!(
        runtime.inspect(|e| e.audio_settings(id)),
        Some((2, 2, 96000.0))
    );
    assert!(runtime.inspect(|e| e.dsp_enabled(id)));
}
