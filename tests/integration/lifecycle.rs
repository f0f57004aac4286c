//! Instance and patch lifecycle tests.

use std::sync::{Arc, Mutex};

use patchhost::prelude::*;
use patchhost::{EngineError, QueueLevels};

use crate::helpers::*;

#[test]
fn test_missing_patch_leaves_slot_empty_and_reports_error() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);

    let result = instance.load_patch("x.ext", "/missing/");
    assert!(matches!(
        result,
        Err(Error::Engine(EngineError::PatchNotFound { .. }))
    ));
    assert_eq!(instance.patch(), None);
    assert_eq!(instance.patch_state(), PatchState::Unloaded);

    let prints = drain_prints(&instance);
    assert!(
        prints.iter().any(|(severity, _)| *severity == Severity::Error),
        "expected an error line, got {:?}",
        prints
    );
}

#[test]
fn test_failed_load_replaces_previous_patch() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = test_instance(&runtime);

    instance.load_patch(MAIN_PATCH, dir.path()).unwrap();
    assert!(instance.load_patch("gone.pd", dir.path()).is_err());
    assert_eq!(instance.patch(), None);

    let id = instance.context().instance_id();
    assert!(runtime.inspect(|e| e.open_patches(id).is_empty()));
}

#[test]
fn test_load_close_drain_leaves_queues_empty() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = test_instance(&runtime);
    instance.bind("out").unwrap();

    instance.load_patch(MAIN_PATCH, dir.path()).unwrap();
    instance.send_float("out", 1.0).unwrap();
    instance
        .send_midi(&HostMidiEvent::note_on(0, 0, 60, 100))
        .unwrap();
    instance.post("hello from the patch").unwrap();

    instance.close_patch().unwrap();

    let mut messages = Vec::<Message>::new();
    let mut midi = Vec::<MidiEvent>::new();
    instance.drain_messages(&mut messages);
    instance.drain_midi(&mut midi);
    let prints = drain_prints(&instance);

    assert!(messages.is_empty(), "patch messages leaked: {:?}", messages);
    assert!(midi.is_empty(), "patch MIDI leaked: {:?}", midi);
    assert_eq!(prints.len(), 1);
    assert_eq!(instance.queue_levels(), QueueLevels::default());
}

#[test]
fn test_reload_keeps_name_and_bumps_generation() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());

    let before = instance.patch().unwrap();
    let after = instance.reload_patch().unwrap();
    assert_eq!(after.name, before.name);
    assert_eq!(after.dir, before.dir);
    assert_eq!(after.generation, before.generation + 1);
    assert!(instance.is_current(&after));
    assert!(!instance.is_current(&before));

    // DSP re-armed after reload
    let id = instance.context().instance_id();
    assert!(runtime.inspect(|e| e.dsp_enabled(id)));
}

#[test]
fn test_dsp_rearmed_even_after_failed_load() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());
    let id = instance.context().instance_id();

    assert!(instance.load_patch("nope.pd", dir.path()).is_err());
    assert!(runtime.inspect(|e| e.dsp_enabled(id)));
}

#[test]
fn test_observer_sees_every_change() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let seen: Arc<Mutex<Vec<Option<u64>>>> = Arc::default();

    let log = Arc::clone(&seen);
    let instance = PatchInstance::builder(&runtime)
        .observer(move |patch: Option<&PatchInfo>| {
            log.lock().unwrap().push(patch.map(|p| p.generation));
        })
        .build()
        .unwrap();

    instance.load_patch(MAIN_PATCH, dir.path()).unwrap();
    instance.reload_patch().unwrap();
    instance.close_patch().unwrap();
    let _ = instance.load_patch("missing.pd", dir.path());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(1), Some(2), None, None]
    );
}

#[test]
fn test_close_without_patch_is_noop() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.close_patch().unwrap();
    assert_eq!(instance.patch_state(), PatchState::Unloaded);
}

#[test]
fn test_close_without_patch_still_reports_empty_state() {
    let runtime = test_runtime();
    let seen: Arc<Mutex<Vec<Option<u64>>>> = Arc::default();

    let log = Arc::clone(&seen);
    let instance = PatchInstance::builder(&runtime)
        .observer(move |patch: Option<&PatchInfo>| {
            log.lock().unwrap().push(patch.map(|p| p.generation));
        })
        .build()
        .unwrap();

    instance.close_patch().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![None]);
}

#[test]
fn test_teardown_releases_everything() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let instance = running_instance(&runtime, dir.path());
    instance.bind("a").unwrap();
    instance.bind("b").unwrap();

    drop(instance);
    assert_eq!(runtime.inspect(|e| e.instance_count()), 0);
}

#[test]
fn test_persisted_state_roundtrip_through_bytes() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let mut params = ParameterSet::new();
    params
        .add(
            ParameterSpec::new("Level")
                .receive("level-r")
                .send("level-s")
                .range(-60.0, 6.0),
        )
        .unwrap();

    let blob = {
        let instance = test_instance(&runtime);
        instance.load_patch(MAIN_PATCH, dir.path()).unwrap();
        params.set_normalized(0, 0.5).unwrap();
        PersistedState::capture(&instance, &params).to_bytes().unwrap()
    };

    params.reset();
    let instance = test_instance(&runtime);
    let state = PersistedState::from_bytes(&blob).unwrap();
    let info = state.restore(&instance, &params).unwrap().unwrap();

    assert_eq!(info.name, MAIN_PATCH);
    assert!((params.normalized(0).unwrap() - 0.5).abs() < tolerances::PARAM_EPSILON);
}
