//! Several instances sharing one process-wide engine.

use patchhost::prelude::*;

use crate::helpers::*;

#[test]
fn test_instances_keep_separate_state() {
    let runtime = test_runtime();
    let dir = patch_dir_with(&["a.pd", "b.pd"]);
    let a = test_instance(&runtime);
    let b = test_instance(&runtime);

    a.load_patch("a.pd", dir.path()).unwrap();
    b.load_patch("b.pd", dir.path()).unwrap();
    a.bind("shared-name").unwrap();

    assert_eq!(a.patch().unwrap().name, "a.pd");
    assert_eq!(b.patch().unwrap().name, "b.pd");
    assert!(a.is_bound("shared-name"));
    assert!(!b.is_bound("shared-name"));

    // Receivers live in their own instance only
    assert!(a.send_bang("shared-name").is_ok());
    assert!(b.send_bang("shared-name").is_err());

    let mut from_a = Vec::<Message>::new();
    let mut from_b = Vec::<Message>::new();
    a.drain_messages(&mut from_a);
    b.drain_messages(&mut from_b);
    assert_eq!(from_a.len(), 1);
    assert!(from_b.is_empty());
}

#[test]
fn test_every_call_selects_its_instance() {
    let runtime = test_runtime();
    let a = test_instance(&runtime);
    let b = test_instance(&runtime);

    let switches = runtime.inspect(|e| e.context_switches());
    a.post("one").unwrap();
    b.post("two").unwrap();
    a.post("three").unwrap();
    assert_eq!(runtime.inspect(|e| e.context_switches()) - switches, 3);

    let lines_a: Vec<String> = drain_prints(&a).into_iter().map(|(_, t)| t).collect();
    let lines_b: Vec<String> = drain_prints(&b).into_iter().map(|(_, t)| t).collect();
    assert_eq!(lines_a, vec!["one", "three"]);
    assert_eq!(lines_b, vec!["two"]);
}

#[test]
fn test_audio_ticks_counted_per_instance() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let a = running_instance(&runtime, dir.path());
    let b = running_instance(&runtime, dir.path());

    let inputs = vec![generate_silence(TEST_BUFFER_SIZE); 2];
    let mut outputs = vec![generate_silence(TEST_BUFFER_SIZE); 2];
    process(&a, &inputs, &mut outputs, TEST_BUFFER_SIZE);
    process(&a, &inputs, &mut outputs, TEST_SUB_BLOCK);
    process(&b, &inputs, &mut outputs, TEST_BUFFER_SIZE);

    assert_eq!(ticks(&a), 9);
    assert_eq!(ticks(&b), 8);
}

#[test]
fn test_dropping_one_instance_leaves_the_other_running() {
    let runtime = test_runtime();
    let dir = patch_dir();
    let a = running_instance(&runtime, dir.path());
    let b = running_instance(&runtime, dir.path());
    b.bind("still-here").unwrap();

    drop(a);
    assert_eq!(runtime.inspect(|e| e.instance_count()), 1);

    assert!(b.send_bang("still-here").is_ok());
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, TEST_BUFFER_SIZE);
    let inputs = vec![input.clone(), input];
    let mut outputs = vec![generate_silence(TEST_BUFFER_SIZE); 2];
    assert_eq!(process(&b, &inputs, &mut outputs, TEST_BUFFER_SIZE), 8);
    assert!(peak(&outputs[0]) > 0.5);
}
