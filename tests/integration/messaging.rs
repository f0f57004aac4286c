//! Host to engine sends, receiver bindings and the drain pump.

use patchhost::prelude::*;
use patchhost::{EngineError, MidiCollector, MidiTranslator};

use crate::helpers::*;

#[test]
fn test_bound_sends_dispatch_by_selector() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.bind("ui").unwrap();

    instance.send_bang("ui").unwrap();
    instance.send_float("ui", 0.5).unwrap();
    instance.send_symbol("ui", "open").unwrap();
    instance
        .send_list("ui", &[Atom::float(1.0), Atom::symbol("two")])
        .unwrap();
    instance
        .send_message("ui", "set", &[Atom::float(3.0)])
        .unwrap();

    let mut recorder = Recorder::default();
    assert_eq!(instance.drain_messages(&mut recorder), 5);
    assert_eq!(
        recorder.received,
        vec![
            Received::Bang("ui".into()),
            Received::Float("ui".into(), 0.5),
            Received::Symbol("ui".into(), "open".into()),
            Received::List("ui".into(), vec![Atom::float(1.0), Atom::symbol("two")]),
            Received::Message("ui".into(), "set".into(), vec![Atom::float(3.0)]),
        ]
    );
}

#[test]
fn test_send_to_unbound_destination_fails() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    assert!(matches!(
        instance.send_bang("nobody"),
        Err(Error::Engine(EngineError::NoReceiver(_)))
    ));
}

#[test]
fn test_bind_twice_keeps_one_receiver() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    let id = instance.context().instance_id();

    assert!(instance.bind("level").unwrap());
    assert!(!instance.bind("level").unwrap());
    assert_eq!(runtime.inspect(|e| e.receiver_count(id)), 1);

    // One send, one queued message
    instance.send_float("level", 1.0).unwrap();
    let mut messages = Vec::<Message>::new();
    assert_eq!(instance.drain_messages(&mut messages), 1);
}

#[test]
fn test_unbind_never_bound_is_noop() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.bind("kept").unwrap();

    assert!(!instance.unbind("never").unwrap());
    assert!(instance.is_bound("kept"));
    instance.send_bang("kept").unwrap();
}

#[test]
fn test_unbind_stops_delivery() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.bind("gone").unwrap();
    assert!(instance.unbind("gone").unwrap());
    assert!(!instance.is_bound("gone"));
    assert!(instance.send_bang("gone").is_err());
}

#[test]
fn test_drain_is_fifo() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.bind("seq").unwrap();
    for i in 0..100 {
        instance.send_float("seq", i as f32).unwrap();
    }

    let mut messages = Vec::<Message>::new();
    instance.drain_messages(&mut messages);
    let values: Vec<f32> = messages
        .iter()
        .map(|m| m.args[0].as_float().unwrap())
        .collect();
    let expected: Vec<f32> = (0..100).map(|i| i as f32).collect();
    assert_eq!(values, expected);
}

#[test]
fn test_message_overflow_drops_newest() {
    let runtime = test_runtime();
    let instance = PatchInstance::builder(&runtime)
        .config(BridgeConfig {
            message_capacity: 4,
            ..Default::default()
        })
        .build()
        .unwrap();
    instance.bind("x").unwrap();
    for i in 0..10 {
        instance.send_float("x", i as f32).unwrap();
    }

    let mut messages = Vec::<Message>::new();
    assert_eq!(instance.drain_messages(&mut messages), 4);
    assert_eq!(messages.last(), Some(&Message::float("x", 3.0)));
}

#[test]
fn test_parameters_follow_engine_and_host() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    let mut params = ParameterSet::new();
    params
        .add(
            ParameterSpec::new("Cutoff")
                .receive("cutoff")
                .send("cutoff")
                .range(0.0, 100.0),
        )
        .unwrap();
    assert!(params
        .add(ParameterSpec::new("Also cutoff").receive("cutoff"))
        .is_err());

    assert_eq!(instance.bind_parameters(&params).unwrap(), 1);

    // Host side: pushing the value loops back through the bound receiver
    params.set_normalized(0, 0.25).unwrap();
    instance.send_parameter(&params, 0).unwrap();
    params.set_normalized(0, 0.0).unwrap();

    instance.drain_messages(&mut &params);
    assert!((params.normalized(0).unwrap() - 0.25).abs() < tolerances::PARAM_EPSILON);
}

#[test]
fn test_console_classifies_prints() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.post("fatal: out of memory").unwrap();
    instance.post("error: bad thing").unwrap();
    instance.post("verbose(4): detail").unwrap();
    instance.post("just chatting").unwrap();

    let mut console = ConsoleHistory::new(instance.config().console_history);
    assert_eq!(instance.drain_prints(&mut console), 4);
    assert_eq!(console.count(Severity::Fatal), 1);
    assert_eq!(console.count(Severity::Error), 1);
    assert_eq!(console.count(Severity::Log), 1);
    assert_eq!(console.count(Severity::Normal), 1);
}

#[test]
fn test_midi_thru_reaches_collector() {
    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance
        .send_midi(&HostMidiEvent::note_on(0, 3, 64, 90))
        .unwrap();
    instance
        .send_midi(&HostMidiEvent::control_change(0, 3, 74, 12))
        .unwrap();

    let mut collector = MidiCollector::new(MidiTranslator::default());
    assert_eq!(instance.drain_midi(&mut collector), 2);
    assert_eq!(
        collector.take(),
        vec![
            HostMidiEvent::note_on(0, 3, 64, 90),
            HostMidiEvent::control_change(0, 3, 74, 12),
        ]
    );
}

#[test]
fn test_receiver_may_call_back_into_instance() {
    struct Echo<'a> {
        instance: &'a PatchInstance<SimEngine>,
        seen: usize,
    }

    impl MessageReceiver for Echo<'_> {
        fn receive_float(&mut self, _dest: &str, value: f32) {
            self.seen += 1;
            self.instance.post(&format!("got {}", value)).unwrap();
        }
    }

    let runtime = test_runtime();
    let instance = test_instance(&runtime);
    instance.bind("ping").unwrap();
    instance.send_float("ping", 1.0).unwrap();

    let mut echo = Echo {
        instance: &instance,
        seen: 0,
    };
    instance.drain_messages(&mut echo);
    assert_eq!(echo.seen, 1);
    assert_eq!(drain_prints(&instance), vec![(Severity::Normal, "got 1".to_string())]);
}
