//! Typed receivers for drained events.
//!
//! Each trait has a single entry point (`receive`, `receive_midi`,
//! `receive_print`) whose default body dispatches to the typed hooks, so an
//! implementor can either override individual hooks or take the whole event.

use crate::atom::{Atom, Symbol};
use crate::message::{Message, MessageKind};
use crate::midi::MidiEvent;
use crate::print::{PrintEntry, Severity};

/// Receives generic messages from bound receivers.
pub trait MessageReceiver {
    fn receive(&mut self, message: &Message) {
        let dest = message.destination.as_str();
        match message.kind() {
            MessageKind::Bang => self.receive_bang(dest),
            MessageKind::Float(value) => self.receive_float(dest, value),
            MessageKind::Symbol(symbol) => self.receive_symbol(dest, symbol),
            MessageKind::List(atoms) => self.receive_list(dest, atoms),
            MessageKind::Anything { selector, args } => {
                self.receive_message(dest, selector, args)
            }
        }
    }

    fn receive_bang(&mut self, _dest: &str) {}

    fn receive_float(&mut self, _dest: &str, _value: f32) {}

    fn receive_symbol(&mut self, _dest: &str, _symbol: &Symbol) {}

    fn receive_list(&mut self, _dest: &str, _atoms: &[Atom]) {}

    fn receive_message(&mut self, _dest: &str, _selector: &Symbol, _args: &[Atom]) {}
}

/// Receives MIDI produced by the engine.
pub trait MidiReceiver {
    fn receive_midi(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn {
                channel,
                pitch,
                velocity,
            } => self.receive_note_on(channel, pitch, velocity),
            MidiEvent::ControlChange {
                channel,
                controller,
                value,
            } => self.receive_control_change(channel, controller, value),
            MidiEvent::ProgramChange { channel, program } => {
                self.receive_program_change(channel, program)
            }
            MidiEvent::PitchBend { channel, value } => self.receive_pitch_bend(channel, value),
            MidiEvent::Aftertouch { channel, value } => self.receive_aftertouch(channel, value),
            MidiEvent::PolyAftertouch {
                channel,
                pitch,
                value,
            } => self.receive_poly_aftertouch(channel, pitch, value),
            MidiEvent::Byte { port, byte } => self.receive_midi_byte(port, byte),
        }
    }

    fn receive_note_on(&mut self, _channel: i32, _pitch: i32, _velocity: i32) {}

    fn receive_control_change(&mut self, _channel: i32, _controller: i32, _value: i32) {}

    fn receive_program_change(&mut self, _channel: i32, _program: i32) {}

    fn receive_pitch_bend(&mut self, _channel: i32, _value: i32) {}

    fn receive_aftertouch(&mut self, _channel: i32, _value: i32) {}

    fn receive_poly_aftertouch(&mut self, _channel: i32, _pitch: i32, _value: i32) {}

    fn receive_midi_byte(&mut self, _port: i32, _byte: i32) {}
}

/// Receives classified diagnostic lines.
pub trait PrintReceiver {
    fn receive_print(&mut self, entry: &PrintEntry, severity: Severity);
}

impl MessageReceiver for Vec<Message> {
    fn receive(&mut self, message: &Message) {
        self.push(message.clone());
    }
}

impl MidiReceiver for Vec<MidiEvent> {
    fn receive_midi(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

impl PrintReceiver for Vec<(Severity, String)> {
    fn receive_print(&mut self, entry: &PrintEntry, severity: Severity) {
        self.push((severity, entry.text.clone()));
    }
}
