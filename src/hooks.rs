//! Engine callbacks that feed the event queues.
//!
//! The sink is owned by the engine and runs on whatever thread drives it,
//! always under the context lock, so it is the single producer of all three
//! queues. Full queues drop the event.
//!
//! Sources, selectors and symbol arguments are interned on first sight, so steady
//! traffic on bound names pushes without allocating. Print lines are the
//! exception: each assembled line becomes an owned `String`. Prints are
//! diagnostics and rare next to message traffic.

use std::collections::HashMap;

use patchhost_core::message::{SELECTOR_BANG, SELECTOR_FLOAT, SELECTOR_LIST, SELECTOR_SYMBOL};
use patchhost_core::{
    Atom, AtomVec, EngineCallbacks, EventProducers, Message, MidiEvent, PrintAssembler,
    PrintEntry, Symbol,
};

/// Interned names kept per sink. Past this, new names allocate per message.
const MAX_INTERNED: usize = 1024;

pub(crate) struct CallbackSink {
    producers: EventProducers,
    interned: HashMap<Box<str>, Symbol>,
    assembler: PrintAssembler,
    bang: Symbol,
    float: Symbol,
    symbol: Symbol,
    list: Symbol,
}

impl CallbackSink {
    pub(crate) fn new(producers: EventProducers) -> Self {
        Self {
            producers,
            interned: HashMap::new(),
            assembler: PrintAssembler::new(),
            bang: Symbol::new(SELECTOR_BANG),
            float: Symbol::new(SELECTOR_FLOAT),
            symbol: Symbol::new(SELECTOR_SYMBOL),
            list: Symbol::new(SELECTOR_LIST),
        }
    }

    fn intern(&mut self, name: &str) -> Symbol {
        if let Some(symbol) = self.interned.get(name) {
            return symbol.clone();
        }
        let symbol = Symbol::new(name);
        if self.interned.len() < MAX_INTERNED {
            self.interned.insert(name.into(), symbol.clone());
        }
        symbol
    }

    #[inline]
    fn push_message(&mut self, source: &str, selector: Symbol, args: AtomVec) {
        let destination = self.intern(source);
        let _ = self
            .producers
            .messages
            .push(Message::new(destination, selector, args));
    }

    #[inline]
    fn push_midi(&mut self, event: MidiEvent) {
        let _ = self.producers.midi.push(event);
    }
}

impl EngineCallbacks for CallbackSink {
    fn bang(&mut self, source: &str) {
        let selector = self.bang.clone();
        self.push_message(source, selector, AtomVec::new());
    }

    fn float(&mut self, source: &str, value: f32) {
        let selector = self.float.clone();
        let mut args = AtomVec::new();
        args.push(Atom::Float(value));
        self.push_message(source, selector, args);
    }

    fn symbol(&mut self, source: &str, symbol: &str) {
        let selector = self.symbol.clone();
        let mut args = AtomVec::new();
        args.push(Atom::Symbol(self.intern(symbol)));
        self.push_message(source, selector, args);
    }

    fn list(&mut self, source: &str, atoms: &[Atom]) {
        let selector = self.list.clone();
        self.push_message(source, selector, atoms.iter().cloned().collect());
    }

    fn message(&mut self, source: &str, selector: &str, atoms: &[Atom]) {
        let selector = self.intern(selector);
        self.push_message(source, selector, atoms.iter().cloned().collect());
    }

    fn note_on(&mut self, channel: i32, pitch: i32, velocity: i32) {
        self.push_midi(MidiEvent::NoteOn {
            channel,
            pitch,
            velocity,
        });
    }

    fn control_change(&mut self, channel: i32, controller: i32, value: i32) {
        self.push_midi(MidiEvent::ControlChange {
            channel,
            controller,
            value,
        });
    }

    fn program_change(&mut self, channel: i32, program: i32) {
        self.push_midi(MidiEvent::ProgramChange { channel, program });
    }

    fn pitch_bend(&mut self, channel: i32, value: i32) {
        self.push_midi(MidiEvent::PitchBend { channel, value });
    }

    fn aftertouch(&mut self, channel: i32, value: i32) {
        self.push_midi(MidiEvent::Aftertouch { channel, value });
    }

    fn poly_aftertouch(&mut self, channel: i32, pitch: i32, value: i32) {
        self.push_midi(MidiEvent::PolyAftertouch {
            channel,
            pitch,
            value,
        });
    }

    fn midi_byte(&mut self, port: i32, byte: i32) {
        self.push_midi(MidiEvent::Byte { port, byte });
    }

    fn print(&mut self, text: &str) {
        let prints = &mut self.producers.prints;
        self.assembler.push(text, |line| {
            let _ = prints.push(PrintEntry::new(line));
        });
    }
}
