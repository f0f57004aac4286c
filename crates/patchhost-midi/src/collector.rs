//! Collects engine MIDI output for the host's output buffer.

use patchhost_core::{MidiEvent, MidiReceiver};

use crate::event::HostMidiEvent;
use crate::translate::MidiTranslator;

/// [`MidiReceiver`] that converts drained engine events to host events.
///
/// Events the host cannot represent (port beyond the translator's range,
/// out-of-range data) are counted and skipped.
#[derive(Debug, Default)]
pub struct MidiCollector {
    translator: MidiTranslator,
    frame_offset: usize,
    events: Vec<HostMidiEvent>,
    rejected: usize,
}

impl MidiCollector {
    pub fn new(translator: MidiTranslator) -> Self {
        Self {
            translator,
            ..Self::default()
        }
    }

    /// Frame offset stamped on subsequently collected events.
    pub fn set_frame_offset(&mut self, frame_offset: usize) {
        self.frame_offset = frame_offset;
    }

    pub fn events(&self) -> &[HostMidiEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<HostMidiEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.rejected = 0;
    }
}

impl MidiReceiver for MidiCollector {
    fn receive_midi(&mut self, event: MidiEvent) {
        match self.translator.to_host(event, self.frame_offset) {
            Ok(host) => self.events.push(host),
            Err(_) => self.rejected += 1,
        }
    }
}
