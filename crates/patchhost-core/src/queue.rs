//! Bounded SPSC event queues between the engine callback context and the
//! message pump.
//!
//! Producers never block: a full queue drops the event and `push` reports it.
//! Consumers never block: `drain` pops at most what was queued when it started,
//! so a producer that keeps pushing cannot pin the pump.

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

use crate::config::BridgeConfig;
use crate::message::Message;
use crate::midi::MidiEvent;
use crate::print::PrintEntry;

/// Producer half. Lives in the engine callback context.
pub struct QueueProducer<T> {
    producer: HeapProd<T>,
}

impl<T> QueueProducer<T> {
    /// Returns false if the queue was full and the item was dropped.
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        self.producer.try_push(item).is_ok()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }
}

/// Consumer half. Lives with the message pump.
pub struct QueueConsumer<T> {
    consumer: HeapCons<T>,
    capacity: usize,
}

impl<T> QueueConsumer<T> {
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.consumer.try_pop()
    }

    /// Pop up to the number of entries pending at call time, in FIFO order.
    pub fn drain(&mut self, mut f: impl FnMut(T)) -> usize {
        let pending = self.consumer.occupied_len();
        let mut count = 0;
        while count < pending {
            match self.consumer.try_pop() {
                Some(item) => {
                    f(item);
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Drain all pending entries into a vector.
    pub fn drain_all(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.consumer.occupied_len());
        self.drain(|item| items.push(item));
        items
    }

    /// Discard everything pending. Returns the number discarded.
    pub fn clear(&mut self) -> usize {
        self.drain(drop)
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Create a bounded SPSC queue.
///
/// # Panics
///
/// Panics if `capacity` is zero. `BridgeConfig::validate` rejects that earlier.
pub fn queue<T>(capacity: usize) -> (QueueProducer<T>, QueueConsumer<T>) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (
        QueueProducer { producer },
        QueueConsumer { consumer, capacity },
    )
}

/// Producer halves of the three event queues.
pub struct EventProducers {
    pub messages: QueueProducer<Message>,
    pub midi: QueueProducer<MidiEvent>,
    pub prints: QueueProducer<PrintEntry>,
}

/// Consumer halves of the three event queues.
pub struct EventConsumers {
    pub messages: QueueConsumer<Message>,
    pub midi: QueueConsumer<MidiEvent>,
    pub prints: QueueConsumer<PrintEntry>,
}

/// Create the message, MIDI and print queues sized from `config`.
pub fn event_queues(config: &BridgeConfig) -> (EventProducers, EventConsumers) {
    let (messages_tx, messages_rx) = queue(config.message_capacity);
    let (midi_tx, midi_rx) = queue(config.midi_capacity);
    let (prints_tx, prints_rx) = queue(config.print_capacity);
    (
        EventProducers {
            messages: messages_tx,
            midi: midi_tx,
            prints: prints_tx,
        },
        EventConsumers {
            messages: messages_rx,
            midi: midi_rx,
            prints: prints_rx,
        },
    )
}
