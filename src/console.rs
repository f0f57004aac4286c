//! Bounded console history fed from the print queue.

use std::collections::VecDeque;

use patchhost_core::{PrintEntry, PrintReceiver, Severity};

/// One retained console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub severity: Severity,
    pub text: String,
}

/// The last `capacity` print lines plus running per-severity counts.
#[derive(Debug)]
pub struct ConsoleHistory {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
    counts: [u64; Severity::ALL.len()],
}

impl ConsoleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
            counts: [0; Severity::ALL.len()],
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    /// Retained lines at `severity` or more severe.
    pub fn filtered(&self, severity: Severity) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter().filter(move |l| l.severity <= severity)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines seen at `severity` since the last clear, evicted ones included.
    #[inline]
    pub fn count(&self, severity: Severity) -> u64 {
        self.counts[severity.index()]
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.counts = [0; Severity::ALL.len()];
    }
}

impl PrintReceiver for ConsoleHistory {
    fn receive_print(&mut self, entry: &PrintEntry, severity: Severity) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(ConsoleLine {
            severity,
            text: entry.text.clone(),
        });
        self.counts[severity.index()] += 1;
    }
}
