//! Diagnostic text from the engine's print hook.

use std::fmt;

/// Console severity, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Fatal,
    Error,
    Normal,
    Log,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Fatal,
        Severity::Error,
        Severity::Normal,
        Severity::Log,
    ];

    /// Lightweight prefix scan; no parsing beyond the first word.
    pub fn classify(text: &str) -> Severity {
        let text = text.trim_start();
        if starts_with_ignore_case(text, "fatal") {
            Severity::Fatal
        } else if starts_with_ignore_case(text, "error") {
            Severity::Error
        } else if text.starts_with("verbose(") || starts_with_ignore_case(text, "log:") {
            Severity::Log
        } else {
            Severity::Normal
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Error => write!(f, "error"),
            Severity::Normal => write!(f, "normal"),
            Severity::Log => write!(f, "log"),
        }
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// One line of diagnostic text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrintEntry {
    pub text: String,
}

impl PrintEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        Severity::classify(&self.text)
    }
}

/// Longest line kept before a forced flush.
pub const MAX_LINE_LEN: usize = 1000;

/// Joins print fragments into whole lines.
///
/// The engine may call its print hook several times per logical line
/// (`"error: "`, `"foo"`, `"\n"`). Lines are emitted without the trailing
/// newline; empty lines are skipped.
#[derive(Debug)]
pub struct PrintAssembler {
    line: String,
}

impl PrintAssembler {
    pub fn new() -> Self {
        Self {
            line: String::with_capacity(MAX_LINE_LEN),
        }
    }

    pub fn push(&mut self, fragment: &str, mut emit: impl FnMut(&str)) {
        let mut rest = fragment;
        while let Some(pos) = rest.find('\n') {
            self.append(&rest[..pos], &mut emit);
            self.flush(&mut emit);
            rest = &rest[pos + 1..];
        }
        self.append(rest, &mut emit);
    }

    /// Emit whatever partial line is pending.
    pub fn flush(&mut self, mut emit: impl FnMut(&str)) {
        if !self.line.is_empty() {
            emit(&self.line);
            self.line.clear();
        }
    }

    #[inline]
    pub fn pending(&self) -> &str {
        &self.line
    }

    fn append(&mut self, mut text: &str, emit: &mut impl FnMut(&str)) {
        while !text.is_empty() {
            let room = MAX_LINE_LEN - self.line.len();
            if text.len() <= room {
                self.line.push_str(text);
                return;
            }
            let mut cut = room;
            while cut > 0 && !text.is_char_boundary(cut) {
                cut -= 1;
            }
            self.line.push_str(&text[..cut]);
            self.flush(&mut *emit);
            text = &text[cut..];
        }
    }
}

impl Default for PrintAssembler {
    fn default() -> Self {
        Self::new()
    }
}
