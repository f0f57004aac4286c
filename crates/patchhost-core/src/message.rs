//! Engine-originated messages and their selector classification.

use crate::atom::{Atom, AtomVec, Symbol};

/// One message produced by an engine callback.
///
/// `destination` is the bound receiver name the engine delivered to,
/// `selector` is the message head (`bang`, `float`, `symbol`, `list` or any
/// other name), `args` are the remaining atoms.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub destination: Symbol,
    pub selector: Symbol,
    pub args: AtomVec,
}

/// Borrowed view of a message, classified by selector.
#[derive(Debug, PartialEq)]
pub enum MessageKind<'a> {
    Bang,
    Float(f32),
    Symbol(&'a Symbol),
    List(&'a [Atom]),
    /// Any selector not covered above, or a typed selector with mismatched arguments.
    Anything {
        selector: &'a Symbol,
        args: &'a [Atom],
    },
}

pub const SELECTOR_BANG: &str = "bang";
pub const SELECTOR_FLOAT: &str = "float";
pub const SELECTOR_SYMBOL: &str = "symbol";
pub const SELECTOR_LIST: &str = "list";

impl Message {
    pub fn new(destination: Symbol, selector: Symbol, args: AtomVec) -> Self {
        Self {
            destination,
            selector,
            args,
        }
    }

    pub fn bang(destination: &str) -> Self {
        Self::new(
            Symbol::new(destination),
            Symbol::new(SELECTOR_BANG),
            AtomVec::new(),
        )
    }

    pub fn float(destination: &str, value: f32) -> Self {
        let mut args = AtomVec::new();
        args.push(Atom::Float(value));
        Self::new(Symbol::new(destination), Symbol::new(SELECTOR_FLOAT), args)
    }

    pub fn symbol(destination: &str, symbol: &str) -> Self {
        let mut args = AtomVec::new();
        args.push(Atom::symbol(symbol));
        Self::new(Symbol::new(destination), Symbol::new(SELECTOR_SYMBOL), args)
    }

    pub fn list(destination: &str, atoms: &[Atom]) -> Self {
        Self::new(
            Symbol::new(destination),
            Symbol::new(SELECTOR_LIST),
            atoms.iter().cloned().collect(),
        )
    }

    pub fn anything(destination: &str, selector: &str, atoms: &[Atom]) -> Self {
        Self::new(
            Symbol::new(destination),
            Symbol::new(selector),
            atoms.iter().cloned().collect(),
        )
    }

    /// Classify by selector.
    ///
    /// `float` and `symbol` need a matching first atom; otherwise the message
    /// falls back to `Anything` so nothing is silently reinterpreted.
    pub fn kind(&self) -> MessageKind<'_> {
        match self.selector.as_str() {
            SELECTOR_BANG => MessageKind::Bang,
            SELECTOR_FLOAT => match self.args.first() {
                Some(Atom::Float(value)) => MessageKind::Float(*value),
                _ => self.anything_kind(),
            },
            SELECTOR_SYMBOL => match self.args.first() {
                Some(Atom::Symbol(symbol)) => MessageKind::Symbol(symbol),
                _ => self.anything_kind(),
            },
            SELECTOR_LIST => MessageKind::List(&self.args),
            _ => self.anything_kind(),
        }
    }

    fn anything_kind(&self) -> MessageKind<'_> {
        MessageKind::Anything {
            selector: &self.selector,
            args: &self.args,
        }
    }
}
