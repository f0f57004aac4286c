//! Message arguments: floats and interned-style symbols.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// Immutable symbol name.
///
/// Cloning is a reference-count bump, so a symbol received once can be copied
/// into many messages without reallocating the text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both symbols share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A single engine message argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Float(f32),
    Symbol(Symbol),
}

impl Atom {
    #[inline]
    pub fn float(value: f32) -> Self {
        Atom::Float(value)
    }

    pub fn symbol(name: &str) -> Self {
        Atom::Symbol(Symbol::new(name))
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(value) => Some(*value),
            Atom::Symbol(_) => None,
        }
    }

    #[inline]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Atom::Symbol(symbol) => Some(symbol),
            Atom::Float(_) => None,
        }
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, Atom::Float(_))
    }
}

impl From<f32> for Atom {
    fn from(value: f32) -> Self {
        Atom::Float(value)
    }
}

impl From<&str> for Atom {
    fn from(name: &str) -> Self {
        Atom::symbol(name)
    }
}

impl From<Symbol> for Atom {
    fn from(symbol: Symbol) -> Self {
        Atom::Symbol(symbol)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(value) => write!(f, "{}", value),
            Atom::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

/// Argument list; up to four atoms live inline.
pub type AtomVec = SmallVec<[Atom; 4]>;
