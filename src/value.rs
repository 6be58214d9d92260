use std::fmt;

/// Unique identifier for an interned atom (index into the symbol table).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomId(pub u32);

/// Index into the cons-cell heap. This is the GC handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairId(pub u32);

/// The fundamental LISP value. Copy semantics — the pair data lives in the heap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Atom(AtomId),
    Pair(PairId),
}

impl Value {
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_pair(self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// Returns true if this value is an atom in the LISP sense: NIL or a symbol.
    pub fn is_atom(self) -> bool {
        !self.is_pair()
    }

    pub fn as_pair(self) -> Option<PairId> {
        match self {
            Value::Pair(id) => Some(id),
            _ => None,
        }
    }
}

impl PairId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Atom(id) => write!(f, "Atom({})", id.0),
            Value::Pair(id) => write!(f, "Pair({})", id.0),
        }
    }
}

impl fmt::Debug for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomId({})", self.0)
    }
}

impl fmt::Debug for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairId({})", self.0)
    }
}
