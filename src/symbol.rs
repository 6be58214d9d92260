use std::collections::HashMap;

use crate::error::{LispError, LispResult};
use crate::value::AtomId;

/// Interned symbol table. Each unique spelling maps to a unique AtomId,
/// so `(EQ (QUOTE FOO) (QUOTE FOO))` reduces to comparing two ids.
/// Entries are never removed; the collector does not touch this table.
pub struct SymbolTable {
    name_to_id: HashMap<String, AtomId>,
    id_to_name: Vec<String>,
    capacity: usize,
}

/// Builtin atom IDs, pre-interned at startup.
/// These must match the order of `BUILTINS`.
pub mod sym {
    use crate::value::AtomId;

    pub const NIL: AtomId = AtomId(0);
    pub const T: AtomId = AtomId(1);
    pub const QUOTE: AtomId = AtomId(2);
    pub const COND: AtomId = AtomId(3);
    pub const READ: AtomId = AtomId(4);
    pub const PRINT: AtomId = AtomId(5);
    pub const ATOM: AtomId = AtomId(6);
    pub const CAR: AtomId = AtomId(7);
    pub const CDR: AtomId = AtomId(8);
    pub const CONS: AtomId = AtomId(9);
    pub const EQ: AtomId = AtomId(10);
    pub const LAMBDA: AtomId = AtomId(11);
}

/// Largest table an `AtomId` can address.
pub const MAX_ATOMS: usize = u32::MAX as usize;

const BUILTINS: [&str; 12] = [
    "NIL", "T", "QUOTE", "COND", "READ", "PRINT", "ATOM", "CAR", "CDR", "CONS", "EQ", "LAMBDA",
];

impl SymbolTable {
    /// Create a new symbol table with the builtin atoms pre-interned.
    pub fn new(capacity: usize) -> Self {
        let mut table = SymbolTable {
            name_to_id: HashMap::new(),
            id_to_name: Vec::new(),
            capacity: capacity.clamp(BUILTINS.len(), MAX_ATOMS),
        };
        for name in BUILTINS {
            table.insert(name);
        }
        table
    }

    /// Intern a name. Returns the existing ID if already interned,
    /// or creates a new one.
    pub fn intern(&mut self, name: &str) -> LispResult<AtomId> {
        if let Some(&id) = self.name_to_id.get(name) {
            return Ok(id);
        }
        if self.id_to_name.len() >= self.capacity {
            return Err(LispError::SymbolTableFull);
        }
        Ok(self.insert(name))
    }

    fn insert(&mut self, name: &str) -> AtomId {
        let id = AtomId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        id
    }

    /// Look up an atom's spelling by its ID.
    pub fn name(&self, id: AtomId) -> &str {
        &self.id_to_name[id.0 as usize]
    }

    /// Look up an atom ID by name, without interning.
    pub fn lookup(&self, name: &str) -> Option<AtomId> {
        self.name_to_id.get(name).copied()
    }
}
