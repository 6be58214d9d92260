//! A minimal LISP machine.
//!
//! Values are `Nil`, interned atoms, or pairs in a bounded cell heap. The
//! evaluator implements QUOTE, COND, LAMBDA and the primitives EQ, CONS,
//! ATOM, CAR, CDR, READ and PRINT over association-list environments, and
//! compacts the heap at the end of every compound evaluation.

pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod gc;
pub mod heap;
pub mod primitives;
pub mod printer;
pub mod reader;
pub mod stream;
pub mod symbol;
pub mod value;

pub use config::{Config, GcStrategy};
pub use error::{LispError, LispResult};
pub use eval::{Machine, MachineStats};
pub use value::{AtomId, PairId, Value};
