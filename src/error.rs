use std::fmt;

/// Errors that can occur in the interpreter at the Rust level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LispError {
    /// Cell arena capacity exceeded.
    HeapExhausted,

    /// Symbol table capacity exceeded.
    SymbolTableFull,

    /// The line source has no more input. Not a failure: the REPL exits cleanly.
    EndOfInput,

    /// Input ended inside an unclosed list.
    UnbalancedInput,

    /// A `)` appeared where an expression had to begin.
    UnexpectedClose,

    /// Attempted to apply NIL.
    NotCallable,

    /// CAR/CDR of a non-NIL atom.
    TypeError(String),

    /// Nesting of eval/apply went past the configured limit.
    DepthExceeded(usize),

    /// I/O error from the line source or output sink.
    Io(String),
}

impl LispError {
    /// Fatal errors end the process; the others abandon one top-level expression.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LispError::HeapExhausted
                | LispError::SymbolTableFull
                | LispError::UnbalancedInput
                | LispError::Io(_)
        )
    }
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LispError::HeapExhausted => write!(f, "Fatal: heap exhausted"),
            LispError::SymbolTableFull => write!(f, "Fatal: symbol table full"),
            LispError::EndOfInput => write!(f, "end of input"),
            LispError::UnbalancedInput => write!(f, "Read error: input ended inside a list"),
            LispError::UnexpectedClose => write!(f, "Read error: unexpected ')'"),
            LispError::NotCallable => write!(f, "Error: NIL is not callable"),
            LispError::TypeError(msg) => write!(f, "Type error: {}", msg),
            LispError::DepthExceeded(limit) => {
                write!(f, "Error: nesting depth exceeded ({} frames)", limit)
            }
            LispError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for LispError {}

impl From<std::io::Error> for LispError {
    fn from(e: std::io::Error) -> Self {
        LispError::Io(e.to_string())
    }
}

pub type LispResult<T> = Result<T, LispError>;
