use std::fmt;
use std::str::FromStr;

/// How the collector reclaims a finished evaluation frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcStrategy {
    /// Copy the result's structure above the frame, then slide it down.
    Copying,
    /// Mark from the result, rank survivors, rewrite and slide in place.
    MarkCompact,
    /// Never reclaim; the frame stays where it was allocated.
    Disabled,
}

impl FromStr for GcStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copying" | "copy" => Ok(GcStrategy::Copying),
            "mark-compact" | "mark" => Ok(GcStrategy::MarkCompact),
            "off" | "none" | "disabled" => Ok(GcStrategy::Disabled),
            other => Err(format!("unknown gc strategy '{}'", other)),
        }
    }
}

impl fmt::Display for GcStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcStrategy::Copying => write!(f, "copying"),
            GcStrategy::MarkCompact => write!(f, "mark-compact"),
            GcStrategy::Disabled => write!(f, "off"),
        }
    }
}

/// Machine sizing and collector settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of pair cells.
    pub heap_capacity: usize,
    /// Maximum number of interned atoms, builtins included.
    pub symbol_capacity: usize,
    /// Maximum eval/apply nesting before `DepthExceeded`.
    pub max_depth: usize,
    pub gc: GcStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            heap_capacity: 64 * 1024,
            symbol_capacity: 10_000,
            max_depth: 1_000,
            gc: GcStrategy::Copying,
        }
    }
}

impl Config {
    /// Defaults overridden by LISP_HEAP, LISP_SYMBOLS, LISP_MAX_DEPTH and LISP_GC.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Bad values are logged and skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = parse_var("LISP_HEAP", &lookup) {
            self.heap_capacity = n;
        }
        if let Some(n) = parse_var("LISP_SYMBOLS", &lookup) {
            self.symbol_capacity = n;
        }
        if let Some(n) = parse_var("LISP_MAX_DEPTH", &lookup) {
            self.max_depth = n;
        }
        if let Some(gc) = parse_var("LISP_GC", &lookup) {
            self.gc = gc;
        }
        self
    }
}

fn parse_var<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
