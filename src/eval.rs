use std::io::Write;

use crate::config::{Config, GcStrategy};
use crate::env::{assoc, pairlis};
use crate::error::{LispError, LispResult};
use crate::gc;
use crate::heap::Heap;
use crate::primitives::{self, PrimContext};
use crate::printer;
use crate::reader::Reader;
use crate::stream::{CharStream, LineSource, StrSource};
use crate::symbol::{sym, SymbolTable};
use crate::value::Value;

/// Running totals kept by the machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MachineStats {
    /// Frame collections performed.
    pub collections: u64,
    /// Cells reclaimed across all collections.
    pub reclaimed: u64,
    /// Highest heap top seen in any top-level cycle.
    pub high_water: usize,
}

/// The LISP machine.
/// All interpreter state lives here: heap, atoms, input and output.
pub struct Machine {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub config: Config,
    input: CharStream,
    output: Box<dyn Write>,
    /// Current eval/apply nesting.
    depth: usize,
    stats: MachineStats,
}

impl Machine {
    pub fn new(config: Config, source: Box<dyn LineSource>, output: Box<dyn Write>) -> Self {
        log::debug!(
            "machine: heap={} cells, symbols={}, max_depth={}, gc={}",
            config.heap_capacity,
            config.symbol_capacity,
            config.max_depth,
            config.gc
        );
        Machine {
            heap: Heap::new(config.heap_capacity),
            symbols: SymbolTable::new(config.symbol_capacity),
            config,
            input: CharStream::new(source),
            output,
            depth: 0,
            stats: MachineStats::default(),
        }
    }

    pub fn stats(&self) -> MachineStats {
        let mut stats = self.stats;
        stats.high_water = stats.high_water.max(self.heap.high_water());
        stats
    }

    // ========================================================================
    // Read / print
    // ========================================================================

    /// Read the next expression from the machine's input.
    pub fn read(&mut self) -> LispResult<Value> {
        Reader::new(&mut self.input, &mut self.heap, &mut self.symbols).read_expression()
    }

    /// Write a value to the machine's output, without a newline.
    pub fn print(&mut self, val: Value) -> LispResult<()> {
        let text = printer::print_val(val, &self.heap, &self.symbols);
        self.output.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn to_text(&self, val: Value) -> String {
        printer::print_val(val, &self.heap, &self.symbols)
    }

    // ========================================================================
    // Core evaluation
    // ========================================================================

    /// Evaluate `expr` in the association-list environment `env`.
    ///
    /// Compound forms run in their own heap frame: the heap top is recorded
    /// before anything is allocated, and on the way out the frame is
    /// compacted down to the cells the result still reaches.
    pub fn eval(&mut self, expr: Value, env: Value) -> LispResult<Value> {
        let id = match expr {
            Value::Nil => return Ok(Value::Nil),
            Value::Atom(_) => return Ok(assoc(expr, env, &self.heap).unwrap_or(Value::Nil)),
            Value::Pair(id) => id,
        };

        let op = self.heap.car(id);
        let rest = self.heap.cdr(id);
        if op == Value::Atom(sym::QUOTE) {
            return self.heap.car_val(rest);
        }

        self.enter()?;
        let mark = self.heap.top();
        let result = if op == Value::Atom(sym::COND) {
            self.evcon(rest, env)
        } else {
            self.evlis(rest, env)
                .and_then(|args| self.apply(op, args, env))
        };
        self.depth -= 1;

        self.collect(result?, mark)
    }

    /// Apply a function to already-evaluated arguments.
    pub fn apply(&mut self, f: Value, args: Value, env: Value) -> LispResult<Value> {
        self.enter()?;
        let result = self.apply_inner(f, args, env);
        self.depth -= 1;
        result
    }

    fn apply_inner(&mut self, f: Value, args: Value, env: Value) -> LispResult<Value> {
        match f {
            Value::Nil => Err(LispError::NotCallable),
            Value::Pair(id) if self.heap.car(id) == Value::Atom(sym::LAMBDA) => {
                // (LAMBDA params body)
                let tail = self.heap.cdr(id);
                let params = self.heap.car_val(tail)?;
                let body = self.heap.car_val(self.heap.cdr_val(tail)?)?;
                let new_env = pairlis(params, args, env, &mut self.heap)?;
                self.eval(body, new_env)
            }
            Value::Atom(name) => {
                let mut cx = PrimContext {
                    heap: &mut self.heap,
                    symbols: &mut self.symbols,
                    input: &mut self.input,
                    output: &mut *self.output,
                };
                if let Some(val) = primitives::call_primitive(name, args, &mut cx)? {
                    return Ok(val);
                }
                let g = self.eval(f, env)?;
                self.apply(g, args, env)
            }
            Value::Pair(_) => {
                let g = self.eval(f, env)?;
                self.apply(g, args, env)
            }
        }
    }

    /// Evaluate each argument left to right and list the results.
    fn evlis(&mut self, forms: Value, env: Value) -> LispResult<Value> {
        let mut values = Vec::new();
        let mut current = forms;
        while let Value::Pair(id) = current {
            let form = self.heap.car(id);
            values.push(self.eval(form, env)?);
            current = self.heap.cdr(id);
        }
        self.heap.list(&values)
    }

    /// Try each `(test consequent)` clause in order. No true test gives NIL.
    fn evcon(&mut self, clauses: Value, env: Value) -> LispResult<Value> {
        let mut current = clauses;
        while let Value::Pair(id) = current {
            let clause = self.heap.car(id);
            let test = self.heap.car_val(clause)?;
            if !self.eval(test, env)?.is_nil() {
                let consequent = self.heap.car_val(self.heap.cdr_val(clause)?)?;
                return self.eval(consequent, env);
            }
            current = self.heap.cdr(id);
        }
        Ok(Value::Nil)
    }

    fn enter(&mut self) -> LispResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(LispError::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn collect(&mut self, result: Value, mark: usize) -> LispResult<Value> {
        let (moved, stats) = gc::collect(&mut self.heap, result, mark, self.config.gc)?;
        if self.config.gc != GcStrategy::Disabled {
            self.stats.collections += 1;
            self.stats.reclaimed += stats.reclaimed() as u64;
        }
        Ok(moved)
    }

    // ========================================================================
    // Top level
    // ========================================================================

    /// One read-eval-print cycle against an empty environment.
    /// The heap is emptied first, so only the returned value is live.
    pub fn rep(&mut self) -> LispResult<Value> {
        self.reset_heap();
        let expr = self.read()?;
        let result = self.eval(expr, Value::Nil)?;
        self.print(result)?;
        writeln!(self.output)?;
        self.output.flush()?;
        Ok(result)
    }

    /// Run cycles until input runs out. Non-fatal errors go to `on_error`
    /// and the rest of the offending line is dropped. End of input writes
    /// a final newline and returns Ok; fatal errors are returned.
    pub fn run(&mut self, mut on_error: impl FnMut(&LispError)) -> LispResult<()> {
        loop {
            match self.rep() {
                Ok(_) => {}
                Err(LispError::EndOfInput) => {
                    writeln!(self.output)?;
                    self.output.flush()?;
                    return Ok(());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    on_error(&e);
                    self.recover();
                }
            }
        }
    }

    /// Abandon the current top-level expression after a reported error.
    pub fn recover(&mut self) {
        log::debug!("recovering at depth {}", self.depth);
        self.input.discard_line();
        self.depth = 0;
        self.reset_heap();
    }

    fn reset_heap(&mut self) {
        if self.heap.top() > 0 {
            log::debug!("heap reset: dropping {} cells", self.heap.top());
        }
        self.stats.high_water = self.stats.high_water.max(self.heap.high_water());
        self.heap.reset();
    }

    /// Read and evaluate every expression in `text`, returning each printed
    /// result. READ inside `text` consumes from `text` too. The machine's
    /// own input is left where it was.
    pub fn eval_str(&mut self, text: &str) -> LispResult<Vec<String>> {
        let source = CharStream::new(Box::new(StrSource::new(text)));
        let saved = std::mem::replace(&mut self.input, source);
        let results = self.eval_all();
        self.input = saved;
        results
    }

    fn eval_all(&mut self) -> LispResult<Vec<String>> {
        let mut printed = Vec::new();
        loop {
            self.reset_heap();
            let expr = match self.read() {
                Ok(expr) => expr,
                Err(LispError::EndOfInput) => return Ok(printed),
                Err(e) => return Err(e),
            };
            self.depth = 0;
            let result = self.eval(expr, Value::Nil)?;
            printed.push(self.to_text(result));
        }
    }
}
