//! Frame collector.
//!
//! `eval` records `heap.top()` before it allocates anything for a compound
//! form, and hands that mark plus the form's result to [`collect`] on the way
//! out. Everything allocated in `[mark, top)` that the result cannot reach is
//! garbage; the survivors are packed down against `mark` and the allocation
//! pointer is pulled back to just above them.
//!
//! Cells below the mark are never touched. A pair only references cells
//! allocated before it, so nothing below the mark can point into the frame,
//! and every value a caller still holds stays valid. Atoms live in the
//! symbol table, not the heap, so they keep their identity across collections.

use crate::config::GcStrategy;
use crate::error::{LispError, LispResult};
use crate::heap::{ConsCell, Heap};
use crate::value::{PairId, Value};

/// Outcome of one frame collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GcStats {
    pub strategy: GcStrategy,
    /// Heap top when collection started.
    pub before: usize,
    /// Heap top after the survivors were compacted.
    pub after: usize,
}

impl GcStats {
    pub fn reclaimed(&self) -> usize {
        self.before - self.after
    }
}

/// Compact the frame starting at `mark`, keeping only what `result` reaches.
/// Returns the relocated result.
pub fn collect(
    heap: &mut Heap,
    result: Value,
    mark: usize,
    strategy: GcStrategy,
) -> LispResult<(Value, GcStats)> {
    let before = heap.top();
    let value = match strategy {
        GcStrategy::Disabled => result,
        _ if !in_frame(result, mark) => {
            heap.truncate(mark);
            result
        }
        GcStrategy::Copying => copy_frame(heap, result, mark)?,
        GcStrategy::MarkCompact => mark_compact_frame(heap, result, mark),
    };
    let stats = GcStats {
        strategy,
        before,
        after: heap.top(),
    };
    log::trace!(
        "gc[{}] mark={} before={} after={} reclaimed={}",
        strategy,
        mark,
        stats.before,
        stats.after,
        stats.reclaimed()
    );
    Ok((value, stats))
}

/// Whether `val` is a pair allocated at or above `mark`. Anything else
/// keeps nothing in the frame alive.
fn in_frame(val: Value, mark: usize) -> bool {
    matches!(val, Value::Pair(id) if id.index() >= mark)
}

// ========================================================================
// Copying
// ========================================================================

enum Task {
    /// Queue the fields of a frame cell, then its rebuild.
    Visit(PairId),
    /// Allocate the copy of a cell whose fields are already forwarded.
    Build(PairId),
}

/// Copy state for one frame. Copies are appended above `base`, and every
/// reference they hold is already rebased by `offset` so the copied block
/// is correct once it has been slid down to `mark`.
struct Copier {
    mark: usize,
    base: usize,
    /// forward[i] is the relocated handle of frame cell `mark + i`.
    forward: Vec<Option<Value>>,
}

impl Copier {
    fn offset(&self) -> usize {
        self.base - self.mark
    }

    fn in_frame(&self, id: PairId) -> bool {
        let i = id.index();
        i >= self.mark && i < self.base
    }

    fn forwarded(&self, id: PairId) -> Option<Value> {
        self.forward[id.index() - self.mark]
    }

    /// The relocated handle for `val`. Values outside the frame are unchanged.
    fn resolve(&self, val: Value) -> Value {
        match val {
            Value::Pair(id) if self.in_frame(id) => self.forwarded(id).unwrap_or(val),
            other => other,
        }
    }

    fn visit(&self, val: Value, tasks: &mut Vec<Task>) {
        if let Value::Pair(id) = val {
            if self.in_frame(id) && self.forwarded(id).is_none() {
                tasks.push(Task::Visit(id));
            }
        }
    }

    /// Copy everything `val` reaches inside the frame. A cell is built only
    /// once both of its fields have been copied, so copies keep referencing
    /// lower cells only. The work list replaces native recursion.
    fn copy(&mut self, heap: &mut Heap, val: Value) -> LispResult<Value> {
        let mut tasks = Vec::new();
        self.visit(val, &mut tasks);
        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(id) => {
                    if self.forwarded(id).is_some() {
                        continue;
                    }
                    tasks.push(Task::Build(id));
                    self.visit(heap.cdr(id), &mut tasks);
                    self.visit(heap.car(id), &mut tasks);
                }
                Task::Build(id) => {
                    if self.forwarded(id).is_some() {
                        continue;
                    }
                    let car = self.resolve(heap.car(id));
                    let cdr = self.resolve(heap.cdr(id));
                    let fresh = heap.alloc(car, cdr)?;
                    let moved = Value::Pair(PairId((fresh.index() - self.offset()) as u32));
                    self.forward[id.index() - self.mark] = Some(moved);
                }
            }
        }
        Ok(self.resolve(val))
    }
}

fn copy_frame(heap: &mut Heap, result: Value, mark: usize) -> LispResult<Value> {
    let base = heap.top();
    let mut copier = Copier {
        mark,
        base,
        forward: vec![None; base - mark],
    };
    let moved = copier.copy(heap, result).map_err(|e| {
        if e == LispError::HeapExhausted {
            log::debug!("copying collector ran out of headroom at mark {}", mark);
        }
        e
    })?;

    let live = heap.top() - base;
    heap.slide_down(base, mark, live);
    heap.truncate(mark + live);
    Ok(moved)
}

// ========================================================================
// Mark-compact
// ========================================================================

fn mark_compact_frame(heap: &mut Heap, result: Value, mark: usize) -> Value {
    let top = heap.top();
    heap.clear_marks(mark);

    let mut worklist = Vec::new();
    heap.mark_value(result, mark, &mut worklist);
    heap.process_worklist(mark, &mut worklist);

    // rank[i] = number of marked frame cells before cell mark + i
    let mut rank = Vec::with_capacity(top - mark);
    let mut scratch: Vec<ConsCell> = Vec::with_capacity(heap.marked_count(mark));
    for i in mark..top {
        rank.push(scratch.len());
        let cell = heap.cell(i);
        if cell.mark {
            scratch.push(cell);
        }
    }

    let relocate = |v: Value| match v {
        Value::Pair(id) if id.index() >= mark => {
            Value::Pair(PairId((mark + rank[id.index() - mark]) as u32))
        }
        other => other,
    };

    for (i, cell) in scratch.iter().enumerate() {
        heap.set_cell(
            mark + i,
            ConsCell {
                car: relocate(cell.car),
                cdr: relocate(cell.cdr),
                mark: false,
            },
        );
    }
    heap.truncate(mark + scratch.len());
    relocate(result)
}
