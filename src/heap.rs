use crate::error::{LispError, LispResult};
use crate::value::{PairId, Value};

/// A single cons cell on the heap.
#[derive(Clone, Copy, Debug)]
pub struct ConsCell {
    pub car: Value,
    pub cdr: Value,
    pub mark: bool,
}

/// The cons cell heap. All pairs are allocated here by bumping `cells`.
/// PairId is an index into `cells`; a cell only ever references cells
/// with a lower index, since pairs are built from existing values.
pub struct Heap {
    cells: Vec<ConsCell>,
    capacity: usize,
    /// Highest `cells.len()` seen since the last reset.
    high_water: usize,
}

/// Largest heap a `PairId` can address.
pub const MAX_CELLS: usize = u32::MAX as usize;

impl Heap {
    /// A heap of at most `capacity` cells, clamped to `MAX_CELLS`.
    pub fn new(capacity: usize) -> Self {
        if capacity > MAX_CELLS {
            log::warn!("heap capacity {} clamped to {}", capacity, MAX_CELLS);
        }
        let capacity = capacity.min(MAX_CELLS);
        Heap {
            cells: Vec::with_capacity(capacity.min(4096)),
            capacity,
            high_water: 0,
        }
    }

    /// Allocate a new cons cell. Returns a PairId.
    /// Returns Err(HeapExhausted) if capacity is exceeded.
    pub fn alloc(&mut self, car: Value, cdr: Value) -> LispResult<PairId> {
        if self.cells.len() >= self.capacity {
            return Err(LispError::HeapExhausted);
        }
        let id = PairId(self.cells.len() as u32);
        self.cells.push(ConsCell {
            car,
            cdr,
            mark: false,
        });
        self.high_water = self.high_water.max(self.cells.len());
        Ok(id)
    }

    /// Allocate and wrap as a Value.
    pub fn cons(&mut self, car: Value, cdr: Value) -> LispResult<Value> {
        self.alloc(car, cdr).map(Value::Pair)
    }

    #[inline]
    pub fn car(&self, id: PairId) -> Value {
        self.cells[id.index()].car
    }

    #[inline]
    pub fn cdr(&self, id: PairId) -> Value {
        self.cells[id.index()].cdr
    }

    /// Car of a pair, or Nil of Nil.
    pub fn car_val(&self, val: Value) -> LispResult<Value> {
        match val {
            Value::Nil => Ok(Value::Nil),
            Value::Pair(id) => Ok(self.car(id)),
            Value::Atom(_) => Err(LispError::TypeError("CAR of an atom".into())),
        }
    }

    /// Cdr of a pair, or Nil of Nil.
    pub fn cdr_val(&self, val: Value) -> LispResult<Value> {
        match val {
            Value::Nil => Ok(Value::Nil),
            Value::Pair(id) => Ok(self.cdr(id)),
            Value::Atom(_) => Err(LispError::TypeError("CDR of an atom".into())),
        }
    }

    /// Build a proper list from a slice of values.
    pub fn list(&mut self, values: &[Value]) -> LispResult<Value> {
        let mut result = Value::Nil;
        for &val in values.iter().rev() {
            result = self.cons(val, result)?;
        }
        Ok(result)
    }

    /// Collect a proper list into a Vec. Returns None if not a proper list.
    #[cfg(test)]
    pub fn list_to_vec(&self, val: Value) -> Option<Vec<Value>> {
        let mut result = Vec::new();
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(result),
                Value::Pair(id) => {
                    result.push(self.car(id));
                    current = self.cdr(id);
                }
                Value::Atom(_) => return None,
            }
        }
    }

    /// The allocation pointer: the index the next cell will get.
    #[inline]
    pub fn top(&self) -> usize {
        self.cells.len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Drop every cell. Values held by callers become dangling.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.high_water = 0;
    }

    /// Drop every cell at or above `top`.
    pub(crate) fn truncate(&mut self, top: usize) {
        self.cells.truncate(top);
    }

    /// Move `len` cells starting at `from` down to `to` (`to <= from`).
    pub(crate) fn slide_down(&mut self, from: usize, to: usize, len: usize) {
        debug_assert!(to <= from);
        self.cells.copy_within(from..from + len, to);
    }

    #[inline]
    pub(crate) fn cell(&self, index: usize) -> ConsCell {
        self.cells[index]
    }

    #[inline]
    pub(crate) fn set_cell(&mut self, index: usize, cell: ConsCell) {
        self.cells[index] = cell;
    }

    // === GC methods ===

    /// Check if a cell is marked.
    #[cfg(test)]
    pub fn is_marked(&self, id: PairId) -> bool {
        self.cells[id.index()].mark
    }

    /// Clear the mark bits of every cell at or above `floor`.
    pub fn clear_marks(&mut self, floor: usize) {
        for cell in &mut self.cells[floor..] {
            cell.mark = false;
        }
    }

    /// Mark a value if it is a pair at or above `floor`, and queue it.
    pub fn mark_value(&mut self, val: Value, floor: usize, worklist: &mut Vec<PairId>) {
        if let Value::Pair(id) = val {
            let i = id.index();
            if i >= floor && !self.cells[i].mark {
                self.cells[i].mark = true;
                worklist.push(id);
            }
        }
    }

    /// Process the mark worklist: for each marked pair, mark its car and cdr.
    pub fn process_worklist(&mut self, floor: usize, worklist: &mut Vec<PairId>) {
        while let Some(id) = worklist.pop() {
            let cell = self.cells[id.index()];
            self.mark_value(cell.car, floor, worklist);
            self.mark_value(cell.cdr, floor, worklist);
        }
    }

    /// Number of marked cells at or above `floor` (call after marking).
    pub fn marked_count(&self, floor: usize) -> usize {
        self.cells[floor..].iter().filter(|c| c.mark).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AtomId;

    #[test]
    fn alloc_until_exhausted() {
        let mut heap = Heap::new(2);
        let a = Value::Atom(AtomId(20));
        let p = heap.alloc(a, Value::Nil).unwrap();
        heap.alloc(Value::Pair(p), Value::Nil).unwrap();
        assert_eq!(heap.alloc(a, a), Err(LispError::HeapExhausted));
        assert_eq!(heap.top(), 2);
        assert_eq!(heap.capacity(), 2);
    }

    #[test]
    fn car_cdr_of_nil_is_nil() {
        let heap = Heap::new(4);
        assert_eq!(heap.car_val(Value::Nil), Ok(Value::Nil));
        assert_eq!(heap.cdr_val(Value::Nil), Ok(Value::Nil));
        assert!(matches!(
            heap.car_val(Value::Atom(AtomId(3))),
            Err(LispError::TypeError(_))
        ));
    }

    #[test]
    fn list_round_trips_through_vec() {
        let mut heap = Heap::new(16);
        let items = [Value::Atom(AtomId(11)), Value::Nil, Value::Atom(AtomId(12))];
        let list = heap.list(&items).unwrap();
        assert_eq!(heap.list_to_vec(list).unwrap(), items.to_vec());

        let dotted = heap.cons(items[0], items[2]).unwrap();
        assert_eq!(heap.list_to_vec(dotted), None);
    }

    #[test]
    fn marking_respects_floor() {
        let mut heap = Heap::new(8);
        let old = heap.cons(Value::Nil, Value::Nil).unwrap();
        let young = heap.cons(old, Value::Nil).unwrap();
        let mut work = Vec::new();
        heap.mark_value(young, 1, &mut work);
        heap.process_worklist(1, &mut work);
        assert!(heap.is_marked(young.as_pair().unwrap()));
        assert!(!heap.is_marked(old.as_pair().unwrap()));
        assert_eq!(heap.marked_count(1), 1);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn capacity_is_clamped_to_addressable_cells() {
        assert_eq!(Heap::new(usize::MAX).capacity(), MAX_CELLS);
        assert_eq!(Heap::new(1 << 40).capacity(), MAX_CELLS);
        assert_eq!(Heap::new(100).capacity(), 100);
    }
}
