use crate::error::LispResult;
use crate::heap::Heap;
use crate::value::Value;

/// Look up an atom in an environment (association list of `(key . value)`).
/// Earlier bindings shadow later ones. Returns None when unbound.
pub fn assoc(key: Value, env: Value, heap: &Heap) -> Option<Value> {
    let mut current = env;
    while let Value::Pair(id) = current {
        if let Value::Pair(bid) = heap.car(id) {
            if heap.car(bid) == key {
                return Some(heap.cdr(bid));
            }
        }
        current = heap.cdr(id);
    }
    None
}

/// Bind `keys` to `values` positionally in front of `env`.
/// Extra values are ignored; keys without a value stay unbound.
pub fn pairlis(keys: Value, values: Value, env: Value, heap: &mut Heap) -> LispResult<Value> {
    let mut bindings = Vec::new();
    let (mut k, mut v) = (keys, values);
    while let (Value::Pair(kid), Value::Pair(vid)) = (k, v) {
        bindings.push((heap.car(kid), heap.car(vid)));
        k = heap.cdr(kid);
        v = heap.cdr(vid);
    }

    let mut result = env;
    for &(key, val) in bindings.iter().rev() {
        let binding = heap.cons(key, val)?;
        result = heap.cons(binding, result)?;
    }
    Ok(result)
}
