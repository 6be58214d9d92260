use crate::heap::Heap;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Separator printed before the atom tail of an improper list.
pub const DOT: char = '\u{2219}';

/// Pending printer work.
enum Step {
    /// A whole value.
    Expr(Value),
    /// The rest of a list whose opening paren is already written.
    Tail(Value),
}

/// Print a value to a string, without a trailing newline.
/// Car nesting goes on an explicit stack and cdr chains are walked in
/// place, so deep structures print without deep native recursion.
pub fn print_val(val: Value, heap: &Heap, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Expr(val)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Expr(Value::Nil) => out.push_str("NIL"),
            Step::Expr(Value::Atom(id)) => out.push_str(symbols.name(id)),
            Step::Expr(Value::Pair(id)) => {
                out.push('(');
                stack.push(Step::Tail(heap.cdr(id)));
                stack.push(Step::Expr(heap.car(id)));
            }
            Step::Tail(Value::Nil) => out.push(')'),
            Step::Tail(Value::Pair(id)) => {
                out.push(' ');
                stack.push(Step::Tail(heap.cdr(id)));
                stack.push(Step::Expr(heap.car(id)));
            }
            Step::Tail(Value::Atom(id)) => {
                out.push(DOT);
                out.push_str(symbols.name(id));
                out.push(')');
            }
        }
    }
    out
}
