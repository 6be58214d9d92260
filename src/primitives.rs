use std::io::Write;

use crate::error::LispResult;
use crate::heap::Heap;
use crate::printer;
use crate::reader::Reader;
use crate::stream::CharStream;
use crate::symbol::{sym, SymbolTable};
use crate::value::{AtomId, Value};

/// Everything a primitive may touch besides its arguments.
pub struct PrimContext<'a> {
    pub heap: &'a mut Heap,
    pub symbols: &'a mut SymbolTable,
    pub input: &'a mut CharStream,
    pub output: &'a mut dyn Write,
}

/// Dispatch a primitive call by its atom.
/// `args` is the evaluated argument list; missing arguments read as NIL
/// and extra ones are ignored.
/// Returns Ok(None) when `name` is not one of the seven primitives.
pub fn call_primitive(name: AtomId, args: Value, cx: &mut PrimContext<'_>) -> LispResult<Option<Value>> {
    let a = cx.heap.car_val(args)?;
    let rest = cx.heap.cdr_val(args)?;
    let b = cx.heap.car_val(rest)?;

    let result = match name {
        sym::EQ => prim_eq(a, b),
        sym::CONS => cx.heap.cons(a, b)?,
        sym::ATOM => truth(a.is_atom()),
        sym::CAR => cx.heap.car_val(a)?,
        sym::CDR => cx.heap.cdr_val(a)?,
        sym::READ => Reader::new(cx.input, cx.heap, cx.symbols).read_expression()?,
        sym::PRINT => prim_print(args, a, cx)?,
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn truth(b: bool) -> Value {
    if b {
        Value::Atom(sym::T)
    } else {
        Value::Nil
    }
}

/// (EQ a b) — identity comparison.
/// Atoms compare by table entry, pairs by heap cell, NIL only to NIL.
fn prim_eq(a: Value, b: Value) -> Value {
    truth(a == b)
}

/// (PRINT x) writes x; (PRINT) writes a newline. Always NIL.
fn prim_print(args: Value, a: Value, cx: &mut PrimContext<'_>) -> LispResult<Value> {
    if args.is_nil() {
        writeln!(cx.output)?;
    } else {
        let text = printer::print_val(a, cx.heap, cx.symbols);
        write!(cx.output, "{}", text)?;
    }
    Ok(Value::Nil)
}
