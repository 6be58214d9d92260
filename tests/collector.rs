use minilisp::stream::{SharedOutput, StrSource};
use minilisp::{Config, GcStrategy, LispError, Machine};

const PROGRAMS: &[&str] = &[
    "(QUOTE (A (B C) D))",
    "((LAMBDA (X) (CONS X X)) (QUOTE Z))",
    "((LAMBDA (X Y) (CONS Y (CONS X (CONS (QUOTE (K L)) NIL)))) (QUOTE A) (QUOTE (B C)))",
    "((LAMBDA (P) (EQ (CAR P) (CDR P))) ((LAMBDA (X) (CONS X X)) (CONS (QUOTE A) NIL)))",
    "((LAMBDA (P) (CONS (EQ (CAR P) (CAR (CDR P))) P)) ((LAMBDA (X) (CONS X (CONS X NIL))) (QUOTE (Q R))))",
    "(COND ((ATOM (QUOTE (A))) (QUOTE WRONG)) ((CDR (QUOTE (A B))) (CONS (QUOTE RIGHT) (QUOTE ON))))",
    REVERSE,
    APPEND,
];

/// Reverse with an accumulator, via self-application.
const REVERSE: &str = "((LAMBDA (REV) (REV REV (QUOTE (A B C D E F G H)) NIL)) \
     (QUOTE (LAMBDA (SELF X ACC) \
       (COND ((EQ X NIL) ACC) \
             ((QUOTE T) (SELF SELF (CDR X) (CONS (CAR X) ACC)))))))";

const APPEND: &str = "((LAMBDA (APPEND) (APPEND APPEND (QUOTE (A B (C D) E)) (QUOTE (F . G)))) \
     (QUOTE (LAMBDA (SELF X Y) \
       (COND ((EQ X NIL) Y) \
             ((QUOTE T) (CONS (CAR X) (SELF SELF (CDR X) Y)))))))";

fn machine(gc: GcStrategy, heap_capacity: usize) -> Machine {
    let config = Config {
        gc,
        heap_capacity,
        ..Config::default()
    };
    Machine::new(config, Box::new(StrSource::new("")), Box::new(SharedOutput::new()))
}

fn eval_with(gc: GcStrategy, heap_capacity: usize, text: &str) -> (Result<Vec<String>, LispError>, usize) {
    let mut m = machine(gc, heap_capacity);
    let result = m.eval_str(text);
    (result, m.stats().high_water)
}

#[test]
fn collection_never_changes_printed_results() {
    for program in PROGRAMS {
        let (plain, _) = eval_with(GcStrategy::Disabled, 1 << 16, program);
        let plain = plain.unwrap();
        for gc in [GcStrategy::Copying, GcStrategy::MarkCompact] {
            let (collected, _) = eval_with(gc, 1 << 16, program);
            assert_eq!(collected.unwrap(), plain, "{} changed output of {}", gc, program);
        }
    }
}

#[test]
fn known_results() {
    let mut m = machine(GcStrategy::Copying, 1 << 16);
    assert_eq!(m.eval_str(REVERSE).unwrap(), vec!["(H G F E D C B A)"]);
    // The reader has no dot syntax, so (F . G) is a three element list.
    assert_eq!(m.eval_str(APPEND).unwrap(), vec!["(A B (C D) E F . G)"]);
    assert_eq!(m.eval_str(PROGRAMS[4]).unwrap(), vec!["(T (Q R) (Q R))"]);
    assert_eq!(m.eval_str(PROGRAMS[3]).unwrap(), vec!["NIL"]);
}

#[test]
fn collection_lowers_the_high_water_mark() {
    let (_, off) = eval_with(GcStrategy::Disabled, 1 << 16, REVERSE);
    let (_, copying) = eval_with(GcStrategy::Copying, 1 << 16, REVERSE);
    let (_, compact) = eval_with(GcStrategy::MarkCompact, 1 << 16, REVERSE);
    assert!(copying < off, "copying {} vs off {}", copying, off);
    assert!(compact <= copying, "mark-compact {} vs copying {}", compact, copying);

    // A heap exactly as large as the copying run needed is enough for it
    // but not for an uncollected run.
    let (ok, _) = eval_with(GcStrategy::Copying, copying, REVERSE);
    assert_eq!(ok.unwrap(), vec!["(H G F E D C B A)"]);
    let (exhausted, _) = eval_with(GcStrategy::Disabled, copying, REVERSE);
    assert_eq!(exhausted, Err(LispError::HeapExhausted));
}

#[test]
fn heap_is_empty_between_top_level_expressions() {
    let mut m = machine(GcStrategy::Copying, 1 << 16);
    m.eval_str(APPEND).unwrap();
    assert_eq!(m.heap.top(), 0);
    let stats = m.stats();
    assert!(stats.collections > 0);
    assert!(stats.high_water > 0);
}

#[test]
fn builtin_atoms_survive_collection() {
    let mut m = machine(GcStrategy::MarkCompact, 1 << 16);
    m.eval_str(REVERSE).unwrap();
    let eq = m.symbols.lookup("EQ");
    m.eval_str(APPEND).unwrap();
    assert_eq!(m.symbols.lookup("EQ"), eq);
    assert_eq!(
        m.eval_str("(CONS (QUOTE EQ) (QUOTE LAMBDA))").unwrap(),
        vec!["(EQ\u{2219}LAMBDA)"]
    );
}
