use minilisp::stream::{SharedOutput, StrSource, Uppercase};
use minilisp::{Config, LispError, Machine};

/// Run a whole REPL session over `input`. Returns what was written to the
/// output, the reported (non-fatal) errors, and the final outcome.
fn session(input: &str, config: Config) -> (String, Vec<LispError>, Result<(), LispError>) {
    let out = SharedOutput::new();
    let mut machine = Machine::new(
        config,
        Box::new(Uppercase::new(StrSource::new(input))),
        Box::new(out.clone()),
    );
    let mut errors = Vec::new();
    let outcome = machine.run(|e| errors.push(e.clone()));
    (out.contents(), errors, outcome)
}

fn run_ok(input: &str) -> String {
    let (out, errors, outcome) = session(input, Config::default());
    assert_eq!(outcome, Ok(()));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    out
}

#[test]
fn reference_scenarios() {
    let input = "(QUOTE (A B C))\n\
                 (COND ((EQ (QUOTE A) (QUOTE A)) (QUOTE YES)) ((QUOTE T) (QUOTE NO)))\n\
                 ((LAMBDA (X) (CONS X X)) (QUOTE Z))\n\
                 FOO";
    assert_eq!(run_ok(input), "(A B C)\nYES\n(Z\u{2219}Z)\nNIL\n\n");
}

#[test]
fn end_of_input_prints_trailing_newline() {
    assert_eq!(run_ok(""), "\n");
}

#[test]
fn several_expressions_per_line() {
    assert_eq!(run_ok("(QUOTE A) (QUOTE B)   NIL"), "A\nB\nNIL\n\n");
}

#[test]
fn lower_case_input_is_folded() {
    assert_eq!(run_ok("(quote (a b))\n(car (quote (x)))"), "(A B)\nX\n\n");
}

#[test]
fn print_and_read_use_the_session_streams() {
    assert_eq!(run_ok("(PRINT (QUOTE HI))"), "HINIL\n\n");
    assert_eq!(run_ok("(PRINT)"), "\nNIL\n\n");
    assert_eq!(
        run_ok("(CONS (READ) NIL)\n(FROM NEXT LINE)\n(QUOTE AFTER)"),
        "((FROM NEXT LINE))\nAFTER\n\n"
    );
}

#[test]
fn print_of_nil_differs_from_print_with_no_argument() {
    assert_eq!(run_ok("(PRINT NIL)"), "NILNIL\n\n");
    assert_eq!(run_ok("(PRINT)"), "\nNIL\n\n");
}

#[test]
fn read_at_end_of_input_shuts_down_cleanly() {
    let (out, errors, outcome) = session("(QUOTE FIRST)\n(CONS (READ) NIL)", Config::default());
    assert_eq!(outcome, Ok(()));
    assert!(errors.is_empty());
    assert_eq!(out, "FIRST\n\n");
}

#[test]
fn deeply_nested_data_reads_and_prints() {
    let depth = 30_000;
    let nested = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
    // Innermost () reads as NIL.
    let expected = format!("{}NIL{}\n\n", "(".repeat(depth - 1), ")".repeat(depth - 1));
    assert_eq!(run_ok(&format!("(QUOTE {})", nested)), expected);
}

#[test]
fn recursion_through_self_application() {
    let append = "((LAMBDA (APPEND) (APPEND APPEND (QUOTE (A B C)) (QUOTE (D E))))\n\
                  (QUOTE (LAMBDA (SELF X Y)\n\
                    (COND ((EQ X NIL) Y)\n\
                          ((QUOTE T) (CONS (CAR X) (SELF SELF (CDR X) Y)))))))";
    assert_eq!(run_ok(append), "(A B C D E)\n\n");
}

#[test]
fn reported_errors_skip_the_rest_of_the_line() {
    let (out, errors, outcome) = session(
        "(CAR (QUOTE A)) (QUOTE SKIPPED)\n(FOO)\n)\n(QUOTE NEXT)",
        Config::default(),
    );
    assert_eq!(outcome, Ok(()));
    assert_eq!(out, "NEXT\n\n");
    assert!(matches!(errors[0], LispError::TypeError(_)));
    assert_eq!(errors[1..], [LispError::NotCallable, LispError::UnexpectedClose]);
}

#[test]
fn unbalanced_input_is_fatal() {
    let (out, errors, outcome) = session("(QUOTE A)\n(A (B", Config::default());
    assert_eq!(out, "A\n");
    assert!(errors.is_empty());
    assert_eq!(outcome, Err(LispError::UnbalancedInput));
}

#[test]
fn heap_exhaustion_is_fatal() {
    let config = Config {
        heap_capacity: 8,
        ..Config::default()
    };
    let (_, _, outcome) = session("(QUOTE (A B C D E F G H I))", config);
    assert_eq!(outcome, Err(LispError::HeapExhausted));
}

#[test]
fn symbol_table_exhaustion_is_fatal() {
    let config = Config {
        symbol_capacity: 14,
        ..Config::default()
    };
    let (out, _, outcome) = session("(QUOTE A)\n(QUOTE (B C))", config);
    assert_eq!(out, "A\n");
    assert_eq!(outcome, Err(LispError::SymbolTableFull));
}

#[test]
fn depth_limit_is_reported_not_fatal() {
    let config = Config {
        max_depth: 100,
        ..Config::default()
    };
    let (out, errors, outcome) = session(
        "((LAMBDA (F) (F F)) (QUOTE (LAMBDA (F) (F F))))\n(QUOTE STILL-HERE)",
        config,
    );
    assert_eq!(outcome, Ok(()));
    assert_eq!(errors, vec![LispError::DepthExceeded(100)]);
    assert_eq!(out, "STILL-HERE\n\n");
}
