use std::io::{self, IsTerminal, Write};

use minilisp::error::{LispError, LispResult};
use minilisp::stream::{BufReadSource, LineSource, Uppercase};
use minilisp::{Config, Machine};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Line source backed by a rustyline editor with in-memory history.
struct EditorSource {
    editor: DefaultEditor,
}

impl LineSource for EditorSource {
    fn read_line(&mut self) -> LispResult<Option<String>> {
        loop {
            match self.editor.readline("* ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    return Ok(Some(line));
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(LispError::Io(e.to_string())),
            }
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--heap" | "--gc" | "--max-depth" if i + 1 >= args.len() => {
                eprintln!("{} requires a value", args[i]);
                std::process::exit(1);
            }
            "--heap" => {
                config.heap_capacity = parse_or_exit(&args[i], &args[i + 1]);
                i += 2;
            }
            "--max-depth" => {
                config.max_depth = parse_or_exit(&args[i], &args[i + 1]);
                i += 2;
            }
            "--gc" => {
                config.gc = parse_or_exit(&args[i], &args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: minilisp [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --heap <cells>       Pair cell capacity (default {})", Config::default().heap_capacity);
                println!("  --gc <strategy>      copying | mark-compact | off");
                println!("  --max-depth <n>      eval/apply nesting limit");
                println!("  --help, -h           Show this help message");
                println!();
                println!("Environment variables:");
                println!("  LISP_HEAP, LISP_SYMBOLS, LISP_MAX_DEPTH, LISP_GC   defaults for the options above");
                println!("  RUST_LOG=minilisp=trace                            log every collection");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'minilisp --help' for usage information.");
                std::process::exit(1);
            }
        }
    }

    let source: Box<dyn LineSource> = if io::stdin().is_terminal() {
        match DefaultEditor::new() {
            Ok(editor) => Box::new(Uppercase::new(EditorSource { editor })),
            Err(e) => {
                eprintln!("Failed to start line editor: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Box::new(Uppercase::new(BufReadSource::new(io::stdin().lock())))
    };

    log::info!("minilisp starting ({} gc, {} cells)", config.gc, config.heap_capacity);
    let mut machine = Machine::new(config, source, Box::new(io::stdout()));

    let outcome = machine.run(|e| {
        log::warn!("{}", e);
        let _ = io::stdout().flush();
        eprintln!("{}", e);
    });

    let stats = machine.stats();
    log::info!(
        "minilisp done: {} collections, {} cells reclaimed, heap high water {}",
        stats.collections,
        stats.reclaimed,
        stats.high_water
    );

    if let Err(e) = outcome {
        let _ = io::stdout().flush();
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn parse_or_exit<T: std::str::FromStr>(flag: &str, raw: &str) -> T
where
    T::Err: std::fmt::Display,
{
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: bad value {:?}: {}", flag, raw, e);
            std::process::exit(1);
        }
    }
}
