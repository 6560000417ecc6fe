//! Handler for the `mima run` subcommand.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, Severity};
use crate::interpreter::{Event, Interpreter, RecordingSink, RunStats, Value};
use crate::parser::parse_with_includes;

use super::{load_config, report_diagnostic};

pub(crate) struct RunOptions {
    pub(crate) config: Option<PathBuf>,
    pub(crate) budget: Option<usize>,
    pub(crate) dump_memory: bool,
    pub(crate) json: bool,
    pub(crate) quiet: bool,
}

/// Machine-readable outcome of `mima run --json`
#[derive(Debug, Serialize)]
pub(crate) struct RunReport {
    pub(crate) ok: bool,
    pub(crate) result: Option<Value>,
    pub(crate) error: Option<Diagnostic>,
    pub(crate) accumulator: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) memory: Option<BTreeMap<i64, Value>>,
    pub(crate) stats: RunStats,
    pub(crate) events: Vec<Event>,
}

pub(crate) fn run_program(
    file: &Path,
    options: &RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read file {}: {}", file.display(), e))?;

    let mut config = load_config(options.config.as_deref(), file)?;
    if let Some(budget) = options.budget {
        config.interpreter.stack_budget = budget;
        config.validate()?;
    }

    let mut resolver = config.include_resolver();
    let program = match parse_with_includes(&source, file, &mut resolver) {
        Ok(program) => program,
        Err(err) => {
            report_diagnostic(&err.to_diagnostic(), file, &source, options.json);
            return Err(format!("could not parse {}", file.display()).into());
        }
    };

    let mut env = config.environment()?;
    let mut memory = config.memory();
    let events = Rc::new(RefCell::new(RecordingSink::new()));
    let mut interpreter =
        Interpreter::new(config.interpreter_config()).with_sink(Rc::clone(&events));
    let result = interpreter.run(&program, &mut env, &mut memory);
    let events = std::mem::take(&mut events.borrow_mut().events);

    if options.json {
        let report = RunReport {
            ok: result.is_ok(),
            result: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(|err| err.to_diagnostic()),
            accumulator: interpreter.machine().accumulator(),
            memory: options.dump_memory.then(|| memory.snapshot()),
            stats: interpreter.stats().clone(),
            events,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return result.map(|_| ()).map_err(|_| "program failed".into());
    }

    for event in &events {
        match event.severity {
            Severity::Log => eprintln!("{}", event.message),
            Severity::Warning if !options.quiet => eprintln!("warning: {}", event.message),
            _ => {}
        }
    }

    match result {
        Ok(value) => {
            if !options.quiet {
                println!("{value}");
            }
            if options.dump_memory {
                let rendered = memory.render();
                if !rendered.is_empty() {
                    println!("{rendered}");
                }
            }
            Ok(())
        }
        Err(err) => {
            report_diagnostic(&err.to_diagnostic(), file, &source, false);
            Err("program failed".into())
        }
    }
}
