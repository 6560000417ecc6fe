//! Handler for the `mima check` subcommand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::diagnostics::{warnings, Diagnostic, DiagnosticBag, Note, Severity, Span};
use crate::parser::ast::{Block, Statement, StatementKind};
use crate::parser::{parse_with_includes, IncludeResolver};

use super::{collect_sources, load_config, report_diagnostic};

pub(crate) fn run_check(paths: &[PathBuf], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_sources(paths)?;

    let mut total_errors = 0;
    let mut total_warnings = 0;
    for file in &files {
        let source = std::fs::read_to_string(file)
            .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
        let config = load_config(None, file)?;
        let mut resolver = config.include_resolver();

        let bag = check_source(&source, file, &mut resolver);
        for diagnostic in bag.diagnostics() {
            report_diagnostic(diagnostic, file, &source, json);
        }
        total_errors += bag.error_count();
        total_warnings += bag
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
    }

    if total_errors > 0 {
        eprintln!(
            "\nChecked {} file(s), found {} error(s), {} warning(s)",
            files.len(),
            total_errors,
            total_warnings
        );
        return Err(format!("{total_errors} error(s)").into());
    }
    if !json {
        if total_warnings > 0 {
            println!(
                "Checked {} file(s), no errors ({} warning(s))",
                files.len(),
                total_warnings
            );
        } else {
            println!("Checked {} file(s), no errors found", files.len());
        }
    }
    Ok(())
}

/// Parse one file and lint the result
pub(super) fn check_source(
    source: &str,
    path: &Path,
    resolver: &mut dyn IncludeResolver,
) -> DiagnosticBag {
    let mut bag = DiagnosticBag::new();
    match parse_with_includes(source, path, resolver) {
        Ok(program) => {
            if !calls_halt(&program.body) {
                let span = program
                    .body
                    .span
                    .clone()
                    .unwrap_or_else(|| Span::file(path));
                bag.push(
                    Diagnostic::warning(warnings::MISSING_HALT)
                        .message("program never calls HALT()")
                        .span(span)
                        .build(),
                );
            }
            check_duplicates(&program.body, &mut bag);
            check_non_calls(&program.body, &mut bag);
        }
        Err(err) => bag.push(err.to_diagnostic()),
    }
    bag
}

/// Whether any statement, at any depth, is a `HALT()` call
fn calls_halt(block: &Block) -> bool {
    block.statements.iter().any(|statement| match &statement.kind {
        StatementKind::Call { opcode, .. } => opcode == "HALT",
        StatementKind::Scope { block } => calls_halt(block),
        StatementKind::Branch {
            then_branch,
            else_branch,
            ..
        } => calls_halt(then_branch) || else_branch.as_deref().is_some_and(calls_halt),
        _ => false,
    })
}

/// Every statement of `block` and its nested blocks, in source order
fn walk(block: &Block, visit: &mut dyn FnMut(&Statement)) {
    for statement in &block.statements {
        visit(statement);
        match &statement.kind {
            StatementKind::Scope { block } => walk(block, visit),
            StatementKind::Branch {
                then_branch,
                else_branch,
                ..
            } => {
                walk(then_branch, visit);
                if let Some(block) = else_branch {
                    walk(block, visit);
                }
            }
            _ => {}
        }
    }
}

/// Warn about labels and definitions declared more than once, across all
/// blocks of the program
fn check_duplicates(body: &Block, bag: &mut DiagnosticBag) {
    let mut labels: HashMap<String, Span> = HashMap::new();
    let mut references: HashMap<String, Span> = HashMap::new();
    walk(body, &mut |statement| {
        let (seen, name, what) = match &statement.kind {
            StatementKind::JumpLabel { name } => (&mut labels, name, "jump definitions"),
            StatementKind::Definition { name, .. } | StatementKind::Constant { name, .. } => {
                (&mut references, name, "definitions")
            }
            _ => return,
        };
        match seen.get(name.as_str()) {
            Some(first) => bag.push(
                Diagnostic::warning(warnings::DUPLICATE_DEFINITION)
                    .message(format!("multiple {what}: \"{name}\""))
                    .span(statement.span.clone())
                    .note(Note {
                        message: format!("`{name}` is first declared here"),
                        span: Some(first.clone()),
                    })
                    .build(),
            ),
            None => {
                seen.insert(name.clone(), statement.span.clone());
            }
        }
    });
}

/// Warn about bare expressions, whose value only lands in the program result
fn check_non_calls(body: &Block, bag: &mut DiagnosticBag) {
    walk(body, &mut |statement| {
        if matches!(statement.kind, StatementKind::Expression { .. }) {
            bag.push(
                Diagnostic::warning(warnings::NOT_A_CALL)
                    .message("not an instruction call")
                    .span(statement.span.clone())
                    .build(),
            );
        }
    });
}
