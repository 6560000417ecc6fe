//! Handler for the `mima tokens` subcommand.

use std::path::Path;

use serde::Serialize;

use crate::parser::{tokenize, Token};

use super::report_diagnostic;

#[derive(Debug, Serialize)]
pub(super) struct TokenRow {
    pub(super) index: usize,
    pub(super) line: usize,
    pub(super) column: usize,
    /// Byte offset
    pub(super) offset: usize,
    pub(super) char_offset: usize,
    pub(super) kind: String,
}

impl From<&Token> for TokenRow {
    fn from(token: &Token) -> Self {
        Self {
            index: token.index,
            line: token.span.start_line,
            column: token.span.start_col,
            offset: token.span.start,
            char_offset: token.position,
            kind: token.kind.to_string(),
        }
    }
}

pub(crate) fn run_tokens(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read file {}: {}", file.display(), e))?;

    let tokens = match tokenize(&source, file) {
        Ok(tokens) => tokens,
        Err(err) => {
            report_diagnostic(&err.to_diagnostic(), file, &source, json);
            return Err(format!("could not tokenize {}", file.display()).into());
        }
    };

    let rows: Vec<TokenRow> = tokens.iter().map(TokenRow::from).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!(
                "{:>4}:{:<4} {:>6} {:>6}  {}",
                row.line, row.column, row.offset, row.char_offset, row.kind
            );
        }
    }
    Ok(())
}
