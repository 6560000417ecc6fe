//! Errors raised while tokenizing and parsing

use crate::diagnostics::{Diagnostic, Span};
use thiserror::Error;

/// Which stage rejected the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Lex,
    Syntax,
}

/// A positioned failure shared by the tokenizer and the parser
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {line}, column {column})", line = .span.start_line, column = .span.start_col)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn lex(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Lex,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn syntax(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Syntax,
            code,
            message: message.into(),
            span,
        }
    }

    /// 1-indexed line of the offending input
    pub fn line(&self) -> usize {
        self.span.start_line
    }

    /// 1-indexed column of the offending input
    pub fn column(&self) -> usize {
        self.span.start_col
    }

    /// Absolute byte offset of the offending input
    pub fn position(&self) -> usize {
        self.span.start
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code)
            .message(self.message.clone())
            .span(self.span.clone())
            .build()
    }
}
