//! Diagnostic reporting for the Mima toolchain
//!
//! Parse and runtime failures are converted into [`Diagnostic`] values with a
//! stable error code and a source span, so hosts can render them for humans or
//! consume them as JSON.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod error_codes;
pub mod report;
pub use error_codes::*;

/// A source location span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Source file path
    pub file: PathBuf,

    /// Start byte offset (0-indexed)
    pub start: usize,

    /// End byte offset (0-indexed, exclusive)
    pub end: usize,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// Start column (1-indexed)
    pub start_col: usize,

    /// End line (1-indexed)
    pub end_line: usize,

    /// End column (1-indexed)
    pub end_col: usize,
}

impl Span {
    /// Create a new span
    pub fn new(
        file: PathBuf,
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            file,
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create an empty span at the start of a file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: path.into(),
            start: 0,
            end: 0,
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 1,
        }
    }

    /// Merge two spans into one that covers both
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            file: self.file.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line: self.start_line.min(other.start_line),
            start_col: if self.start_line <= other.start_line {
                self.start_col
            } else {
                other.start_col
            },
            end_line: self.end_line.max(other.end_line),
            end_col: if self.end_line >= other.end_line {
                self.end_col
            } else {
                other.end_col
            },
        }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no text (end of input, synthetic spans)
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Severity level for diagnostics and interpreter events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Log,
}

impl Severity {
    /// Lowercase label used in rendered output
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Log => "log",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An additional note attached to a diagnostic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Note {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}

/// A diagnostic produced while parsing or running a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable error code (e.g., "E0001")
    pub code: String,

    /// Severity level
    pub severity: Severity,

    /// Primary message
    pub message: String,

    /// Primary source span
    pub span: Span,

    /// Additional notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl Diagnostic {
    /// Start building an error diagnostic
    pub fn error(code: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Error)
    }

    /// Start building a warning diagnostic
    pub fn warning(code: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Warning)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Format as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format as a compiler-style message with the offending source line
    pub fn to_human_readable(&self, source: &str) -> String {
        let mut output = format!(
            "{}[{}]: {}\n  --> {}:{}:{}\n",
            self.severity,
            self.code,
            self.message,
            self.span.file.display(),
            self.span.start_line,
            self.span.start_col
        );

        let lines: Vec<&str> = source.lines().collect();
        if self.span.start_line > 0 && self.span.start_line <= lines.len() {
            let line = lines[self.span.start_line - 1];
            output.push_str(&format!(
                "   |\n{:>3} | {}\n   |",
                self.span.start_line, line
            ));

            let underline_start = self.span.start_col.saturating_sub(1);
            let underline_len = if self.span.end_line == self.span.start_line {
                self.span.end_col.saturating_sub(self.span.start_col).max(1)
            } else {
                line.len().saturating_sub(underline_start).max(1)
            };

            output.push_str(&format!(
                " {}{}\n",
                " ".repeat(underline_start),
                "^".repeat(underline_len)
            ));
        }

        for note in &self.notes {
            output.push_str(&format!("   = note: {}\n", note.message));
        }

        output
    }
}

/// Builder for constructing diagnostics
pub struct DiagnosticBuilder {
    code: String,
    severity: Severity,
    message: String,
    span: Option<Span>,
    notes: Vec<Note>,
}

impl DiagnosticBuilder {
    fn new(code: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            severity,
            message: String::new(),
            span: None,
            notes: Vec::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic {
            code: self.code,
            severity: self.severity,
            message: self.message,
            span: self.span.unwrap_or_else(|| Span::file("")),
            notes: self.notes,
        }
    }
}

/// Diagnostics collected across several files
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Format all diagnostics as a JSON array
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.diagnostics).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_json() {
        let diag = Diagnostic::error(syntax::UNEXPECTED_TOKEN)
            .message("expected `;`, found `}`")
            .span(Span::new(PathBuf::from("main.mima"), 10, 11, 1, 11, 1, 12))
            .build();

        let json = diag.to_json();
        assert!(json.contains("E0001"));
        assert!(json.contains("\"severity\":\"error\""));
    }

    #[test]
    fn test_span_merge() {
        let span1 = Span::new(PathBuf::from("main.mima"), 10, 20, 1, 10, 1, 20);
        let span2 = Span::new(PathBuf::from("main.mima"), 15, 30, 1, 15, 2, 5);

        let merged = span1.merge(&span2);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
        assert_eq!(merged.end_line, 2);
        assert_eq!(merged.len(), 20);
    }

    #[test]
    fn test_diagnostic_human_readable() {
        let diag = Diagnostic::error(runtime::UNRESOLVED_REFERENCE)
            .message("undefined reference `loop`")
            .span(Span::new(PathBuf::from("main.mima"), 4, 8, 1, 5, 1, 9))
            .note(Note::new("jump labels are visible in their block and nested blocks"))
            .build();

        let output = diag.to_human_readable("JMP(loop);");
        assert!(output.starts_with("error[E4001]"));
        assert!(output.contains("  1 | JMP(loop);"));
        assert!(output.contains("    ^^^^"));
        assert!(output.contains("= note: jump labels"));
    }

    #[test]
    fn test_diagnostic_bag_operations() {
        let mut bag = DiagnosticBag::new();
        assert!(bag.is_empty());

        bag.push(Diagnostic::error(syntax::UNEXPECTED_EOF).message("error").build());
        bag.push(Diagnostic::warning("W0001").message("warning").build());

        assert_eq!(bag.len(), 2);
        assert!(bag.has_errors());
        assert_eq!(bag.error_count(), 1);
        assert!(bag.to_json().starts_with('['));
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Log.to_string(), "log");
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
