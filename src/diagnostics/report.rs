//! Rich terminal rendering of diagnostics through `miette`

use super::Diagnostic as MimaDiagnostic;
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

/// A diagnostic bound to the text it points into
#[derive(Debug, Error, Diagnostic, Clone)]
#[error("[{code}] {message}")]
pub struct SourceReport {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    code: String,
    message: String,
    label: String,
}

impl SourceReport {
    pub fn new(diagnostic: &MimaDiagnostic, source: impl Into<String>) -> Self {
        let source = source.into();
        let start = diagnostic.span.start.min(source.len());
        let len = diagnostic.span.len().min(source.len() - start);
        let help = diagnostic
            .notes
            .iter()
            .map(|note| note.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            src: NamedSource::new(diagnostic.span.file.display().to_string(), source),
            span: (start, len).into(),
            help: (!help.is_empty()).then_some(help),
            code: diagnostic.code.clone(),
            message: diagnostic.message.clone(),
            label: diagnostic.severity.label().to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Print a diagnostic with source context to stderr
pub fn emit(diagnostic: &MimaDiagnostic, source: &str) {
    let report = SourceReport::new(diagnostic, source);
    eprintln!("{:?}", Report::new(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{syntax, Note, Span};
    use std::path::PathBuf;

    #[test]
    fn test_report_clamps_span_to_source() {
        let diagnostic = MimaDiagnostic::error(syntax::UNEXPECTED_EOF)
            .message("unterminated block")
            .span(Span::new(PathBuf::from("main.mima"), 40, 45, 3, 1, 3, 6))
            .note(Note::new("add `}`"))
            .build();

        let report = SourceReport::new(&diagnostic, "{ define x;");
        assert_eq!(report.span.offset(), 11);
        assert_eq!(report.span.len(), 0);
        assert_eq!(report.code(), "E0006");
        assert_eq!(report.help.as_deref(), Some("add `}`"));
    }
}
