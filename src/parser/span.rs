//! Source files and span construction

use crate::diagnostics::Span;
use std::path::{Path, PathBuf};

/// Program text together with the byte offset of every line start
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    content: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            path: path.into(),
            content,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Span covering the byte range `start..end`
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_col) = self.line_col(start);
        let (end_line, end_col) = self.line_col(end);
        Span::new(
            self.path.clone(),
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        )
    }

    /// Empty span at `offset`; used for end-of-input positions
    pub fn point(&self, offset: usize) -> Span {
        self.span(offset, offset)
    }

    /// Byte offset to 1-indexed line and column (columns count characters)
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let col = self
            .content
            .get(line_start..offset)
            .map_or(offset - line_start, |text| text.chars().count())
            + 1;
        (line + 1, col)
    }

    /// Text of a 1-indexed line without its terminator
    pub fn get_line(&self, line: usize) -> Option<&str> {
        if line == 0 || line > self.line_starts.len() {
            return None;
        }

        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.content.len());

        self.content
            .get(start..end)
            .map(|text| text.trim_end_matches('\r'))
    }
}

#[cfg(test)]
#[path = "span_tests.rs"]
mod tests;
