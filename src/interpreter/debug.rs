//! Breakpoints and single stepping
//!
//! The interpreter asks the [`DebugController`] before every statement. When it
//! answers yes the run stops with a [`Pause`](super::Pause) that the host
//! resumes or aborts.

use std::path::{Path, PathBuf};

use crate::diagnostics::Span;

/// Stop before statements starting on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: usize,
    /// 1-indexed line
    pub line: usize,
    /// Restrict to one file; `None` matches the line in every file
    pub file: Option<PathBuf>,
    pub enabled: bool,
    pub hit_count: usize,
}

impl Breakpoint {
    fn matches(&self, span: &Span) -> bool {
        self.enabled
            && self.line == span.start_line
            && self.file.as_deref().map_or(true, |file| file == span.file.as_path())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugController {
    breakpoints: Vec<Breakpoint>,
    step: bool,
    next_id: usize,
}

impl DebugController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Break on `line` of any file; returns the breakpoint id
    pub fn add_breakpoint(&mut self, line: usize) -> usize {
        self.push(line, None)
    }

    pub fn add_breakpoint_in(&mut self, file: impl AsRef<Path>, line: usize) -> usize {
        self.push(line, Some(file.as_ref().to_path_buf()))
    }

    fn push(&mut self, line: usize, file: Option<PathBuf>) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.breakpoints.push(Breakpoint {
            id,
            line,
            file,
            enabled: true,
            hit_count: 0,
        });
        id
    }

    pub fn remove_breakpoint(&mut self, id: usize) -> bool {
        let before = self.breakpoints.len();
        self.breakpoints.retain(|breakpoint| breakpoint.id != id);
        self.breakpoints.len() != before
    }

    pub fn set_enabled(&mut self, id: usize, enabled: bool) -> bool {
        match self.breakpoints.iter_mut().find(|b| b.id == id) {
            Some(breakpoint) => {
                breakpoint.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Pause before every statement
    pub fn set_step(&mut self, step: bool) {
        self.step = step;
    }

    pub fn is_stepping(&self) -> bool {
        self.step
    }

    /// Whether to stop before the statement at `span`
    pub(crate) fn should_pause(&mut self, span: &Span) -> bool {
        let mut hit = false;
        for breakpoint in self.breakpoints.iter_mut().filter(|b| b.matches(span)) {
            breakpoint.hit_count += 1;
            hit = true;
        }
        hit || self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_at(file: &str, line: usize) -> Span {
        Span::new(PathBuf::from(file), 0, 1, line, 1, line, 2)
    }

    #[test]
    fn test_breakpoint_matches_line_and_counts_hits() {
        let mut debugger = DebugController::new();
        let id = debugger.add_breakpoint(3);

        assert!(!debugger.should_pause(&span_at("a.mima", 2)));
        assert!(debugger.should_pause(&span_at("a.mima", 3)));
        assert!(debugger.should_pause(&span_at("b.mima", 3)));
        assert_eq!(debugger.breakpoints()[0].hit_count, 2);

        assert!(debugger.set_enabled(id, false));
        assert!(!debugger.should_pause(&span_at("a.mima", 3)));
    }

    #[test]
    fn test_file_breakpoint_ignores_other_files() {
        let mut debugger = DebugController::new();
        debugger.add_breakpoint_in("lib/defs.mima", 1);
        assert!(debugger.should_pause(&span_at("lib/defs.mima", 1)));
        assert!(!debugger.should_pause(&span_at("main.mima", 1)));
    }

    #[test]
    fn test_step_pauses_everywhere() {
        let mut debugger = DebugController::new();
        debugger.set_step(true);
        assert!(debugger.should_pause(&span_at("a.mima", 9)));

        let id = debugger.add_breakpoint(1);
        assert!(debugger.remove_breakpoint(id));
        assert!(!debugger.remove_breakpoint(id));
    }
}
