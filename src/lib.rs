//! Mima
//!
//! A simulator for the Mima, a minimal accumulator machine used in teaching,
//! and its small assembly language with constants, variables, nested scopes
//! and file inclusion.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod interpreter;
pub mod parser;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::diagnostics::{Diagnostic, Severity, Span};
    pub use crate::interpreter::{
        DebugController, Environment, Interpreter, InterpreterConfig, Memory, Pause, RunState,
        RuntimeError, Value,
    };
    pub use crate::parser::ast::*;
    pub use crate::parser::{parse_source, parse_with_includes, ParseError};
}
