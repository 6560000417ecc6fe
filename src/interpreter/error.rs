//! Runtime error types for the Mima interpreter.

use std::fmt;

use thiserror::Error;

use super::query::IllegalRequest;
use super::value::ValueType;
use crate::diagnostics::error_codes::runtime;
use crate::diagnostics::{Diagnostic, Span};

/// What went wrong while executing a program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    #[error("undefined reference `{0}`")]
    UnresolvedReference(String),

    #[error(transparent)]
    IllegalRequest(#[from] IllegalRequest),

    #[error("cannot reassign constant `{0}`")]
    ConstantReassignment(String),

    #[error("`{0}` is already defined in this scope")]
    AlreadyDefined(String),

    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: ValueType },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{instruction} expects {expected} argument(s), got {found}")]
    ArityMismatch {
        instruction: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown instruction `{0}`")]
    UnknownInstruction(String),

    #[error("illegal memory address {0}")]
    IllegalAddress(i64),

    #[error("constant {value} does not fit in {bits} bits")]
    ConstantOutOfRange { value: i64, bits: u32 },

    #[error("nowhere to return to: the return stack is empty")]
    EmptyReturnStack,

    #[error("scope is no longer alive")]
    StaleScope,

    #[error("`{0}` transfers control and cannot be used inside an expression")]
    ControlTransferInExpression(String),

    #[error("cannot define variable `{0}` in a constant scope")]
    ConstantScope(String),

    #[error("{0}")]
    Instruction(String),
}

impl RuntimeErrorKind {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeErrorKind::UnresolvedReference(_) => runtime::UNRESOLVED_REFERENCE,
            RuntimeErrorKind::IllegalRequest(_) => runtime::ILLEGAL_REQUEST,
            RuntimeErrorKind::ConstantReassignment(_) => runtime::CONSTANT_REASSIGNMENT,
            RuntimeErrorKind::AlreadyDefined(_) => runtime::ALREADY_DEFINED,
            RuntimeErrorKind::TypeMismatch { .. } => runtime::TYPE_MISMATCH,
            RuntimeErrorKind::DivisionByZero => runtime::DIVISION_BY_ZERO,
            RuntimeErrorKind::ArityMismatch { .. } => runtime::ARITY_MISMATCH,
            RuntimeErrorKind::UnknownInstruction(_) => runtime::UNKNOWN_INSTRUCTION,
            RuntimeErrorKind::IllegalAddress(_) => runtime::ILLEGAL_ADDRESS,
            RuntimeErrorKind::ConstantOutOfRange { .. } => runtime::CONSTANT_OUT_OF_RANGE,
            RuntimeErrorKind::EmptyReturnStack => runtime::EMPTY_RETURN_STACK,
            RuntimeErrorKind::StaleScope => runtime::STALE_SCOPE,
            RuntimeErrorKind::ControlTransferInExpression(_) => {
                runtime::CONTROL_TRANSFER_IN_EXPRESSION
            }
            RuntimeErrorKind::ConstantScope(_) => runtime::CONSTANT_SCOPE,
            RuntimeErrorKind::Instruction(_) => runtime::INSTRUCTION_FAILED,
        }
    }
}

/// Runtime error with the location of the statement that raised it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }

    /// Attach a location unless one is already known
    pub fn at(mut self, span: &Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn unresolved_reference(name: &str) -> Self {
        Self::new(RuntimeErrorKind::UnresolvedReference(name.to_string()))
    }

    pub fn constant_reassignment(name: &str) -> Self {
        Self::new(RuntimeErrorKind::ConstantReassignment(name.to_string()))
    }

    pub fn already_defined(name: &str) -> Self {
        Self::new(RuntimeErrorKind::AlreadyDefined(name.to_string()))
    }

    pub fn type_mismatch(expected: impl Into<String>, found: ValueType) -> Self {
        Self::new(RuntimeErrorKind::TypeMismatch {
            expected: expected.into(),
            found,
        })
    }

    pub fn division_by_zero() -> Self {
        Self::new(RuntimeErrorKind::DivisionByZero)
    }

    pub fn unknown_instruction(name: &str) -> Self {
        Self::new(RuntimeErrorKind::UnknownInstruction(name.to_string()))
    }

    pub fn illegal_address(address: i64) -> Self {
        Self::new(RuntimeErrorKind::IllegalAddress(address))
    }

    pub fn stale_scope() -> Self {
        Self::new(RuntimeErrorKind::StaleScope)
    }

    pub fn instruction_failed(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Instruction(message.into()))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let builder = Diagnostic::error(self.code()).message(self.kind.to_string());
        match &self.span {
            Some(span) => builder.span(span.clone()).build(),
            None => builder.build(),
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<IllegalRequest> for RuntimeError {
    fn from(request: IllegalRequest) -> Self {
        Self::new(RuntimeErrorKind::IllegalRequest(request))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = &self.span {
            write!(
                f,
                "[{}] {}\n  --> {}:{}:{}",
                self.code(),
                self.kind,
                span.file.display(),
                span.start_line,
                span.start_col
            )
        } else {
            write!(f, "[{}] {}", self.code(), self.kind)
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Check that `args` has exactly `expected` elements
pub fn check_arity<T>(instruction: &str, args: &[T], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        Err(RuntimeErrorKind::ArityMismatch {
            instruction: instruction.to_string(),
            expected,
            found: args.len(),
        }
        .into())
    } else {
        Ok(())
    }
}
