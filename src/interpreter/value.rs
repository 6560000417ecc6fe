//! Runtime value types for the Mima interpreter.

use std::fmt;

use serde::Serialize;

use super::environment::ScopeId;

/// Runtime value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// No value
    Void,
    /// Integer
    Number(i64),
    /// Integer written as a binary literal
    Binary(i64),
    Boolean(bool),
    Text(String),
    /// Resolved jump label
    Jump(JumpRef),
    /// Memory address bound to a variable
    Memory(i64),
    /// Failure reported by an instruction
    Error(String),
}

/// Target of a jump: a labeled statement in a live scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JumpRef {
    pub label: String,
    pub scope: ScopeId,
    pub index: usize,
}

/// Closed set of value types, used in type errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Void,
    Number,
    BinaryNumber,
    Boolean,
    String,
    JumpReference,
    MemoryReference,
    Error,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Void => "VOID",
            ValueType::Number => "NUMBER",
            ValueType::BinaryNumber => "BINARY_NUMBER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::String => "STRING",
            ValueType::JumpReference => "JUMP_REFERENCE",
            ValueType::MemoryReference => "MEMORY_REFERENCE",
            ValueType::Error => "ERROR",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Void => ValueType::Void,
            Value::Number(_) => ValueType::Number,
            Value::Binary(_) => ValueType::BinaryNumber,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Text(_) => ValueType::String,
            Value::Jump(_) => ValueType::JumpReference,
            Value::Memory(_) => ValueType::MemoryReference,
            Value::Error(_) => ValueType::Error,
        }
    }

    /// Integer content of numbers, binaries and memory references
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Number(n) | Value::Binary(n) | Value::Memory(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Binary(n) if *n < 0 => write!(f, "-0b{:b}", n.unsigned_abs()),
            Value::Binary(n) => write!(f, "0b{n:b}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Text(s) => f.write_str(s),
            Value::Jump(target) => write!(f, "{}:", target.label),
            Value::Memory(address) => write!(f, "[{address}]"),
            Value::Error(message) => write!(f, "error: {message}"),
        }
    }
}
