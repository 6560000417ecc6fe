//! Machine instructions
//!
//! Every instruction reports how execution continues through a [`Completion`];
//! the interpreter performs the control transfer, so instructions never call
//! back into it.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::environment::{Environment, ScopeId};
use super::error::{check_arity, RuntimeError, RuntimeErrorKind};
use super::machine::{Machine, Word};
use super::memory::Memory;
use super::value::{JumpRef, Value};

/// How execution continues after an instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Continue with the next statement
    Value(Value),
    /// Continue at a labeled statement
    Jump(JumpRef),
    /// Remember the next statement on the return stack, then jump
    Call(JumpRef),
    /// Continue at the most recent return point
    Return,
    /// Stop the program with a result
    Halt(Value),
}

/// State an instruction may read and change
pub struct ExecutionContext<'a> {
    pub machine: &'a mut Machine,
    pub memory: &'a mut Memory,
    pub env: &'a mut Environment,
    /// Scope of the statement that called the instruction
    pub scope: ScopeId,
    /// Width of constants accepted by `LDC` and `ADC`
    pub constant_word: Word,
}

pub trait Instruction {
    /// Name used to call the instruction in source
    fn name(&self) -> &str;

    /// Exact number of arguments
    fn arity(&self) -> usize;

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        args: &[Value],
    ) -> Result<Completion, RuntimeError>;
}

/// Instruction sets with their word widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstructionSet {
    #[default]
    Mima,
    MimaX,
}

impl InstructionSet {
    pub fn word_length(self) -> u32 {
        24
    }

    pub fn constant_word_length(self) -> u32 {
        match self {
            InstructionSet::Mima => 20,
            InstructionSet::MimaX => 24,
        }
    }

    pub fn opcodes(self) -> Vec<Opcode> {
        let mut opcodes = Opcode::MIMA.to_vec();
        if self == InstructionSet::MimaX {
            opcodes.extend_from_slice(Opcode::MIMA_X);
        }
        opcodes
    }
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionSet::Mima => f.write_str("mima"),
            InstructionSet::MimaX => f.write_str("mima-x"),
        }
    }
}

/// Built-in Mima and Mima-X instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Ldc,
    Ldv,
    Stv,
    Ldiv,
    Stiv,
    Add,
    And,
    Or,
    Xor,
    Eql,
    Not,
    Rar,
    Jmp,
    Jmn,
    Halt,
    // Mima-X
    Adc,
    Ldsp,
    Stsp,
    Sp,
    Ldvr,
    Stvr,
    Call,
    Ret,
}

impl Opcode {
    pub const MIMA: &'static [Opcode] = &[
        Opcode::Ldc,
        Opcode::Ldv,
        Opcode::Stv,
        Opcode::Ldiv,
        Opcode::Stiv,
        Opcode::Add,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Eql,
        Opcode::Not,
        Opcode::Rar,
        Opcode::Jmp,
        Opcode::Jmn,
        Opcode::Halt,
    ];

    pub const MIMA_X: &'static [Opcode] = &[
        Opcode::Adc,
        Opcode::Ldsp,
        Opcode::Stsp,
        Opcode::Sp,
        Opcode::Ldvr,
        Opcode::Stvr,
        Opcode::Call,
        Opcode::Ret,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ldc => "LDC",
            Opcode::Ldv => "LDV",
            Opcode::Stv => "STV",
            Opcode::Ldiv => "LDIV",
            Opcode::Stiv => "STIV",
            Opcode::Add => "ADD",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Eql => "EQL",
            Opcode::Not => "NOT",
            Opcode::Rar => "RAR",
            Opcode::Jmp => "JMP",
            Opcode::Jmn => "JMN",
            Opcode::Halt => "HALT",
            Opcode::Adc => "ADC",
            Opcode::Ldsp => "LDSP",
            Opcode::Stsp => "STSP",
            Opcode::Sp => "SP",
            Opcode::Ldvr => "LDVR",
            Opcode::Stvr => "STVR",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
        }
    }
}

impl Instruction for Opcode {
    fn name(&self) -> &str {
        self.mnemonic()
    }

    fn arity(&self) -> usize {
        match self {
            Opcode::Not | Opcode::Rar | Opcode::Halt | Opcode::Ldsp | Opcode::Stsp | Opcode::Sp
            | Opcode::Ret => 0,
            Opcode::Ldvr | Opcode::Stvr => 2,
            _ => 1,
        }
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        args: &[Value],
    ) -> Result<Completion, RuntimeError> {
        check_arity(self.mnemonic(), args, self.arity())?;
        let word = ctx.machine.word();
        let acc = ctx.machine.accumulator();

        match self {
            Opcode::Ldc => {
                let value = constant_arg(ctx, &args[0])?;
                accumulate(ctx, value)
            }
            Opcode::Ldv => {
                let value = load_word(ctx, address_arg(&args[0])?)?;
                accumulate(ctx, value)
            }
            Opcode::Stv => {
                let address = address_arg(&args[0])?;
                ctx.memory.store_value(address, Value::Number(acc));
                Ok(Completion::Value(Value::Void))
            }
            Opcode::Ldiv => {
                let address = indirect_address(ctx, address_arg(&args[0])?, 0)?;
                let value = load_word(ctx, address)?;
                accumulate(ctx, value)
            }
            Opcode::Stiv => {
                let address = indirect_address(ctx, address_arg(&args[0])?, 0)?;
                ctx.memory.store_value(address, Value::Number(acc));
                Ok(Completion::Value(Value::Void))
            }
            Opcode::Add => {
                let operand = load_word(ctx, address_arg(&args[0])?)?;
                accumulate(ctx, acc.wrapping_add(operand))
            }
            Opcode::And => {
                let operand = load_word(ctx, address_arg(&args[0])?)?;
                accumulate(ctx, acc & operand)
            }
            Opcode::Or => {
                let operand = load_word(ctx, address_arg(&args[0])?)?;
                accumulate(ctx, acc | operand)
            }
            Opcode::Xor => {
                let operand = load_word(ctx, address_arg(&args[0])?)?;
                accumulate(ctx, acc ^ operand)
            }
            Opcode::Eql => {
                let operand = load_word(ctx, address_arg(&args[0])?)?;
                let equal = word.wrap(acc) == word.wrap(operand);
                accumulate(ctx, if equal { -1 } else { 0 })
            }
            Opcode::Not => accumulate(ctx, word.not(acc)),
            Opcode::Rar => accumulate(ctx, word.rotate_right(acc)),
            Opcode::Jmp => Ok(Completion::Jump(jump_arg(&args[0])?)),
            Opcode::Jmn => {
                let target = jump_arg(&args[0])?;
                if word.is_negative(acc) {
                    Ok(Completion::Jump(target))
                } else {
                    Ok(Completion::Value(Value::Void))
                }
            }
            Opcode::Halt => Ok(Completion::Halt(Value::Number(acc))),
            Opcode::Adc => {
                let value = constant_arg(ctx, &args[0])?;
                accumulate(ctx, acc.wrapping_add(value))
            }
            Opcode::Ldsp => {
                let sp = ctx.machine.stack_pointer();
                accumulate(ctx, sp)
            }
            Opcode::Stsp => {
                ctx.machine.set_stack_pointer(acc);
                Ok(Completion::Value(Value::Void))
            }
            Opcode::Sp => Ok(Completion::Value(Value::Memory(
                ctx.machine.stack_pointer(),
            ))),
            Opcode::Ldvr => {
                let offset = constant_arg(ctx, &args[1])?;
                let address = indirect_address(ctx, address_arg(&args[0])?, offset)?;
                let value = load_word(ctx, address)?;
                accumulate(ctx, value)
            }
            Opcode::Stvr => {
                let offset = constant_arg(ctx, &args[1])?;
                let address = indirect_address(ctx, address_arg(&args[0])?, offset)?;
                ctx.memory.store_value(address, Value::Number(acc));
                Ok(Completion::Value(Value::Void))
            }
            Opcode::Call => Ok(Completion::Call(jump_arg(&args[0])?)),
            Opcode::Ret => Ok(Completion::Return),
        }
    }
}

/// Set the accumulator and report its new value
fn accumulate(ctx: &mut ExecutionContext<'_>, value: i64) -> Result<Completion, RuntimeError> {
    ctx.machine.set_accumulator(value);
    Ok(Completion::Value(Value::Number(ctx.machine.accumulator())))
}

/// A constant operand that must fit the constant word.
///
/// When constants are narrower than machine words they are unsigned.
fn constant_arg(ctx: &ExecutionContext<'_>, value: &Value) -> Result<i64, RuntimeError> {
    let n = match value {
        Value::Number(n) | Value::Binary(n) => *n,
        other => return Err(RuntimeError::type_mismatch("a constant", other.value_type())),
    };
    let constant = ctx.constant_word;
    let signed = constant.bits() >= ctx.machine.word().bits();
    let lowest = if signed { constant.min_signed() } else { 0 };
    if n < lowest || n > constant.max_unsigned() {
        return Err(RuntimeErrorKind::ConstantOutOfRange {
            value: n,
            bits: constant.bits(),
        }
        .into());
    }
    Ok(n)
}

/// A memory address operand; negative addresses only come from `define`
fn address_arg(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Memory(address) => Ok(*address),
        Value::Number(n) | Value::Binary(n) if *n >= 0 => Ok(*n),
        Value::Number(n) | Value::Binary(n) => Err(RuntimeError::illegal_address(*n)),
        other => Err(RuntimeError::type_mismatch(
            "a memory address",
            other.value_type(),
        )),
    }
}

fn jump_arg(value: &Value) -> Result<JumpRef, RuntimeError> {
    match value {
        Value::Jump(target) => Ok(target.clone()),
        other => Err(RuntimeError::type_mismatch(
            "a jump label",
            other.value_type(),
        )),
    }
}

fn load_word(ctx: &mut ExecutionContext<'_>, address: i64) -> Result<i64, RuntimeError> {
    let value = ctx.memory.load_value(address);
    value
        .as_integer()
        .ok_or_else(|| RuntimeError::type_mismatch("a number in memory", value.value_type()))
}

/// Address stored at `pointer`, displaced by `offset`
fn indirect_address(
    ctx: &mut ExecutionContext<'_>,
    pointer: i64,
    offset: i64,
) -> Result<i64, RuntimeError> {
    let address = load_word(ctx, pointer)?.wrapping_add(offset);
    if address < 0 && pointer >= 0 {
        return Err(RuntimeError::illegal_address(address));
    }
    Ok(address)
}

/// Instructions callable by name
#[derive(Clone, Default)]
pub struct InstructionTable {
    instructions: HashMap<String, Rc<dyn Instruction>>,
}

impl InstructionTable {
    pub fn for_set(set: InstructionSet) -> Self {
        let mut table = Self::default();
        for opcode in set.opcodes() {
            table.register(Rc::new(opcode));
        }
        table
    }

    /// Add or replace an instruction
    pub fn register(&mut self, instruction: Rc<dyn Instruction>) {
        self.instructions
            .insert(instruction.name().to_string(), instruction);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Instruction>> {
        self.instructions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instructions.contains_key(name)
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.instructions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for InstructionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
#[path = "instructions_tests.rs"]
mod tests;
