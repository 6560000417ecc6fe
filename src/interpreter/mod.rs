//! Interpreter for Mima programs
//!
//! Executes a parsed [`Program`] statement by statement over an [`Environment`]
//! and a [`Memory`]. Each statement hands control to the next one through a
//! guarded step; when the [`StackGuard`] budget runs out the step suspends and
//! the trampoline resumes it from a fresh native stack. Expressions are
//! evaluated off an explicit task stack. A [`DebugController`] can pause a run
//! before any statement.

pub mod debug;
pub mod environment;
pub mod error;
pub mod events;
pub mod instructions;
pub mod machine;
pub mod memory;
pub mod query;
pub mod stack;
pub mod value;

pub use debug::{Breakpoint, DebugController};
pub use environment::{Binding, Environment, ScopeId};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use events::{Event, EventSink, RecordingSink, TracingSink};
pub use instructions::{
    Completion, ExecutionContext, Instruction, InstructionSet, InstructionTable, Opcode,
};
pub use machine::{Machine, Word};
pub use memory::Memory;
pub use query::{IllegalRequest, QueryItem};
pub use stack::{Continuation, Outcome, StackGuard, Step};
pub use value::{JumpRef, Value, ValueType};

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::diagnostics::error_codes::warnings;
use crate::diagnostics::Span;
use crate::parser::ast::{
    BinaryOp, Block, Expr, Literal, Program, Statement, StatementKind, UnaryOp,
};

/// Settings of a single interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub instruction_set: InstructionSet,
    pub word_length: u32,
    pub constant_word_length: u32,
    pub stack_budget: usize,
    /// Emit a `Log` event for every executed instruction
    pub trace: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::for_set(InstructionSet::default())
    }
}

impl InterpreterConfig {
    /// Defaults of an instruction set
    pub fn for_set(instruction_set: InstructionSet) -> Self {
        Self {
            instruction_set,
            word_length: instruction_set.word_length(),
            constant_word_length: instruction_set.constant_word_length(),
            stack_budget: StackGuard::DEFAULT_BUDGET,
            trace: false,
        }
    }
}

/// Counters of the most recent run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub statements: usize,
    pub instructions: usize,
    /// Times the trampoline resumed a suspended step
    pub bounces: usize,
    /// Most guarded steps spent within one bounce
    pub peak_guard_usage: usize,
    pub halted: bool,
}

pub struct Interpreter {
    config: InterpreterConfig,
    instructions: InstructionTable,
    machine: Machine,
    debugger: DebugController,
    sink: Box<dyn EventSink>,
    stats: RunStats,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            instructions: InstructionTable::for_set(config.instruction_set),
            machine: Machine::new(Word::new(config.word_length)),
            debugger: DebugController::new(),
            sink: Box::new(TracingSink),
            stats: RunStats::default(),
            config,
        }
    }

    /// Deliver events to `sink` instead of `tracing`
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_debugger(mut self, debugger: DebugController) -> Self {
        self.debugger = debugger;
        self
    }

    /// Add a host instruction, replacing a built-in of the same name
    pub fn register_instruction(&mut self, instruction: Rc<dyn Instruction>) {
        self.instructions.register(instruction);
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn instructions(&self) -> &InstructionTable {
        &self.instructions
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn debugger(&self) -> &DebugController {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut DebugController {
        &mut self.debugger
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Execute `program` in the entry scope of `env` to its end.
    ///
    /// Returns the accumulator when the program halts, otherwise the value of
    /// the last statement. Errors leave `env` and `memory` as they were when
    /// the failing statement ran. Breakpoints are passed over; use
    /// [`Interpreter::start`] to stop at them.
    pub fn run(
        &mut self,
        program: &Program,
        env: &mut Environment,
        memory: &mut Memory,
    ) -> Result<Value, RuntimeError> {
        let mut state = self.start(program, env, memory)?;
        loop {
            match state {
                RunState::Finished(value) => return Ok(value),
                RunState::Paused(pause) => state = self.resume(pause, env, memory)?,
            }
        }
    }

    /// Execute `program` until it finishes or the debugger pauses it
    pub fn start(
        &mut self,
        program: &Program,
        env: &mut Environment,
        memory: &mut Memory,
    ) -> Result<RunState, RuntimeError> {
        let entry = env.entry();
        env.attach_block(entry, Rc::clone(&program.body), 0)?;
        env.retain(entry)?;

        debug!(
            file = %program.file.display(),
            statements = program.body.len(),
            budget = self.config.stack_budget,
            "run started"
        );

        let activation = Activation {
            entry,
            current: entry,
            return_stack: Vec::new(),
            stats: RunStats::default(),
        };
        let first = Continuation::new(move |runtime| runtime.execute(entry, 0, Value::Void));
        self.proceed(activation, first, env, memory)
    }

    /// Continue a paused run with the statement it stopped before.
    ///
    /// `env` and `memory` must be the ones the run was started with.
    pub fn resume(
        &mut self,
        pause: Pause,
        env: &mut Environment,
        memory: &mut Memory,
    ) -> Result<RunState, RuntimeError> {
        debug!(line = pause.line(), "run resumed");
        self.proceed(pause.activation, pause.continuation, env, memory)
    }

    /// Stop a paused run and drop the scopes it holds
    pub fn abort(&mut self, pause: Pause, env: &mut Environment) -> Result<(), RuntimeError> {
        let Activation {
            current,
            return_stack,
            stats,
            ..
        } = pause.activation;
        let mut result = env.release(current);
        for point in return_stack {
            result = result.and(env.release(point.scope));
        }
        self.stats = stats;
        debug!(line = pause.span.start_line, "paused run aborted");
        result
    }

    fn proceed(
        &mut self,
        activation: Activation,
        next: Continuation,
        env: &mut Environment,
        memory: &mut Memory,
    ) -> Result<RunState, RuntimeError> {
        let mut runtime = Runtime {
            env,
            memory,
            machine: &mut self.machine,
            instructions: &self.instructions,
            debugger: &mut self.debugger,
            sink: self.sink.as_mut(),
            constant_word: Word::new(self.config.constant_word_length),
            trace: self.config.trace,
            guard: StackGuard::new(self.config.stack_budget.max(1)),
            entry: activation.entry,
            current: activation.current,
            return_stack: activation.return_stack,
            stats: activation.stats,
        };

        let result = match runtime.drive(next) {
            Ok(Stop::Paused(span, continuation)) => {
                let activation = runtime.suspend();
                debug!(line = span.start_line, file = %span.file.display(), "run paused");
                self.stats = activation.stats.clone();
                return Ok(RunState::Paused(Pause {
                    span,
                    continuation,
                    activation,
                }));
            }
            Ok(Stop::Done(value)) => Ok(value),
            Err(err) => Err(err),
        };
        let cleanup = runtime.finish();
        let stats = runtime.suspend().stats;
        let result = result.and_then(|value| cleanup.map(|()| value));

        debug!(
            bounces = stats.bounces,
            statements = stats.statements,
            peak = stats.peak_guard_usage,
            "run finished"
        );
        match &result {
            Ok(value) if stats.halted => self
                .sink
                .emit(Event::info(format!("program halted with accumulator {value}"))),
            Ok(_) => self.sink.emit(Event::warning(format!(
                "[{}] program ended without HALT()",
                warnings::MISSING_HALT
            ))),
            Err(err) => self.sink.emit(Event::error(err.to_string())),
        }
        self.stats = stats;
        result.map(RunState::Finished)
    }
}

/// Where a run stands after [`Interpreter::start`] or [`Interpreter::resume`]
#[derive(Debug)]
pub enum RunState {
    Finished(Value),
    Paused(Pause),
}

/// A run stopped by the debugger before a statement
pub struct Pause {
    span: Span,
    continuation: Continuation,
    activation: Activation,
}

impl Pause {
    /// Span of the statement that runs next
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn line(&self) -> usize {
        self.span.start_line
    }

    /// Counters up to the pause
    pub fn stats(&self) -> &RunStats {
        &self.activation.stats
    }
}

impl fmt::Debug for Pause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pause")
            .field("span", &self.span)
            .field("stats", &self.activation.stats)
            .finish_non_exhaustive()
    }
}

/// Bookkeeping of a run that outlives a pause
#[derive(Debug)]
struct Activation {
    entry: ScopeId,
    current: ScopeId,
    return_stack: Vec<ReturnPoint>,
    stats: RunStats,
}

/// Where `RET` continues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReturnPoint {
    scope: ScopeId,
    index: usize,
}

/// How the trampoline stopped
enum Stop {
    Done(Value),
    Paused(Span, Continuation),
}

/// How a statement hands on control
enum Flow {
    Next(Value),
    Goto(JumpRef, Value),
    Enter(Rc<Block>, Value),
    Halt(Value),
}

/// Pending work of [`Runtime::evaluate`]
enum Task<'e> {
    Eval(&'e Expr),
    /// Operands are on the value stack
    Call {
        opcode: &'e str,
        arity: usize,
        span: &'e Span,
    },
    Unary(UnaryOp, &'e Span),
    Binary(BinaryOp, &'e Span),
    /// Left side of `&&` or `||` is on the value stack
    ShortCircuit {
        op: BinaryOp,
        right: &'e Expr,
        span: &'e Span,
    },
    /// Right side of `&&` or `||` is on the value stack
    Logical(BinaryOp, &'e Span),
}

/// State of one run; continuations resume against it
pub struct Runtime<'r> {
    env: &'r mut Environment,
    memory: &'r mut Memory,
    machine: &'r mut Machine,
    instructions: &'r InstructionTable,
    debugger: &'r mut DebugController,
    sink: &'r mut dyn EventSink,
    constant_word: Word,
    trace: bool,
    guard: StackGuard,
    entry: ScopeId,
    /// Scope holding the reference of the running activation
    current: ScopeId,
    return_stack: Vec<ReturnPoint>,
    stats: RunStats,
}

impl<'r> Runtime<'r> {
    /// Trampoline: resume `next` until a step completes or pauses
    fn drive(&mut self, next: Continuation) -> Result<Stop, RuntimeError> {
        let mut outcome = next.resume(self)?;
        loop {
            match outcome {
                Outcome::Done(value) => return Ok(Stop::Done(value)),
                Outcome::Paused(span, continuation) => return Ok(Stop::Paused(span, continuation)),
                Outcome::Suspended(continuation) => {
                    self.stats.bounces += 1;
                    self.guard.reset();
                    trace!(bounce = self.stats.bounces, "resuming suspended step");
                    outcome = continuation.resume(self)?;
                }
            }
        }
    }

    /// Hand the bookkeeping back for a later resume
    fn suspend(&mut self) -> Activation {
        self.stats.peak_guard_usage = self.stats.peak_guard_usage.max(self.guard.peak_usage());
        Activation {
            entry: self.entry,
            current: self.current,
            return_stack: std::mem::take(&mut self.return_stack),
            stats: std::mem::take(&mut self.stats),
        }
    }

    /// Execute statement `index` of `scope`; `last` is the previous result
    fn execute(&mut self, scope: ScopeId, index: usize, last: Value) -> Step {
        if !self.guard.guard() {
            return Ok(Outcome::Suspended(Continuation::new(move |runtime| {
                runtime.execute(scope, index, last)
            })));
        }

        let block = self
            .env
            .block(scope)?
            .ok_or_else(RuntimeError::stale_scope)?;
        let Some(statement) = block.statements.get(index) else {
            return self.leave(scope, last);
        };
        if self.debugger.should_pause(&statement.span) {
            return Ok(Outcome::Paused(
                statement.span.clone(),
                Continuation::new(move |runtime| runtime.perform(scope, index, last)),
            ));
        }
        self.run_statement(scope, index, statement, last)
    }

    /// Execute statement `index` without consulting the debugger
    fn perform(&mut self, scope: ScopeId, index: usize, last: Value) -> Step {
        let block = self
            .env
            .block(scope)?
            .ok_or_else(RuntimeError::stale_scope)?;
        match block.statements.get(index) {
            Some(statement) => self.run_statement(scope, index, statement, last),
            None => self.leave(scope, last),
        }
    }

    fn run_statement(
        &mut self,
        scope: ScopeId,
        index: usize,
        statement: &Statement,
        last: Value,
    ) -> Step {
        self.stats.statements += 1;

        let flow = self
            .statement(scope, index, &statement.kind, last)
            .map_err(|err| err.at(&statement.span))?;
        match flow {
            Flow::Next(value) => self.execute(scope, index + 1, value),
            Flow::Goto(target, value) => {
                self.move_to(target.scope)
                    .map_err(|err| err.at(&statement.span))?;
                self.execute(target.scope, target.index, value)
            }
            Flow::Enter(body, value) => {
                let child = self
                    .enter(scope, body, index + 1)
                    .map_err(|err| err.at(&statement.span))?;
                self.execute(child, 0, value)
            }
            Flow::Halt(value) => {
                self.stats.halted = true;
                Ok(Outcome::Done(value))
            }
        }
    }

    fn statement(
        &mut self,
        scope: ScopeId,
        index: usize,
        kind: &StatementKind,
        last: Value,
    ) -> Result<Flow, RuntimeError> {
        match kind {
            StatementKind::Definition { name, initializer } => {
                let address = match initializer {
                    Some(expr) => {
                        let value = self.evaluate(scope, expr)?;
                        memory_reference(&value)?
                    }
                    None => Value::Memory(self.env.reserve_address(scope)?),
                };
                self.env.define(scope, name, address.clone())?;
                Ok(Flow::Next(address))
            }
            StatementKind::Constant { name, value } => {
                let value = self.evaluate(scope, value)?;
                if value.is_void() {
                    return Err(RuntimeError::type_mismatch("a value", value.value_type()));
                }
                self.env.define_constant(scope, name, value.clone())?;
                Ok(Flow::Next(value))
            }
            StatementKind::Assignment { name, value } => {
                let value = self.evaluate(scope, value)?;
                let address = memory_reference(&value)?;
                self.env.update(scope, name, address.clone())?;
                Ok(Flow::Next(address))
            }
            StatementKind::Expression { expr } => match self.evaluate(scope, expr)? {
                Value::Error(message) => Err(RuntimeError::instruction_failed(message)),
                value => Ok(Flow::Next(value)),
            },
            StatementKind::Call { opcode, operands } => {
                let args = self.evaluate_all(scope, operands)?;
                match self.invoke(scope, opcode, &args)? {
                    Completion::Value(Value::Error(message)) => {
                        Err(RuntimeError::instruction_failed(message))
                    }
                    Completion::Value(value) => Ok(Flow::Next(value)),
                    Completion::Jump(target) => Ok(Flow::Goto(target, last)),
                    Completion::Call(target) => {
                        self.env.retain(scope)?;
                        self.return_stack.push(ReturnPoint {
                            scope,
                            index: index + 1,
                        });
                        Ok(Flow::Goto(target, last))
                    }
                    Completion::Return => {
                        let point = self
                            .return_stack
                            .pop()
                            .ok_or(RuntimeErrorKind::EmptyReturnStack)?;
                        let target = JumpRef {
                            label: String::new(),
                            scope: point.scope,
                            index: point.index,
                        };
                        // the pin is dropped once the activation has moved there
                        self.move_to(point.scope)?;
                        self.env.release(point.scope)?;
                        Ok(Flow::Goto(target, last))
                    }
                    Completion::Halt(value) => Ok(Flow::Halt(value)),
                }
            }
            StatementKind::Scope { block } => Ok(Flow::Enter(Rc::clone(block), last)),
            StatementKind::Branch {
                condition,
                then_branch,
                else_branch,
            } => match self.evaluate(scope, condition)? {
                Value::Boolean(true) => Ok(Flow::Enter(Rc::clone(then_branch), last)),
                Value::Boolean(false) => match else_branch {
                    Some(block) => Ok(Flow::Enter(Rc::clone(block), last)),
                    None => Ok(Flow::Next(last)),
                },
                other => Err(RuntimeError::type_mismatch(
                    "a BOOLEAN condition",
                    other.value_type(),
                )),
            },
            StatementKind::JumpLabel { .. } | StatementKind::Include { .. } => Ok(Flow::Next(last)),
        }
    }

    /// Open a child of `parent` running `block`; the activation moves into it
    fn enter(
        &mut self,
        parent: ScopeId,
        block: Rc<Block>,
        resume_at: usize,
    ) -> Result<ScopeId, RuntimeError> {
        let child = self.env.create_child(parent)?;
        self.env.attach_block(child, block, resume_at)?;
        self.env.release(parent)?;
        self.current = child;
        Ok(child)
    }

    /// Finish `scope`, continuing after the statement that opened it
    fn leave(&mut self, scope: ScopeId, last: Value) -> Step {
        if scope == self.entry {
            return Ok(Outcome::Done(last));
        }
        let (parent, resume_at) = self
            .env
            .exit_point(scope)?
            .ok_or_else(RuntimeError::stale_scope)?;
        self.move_to(parent)?;
        self.execute(parent, resume_at, last)
    }

    fn move_to(&mut self, to: ScopeId) -> Result<(), RuntimeError> {
        self.env.transfer(self.current, to)?;
        self.current = to;
        Ok(())
    }

    /// Drop the references held by this run
    fn finish(&mut self) -> Result<(), RuntimeError> {
        let mut result = self.env.release(self.current);
        for point in std::mem::take(&mut self.return_stack) {
            result = result.and(self.env.release(point.scope));
        }
        result
    }

    fn invoke(
        &mut self,
        scope: ScopeId,
        opcode: &str,
        args: &[Value],
    ) -> Result<Completion, RuntimeError> {
        let instruction = self
            .instructions
            .get(opcode)
            .ok_or_else(|| RuntimeError::unknown_instruction(opcode))?;
        error::check_arity(opcode, args, instruction.arity())?;

        let mut ctx = ExecutionContext {
            machine: &mut *self.machine,
            memory: &mut *self.memory,
            env: &mut *self.env,
            scope,
            constant_word: self.constant_word,
        };
        let completion = instruction.apply(&mut ctx, args)?;
        self.stats.instructions += 1;

        trace!(instruction = opcode, ?args, accumulator = self.machine.accumulator(), "executed");
        if self.trace {
            let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
            self.sink.emit(Event::log(format!(
                "{opcode}({}) acc = {}",
                rendered.join(", "),
                self.machine.accumulator()
            )));
        }
        Ok(completion)
    }

    fn evaluate_all(&mut self, scope: ScopeId, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|expr| self.evaluate(scope, expr)).collect()
    }

    /// Evaluate an expression to a value.
    ///
    /// Sub-expressions are worked off an explicit task stack, so the native
    /// stack stays flat however deeply the expression nests.
    pub fn evaluate(&mut self, scope: ScopeId, expr: &Expr) -> Result<Value, RuntimeError> {
        let mut tasks = vec![Task::Eval(expr)];
        let mut values: Vec<Value> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(expr) => match expr {
                    Expr::Literal { value, .. } => values.push(literal_value(value)),
                    Expr::Identifier { name, span } => {
                        let value = self
                            .env
                            .lookup(scope, name)
                            .or_else_throw(|| RuntimeError::unresolved_reference(name))
                            .map_err(|err| err.at(span))?;
                        values.push(value);
                    }
                    Expr::Call {
                        opcode,
                        operands,
                        span,
                    } => {
                        tasks.push(Task::Call {
                            opcode,
                            arity: operands.len(),
                            span,
                        });
                        tasks.extend(operands.iter().rev().map(Task::Eval));
                    }
                    Expr::Unary { op, operand, span } => {
                        tasks.push(Task::Unary(*op, span));
                        tasks.push(Task::Eval(operand));
                    }
                    Expr::Binary {
                        op: op @ (BinaryOp::And | BinaryOp::Or),
                        left,
                        right,
                        span,
                    } => {
                        tasks.push(Task::ShortCircuit {
                            op: *op,
                            right,
                            span,
                        });
                        tasks.push(Task::Eval(left));
                    }
                    Expr::Binary {
                        op,
                        left,
                        right,
                        span,
                    } => {
                        tasks.push(Task::Binary(*op, span));
                        tasks.push(Task::Eval(right));
                        tasks.push(Task::Eval(left));
                    }
                },
                Task::Call {
                    opcode,
                    arity,
                    span,
                } => {
                    let args = values.split_off(values.len().saturating_sub(arity));
                    let value = match self.invoke(scope, opcode, &args) {
                        Ok(Completion::Value(value)) => value,
                        Ok(_) => {
                            return Err(RuntimeError::from(
                                RuntimeErrorKind::ControlTransferInExpression(opcode.to_string()),
                            )
                            .at(span))
                        }
                        Err(err) => return Err(err.at(span)),
                    };
                    values.push(value);
                }
                Task::Unary(op, span) => {
                    let operand = pop(&mut values);
                    let value = self.eval_unary_op(op, &operand).map_err(|err| err.at(span))?;
                    values.push(value);
                }
                Task::Binary(op, span) => {
                    let right = pop(&mut values);
                    let left = pop(&mut values);
                    let value = eval_binary_op(op, &left, &right).map_err(|err| err.at(span))?;
                    values.push(value);
                }
                Task::ShortCircuit { op, right, span } => {
                    let left = expect_boolean(op, pop(&mut values)).map_err(|err| err.at(span))?;
                    if (op == BinaryOp::And) != left {
                        values.push(Value::Boolean(left));
                    } else {
                        tasks.push(Task::Logical(op, span));
                        tasks.push(Task::Eval(right));
                    }
                }
                Task::Logical(op, span) => {
                    let right = expect_boolean(op, pop(&mut values)).map_err(|err| err.at(span))?;
                    values.push(Value::Boolean(right));
                }
            }
        }

        Ok(pop(&mut values))
    }

    fn eval_unary_op(&self, op: UnaryOp, value: &Value) -> Result<Value, RuntimeError> {
        match (op, value) {
            (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(n.wrapping_neg())),
            (UnaryOp::Neg, Value::Binary(n)) => Ok(Value::Binary(n.wrapping_neg())),
            (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            (UnaryOp::Not, Value::Number(n)) => Ok(Value::Number(self.machine.word().not(*n))),
            (UnaryOp::Not, Value::Binary(n)) => Ok(Value::Binary(self.machine.word().not(*n))),
            (UnaryOp::Neg, other) => Err(RuntimeError::type_mismatch(
                "a number after `-`",
                other.value_type(),
            )),
            (UnaryOp::Not, other) => Err(RuntimeError::type_mismatch(
                "a BOOLEAN or number after `!`",
                other.value_type(),
            )),
        }
    }
}

fn eval_binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (op, left, right) {
        // String concatenation
        (BinaryOp::Add, Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),

        // Equality of same-typed values
        (BinaryOp::Eq, a, b) if a.value_type() == b.value_type() => Ok(Value::Boolean(a == b)),
        (BinaryOp::Ne, a, b) if a.value_type() == b.value_type() => Ok(Value::Boolean(a != b)),

        _ => {
            let (Some(a), Some(b)) = (left.as_integer(), right.as_integer()) else {
                let found = if left.as_integer().is_none() { left } else { right };
                return Err(RuntimeError::type_mismatch(
                    format!("operands compatible with `{}`", op.symbol()),
                    found.value_type(),
                ));
            };
            let number = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div | BinaryOp::Mod if b == 0 => {
                    return Err(RuntimeError::division_by_zero())
                }
                BinaryOp::Div => a.wrapping_div(b),
                BinaryOp::Mod => a.wrapping_rem(b),
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
                BinaryOp::Shl | BinaryOp::Shr => {
                    let shift = u32::try_from(b)
                        .ok()
                        .filter(|shift| *shift < i64::BITS)
                        .ok_or_else(|| {
                            RuntimeError::instruction_failed(format!("shift by {b} is out of range"))
                        })?;
                    if op == BinaryOp::Shl {
                        a << shift
                    } else {
                        a >> shift
                    }
                }
                BinaryOp::Eq => return Ok(Value::Boolean(a == b)),
                BinaryOp::Ne => return Ok(Value::Boolean(a != b)),
                BinaryOp::Lt => return Ok(Value::Boolean(a < b)),
                BinaryOp::Le => return Ok(Value::Boolean(a <= b)),
                BinaryOp::Gt => return Ok(Value::Boolean(a > b)),
                BinaryOp::Ge => return Ok(Value::Boolean(a >= b)),
                BinaryOp::And | BinaryOp::Or => {
                    return Err(RuntimeError::type_mismatch(
                        format!("BOOLEAN operands for `{}`", op.symbol()),
                        left.value_type(),
                    ))
                }
            };
            Ok(match (left, right) {
                (Value::Binary(_), Value::Binary(_)) => Value::Binary(number),
                (Value::Memory(_), _) | (_, Value::Memory(_))
                    if matches!(op, BinaryOp::Add | BinaryOp::Sub) =>
                {
                    Value::Memory(number)
                }
                _ => Value::Number(number),
            })
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::Binary(n) => Value::Binary(*n),
        Literal::Text(s) => Value::Text(s.clone()),
        Literal::Boolean(b) => Value::Boolean(*b),
    }
}

/// Top of the value stack; every task pushes exactly one value
fn pop(values: &mut Vec<Value>) -> Value {
    values.pop().unwrap_or(Value::Void)
}

fn expect_boolean(op: BinaryOp, value: Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Boolean(b) => Ok(b),
        other => Err(RuntimeError::type_mismatch(
            format!("BOOLEAN operands for `{}`", op.symbol()),
            other.value_type(),
        )),
    }
}

/// Address a variable is bound to: a non-negative integer or an existing reference
fn memory_reference(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Memory(address) => Ok(Value::Memory(*address)),
        Value::Number(n) | Value::Binary(n) if *n >= 0 => Ok(Value::Memory(*n)),
        Value::Number(n) | Value::Binary(n) => Err(RuntimeError::illegal_address(*n)),
        other => Err(RuntimeError::type_mismatch(
            "a memory address",
            other.value_type(),
        )),
    }
}
