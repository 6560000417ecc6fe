//! Syntax tree for Mima programs
//!
//! Blocks are reference counted so the interpreter can keep the block a scope
//! executes alive without cloning statements.

use crate::diagnostics::Span;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

/// A parsed program: the top-level block of the main file
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub file: PathBuf,
    pub body: Rc<Block>,
}

/// A sequence of statements together with the jump labels declared in it
#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    /// Label name to the index of its `JumpLabel` statement
    pub labels: BTreeMap<String, usize>,
    pub span: Option<Span>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StatementKind {
    /// `define name [= initializer]`
    Definition {
        name: String,
        initializer: Option<Expr>,
    },
    /// `const name = value`
    Constant { name: String, value: Expr },
    /// Instruction call in statement position, e.g. `LDC(5)`
    Call { opcode: String, operands: Vec<Expr> },
    Expression { expr: Expr },
    /// `name = value`
    Assignment { name: String, value: Expr },
    /// `name:`
    JumpLabel { name: String },
    Scope { block: Rc<Block> },
    Branch {
        condition: Expr,
        then_branch: Rc<Block>,
        else_branch: Option<Rc<Block>>,
    },
    /// Marks where an included file's statements were spliced in
    Include { path: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Literal {
        value: Literal,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Call {
        opcode: String,
        operands: Vec<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    /// Move the direct sub-expressions into `out`, leaving leaves behind
    fn take_children(&mut self, out: &mut Vec<Expr>) {
        match self {
            Expr::Call { operands, .. } => out.append(operands),
            Expr::Unary { operand, .. } => out.push(std::mem::replace(&mut **operand, Expr::hole())),
            Expr::Binary { left, right, .. } => {
                out.push(std::mem::replace(&mut **left, Expr::hole()));
                out.push(std::mem::replace(&mut **right, Expr::hole()));
            }
            Expr::Literal { .. } | Expr::Identifier { .. } => {}
        }
    }

    fn hole() -> Expr {
        Expr::Literal {
            value: Literal::Boolean(false),
            span: Span::file(PathBuf::new()),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Call { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. } => span,
        }
    }
}

// Long operator chains nest thousands of levels deep; tear them down
// iteratively.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.take_children(&mut pending);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Number(i64),
    Binary(i64),
    Text(String),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
}
