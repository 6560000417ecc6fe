//! Recursive descent parser for Mima
//!
//! Parsing is fail-fast: the first lexical or syntax error aborts the parse.
#![allow(clippy::result_large_err)]

use crate::diagnostics::error_codes::syntax;
use crate::diagnostics::Span;
use crate::parser::ast::*;
use crate::parser::error::ParseError;
use crate::parser::include::IncludeResolver;
use crate::parser::lexer::{Keyword, Punct, Token, TokenKind, TokenStream};
use crate::parser::span::SourceFile;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

/// Statements of a block under construction
#[derive(Default)]
struct BlockBuilder {
    statements: Vec<Statement>,
    labels: BTreeMap<String, usize>,
    constants: HashSet<String>,
}

impl BlockBuilder {
    fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    fn declare_label(&mut self, name: &str, span: &Span) -> Result<(), ParseError> {
        if self.labels.contains_key(name) {
            return Err(ParseError::syntax(
                syntax::DUPLICATE_LABEL,
                format!("jump label `{name}` is already declared in this block"),
                span.clone(),
            ));
        }
        self.labels.insert(name.to_string(), self.statements.len());
        Ok(())
    }

    fn declare_constant(&mut self, name: &str, span: &Span) -> Result<(), ParseError> {
        if !self.constants.insert(name.to_string()) {
            return Err(ParseError::syntax(
                syntax::DUPLICATE_CONSTANT,
                format!("constant `{name}` is already defined in this block"),
                span.clone(),
            ));
        }
        Ok(())
    }

    fn finish(self, span: Option<Span>) -> Block {
        Block {
            statements: self.statements,
            labels: self.labels,
            span,
        }
    }
}

/// Deepest nesting of blocks, parentheses, argument lists and prefix operators
pub const MAX_NESTING: usize = 128;

/// Parser for one program and the files it includes
pub struct Parser<'r> {
    tokens: TokenStream,
    resolver: &'r mut dyn IncludeResolver,
    included: HashSet<PathBuf>,
    depth: usize,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: TokenStream, resolver: &'r mut dyn IncludeResolver) -> Self {
        let included = HashSet::from([tokens.source().path().to_path_buf()]);
        Self {
            tokens,
            resolver,
            included,
            depth: 0,
        }
    }

    /// Parse the whole input into a program
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let file = self.tokens.source().path().to_path_buf();
        let start_span = self.current_span()?;

        let mut body = BlockBuilder::default();
        self.parse_statements_until_eof(&mut body)?;

        let end_span = self.current_span()?;
        Ok(Program {
            file,
            body: Rc::new(body.finish(Some(start_span.merge(&end_span)))),
        })
    }

    fn parse_statements_until_eof(&mut self, block: &mut BlockBuilder) -> Result<(), ParseError> {
        while !self.is_eof()? {
            self.parse_statement(block)?;
        }
        Ok(())
    }

    fn parse_statement(&mut self, block: &mut BlockBuilder) -> Result<(), ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Punctuation(Punct::Semicolon) => {
                self.advance()?;
                Ok(())
            }
            TokenKind::Keyword(Keyword::Define) => self.parse_definitions(block),
            TokenKind::Keyword(Keyword::Const) => self.parse_constants(block),
            TokenKind::Keyword(Keyword::Include) => self.parse_include(block),
            TokenKind::Keyword(Keyword::If) => {
                let branch = self.parse_branch()?;
                block.push(branch);
                Ok(())
            }
            TokenKind::Punctuation(Punct::LBrace) => {
                let inner = self.parse_block()?;
                let span = inner.span.clone().unwrap_or(token.span);
                if self.check(Punct::Semicolon)? {
                    self.advance()?;
                }
                block.push(Statement {
                    kind: StatementKind::Scope { block: inner },
                    span,
                });
                Ok(())
            }
            _ => self.parse_expression_statement(block),
        }
    }

    /// `define a, b = expr;`
    fn parse_definitions(&mut self, block: &mut BlockBuilder) -> Result<(), ParseError> {
        self.advance()?;
        loop {
            let (name, name_span) = self.expect_ident()?;
            let initializer = if self.check(Punct::Assign)? {
                self.advance()?;
                Some(self.parse_expr()?)
            } else {
                None
            };
            let span = initializer
                .as_ref()
                .map_or(name_span.clone(), |init| name_span.merge(init.span()));
            block.push(Statement {
                kind: StatementKind::Definition { name, initializer },
                span,
            });

            if !self.check(Punct::Comma)? {
                break;
            }
            self.advance()?;
        }
        self.expect(Punct::Semicolon, "after a definition")?;
        Ok(())
    }

    /// `const a = expr, b = expr;`
    fn parse_constants(&mut self, block: &mut BlockBuilder) -> Result<(), ParseError> {
        self.advance()?;
        loop {
            let (name, name_span) = self.expect_ident()?;
            block.declare_constant(&name, &name_span)?;
            self.expect(Punct::Assign, "in a constant definition")?;
            let value = self.parse_expr()?;
            let span = name_span.merge(value.span());
            block.push(Statement {
                kind: StatementKind::Constant { name, value },
                span,
            });

            if !self.check(Punct::Comma)? {
                break;
            }
            self.advance()?;
        }
        self.expect(Punct::Semicolon, "after a constant definition")?;
        Ok(())
    }

    /// `include 'file';` splices the file's statements into the current block
    fn parse_include(&mut self, block: &mut BlockBuilder) -> Result<(), ParseError> {
        let start_span = self.advance()?.span;
        let (request, request_span) = self.expect_text()?;
        let end_span = self.expect(Punct::Semicolon, "after an include")?.span;

        let from = self.tokens.source().path().to_path_buf();
        let resolved = self
            .resolver
            .resolve(&request, &from)
            .map_err(|err| ParseError::syntax(syntax::INCLUDE_FAILED, err.to_string(), request_span))?;

        block.push(Statement {
            kind: StatementKind::Include {
                path: request.clone(),
            },
            span: start_span.merge(&end_span),
        });

        if !self.included.insert(resolved.path.clone()) {
            debug!(file = %resolved.path.display(), "skipping file that was already included");
            return Ok(());
        }
        debug!(request = %request, file = %resolved.path.display(), "including file");

        let source = Rc::new(SourceFile::new(resolved.path, resolved.source));
        let outer = std::mem::replace(&mut self.tokens, TokenStream::new(source));
        let result = self.parse_statements_until_eof(block);
        self.tokens = outer;
        result
    }

    /// `if (cond) { ... } else { ... }`; `else if` nests a branch in the else block
    fn parse_branch(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.advance()?.span;
        self.expect(Punct::LParen, "after `if`")?;
        let condition = self.parse_expr()?;
        self.expect(Punct::RParen, "after the condition")?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.check_keyword(Keyword::Else)? {
            self.advance()?;
            if self.check_keyword(Keyword::If)? {
                let nested = self.parse_branch()?;
                let span = Some(nested.span.clone());
                Some(Rc::new(Block {
                    statements: vec![nested],
                    labels: BTreeMap::new(),
                    span,
                }))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        let end_span = else_branch
            .as_ref()
            .unwrap_or(&then_branch)
            .span
            .clone()
            .unwrap_or_else(|| start_span.clone());
        Ok(Statement {
            kind: StatementKind::Branch {
                condition,
                then_branch,
                else_branch,
            },
            span: start_span.merge(&end_span),
        })
    }

    fn parse_block(&mut self) -> Result<Rc<Block>, ParseError> {
        self.nested(Self::parse_block_contents)
    }

    fn parse_block_contents(&mut self) -> Result<Rc<Block>, ParseError> {
        let open = self.expect(Punct::LBrace, "to open a block")?;
        let mut block = BlockBuilder::default();

        loop {
            if self.check(Punct::RBrace)? {
                break;
            }
            if self.is_eof()? {
                let eof_span = self.current_span()?;
                return Err(ParseError::syntax(
                    syntax::UNEXPECTED_EOF,
                    format!(
                        "unterminated block opened at line {}: expected `}}` before end of input",
                        open.span.start_line
                    ),
                    eof_span,
                ));
            }
            self.parse_statement(&mut block)?;
        }

        let close = self.advance()?;
        Ok(Rc::new(block.finish(Some(open.span.merge(&close.span)))))
    }

    /// Jump labels, assignments, instruction calls and bare expressions
    fn parse_expression_statement(&mut self, block: &mut BlockBuilder) -> Result<(), ParseError> {
        let mut expr = self.parse_expr()?;

        if self.check(Punct::Colon)? {
            let colon = self.advance()?;
            let Expr::Identifier { name, span } = &expr else {
                return Err(ParseError::syntax(
                    syntax::UNEXPECTED_TOKEN,
                    "only a name can be used as a jump label",
                    colon.span,
                ));
            };
            let (name, span) = (name.clone(), span.clone());
            block.declare_label(&name, &span)?;
            block.push(Statement {
                kind: StatementKind::JumpLabel { name },
                span: span.merge(&colon.span),
            });
            return Ok(());
        }

        if self.check(Punct::Assign)? {
            let assign = self.advance()?;
            let Expr::Identifier { name, span } = &expr else {
                return Err(ParseError::syntax(
                    syntax::UNEXPECTED_TOKEN,
                    "only a name can be assigned to",
                    assign.span,
                ));
            };
            let (name, span) = (name.clone(), span.clone());
            let value = self.parse_expr()?;
            let end_span = self.expect(Punct::Semicolon, "after an assignment")?.span;
            block.push(Statement {
                kind: StatementKind::Assignment { name, value },
                span: span.merge(&end_span),
            });
            return Ok(());
        }

        let end_span = self.expect(Punct::Semicolon, "after a statement")?.span;
        let span = expr.span().merge(&end_span);
        let kind = if let Expr::Call {
            opcode, operands, ..
        } = &mut expr
        {
            StatementKind::Call {
                opcode: std::mem::take(opcode),
                operands: std::mem::take(operands),
            }
        } else {
            StatementKind::Expression { expr }
        };
        block.push(Statement { kind, span });
        Ok(())
    }

    // Expressions

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_expr(1)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let (op, prec) = match self.peek()?.kind {
                TokenKind::Punctuation(Punct::PipePipe) => (BinaryOp::Or, 1),
                TokenKind::Punctuation(Punct::AmpAmp) => (BinaryOp::And, 2),
                TokenKind::Punctuation(Punct::Pipe) => (BinaryOp::BitOr, 3),
                TokenKind::Punctuation(Punct::Caret) => (BinaryOp::BitXor, 4),
                TokenKind::Punctuation(Punct::Amp) => (BinaryOp::BitAnd, 5),
                TokenKind::Punctuation(Punct::EqEq) => (BinaryOp::Eq, 6),
                TokenKind::Punctuation(Punct::NotEq) => (BinaryOp::Ne, 6),
                TokenKind::Punctuation(Punct::Lt) => (BinaryOp::Lt, 7),
                TokenKind::Punctuation(Punct::Le) => (BinaryOp::Le, 7),
                TokenKind::Punctuation(Punct::Gt) => (BinaryOp::Gt, 7),
                TokenKind::Punctuation(Punct::Ge) => (BinaryOp::Ge, 7),
                TokenKind::Punctuation(Punct::Shl) => (BinaryOp::Shl, 8),
                TokenKind::Punctuation(Punct::Shr) => (BinaryOp::Shr, 8),
                TokenKind::Punctuation(Punct::Plus) => (BinaryOp::Add, 9),
                TokenKind::Punctuation(Punct::Minus) => (BinaryOp::Sub, 9),
                TokenKind::Punctuation(Punct::Star) => (BinaryOp::Mul, 10),
                TokenKind::Punctuation(Punct::Slash) => (BinaryOp::Div, 10),
                TokenKind::Punctuation(Punct::Percent) => (BinaryOp::Mod, 10),
                _ => break,
            };

            if prec < min_prec {
                break;
            }

            self.advance()?;
            let right = self.parse_binary_expr(prec + 1)?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek()?.kind {
            TokenKind::Punctuation(Punct::Minus) => UnaryOp::Neg,
            TokenKind::Punctuation(Punct::Bang) => UnaryOp::Not,
            _ => return self.parse_primary_expr(),
        };
        let start_span = self.advance()?.span;
        let operand = self.nested(Self::parse_unary_expr)?;
        let span = start_span.merge(operand.span());
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek()?.clone();
        let literal = match token.kind {
            TokenKind::Number(n) => Literal::Number(n),
            TokenKind::Binary(n) => Literal::Binary(n),
            TokenKind::Text(s) => Literal::Text(s),
            TokenKind::Boolean(b) => Literal::Boolean(b),
            TokenKind::Identifier(name) => {
                self.advance()?;
                if self.check(Punct::LParen)? {
                    return self.parse_call(name, token.span);
                }
                return Ok(Expr::Identifier {
                    name,
                    span: token.span,
                });
            }
            TokenKind::Punctuation(Punct::LParen) => {
                self.advance()?;
                let inner = self.nested(Self::parse_expr)?;
                self.expect(Punct::RParen, "to close the parenthesis")?;
                return Ok(inner);
            }
            _ => return Err(self.error_unexpected("an expression")?),
        };

        self.advance()?;
        Ok(Expr::Literal {
            value: literal,
            span: token.span,
        })
    }

    /// `OPCODE(arg, ...)`; the opcode has already been consumed
    fn parse_call(&mut self, opcode: String, start_span: Span) -> Result<Expr, ParseError> {
        self.expect(Punct::LParen, "to start the argument list")?;
        let mut operands = Vec::new();
        if !self.check(Punct::RParen)? {
            loop {
                operands.push(self.nested(Self::parse_expr)?);
                if !self.check(Punct::Comma)? {
                    break;
                }
                self.advance()?;
            }
        }
        let end_span = self.expect(Punct::RParen, "to close the argument list")?.span;
        Ok(Expr::Call {
            opcode,
            operands,
            span: start_span.merge(&end_span),
        })
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            let span = self.current_span()?;
            return Err(ParseError::syntax(
                syntax::NESTING_TOO_DEEP,
                format!("nesting exceeds {MAX_NESTING} levels"),
                span,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // Token helpers

    fn peek(&mut self) -> Result<&Token, ParseError> {
        self.tokens.peek()
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.tokens.next()
    }

    fn is_eof(&mut self) -> Result<bool, ParseError> {
        Ok(matches!(self.peek()?.kind, TokenKind::Eof))
    }

    fn current_span(&mut self) -> Result<Span, ParseError> {
        Ok(self.peek()?.span.clone())
    }

    fn check(&mut self, punct: Punct) -> Result<bool, ParseError> {
        Ok(self.peek()?.kind == TokenKind::Punctuation(punct))
    }

    fn check_keyword(&mut self, keyword: Keyword) -> Result<bool, ParseError> {
        Ok(self.peek()?.kind == TokenKind::Keyword(keyword))
    }

    fn expect(&mut self, punct: Punct, context: &str) -> Result<Token, ParseError> {
        if self.check(punct)? {
            return self.advance();
        }
        Err(self.error_unexpected(&format!("`{}` {}", punct.as_str(), context))?)
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance()?;
                Ok((name, token.span))
            }
            TokenKind::Keyword(keyword) => Err(ParseError::syntax(
                syntax::RESERVED_KEYWORD,
                format!(
                    "`{}` is a reserved word and cannot be used as a name",
                    keyword.as_str()
                ),
                token.span,
            )),
            _ => Err(self.error_unexpected("a name")?),
        }
    }

    fn expect_text(&mut self) -> Result<(String, Span), ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Text(text) => {
                self.advance()?;
                Ok((text, token.span))
            }
            _ => Err(self.error_unexpected("a file name in quotes")?),
        }
    }

    fn error_unexpected(&mut self, expected: &str) -> Result<ParseError, ParseError> {
        let token = self.peek()?;
        let code = if token.kind == TokenKind::Eof {
            syntax::UNEXPECTED_EOF
        } else {
            syntax::UNEXPECTED_TOKEN
        };
        Ok(ParseError::syntax(
            code,
            format!("expected {expected}, found {}", token.kind),
            token.span.clone(),
        ))
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
