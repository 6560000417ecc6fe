//! Front-end for the Mima language
//!
//! This module provides:
//! - CharStream (character cursor with positions)
//! - TokenStream (lazy tokenization)
//! - Parser (program construction, include splicing)
//! - AST definitions

pub mod ast;
pub mod error;
pub mod include;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod span;
pub mod stream;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use include::{FsResolver, IncludeResolver, MapResolver, NoIncludes};
pub use lexer::{Keyword, Punct, Token, TokenKind, TokenStream};
pub use parser::Parser;
pub use span::SourceFile;
pub use stream::{CharStream, Position};

use std::path::Path;
use std::rc::Rc;

/// Parse a program that does not include other files
pub fn parse_source(source: &str, path: impl AsRef<Path>) -> Result<Program, ParseError> {
    parse_with_includes(source, path, &mut NoIncludes)
}

/// Parse a program, resolving `include` statements through `resolver`
pub fn parse_with_includes(
    source: &str,
    path: impl AsRef<Path>,
    resolver: &mut dyn IncludeResolver,
) -> Result<Program, ParseError> {
    let source_file = Rc::new(SourceFile::new(path.as_ref(), source));
    let mut parser = Parser::new(TokenStream::new(source_file), resolver);
    parser.parse_program()
}

/// Tokenize a whole source text, stopping at the first lexical error
pub fn tokenize(source: &str, path: impl AsRef<Path>) -> Result<Vec<Token>, ParseError> {
    let mut tokens = TokenStream::new(Rc::new(SourceFile::new(path.as_ref(), source)));
    let mut out = Vec::new();
    loop {
        let token = tokens.next()?;
        if token.kind == TokenKind::Eof {
            return Ok(out);
        }
        out.push(token);
    }
}
