//! Tokenizer for Mima source text
//!
//! Tokens are produced lazily from a [`CharStream`]; the first character of each
//! token decides how the rest of it is read.

use crate::diagnostics::error_codes::syntax;
use crate::diagnostics::Span;
use crate::parser::error::ParseError;
use crate::parser::span::SourceFile;
use crate::parser::stream::{CharStream, Position};
use std::fmt;
use std::rc::Rc;
use unicode_xid::UnicodeXID;

/// Reserved words of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Define,
    Const,
    Include,
    If,
    Else,
    True,
    False,
}

impl Keyword {
    pub const ALL: [Keyword; 7] = [
        Keyword::Define,
        Keyword::Const,
        Keyword::Include,
        Keyword::If,
        Keyword::Else,
        Keyword::True,
        Keyword::False,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Define => "define",
            Keyword::Const => "const",
            Keyword::Include => "include",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::True => "true",
            Keyword::False => "false",
        }
    }

    /// Keyword spelled exactly as `text`, if any
    pub fn lookup(text: &str) -> Option<Keyword> {
        Self::ALL.into_iter().find(|k| k.as_str() == text)
    }
}

/// Operators and separators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Colon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Bang,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Shl,
    Shr,
}

/// Two-character operators are listed first so they win over their prefixes
const PUNCTUATION: &[(&str, Punct)] = &[
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AmpAmp),
    ("||", Punct::PipePipe),
    ("<<", Punct::Shl),
    (">>", Punct::Shr),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    (",", Punct::Comma),
    (";", Punct::Semicolon),
    (":", Punct::Colon),
    ("=", Punct::Assign),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("!", Punct::Bang),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
    ("^", Punct::Caret),
];

impl Punct {
    pub fn as_str(self) -> &'static str {
        PUNCTUATION
            .iter()
            .find(|(_, p)| *p == self)
            .map_or("?", |(text, _)| text)
    }
}

/// Token categories
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(i64),
    Binary(i64),
    Text(String),
    Boolean(bool),
    Identifier(String),
    Keyword(Keyword),
    Punctuation(Punct),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number `{n}`"),
            TokenKind::Binary(n) => write!(f, "binary `0b{n:b}`"),
            TokenKind::Text(s) => write!(f, "string {s:?}"),
            TokenKind::Boolean(b) => write!(f, "`{b}`"),
            TokenKind::Identifier(name) => write!(f, "identifier `{name}`"),
            TokenKind::Keyword(k) => write!(f, "keyword `{}`", k.as_str()),
            TokenKind::Punctuation(p) => write!(f, "`{}`", p.as_str()),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with its ordinal in the stream and its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub index: usize,
    /// Absolute character offset of the first character
    pub position: usize,
    pub span: Span,
}

/// Lazy token source over one file
pub struct TokenStream {
    source: Rc<SourceFile>,
    chars: CharStream,
    peeked: Option<Token>,
    produced: usize,
}

impl TokenStream {
    pub fn new(source: Rc<SourceFile>) -> Self {
        let chars = CharStream::new(source.content());
        Self {
            source,
            chars,
            peeked: None,
            produced: 0,
        }
    }

    pub fn source(&self) -> &Rc<SourceFile> {
        &self.source
    }

    /// Consume the next token; repeats `Eof` once the input is exhausted
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.read_token(),
        }
    }

    pub fn peek(&mut self) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.read_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    pub fn eof(&mut self) -> bool {
        self.peek().map_or(true, |t| t.kind == TokenKind::Eof)
    }

    fn read_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let start = self.chars.position();

        let kind = match self.chars.peek() {
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    index: self.produced,
                    position: start.char_offset,
                    span: self.span_from(start),
                })
            }
            Some('0') if self.chars.peek_second() == Some('b') => {
                self.chars.next();
                self.chars.next();
                self.read_binary(start)?
            }
            Some('~') => {
                self.chars.next();
                self.read_binary(start)?
            }
            Some(c) if c.is_ascii_digit() => self.read_number(start)?,
            Some(c) if c == '_' || c.is_xid_start() => self.read_word(),
            Some(quote @ ('\'' | '"')) => {
                self.chars.next();
                self.read_string(start, quote)?
            }
            Some(c) => self.read_punctuation(start, c)?,
        };

        let token = Token {
            kind,
            index: self.produced,
            position: start.char_offset,
            span: self.span_from(start),
        };
        self.produced += 1;
        Ok(token)
    }

    /// Whitespace and `#` comments; a comment ends at a newline or the next `#`
    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some('#') => {
                    self.chars.next();
                    while let Some(c) = self.chars.next() {
                        if c == '\n' || c == '#' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn read_number(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        self.reject_trailing_word(start, "number")?;
        digits
            .parse::<i64>()
            .map(TokenKind::Number)
            .map_err(|_| {
                ParseError::lex(
                    syntax::INVALID_NUMBER,
                    format!("number literal `{digits}` is out of range"),
                    self.span_from(start),
                )
            })
    }

    fn read_binary(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        let digits = self.take_while(|c| c == '0' || c == '1');
        self.reject_trailing_word(start, "binary")?;
        if digits.is_empty() {
            return Err(ParseError::lex(
                syntax::INVALID_NUMBER,
                "binary literal needs at least one digit",
                self.span_from(start),
            ));
        }
        i64::from_str_radix(&digits, 2)
            .map(TokenKind::Binary)
            .map_err(|_| {
                ParseError::lex(
                    syntax::INVALID_NUMBER,
                    format!("binary literal `{digits}` is out of range"),
                    self.span_from(start),
                )
            })
    }

    fn reject_trailing_word(&mut self, start: Position, what: &str) -> Result<(), ParseError> {
        match self.chars.peek() {
            Some(c) if c.is_xid_continue() => {
                self.chars.next();
                Err(ParseError::lex(
                    syntax::INVALID_NUMBER,
                    format!("invalid digit `{c}` in {what} literal"),
                    self.span_from(start),
                ))
            }
            _ => Ok(()),
        }
    }

    fn read_word(&mut self) -> TokenKind {
        let word = self.take_while(|c| c == '_' || c.is_xid_continue());
        match Keyword::lookup(&word) {
            Some(Keyword::True) => TokenKind::Boolean(true),
            Some(Keyword::False) => TokenKind::Boolean(false),
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word),
        }
    }

    fn read_string(&mut self, start: Position, quote: char) -> Result<TokenKind, ParseError> {
        let mut text = String::new();
        loop {
            let escape_start = self.chars.position();
            match self.chars.next() {
                Some(c) if c == quote => return Ok(TokenKind::Text(text)),
                None | Some('\n') => {
                    return Err(ParseError::lex(
                        syntax::UNTERMINATED_STRING,
                        "unterminated string literal",
                        self.span_from(start),
                    ))
                }
                Some('\\') => {
                    let escaped = match self.chars.next() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        other => {
                            let shown = other.map_or_else(String::new, String::from);
                            return Err(ParseError::lex(
                                syntax::INVALID_ESCAPE,
                                format!("invalid escape sequence `\\{shown}`"),
                                self.span_from(escape_start),
                            ));
                        }
                    };
                    text.push(escaped);
                }
                Some(c) => text.push(c),
            }
        }
    }

    fn read_punctuation(&mut self, start: Position, first: char) -> Result<TokenKind, ParseError> {
        let second = self.chars.peek_second();
        for (text, punct) in PUNCTUATION {
            let mut expected = text.chars();
            if expected.next() != Some(first) {
                continue;
            }
            match expected.next() {
                Some(c) if second != Some(c) => continue,
                Some(_) => {
                    self.chars.next();
                    self.chars.next();
                }
                None => {
                    self.chars.next();
                }
            }
            return Ok(TokenKind::Punctuation(*punct));
        }

        self.chars.next();
        Err(ParseError::lex(
            syntax::UNEXPECTED_CHARACTER,
            format!("can't handle character `{first}`"),
            self.span_from(start),
        ))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.chars.next_if(&pred) {
            text.push(c);
        }
        text
    }

    fn span_from(&self, start: Position) -> Span {
        let end = self.chars.position();
        Span::new(
            self.source.path().to_path_buf(),
            start.offset,
            end.offset,
            start.line,
            start.column,
            end.line,
            end.column,
        )
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
