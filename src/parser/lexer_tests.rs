use super::*;
use crate::parser::error::ParseErrorKind;
use pretty_assertions::assert_eq;

fn stream(source: &str) -> TokenStream {
    TokenStream::new(Rc::new(SourceFile::new("test.mima", source)))
}

fn lex(source: &str) -> Vec<TokenKind> {
    let mut tokens = stream(source);
    let mut kinds = Vec::new();

    loop {
        let token = tokens.next().expect("lex error");
        if token.kind == TokenKind::Eof {
            break;
        }
        kinds.push(token.kind);
    }

    kinds
}

fn lex_error(source: &str) -> ParseError {
    let mut tokens = stream(source);
    loop {
        match tokens.next() {
            Ok(token) if token.kind == TokenKind::Eof => panic!("expected a lex error"),
            Ok(_) => {}
            Err(err) => return err,
        }
    }
}

#[test]
fn test_number_and_binary_positions() {
    let mut tokens = stream("10 + 0b101");

    let ten = tokens.next().unwrap();
    assert_eq!(ten.kind, TokenKind::Number(10));
    assert_eq!((ten.index, ten.span.start, ten.span.end), (0, 0, 2));

    let plus = tokens.next().unwrap();
    assert_eq!(plus.kind, TokenKind::Punctuation(Punct::Plus));
    assert_eq!((plus.index, plus.span.start), (1, 3));

    let five = tokens.next().unwrap();
    assert_eq!(five.kind, TokenKind::Binary(0b101));
    assert_eq!((five.index, five.span.start, five.span.end), (2, 5, 10));

    assert!(tokens.eof());
}

#[test]
fn test_positions_count_characters() {
    let mut tokens = stream("'ä' + x");

    let text = tokens.next().unwrap();
    assert_eq!((text.position, text.span.start, text.span.end), (0, 0, 4));

    let plus = tokens.next().unwrap();
    assert_eq!((plus.position, plus.span.start), (4, 5));

    let name = tokens.next().unwrap();
    assert_eq!((name.position, name.span.start), (6, 7));
}

#[test]
fn test_keywords() {
    assert_eq!(
        lex("define const include if else"),
        vec![
            TokenKind::Keyword(Keyword::Define),
            TokenKind::Keyword(Keyword::Const),
            TokenKind::Keyword(Keyword::Include),
            TokenKind::Keyword(Keyword::If),
            TokenKind::Keyword(Keyword::Else),
        ]
    );
}

#[test]
fn test_keyword_table_round_trips() {
    for keyword in Keyword::ALL {
        assert_eq!(Keyword::lookup(keyword.as_str()), Some(keyword));
    }
    assert_eq!(Keyword::lookup("Define"), None);
}

#[test]
fn test_literals() {
    assert_eq!(
        lex("42 ~110 true false 'text' \"more\""),
        vec![
            TokenKind::Number(42),
            TokenKind::Binary(6),
            TokenKind::Boolean(true),
            TokenKind::Boolean(false),
            TokenKind::Text("text".to_string()),
            TokenKind::Text("more".to_string()),
        ]
    );
}

#[test]
fn test_identifiers() {
    assert_eq!(
        lex("loop _tmp LDC defined"),
        vec![
            TokenKind::Identifier("loop".to_string()),
            TokenKind::Identifier("_tmp".to_string()),
            TokenKind::Identifier("LDC".to_string()),
            TokenKind::Identifier("defined".to_string()),
        ]
    );
}

#[test]
fn test_operators_prefer_longest_match() {
    use Punct::*;
    let kinds = lex("== = != ! <= < << >= > >> && & || | ^ %");
    let expected: Vec<TokenKind> = [
        EqEq, Assign, NotEq, Bang, Le, Lt, Shl, Ge, Gt, Shr, AmpAmp, Amp, PipePipe, Pipe, Caret,
        Percent,
    ]
    .into_iter()
    .map(TokenKind::Punctuation)
    .collect();
    assert_eq!(kinds, expected);
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        lex("# whole line\nLDC(1); # inline # HALT();"),
        vec![
            TokenKind::Identifier("LDC".to_string()),
            TokenKind::Punctuation(Punct::LParen),
            TokenKind::Number(1),
            TokenKind::Punctuation(Punct::RParen),
            TokenKind::Punctuation(Punct::Semicolon),
            TokenKind::Identifier("HALT".to_string()),
            TokenKind::Punctuation(Punct::LParen),
            TokenKind::Punctuation(Punct::RParen),
            TokenKind::Punctuation(Punct::Semicolon),
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        lex(r"'it\'s\n'"),
        vec![TokenKind::Text("it's\n".to_string())]
    );
}

#[test]
fn test_unexpected_character() {
    let err = lex_error("LDC(1);\n  @");
    assert_eq!(err.kind, ParseErrorKind::Lex);
    assert_eq!(err.code, syntax::UNEXPECTED_CHARACTER);
    assert_eq!((err.line(), err.column(), err.position()), (2, 3, 10));
}

#[test]
fn test_unterminated_string() {
    let err = lex_error("'open\n'");
    assert_eq!(err.code, syntax::UNTERMINATED_STRING);
    assert_eq!(err.position(), 0);
}

#[test]
fn test_invalid_numbers() {
    assert_eq!(lex_error("0b").code, syntax::INVALID_NUMBER);
    assert_eq!(lex_error("0b102").code, syntax::INVALID_NUMBER);
    assert_eq!(lex_error("12ab").code, syntax::INVALID_NUMBER);
    assert_eq!(
        lex_error("99999999999999999999").code,
        syntax::INVALID_NUMBER
    );
}

#[test]
fn test_eof_repeats_with_stable_index() {
    let mut tokens = stream("x");
    tokens.next().unwrap();
    let first = tokens.next().unwrap();
    let second = tokens.next().unwrap();
    assert_eq!(first.kind, TokenKind::Eof);
    assert_eq!(first, second);
    assert_eq!(first.index, 1);
}

#[test]
fn test_token_display() {
    assert_eq!(TokenKind::Punctuation(Punct::Semicolon).to_string(), "`;`");
    assert_eq!(TokenKind::Eof.to_string(), "end of input");
    assert_eq!(
        TokenKind::Keyword(Keyword::Define).to_string(),
        "keyword `define`"
    );
}
