//! Unit tests for the lexer module.
//!
//! Covers keywords, identifiers, literals, operators, comments and the
//! error cases the lexer reports itself.

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.tig".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "array break do else end for function if in let nil of then to type var while";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Array,
            TokenKind::Break,
            TokenKind::Do,
            TokenKind::Else,
            TokenKind::End,
            TokenKind::For,
            TokenKind::Function,
            TokenKind::If,
            TokenKind::In,
            TokenKind::Let,
            TokenKind::Nil,
            TokenKind::Of,
            TokenKind::Then,
            TokenKind::To,
            TokenKind::Type,
            TokenKind::Var,
            TokenKind::While,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 CamelCase letter".to_string();
    let tokens = tokenize(source, Some("test.tig".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "CamelCase");
    // A keyword prefix does not split an identifier.
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].value, "letter");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 0 1000".to_string();
    let tokens = tokenize(source, Some("test.tig".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "0");
    assert_eq!(tokens[2].value, "1000");
}

#[test]
fn test_tokenize_strings() {
    let source = r#""hello" "two words" """#.to_string();
    let tokens = tokenize(source, Some("test.tig".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].value, "two words");
    assert_eq!(tokens[2].value, "");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_string_escapes() {
    let source = r#""a\nb\t\"q\"\\ \065""#.to_string();
    let tokens = tokenize(source, Some("test.tig".to_string())).unwrap();

    assert_eq!(tokens[0].value, "a\nb\t\"q\"\\ A");
}

#[test]
fn test_tokenize_bad_escape() {
    let result = tokenize(r#""\q""#.to_string(), Some("test.tig".to_string()));

    assert_eq!(
        result.err().unwrap().get_error_name(),
        "UnexpectedTokenDetailed"
    );
}

#[test]
fn test_tokenize_character_code_range() {
    let tokens = tokenize(r#""\127""#.to_string(), Some("test.tig".to_string())).unwrap();
    assert_eq!(tokens[0].value.as_bytes(), &[127]);

    for source in [r#""\128""#, r#""\200""#, r#""\255""#, r#""\12""#] {
        let result = tokenize(source.to_string(), Some("test.tig".to_string()));
        assert_eq!(
            result.err().unwrap().get_error_name(),
            "UnexpectedTokenDetailed"
        );
    }
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds(":= : = <> < <= > >= + - * / & | . , ;"),
        vec![
            TokenKind::Assignment,
            TokenKind::Colon,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::LessEquals,
            TokenKind::Greater,
            TokenKind::GreaterEquals,
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_brackets() {
    assert_eq!(
        kinds("( ) [ ] { }"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_without_spaces() {
    assert_eq!(
        kinds("a:=b[1]+2"),
        vec![
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Identifier,
            TokenKind::OpenBracket,
            TokenKind::Number,
            TokenKind::CloseBracket,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_nested_comments() {
    assert_eq!(
        kinds("1 /* outer /* inner */ still outer */ 2"),
        vec![TokenKind::Number, TokenKind::Number, TokenKind::EOF]
    );
}

#[test]
fn test_tokenize_unterminated_comment() {
    let result = tokenize("1 /* open /* */".to_string(), Some("test.tig".to_string()));

    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "UnterminatedComment");
    assert_eq!(error.get_position().0, 2);
}

#[test]
fn test_tokenize_unrecognised() {
    let result = tokenize("a # b".to_string(), Some("test.tig".to_string()));

    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 2);
}

#[test]
fn test_token_spans() {
    let tokens = tokenize("var x := \"ab\"".to_string(), Some("test.tig".to_string())).unwrap();

    assert_eq!(tokens[1].span.start.0, 4);
    assert_eq!(tokens[1].span.end.0, 5);
    assert_eq!(tokens[3].span.start.0, 9);
    assert_eq!(tokens[3].span.end.0, 13);
    assert_eq!(tokens[3].span.start.1.as_str(), "test.tig");
}

#[test]
fn test_tokenize_default_file_name() {
    let tokens = tokenize("nil".to_string(), None).unwrap();

    assert_eq!(tokens[0].span.start.1.as_str(), "shell");
}
