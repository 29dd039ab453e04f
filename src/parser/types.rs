//! Type expression parsing.
//!
//! This module handles the right-hand side of `type` declarations:
//!
//! - Type names (`int`, `list`)
//! - Record types (`{ head: int, tail: list }`)
//! - Array types (`array of int`)
//!
//! Like expressions, each form is dispatched through a lookup table keyed
//! by its leading token.

use std::collections::HashMap;

use crate::{
    ast::ast::{TypeExp, TypeExpKind},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{decl::parse_type_fields, parser::Parser};

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeExp, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Initializes the type parsing lookup table.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_name_type);
    parser.type_nud(TokenKind::OpenCurly, parse_record_type);
    parser.type_nud(TokenKind::Array, parse_array_type);
}

pub fn parse_name_type(parser: &mut Parser) -> Result<TypeExp, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    Ok(TypeExp {
        span: token.span.clone(),
        kind: TypeExpKind::Name(token.value),
    })
}

pub fn parse_record_type(parser: &mut Parser) -> Result<TypeExp, Error> {
    let start = parser.advance().span.start.clone();
    let fields = parse_type_fields(parser, TokenKind::CloseCurly)?;
    parser.expect(TokenKind::CloseCurly)?;

    Ok(TypeExp {
        span: parser.span_from(start),
        kind: TypeExpKind::Record(fields),
    })
}

pub fn parse_array_type(parser: &mut Parser) -> Result<TypeExp, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::Of)?;
    let element = parser.expect_identifier("for array element type")?;

    Ok(TypeExp {
        span: parser.span_from(start),
        kind: TypeExpKind::Array(element),
    })
}

pub fn parse_type(parser: &mut Parser) -> Result<TypeExp, Error> {
    let token_kind = parser.current_token_kind();
    let handler = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(handler) => *handler,
        None => return Err(parser.unexpected()),
    };

    handler(parser)
}
