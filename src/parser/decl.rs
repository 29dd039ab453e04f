use crate::{
    ast::ast::{Dec, DecKind, Field},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

/// `name : type-id` lists, as used by parameters and record types.
pub fn parse_type_fields(parser: &mut Parser, terminator: TokenKind) -> Result<Vec<Field>, Error> {
    let mut fields = vec![];

    while parser.current_token_kind() != terminator {
        let start = parser.get_position();
        let name = parser.expect_identifier("for field name")?;
        parser.expect(TokenKind::Colon)?;
        let type_name = parser.expect_identifier("for field type")?;

        fields.push(Field {
            id: parser.advance_id(),
            name,
            type_name,
            span: parser.span_from(start),
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    Ok(fields)
}

pub fn parse_type_dec(parser: &mut Parser) -> Result<Dec, Error> {
    let start = parser.advance().span.start.clone();

    let name = parser.expect_identifier("during type declaration")?;
    parser.expect(TokenKind::Equals)?;
    let ty = parse_type(parser)?;

    Ok(Dec {
        id: parser.advance_id(),
        span: parser.span_from(start),
        kind: DecKind::Type { name, ty },
    })
}

pub fn parse_var_dec(parser: &mut Parser) -> Result<Dec, Error> {
    let start = parser.advance().span.start.clone();

    let name = parser.expect_identifier("during variable declaration")?;

    let type_name = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        Some(parser.expect_identifier("for variable type")?)
    } else {
        None
    };

    parser.expect(TokenKind::Assignment)?;
    let init = parse_expr(parser, BindingPower::Default)?;

    Ok(Dec {
        id: parser.advance_id(),
        span: parser.span_from(start),
        kind: DecKind::Var {
            name,
            type_name,
            init,
        },
    })
}

pub fn parse_function_dec(parser: &mut Parser) -> Result<Dec, Error> {
    let start = parser.advance().span.start.clone();

    let name = parser.expect_identifier("during function declaration")?;

    parser.expect(TokenKind::OpenParen)?;
    let params = parse_type_fields(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;

    let result = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        Some(parser.expect_identifier("for return type")?)
    } else {
        None
    };

    parser.expect(TokenKind::Equals)?;
    let body = parse_expr(parser, BindingPower::Default)?;

    Ok(Dec {
        id: parser.advance_id(),
        span: parser.span_from(start),
        kind: DecKind::Function {
            name,
            params,
            result,
            body,
        },
    })
}
