use crate::{
    ast::ast::{Exp, ExpKind, FieldExp, Operator, Var, VarKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Position,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Exp, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected()),
    };

    let mut left = nud(parser)?;

    // While the next operator binds tighter than the caller, keep folding into lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected()),
        };
        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.get_position();

    let kind = match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.current_token().value.clone();
            match token.parse::<i64>() {
                Ok(value) => ExpKind::Int(value),
                Err(_) => {
                    return Err(Error::new(
                        ErrorImpl::NumberParseError { token },
                        parser.get_position(),
                    ))
                }
            }
        }
        TokenKind::String => ExpKind::Str(parser.current_token().value.clone()),
        TokenKind::Nil => ExpKind::Nil,
        _ => return Err(parser.unexpected()),
    };

    parser.advance();
    Ok(parser.mk_exp(kind, start))
}

/// Identifier-led forms: variables, assignment, calls, record and array construction.
pub fn parse_identifier_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.get_position();
    let name = parser.advance().value.clone();

    match parser.current_token_kind() {
        TokenKind::OpenParen => return parse_call_expr(parser, name, start),
        TokenKind::OpenCurly => return parse_record_expr(parser, name, start),
        _ => {}
    }

    let mut var = Var {
        id: parser.advance_id(),
        span: parser.span_from(start.clone()),
        kind: VarKind::Simple(name.clone()),
    };

    if parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        let index = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::CloseBracket)?;

        if parser.current_token_kind() == TokenKind::Of {
            parser.advance();
            let init = parse_expr(parser, BindingPower::Default)?;
            return Ok(parser.mk_exp(
                ExpKind::Array {
                    type_name: name,
                    size: Box::new(index),
                    init: Box::new(init),
                },
                start,
            ));
        }

        var = Var {
            id: parser.advance_id(),
            span: parser.span_from(start.clone()),
            kind: VarKind::Subscript(Box::new(var), Box::new(index)),
        };
    }

    let var = parse_lvalue_suffix(parser, var, start.clone())?;

    if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        let exp = parse_expr(parser, BindingPower::Default)?;
        return Ok(parser.mk_exp(
            ExpKind::Assign {
                var: Box::new(var),
                exp: Box::new(exp),
            },
            start,
        ));
    }

    Ok(parser.mk_exp(ExpKind::Var(Box::new(var)), start))
}

fn parse_lvalue_suffix(parser: &mut Parser, mut var: Var, start: Position) -> Result<Var, Error> {
    loop {
        match parser.current_token_kind() {
            TokenKind::Dot => {
                parser.advance();
                let field = parser.expect_identifier("after `.`")?;
                var = Var {
                    id: parser.advance_id(),
                    span: parser.span_from(start.clone()),
                    kind: VarKind::Field(Box::new(var), field),
                };
            }
            TokenKind::OpenBracket => {
                parser.advance();
                let index = parse_expr(parser, BindingPower::Default)?;
                parser.expect(TokenKind::CloseBracket)?;
                var = Var {
                    id: parser.advance_id(),
                    span: parser.span_from(start.clone()),
                    kind: VarKind::Subscript(Box::new(var), Box::new(index)),
                };
            }
            _ => return Ok(var),
        }
    }
}

fn parse_call_expr(parser: &mut Parser, func: String, start: Position) -> Result<Exp, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut args = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(parser.mk_exp(ExpKind::Call { func, args }, start))
}

fn parse_record_expr(parser: &mut Parser, type_name: String, start: Position) -> Result<Exp, Error> {
    // point { x = 1, y = 2 }
    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = vec![];

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let field_start = parser.get_position();
        let name = parser.expect_identifier("in record field")?;
        parser.expect(TokenKind::Equals)?;
        let exp = parse_expr(parser, BindingPower::Default)?;

        fields.push(FieldExp {
            name,
            exp,
            span: parser.span_from(field_start),
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(parser.mk_exp(ExpKind::Record { type_name, fields }, start))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Exp, bp: BindingPower) -> Result<Exp, Error> {
    let op = match parser.current_token_kind() {
        TokenKind::Plus => Operator::Add,
        TokenKind::Dash => Operator::Sub,
        TokenKind::Star => Operator::Mul,
        TokenKind::Slash => Operator::Div,
        TokenKind::Equals => Operator::Eq,
        TokenKind::NotEquals => Operator::Neq,
        TokenKind::Less => Operator::Lt,
        TokenKind::LessEquals => Operator::Le,
        TokenKind::Greater => Operator::Gt,
        TokenKind::GreaterEquals => Operator::Ge,
        _ => return Err(parser.unexpected()),
    };
    parser.advance();

    let right = parse_expr(parser, bp)?;
    let start = left.span.start.clone();

    Ok(parser.mk_exp(
        ExpKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        start,
    ))
}

/// `a & b` becomes `if a then b else 0`, `a | b` becomes `if a then 1 else b`.
pub fn parse_logical_expr(parser: &mut Parser, left: Exp, bp: BindingPower) -> Result<Exp, Error> {
    let operator = parser.advance().clone();
    let right = parse_expr(parser, bp)?;
    let start = left.span.start.clone();

    let constant = |parser: &mut Parser, value: i64| Exp {
        id: parser.advance_id(),
        span: operator.span.clone(),
        kind: ExpKind::Int(value),
    };

    let kind = if operator.kind == TokenKind::And {
        ExpKind::If {
            test: Box::new(left),
            then: Box::new(right),
            otherwise: Some(Box::new(constant(parser, 0))),
        }
    } else {
        ExpKind::If {
            test: Box::new(left),
            then: Box::new(constant(parser, 1)),
            otherwise: Some(Box::new(right)),
        }
    };

    Ok(parser.mk_exp(kind, start))
}

/// Unary minus, lowered to `0 - operand`.
pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let operator = parser.advance().clone();
    let operand = parse_expr(parser, BindingPower::Unary)?;

    let zero = Exp {
        id: parser.advance_id(),
        span: operator.span.clone(),
        kind: ExpKind::Int(0),
    };

    Ok(parser.mk_exp(
        ExpKind::Binary {
            op: Operator::Sub,
            left: Box::new(zero),
            right: Box::new(operand),
        },
        operator.span.start,
    ))
}

/// Parses `exp ; exp ; ...` up to (not including) `terminator`.
fn parse_expr_sequence(parser: &mut Parser, terminator: TokenKind) -> Result<Vec<Exp>, Error> {
    let mut exps = vec![];

    if parser.current_token_kind() == terminator {
        return Ok(exps);
    }

    exps.push(parse_expr(parser, BindingPower::Default)?);
    while parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        exps.push(parse_expr(parser, BindingPower::Default)?);
    }

    Ok(exps)
}

fn sequence_or_single(parser: &mut Parser, mut exps: Vec<Exp>, start: Position) -> Exp {
    if exps.len() == 1 {
        if let Some(exp) = exps.pop() {
            return exp;
        }
    }
    parser.mk_exp(ExpKind::Sequence(exps), start)
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.advance().span.start.clone();
    let exps = parse_expr_sequence(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(sequence_or_single(parser, exps, start))
}

pub fn parse_if_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.advance().span.start.clone();

    let test = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Then)?;
    let then = parse_expr(parser, BindingPower::Default)?;

    let otherwise = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_expr(parser, BindingPower::Default)?))
    } else {
        None
    };

    Ok(parser.mk_exp(
        ExpKind::If {
            test: Box::new(test),
            then: Box::new(then),
            otherwise,
        },
        start,
    ))
}

pub fn parse_while_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.advance().span.start.clone();

    let test = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_expr(parser, BindingPower::Default)?;

    Ok(parser.mk_exp(
        ExpKind::While {
            test: Box::new(test),
            body: Box::new(body),
        },
        start,
    ))
}

pub fn parse_for_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.advance().span.start.clone();

    let var = parser.expect_identifier("after `for`")?;
    parser.expect(TokenKind::Assignment)?;
    let lo = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::To)?;
    let hi = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_expr(parser, BindingPower::Default)?;

    Ok(parser.mk_exp(
        ExpKind::For {
            var,
            lo: Box::new(lo),
            hi: Box::new(hi),
            body: Box::new(body),
        },
        start,
    ))
}

pub fn parse_break_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.advance().span.start.clone();
    Ok(parser.mk_exp(ExpKind::Break, start))
}

pub fn parse_let_expr(parser: &mut Parser) -> Result<Exp, Error> {
    let start = parser.advance().span.start.clone();

    let mut decs = vec![];
    loop {
        let handler = match parser.get_dec_lookup().get(&parser.current_token_kind()) {
            Some(handler) => *handler,
            None => break,
        };
        decs.push(handler(parser)?);
    }

    parser.expect(TokenKind::In)?;
    let body_start = parser.get_position();
    let exps = parse_expr_sequence(parser, TokenKind::End)?;
    let body = sequence_or_single(parser, exps, body_start);
    parser.expect(TokenKind::End)?;

    Ok(parser.mk_exp(
        ExpKind::Let {
            decs,
            body: Box::new(body),
        },
        start,
    ))
}
