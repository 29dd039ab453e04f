//! Unit tests for the parser module.
//!
//! Covers declarations, expressions, lvalues, control flow, desugarings and
//! parse errors.

use std::rc::Rc;

use crate::ast::ast::{DecKind, Exp, ExpKind, Operator, TypeExpKind, VarKind};
use crate::lexer::lexer::tokenize;

use super::parser::parse;

fn parse_source(source: &str) -> Result<Exp, crate::errors::errors::Error> {
    let tokens = tokenize(source.to_string(), Some("test.tig".to_string())).unwrap();
    let (_, result) = parse(tokens, Rc::new("test.tig".to_string()));
    result
}

#[test]
fn test_parse_literals() {
    assert!(matches!(parse_source("42").unwrap().kind, ExpKind::Int(42)));
    assert!(matches!(parse_source("nil").unwrap().kind, ExpKind::Nil));
    match parse_source("\"hi\"").unwrap().kind {
        ExpKind::Str(value) => assert_eq!(value, "hi"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_precedence() {
    // 1 + 2 * 3 = 7 parses as (1 + (2 * 3)) = 7
    let exp = parse_source("1 + 2 * 3 = 7").unwrap();

    let ExpKind::Binary { op, left, .. } = exp.kind else {
        panic!("expected comparison");
    };
    assert_eq!(op, Operator::Eq);

    let ExpKind::Binary { op, right, .. } = left.kind else {
        panic!("expected addition");
    };
    assert_eq!(op, Operator::Add);
    assert!(matches!(
        right.kind,
        ExpKind::Binary {
            op: Operator::Mul,
            ..
        }
    ));
}

#[test]
fn test_parse_left_associative_subtraction() {
    let exp = parse_source("10 - 3 - 2").unwrap();

    let ExpKind::Binary { op, left, right } = exp.kind else {
        panic!("expected subtraction");
    };
    assert_eq!(op, Operator::Sub);
    assert!(matches!(right.kind, ExpKind::Int(2)));
    assert!(matches!(
        left.kind,
        ExpKind::Binary {
            op: Operator::Sub,
            ..
        }
    ));
}

#[test]
fn test_parse_unary_minus() {
    let exp = parse_source("-5 * 2").unwrap();

    let ExpKind::Binary { op, left, .. } = exp.kind else {
        panic!("expected multiplication");
    };
    assert_eq!(op, Operator::Mul);
    let ExpKind::Binary { op, left, right } = left.kind else {
        panic!("expected negation");
    };
    assert_eq!(op, Operator::Sub);
    assert!(matches!(left.kind, ExpKind::Int(0)));
    assert!(matches!(right.kind, ExpKind::Int(5)));
}

#[test]
fn test_parse_logical_desugaring() {
    let exp = parse_source("1 & 2 | 3").unwrap();

    // (1 & 2) | 3  =>  if (if 1 then 2 else 0) then 1 else 3
    let ExpKind::If {
        test,
        then,
        otherwise,
    } = exp.kind
    else {
        panic!("expected if");
    };
    assert!(matches!(then.kind, ExpKind::Int(1)));
    assert!(matches!(otherwise.unwrap().kind, ExpKind::Int(3)));

    let ExpKind::If {
        then, otherwise, ..
    } = test.kind
    else {
        panic!("expected nested if");
    };
    assert!(matches!(then.kind, ExpKind::Int(2)));
    assert!(matches!(otherwise.unwrap().kind, ExpKind::Int(0)));
}

#[test]
fn test_parse_let_with_declarations() {
    let source = "let type list = { head: int, tail: list } \
                  type ints = array of int \
                  type name = string \
                  var x : int := 1 \
                  function f(a: int, b: string) : int = a \
                  in f(x, \"s\"); x end";
    let exp = parse_source(source).unwrap();

    let ExpKind::Let { decs, body } = exp.kind else {
        panic!("expected let");
    };
    assert_eq!(decs.len(), 5);

    match &decs[0].kind {
        DecKind::Type { name, ty } => {
            assert_eq!(name, "list");
            let TypeExpKind::Record(fields) = &ty.kind else {
                panic!("expected record type");
            };
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[1].name, "tail");
            assert_eq!(fields[1].type_name, "list");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        &decs[1].kind,
        DecKind::Type { ty, .. } if matches!(&ty.kind, TypeExpKind::Array(elem) if elem == "int")
    ));
    assert!(matches!(
        &decs[2].kind,
        DecKind::Type { ty, .. } if matches!(&ty.kind, TypeExpKind::Name(name) if name == "string")
    ));
    assert!(matches!(
        &decs[3].kind,
        DecKind::Var { name, type_name: Some(ty), .. } if name == "x" && ty == "int"
    ));
    match &decs[4].kind {
        DecKind::Function {
            name,
            params,
            result,
            ..
        } => {
            assert_eq!(name, "f");
            assert_eq!(params.len(), 2);
            assert_eq!(result.as_deref(), Some("int"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let ExpKind::Sequence(exps) = body.kind else {
        panic!("expected sequence body");
    };
    assert_eq!(exps.len(), 2);
}

#[test]
fn test_parse_single_expression_let_body_is_not_wrapped() {
    let exp = parse_source("let var a := 5 in a + 1 end").unwrap();

    let ExpKind::Let { body, .. } = exp.kind else {
        panic!("expected let");
    };
    assert!(matches!(body.kind, ExpKind::Binary { .. }));
}

#[test]
fn test_parse_empty_sequence() {
    let exp = parse_source("()").unwrap();
    assert!(matches!(exp.kind, ExpKind::Sequence(ref exps) if exps.is_empty()));

    let exp = parse_source("(1)").unwrap();
    assert!(matches!(exp.kind, ExpKind::Int(1)));
}

#[test]
fn test_parse_lvalues() {
    let exp = parse_source("a.b[1].c := 2").unwrap();

    let ExpKind::Assign { var, exp } = exp.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(exp.kind, ExpKind::Int(2)));

    let VarKind::Field(base, field) = var.kind else {
        panic!("expected field");
    };
    assert_eq!(field, "c");
    let VarKind::Subscript(base, _) = base.kind else {
        panic!("expected subscript");
    };
    let VarKind::Field(base, field) = base.kind else {
        panic!("expected field");
    };
    assert_eq!(field, "b");
    assert!(matches!(base.kind, VarKind::Simple(ref name) if name == "a"));
}

#[test]
fn test_parse_array_creation_versus_subscript() {
    let exp = parse_source("ints [10] of 0").unwrap();
    assert!(matches!(exp.kind, ExpKind::Array { ref type_name, .. } if type_name == "ints"));

    let exp = parse_source("ints [10]").unwrap();
    let ExpKind::Var(var) = exp.kind else {
        panic!("expected variable");
    };
    assert!(matches!(var.kind, VarKind::Subscript(..)));
}

#[test]
fn test_parse_record_creation() {
    let exp = parse_source("point { x = 1, y = 2 }").unwrap();

    let ExpKind::Record { type_name, fields } = exp.kind else {
        panic!("expected record");
    };
    assert_eq!(type_name, "point");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "x");
    assert_eq!(fields[1].name, "y");

    let exp = parse_source("empty {}").unwrap();
    assert!(matches!(exp.kind, ExpKind::Record { ref fields, .. } if fields.is_empty()));
}

#[test]
fn test_parse_calls() {
    let exp = parse_source("f()").unwrap();
    assert!(matches!(exp.kind, ExpKind::Call { ref args, .. } if args.is_empty()));

    let exp = parse_source("substring(s, 1, 2)").unwrap();
    assert!(matches!(exp.kind, ExpKind::Call { ref func, ref args } if func == "substring" && args.len() == 3));
}

#[test]
fn test_parse_control_flow() {
    assert!(matches!(
        parse_source("if a then b else c").unwrap().kind,
        ExpKind::If {
            otherwise: Some(_),
            ..
        }
    ));
    assert!(matches!(
        parse_source("while i < 10 do i := i + 1").unwrap().kind,
        ExpKind::While { .. }
    ));
    assert!(matches!(
        parse_source("for i := 0 to 9 do (print(\"x\"); break)").unwrap().kind,
        ExpKind::For { ref var, .. } if var == "i"
    ));
}

#[test]
fn test_parse_dangling_else_binds_inner() {
    let exp = parse_source("if a then if b then c else d").unwrap();

    let ExpKind::If {
        then, otherwise, ..
    } = exp.kind
    else {
        panic!("expected if");
    };
    assert!(otherwise.is_none());
    assert!(matches!(
        then.kind,
        ExpKind::If {
            otherwise: Some(_),
            ..
        }
    ));
}

#[test]
fn test_node_ids_are_unique() {
    let exp = parse_source("let var a := 1 in a + a end").unwrap();
    let let_id = exp.id;

    let ExpKind::Let { decs, body } = exp.kind else {
        panic!("expected let");
    };
    let body_id = body.id;
    let ExpKind::Binary { left, right, .. } = body.kind else {
        panic!("expected binary");
    };
    let ids = [let_id, decs[0].id, body_id, left.id, right.id];
    for (i, a) in ids.iter().enumerate() {
        for b in ids.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_spans_cover_the_expression() {
    let exp = parse_source("  foo(1, 2)  ").unwrap();

    assert_eq!(exp.span.start.0, 2);
    assert_eq!(exp.span.end.0, 11);
}

#[test]
fn test_parse_errors() {
    let error = parse_source("let var := 1 in end").err().unwrap();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");

    let error = parse_source("if 1 2").err().unwrap();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");

    let error = parse_source("1 2").err().unwrap();
    assert_eq!(error.get_error_name(), "UnexpectedToken");

    let error = parse_source("99999999999999999999").err().unwrap();
    assert_eq!(error.get_error_name(), "NumberParseError");
}
