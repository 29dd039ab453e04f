//! Indented text rendering of the syntax tree, one node per line.

use super::ast::{Dec, DecKind, Exp, ExpKind, Field, TypeExpKind, Var, VarKind};

pub fn display_tree(exp: &Exp) -> String {
    let mut out = String::new();
    write_exp(&mut out, exp, 0);
    out
}

fn line(out: &mut String, depth: usize, text: &str) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(text);
    out.push('\n');
}

fn write_exp(out: &mut String, exp: &Exp, depth: usize) {
    match &exp.kind {
        ExpKind::Nil => line(out, depth, "NilExp"),
        ExpKind::Int(value) => line(out, depth, &format!("IntExp {}", value)),
        ExpKind::Str(value) => line(out, depth, &format!("StringExp {:?}", value)),
        ExpKind::Var(var) => {
            line(out, depth, "VarExp");
            write_var(out, var, depth + 1);
        }
        ExpKind::Call { func, args } => {
            line(out, depth, &format!("CallExp {}", func));
            for arg in args {
                write_exp(out, arg, depth + 1);
            }
        }
        ExpKind::Binary { op, left, right } => {
            line(out, depth, &format!("BinaryExp {}", op));
            write_exp(out, left, depth + 1);
            write_exp(out, right, depth + 1);
        }
        ExpKind::Record { type_name, fields } => {
            line(out, depth, &format!("RecordExp {}", type_name));
            for field in fields {
                line(out, depth + 1, &format!("Field {}", field.name));
                write_exp(out, &field.exp, depth + 2);
            }
        }
        ExpKind::Sequence(exps) => {
            line(out, depth, "SequenceExp");
            for exp in exps {
                write_exp(out, exp, depth + 1);
            }
        }
        ExpKind::Assign { var, exp } => {
            line(out, depth, "AssignExp");
            write_var(out, var, depth + 1);
            write_exp(out, exp, depth + 1);
        }
        ExpKind::If {
            test,
            then,
            otherwise,
        } => {
            line(out, depth, "IfExp");
            write_exp(out, test, depth + 1);
            write_exp(out, then, depth + 1);
            if let Some(otherwise) = otherwise {
                write_exp(out, otherwise, depth + 1);
            }
        }
        ExpKind::While { test, body } => {
            line(out, depth, "WhileExp");
            write_exp(out, test, depth + 1);
            write_exp(out, body, depth + 1);
        }
        ExpKind::For { var, lo, hi, body } => {
            line(out, depth, &format!("ForExp {}", var));
            write_exp(out, lo, depth + 1);
            write_exp(out, hi, depth + 1);
            write_exp(out, body, depth + 1);
        }
        ExpKind::Break => line(out, depth, "BreakExp"),
        ExpKind::Let { decs, body } => {
            line(out, depth, "LetExp");
            for dec in decs {
                write_dec(out, dec, depth + 1);
            }
            write_exp(out, body, depth + 1);
        }
        ExpKind::Array {
            type_name,
            size,
            init,
        } => {
            line(out, depth, &format!("ArrayExp {}", type_name));
            write_exp(out, size, depth + 1);
            write_exp(out, init, depth + 1);
        }
    }
}

fn write_var(out: &mut String, var: &Var, depth: usize) {
    match &var.kind {
        VarKind::Simple(name) => line(out, depth, &format!("SimpleVar {}", name)),
        VarKind::Field(base, field) => {
            line(out, depth, &format!("FieldVar {}", field));
            write_var(out, base, depth + 1);
        }
        VarKind::Subscript(base, index) => {
            line(out, depth, "SubscriptVar");
            write_var(out, base, depth + 1);
            write_exp(out, index, depth + 1);
        }
    }
}

fn write_fields(out: &mut String, fields: &[Field], depth: usize) {
    for field in fields {
        line(out, depth, &format!("Field {}: {}", field.name, field.type_name));
    }
}

fn write_dec(out: &mut String, dec: &Dec, depth: usize) {
    match &dec.kind {
        DecKind::Var {
            name,
            type_name,
            init,
        } => {
            match type_name {
                Some(type_name) => line(out, depth, &format!("VarDec {}: {}", name, type_name)),
                None => line(out, depth, &format!("VarDec {}", name)),
            }
            write_exp(out, init, depth + 1);
        }
        DecKind::Type { name, ty } => {
            line(out, depth, &format!("TypeDec {}", name));
            match &ty.kind {
                TypeExpKind::Name(name) => line(out, depth + 1, &format!("NameType {}", name)),
                TypeExpKind::Array(name) => line(out, depth + 1, &format!("ArrayType {}", name)),
                TypeExpKind::Record(fields) => {
                    line(out, depth + 1, "RecordType");
                    write_fields(out, fields, depth + 2);
                }
            }
        }
        DecKind::Function {
            name,
            params,
            result,
            body,
        } => {
            match result {
                Some(result) => line(out, depth, &format!("FunctionDec {}: {}", name, result)),
                None => line(out, depth, &format!("FunctionDec {}", name)),
            }
            write_fields(out, params, depth + 1);
            write_exp(out, body, depth + 1);
        }
    }
}
