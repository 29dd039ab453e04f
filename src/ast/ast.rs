//! Syntax tree for Tiger programs.
//!
//! Every node owns its children and carries a parser-assigned [`NodeId`]
//! that later passes use as the key of their side tables.

use std::fmt::Display;

use crate::Span;

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Var {
    pub id: NodeId,
    pub span: Span,
    pub kind: VarKind,
}

#[derive(Debug, Clone)]
pub enum VarKind {
    Simple(String),
    Field(Box<Var>, String),
    Subscript(Box<Var>, Box<Exp>),
}

#[derive(Debug, Clone)]
pub struct Exp {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExpKind,
}

#[derive(Debug, Clone)]
pub enum ExpKind {
    Nil,
    Int(i64),
    Str(String),
    Var(Box<Var>),
    Call {
        func: String,
        args: Vec<Exp>,
    },
    Binary {
        op: Operator,
        left: Box<Exp>,
        right: Box<Exp>,
    },
    Record {
        type_name: String,
        fields: Vec<FieldExp>,
    },
    Sequence(Vec<Exp>),
    Assign {
        var: Box<Var>,
        exp: Box<Exp>,
    },
    If {
        test: Box<Exp>,
        then: Box<Exp>,
        otherwise: Option<Box<Exp>>,
    },
    While {
        test: Box<Exp>,
        body: Box<Exp>,
    },
    For {
        var: String,
        lo: Box<Exp>,
        hi: Box<Exp>,
        body: Box<Exp>,
    },
    Break,
    Let {
        decs: Vec<Dec>,
        body: Box<Exp>,
    },
    Array {
        type_name: String,
        size: Box<Exp>,
        init: Box<Exp>,
    },
}

/// `name = exp` inside a record construction.
#[derive(Debug, Clone)]
pub struct FieldExp {
    pub name: String,
    pub exp: Exp,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Dec {
    pub id: NodeId,
    pub span: Span,
    pub kind: DecKind,
}

#[derive(Debug, Clone)]
pub enum DecKind {
    Var {
        name: String,
        type_name: Option<String>,
        init: Exp,
    },
    Type {
        name: String,
        ty: TypeExp,
    },
    Function {
        name: String,
        params: Vec<Field>,
        result: Option<String>,
        body: Exp,
    },
}

/// `name : type_name` in a record type or parameter list.
#[derive(Debug, Clone)]
pub struct Field {
    pub id: NodeId,
    pub name: String,
    pub type_name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeExp {
    pub span: Span,
    pub kind: TypeExpKind,
}

#[derive(Debug, Clone)]
pub enum TypeExpKind {
    Name(String),
    Record(Vec<Field>),
    Array(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq | Operator::Neq)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

impl Exp {
    /// Every function declaration directly in this expression's `let`s and below.
    pub fn function_count(&self) -> usize {
        let mut count = 0;
        visit_decs(self, &mut |dec| {
            if matches!(dec.kind, DecKind::Function { .. }) {
                count += 1;
            }
        });
        count
    }
}

/// Calls `visit` for every declaration in the tree, outermost first.
pub fn visit_decs(exp: &Exp, visit: &mut dyn FnMut(&Dec)) {
    match &exp.kind {
        ExpKind::Nil | ExpKind::Int(_) | ExpKind::Str(_) | ExpKind::Break => {}
        ExpKind::Var(var) => visit_var_decs(var, visit),
        ExpKind::Call { args, .. } => args.iter().for_each(|arg| visit_decs(arg, visit)),
        ExpKind::Binary { left, right, .. } => {
            visit_decs(left, visit);
            visit_decs(right, visit);
        }
        ExpKind::Record { fields, .. } => fields
            .iter()
            .for_each(|field| visit_decs(&field.exp, visit)),
        ExpKind::Sequence(exps) => exps.iter().for_each(|exp| visit_decs(exp, visit)),
        ExpKind::Assign { var, exp } => {
            visit_var_decs(var, visit);
            visit_decs(exp, visit);
        }
        ExpKind::If {
            test,
            then,
            otherwise,
        } => {
            visit_decs(test, visit);
            visit_decs(then, visit);
            if let Some(otherwise) = otherwise {
                visit_decs(otherwise, visit);
            }
        }
        ExpKind::While { test, body } => {
            visit_decs(test, visit);
            visit_decs(body, visit);
        }
        ExpKind::For { lo, hi, body, .. } => {
            visit_decs(lo, visit);
            visit_decs(hi, visit);
            visit_decs(body, visit);
        }
        ExpKind::Let { decs, body } => {
            for dec in decs {
                visit(dec);
                match &dec.kind {
                    DecKind::Var { init, .. } => visit_decs(init, visit),
                    DecKind::Function { body, .. } => visit_decs(body, visit),
                    DecKind::Type { .. } => {}
                }
            }
            visit_decs(body, visit);
        }
        ExpKind::Array { size, init, .. } => {
            visit_decs(size, visit);
            visit_decs(init, visit);
        }
    }
}

fn visit_var_decs(var: &Var, visit: &mut dyn FnMut(&Dec)) {
    match &var.kind {
        VarKind::Simple(_) => {}
        VarKind::Field(base, _) => visit_var_decs(base, visit),
        VarKind::Subscript(base, index) => {
            visit_var_decs(base, visit);
            visit_decs(index, visit);
        }
    }
}
