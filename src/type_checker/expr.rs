use crate::{
    ast::ast::{Exp, ExpKind, FieldExp, Operator, Var, VarKind},
    errors::errors::{ErrorImpl, NameKind},
    Position,
};

use super::{
    annotations::VarRef,
    type_checker::{TypeChecker, VarEntry},
    types::Ty,
};

impl TypeChecker {
    /// Computes the type of `exp`, recording it in the side table.
    ///
    /// Never fails: problems are reported and the node gets [`Ty::Error`].
    pub fn check_exp(&mut self, exp: &Exp) -> Ty {
        let ty = self.check_exp_kind(exp);
        self.annotations.exp_types.insert(exp.id, ty);
        ty
    }

    fn check_exp_kind(&mut self, exp: &Exp) -> Ty {
        let position = &exp.span.start;

        match &exp.kind {
            ExpKind::Nil => Ty::Nil,
            ExpKind::Int(_) => Ty::Int,
            ExpKind::Str(_) => Ty::String,
            ExpKind::Var(var) => self.check_var(var),
            ExpKind::Call { func, args } => self.check_call(exp, func, args),
            ExpKind::Binary { op, left, right } => {
                let left_type = self.check_exp(left);
                let right_type = self.check_exp(right);
                self.check_binary(*op, left_type, right_type, &right.span.start)
            }
            ExpKind::Record { type_name, fields } => self.check_record(type_name, fields, position),
            ExpKind::Sequence(exps) => {
                let mut ty = Ty::Void;
                for exp in exps {
                    ty = self.check_exp(exp);
                }
                ty
            }
            ExpKind::Assign { var, exp } => {
                let var_type = self.check_var(var);
                let exp_type = self.check_exp(exp);

                if let VarKind::Simple(name) = &var.kind {
                    if self.values.lookup(name).is_some_and(|entry| entry.read_only) {
                        self.report(
                            ErrorImpl::KindError {
                                message: format!("loop variable `{}` cannot be assigned", name),
                            },
                            var.span.start.clone(),
                        );
                    }
                }
                self.expect_type(var_type, exp_type, &exp.span.start);
                Ty::Void
            }
            ExpKind::If {
                test,
                then,
                otherwise,
            } => {
                let test_type = self.check_exp(test);
                self.expect_type(Ty::Int, test_type, &test.span.start);
                let then_type = self.check_exp(then);

                match otherwise {
                    Some(otherwise) => {
                        let else_type = self.check_exp(otherwise);
                        if !self.expect_type(then_type, else_type, &otherwise.span.start) {
                            return Ty::Error;
                        }
                        match then_type {
                            Ty::Nil | Ty::Error => else_type,
                            _ => then_type,
                        }
                    }
                    None => {
                        self.expect_type(Ty::Void, then_type, &then.span.start);
                        Ty::Void
                    }
                }
            }
            ExpKind::While { test, body } => {
                let test_type = self.check_exp(test);
                self.expect_type(Ty::Int, test_type, &test.span.start);

                self.loop_depth += 1;
                let body_type = self.check_exp(body);
                self.loop_depth -= 1;
                self.expect_type(Ty::Void, body_type, &body.span.start);
                Ty::Void
            }
            ExpKind::For { var, lo, hi, body } => {
                let lo_type = self.check_exp(lo);
                self.expect_type(Ty::Int, lo_type, &lo.span.start);
                let hi_type = self.check_exp(hi);
                self.expect_type(Ty::Int, hi_type, &hi.span.start);

                self.values.enter();
                let slot = self.frames.allocate(Ty::Int);
                self.annotations.slots.insert(exp.id, slot);
                self.values.define(
                    var.clone(),
                    VarEntry {
                        ty: Ty::Int,
                        slot,
                        read_only: true,
                    },
                );

                self.loop_depth += 1;
                let body_type = self.check_exp(body);
                self.loop_depth -= 1;
                self.values.exit();

                self.expect_type(Ty::Void, body_type, &body.span.start);
                Ty::Void
            }
            ExpKind::Break => {
                if self.loop_depth == 0 {
                    self.report(
                        ErrorImpl::KindError {
                            message: String::from("`break` must be inside a loop"),
                        },
                        position.clone(),
                    );
                    return Ty::Error;
                }
                Ty::Void
            }
            ExpKind::Let { decs, body } => self.scoped(|checker| {
                checker.check_decs(decs);
                checker.check_exp(body)
            }),
            ExpKind::Array {
                type_name,
                size,
                init,
            } => {
                let ty = self.lookup_type(type_name, position);
                let size_type = self.check_exp(size);
                self.expect_type(Ty::Int, size_type, &size.span.start);
                let init_type = self.check_exp(init);

                match ty {
                    Ty::Error => Ty::Error,
                    Ty::Array(_) => {
                        let element = self.registry.element(ty).unwrap_or(Ty::Error);
                        self.expect_type(element, init_type, &init.span.start);
                        ty
                    }
                    _ => {
                        self.report(
                            ErrorImpl::KindError {
                                message: format!("`{}` is not an array type", type_name),
                            },
                            position.clone(),
                        );
                        Ty::Error
                    }
                }
            }
        }
    }

    fn check_call(&mut self, exp: &Exp, func: &str, args: &[Exp]) -> Ty {
        let arg_types = args
            .iter()
            .map(|arg| self.check_exp(arg))
            .collect::<Vec<Ty>>();

        let Some(function) = self.functions.lookup(func).cloned() else {
            self.report(
                ErrorImpl::UndefinedName {
                    kind: NameKind::Function,
                    name: func.to_string(),
                },
                exp.span.start.clone(),
            );
            return Ty::Error;
        };
        self.annotations.calls.insert(exp.id, function.target);

        if function.params.len() != args.len() {
            self.report(
                ErrorImpl::ArityMismatch {
                    expected: function.params.len(),
                    received: args.len(),
                },
                exp.span.start.clone(),
            );
        }
        for ((param, arg_type), arg) in function.params.iter().zip(arg_types).zip(args) {
            self.expect_type(*param, arg_type, &arg.span.start);
        }

        function.result
    }

    fn check_binary(&mut self, op: Operator, left: Ty, right: Ty, position: &Position) -> Ty {
        if op.is_arithmetic() {
            self.expect_type(Ty::Int, left, position);
            self.expect_type(Ty::Int, right, position);
            return Ty::Int;
        }

        if op.is_equality() {
            if left == Ty::Nil && right == Ty::Nil {
                self.report(
                    ErrorImpl::TypeMismatch {
                        expected: String::from("a record"),
                        received: String::from("nil"),
                    },
                    position.clone(),
                );
                return Ty::Error;
            }
            if left == Ty::Void || right == Ty::Void {
                self.report(
                    ErrorImpl::KindError {
                        message: String::from("values of type `void` cannot be compared"),
                    },
                    position.clone(),
                );
                return Ty::Error;
            }
            self.expect_type(left, right, position);
            return Ty::Int;
        }

        match (left, right) {
            (Ty::Int, Ty::Int) | (Ty::String, Ty::String) => {}
            (Ty::Error, _) | (_, Ty::Error) => {}
            (Ty::String, other) => {
                self.expect_type(Ty::String, other, position);
            }
            (Ty::Int, other) | (other, _) => {
                self.expect_type(Ty::Int, other, position);
            }
        }
        Ty::Int
    }

    fn check_record(&mut self, type_name: &str, fields: &[FieldExp], position: &Position) -> Ty {
        let ty = self.lookup_type(type_name, position);
        let field_types = fields
            .iter()
            .map(|field| self.check_exp(&field.exp))
            .collect::<Vec<Ty>>();

        let declared = match ty {
            Ty::Error => return Ty::Error,
            Ty::Record(id) => match self.registry.record(id) {
                Some(record) => record.fields.clone(),
                None => return Ty::Error,
            },
            _ => {
                self.report(
                    ErrorImpl::KindError {
                        message: format!("`{}` is not a record type", type_name),
                    },
                    position.clone(),
                );
                return Ty::Error;
            }
        };

        if declared.len() != fields.len() {
            self.report(
                ErrorImpl::ArityMismatch {
                    expected: declared.len(),
                    received: fields.len(),
                },
                position.clone(),
            );
        }

        for ((field, field_type), (declared_name, declared_type)) in
            fields.iter().zip(field_types).zip(declared.iter())
        {
            if &field.name != declared_name {
                if declared.iter().any(|(name, _)| name == &field.name) {
                    self.report(
                        ErrorImpl::KindError {
                            message: format!(
                                "field `{}` given where `{}` was declared",
                                field.name, declared_name
                            ),
                        },
                        field.span.start.clone(),
                    );
                } else {
                    self.report(
                        ErrorImpl::UndefinedName {
                            kind: NameKind::Field,
                            name: field.name.clone(),
                        },
                        field.span.start.clone(),
                    );
                }
                continue;
            }
            self.expect_type(*declared_type, field_type, &field.exp.span.start);
        }

        ty
    }

    /// Type of an lvalue, recording its slot use for simple variables.
    pub fn check_var(&mut self, var: &Var) -> Ty {
        let ty = self.check_var_kind(var);
        self.annotations.var_types.insert(var.id, ty);
        ty
    }

    fn check_var_kind(&mut self, var: &Var) -> Ty {
        match &var.kind {
            VarKind::Simple(name) => {
                let Some(entry) = self.values.lookup(name).cloned() else {
                    self.report(
                        ErrorImpl::UndefinedName {
                            kind: NameKind::Variable,
                            name: name.clone(),
                        },
                        var.span.start.clone(),
                    );
                    return Ty::Error;
                };
                self.annotations.var_refs.insert(
                    var.id,
                    VarRef {
                        slot: entry.slot,
                        use_level: self.frames.current_level(),
                    },
                );
                entry.ty
            }
            VarKind::Field(base, field) => {
                let base_type = self.check_var(base);
                match base_type {
                    Ty::Error => Ty::Error,
                    Ty::Record(_) => match self.registry.field(base_type, field) {
                        Some((_, ty)) => ty,
                        None => {
                            self.report(
                                ErrorImpl::UndefinedName {
                                    kind: NameKind::Field,
                                    name: field.clone(),
                                },
                                var.span.start.clone(),
                            );
                            Ty::Error
                        }
                    },
                    other => {
                        self.report(
                            ErrorImpl::KindError {
                                message: format!(
                                    "value of type `{}` has no field `{}`",
                                    self.registry.type_name(other),
                                    field
                                ),
                            },
                            var.span.start.clone(),
                        );
                        Ty::Error
                    }
                }
            }
            VarKind::Subscript(base, index) => {
                let base_type = self.check_var(base);
                let index_type = self.check_exp(index);
                self.expect_type(Ty::Int, index_type, &index.span.start);

                match base_type {
                    Ty::Error => Ty::Error,
                    Ty::Array(_) => self.registry.element(base_type).unwrap_or(Ty::Error),
                    other => {
                        self.report(
                            ErrorImpl::KindError {
                                message: format!(
                                    "value of type `{}` cannot be subscripted",
                                    self.registry.type_name(other)
                                ),
                            },
                            var.span.start.clone(),
                        );
                        Ty::Error
                    }
                }
            }
        }
    }
}
