use log::{debug, info, trace};

use crate::{
    ast::ast::{Dec, DecKind, Exp, TypeExp},
    errors::errors::{Error, ErrorImpl, NameKind},
    runtime::RUNTIME_FUNCTIONS,
    Position,
};

use super::{
    annotations::{Annotations, CallTarget, FunctionId, FunctionInfo},
    frame::{FrameLayout, SlotLocation},
    symbol_table::SymbolTable,
    types::{Ty, TypeRegistry},
};

/// A type name binding. Built-ins have no declaration and are resolved from the start.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub decl: Option<TypeExp>,
    pub resolved: Option<Ty>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct VarEntry {
    pub ty: Ty,
    pub slot: SlotLocation,
    /// `for` loop variables cannot be assigned.
    pub read_only: bool,
}

#[derive(Debug, Clone)]
pub struct FunEntry {
    pub params: Vec<Ty>,
    pub result: Ty,
    pub target: CallTarget,
}

#[derive(Debug)]
pub struct TypeChecker {
    pub types: SymbolTable<TypeEntry>,
    pub values: SymbolTable<VarEntry>,
    pub functions: SymbolTable<FunEntry>,
    pub registry: TypeRegistry,
    pub frames: FrameLayout,
    pub annotations: Annotations,
    /// Loops enclosing the current expression within the current function.
    pub loop_depth: usize,
    pub errors: Vec<Error>,
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut type_checker = TypeChecker {
            types: SymbolTable::new(),
            values: SymbolTable::new(),
            functions: SymbolTable::new(),
            registry: TypeRegistry::new(),
            frames: FrameLayout::new(),
            annotations: Annotations::default(),
            loop_depth: 0,
            errors: vec![],
        };
        type_checker.reset();
        type_checker
    }

    /// Clears all state and re-registers the built-in types and runtime functions.
    pub fn reset(&mut self) {
        self.types.reset();
        self.values.reset();
        self.functions.reset();
        self.registry = TypeRegistry::new();
        self.frames = FrameLayout::new();
        self.annotations = Annotations::default();
        self.loop_depth = 0;
        self.errors.clear();

        for (name, ty) in [("int", Ty::Int), ("string", Ty::String)] {
            self.types.define(
                name,
                TypeEntry {
                    decl: None,
                    resolved: Some(ty),
                    position: Position::null(),
                },
            );
        }

        for function in RUNTIME_FUNCTIONS {
            self.functions.define(
                function.name,
                FunEntry {
                    params: function.params.to_vec(),
                    result: function.result,
                    target: CallTarget::Runtime(function.symbol),
                },
            );
        }
    }

    pub fn report(&mut self, error: ErrorImpl, position: Position) {
        trace!("reporting {:?}", error);
        self.errors.push(Error::new(error, position));
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Reports a mismatch unless `received` may stand in for `expected`.
    pub fn expect_type(&mut self, expected: Ty, received: Ty, position: &Position) -> bool {
        if self.registry.compatible(expected, received) {
            return true;
        }
        self.report(
            ErrorImpl::TypeMismatch {
                expected: self.registry.type_name(expected),
                received: self.registry.type_name(received),
            },
            position.clone(),
        );
        false
    }

    /// Runs `f` inside a fresh scope of all three namespaces.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.values.depth();
        self.types.enter();
        self.values.enter();
        self.functions.enter();
        trace!("entered scope at depth {}", self.values.depth());
        let result = f(self);
        self.functions.exit();
        self.values.exit();
        self.types.exit();
        debug_assert_eq!(self.values.depth(), depth, "unbalanced scopes");
        result
    }

    /// Resolves a type name used at `position`.
    pub fn lookup_type(&mut self, name: &str, position: &Position) -> Ty {
        self.resolve_type(name, position, &mut vec![])
    }

    pub fn check_decs(&mut self, decs: &[Dec]) {
        // Type declarations first, so later declarations in the block can use them.
        let mut type_names = vec![];
        for dec in decs {
            if let DecKind::Type { name, ty } = &dec.kind {
                let position = dec.span.start.clone();
                if self.types.defined_in_current_scope(name) {
                    self.report(
                        ErrorImpl::RedefinitionError {
                            kind: NameKind::Type,
                            name: name.clone(),
                        },
                        position,
                    );
                    continue;
                }
                self.types.define(
                    name.clone(),
                    TypeEntry {
                        decl: Some(ty.clone()),
                        resolved: None,
                        position,
                    },
                );
                type_names.push((name.clone(), dec.span.start.clone()));
            }
        }
        for (name, position) in type_names.iter() {
            self.resolve_type(name, position, &mut vec![]);
        }

        // Headers before bodies, so functions of one block can call each other.
        for dec in decs {
            if let DecKind::Function { .. } = &dec.kind {
                self.declare_function(dec);
            }
        }

        for dec in decs {
            match &dec.kind {
                DecKind::Var { .. } => self.check_var_dec(dec),
                DecKind::Function { .. } => self.check_function_body(dec),
                DecKind::Type { .. } => {}
            }
        }
    }

    fn declare_function(&mut self, dec: &Dec) {
        let DecKind::Function {
            name,
            params,
            result,
            ..
        } = &dec.kind
        else {
            return;
        };

        let param_types = params
            .iter()
            .map(|param| self.lookup_type(&param.type_name, &param.span.start))
            .collect::<Vec<Ty>>();
        let result = match result {
            Some(result) => self.lookup_type(result, &dec.span.start),
            None => Ty::Void,
        };

        let symbol = format!("{}.{}", name, dec.id);
        let frame = self.frames.declare(&symbol);
        let function: FunctionId = self.annotations.functions.len();
        self.annotations.functions.push(FunctionInfo {
            name: name.clone(),
            symbol: symbol.clone(),
            frame,
            level: self.frames.current_level() + 1,
            params: param_types.clone(),
            result,
        });
        self.annotations.function_decs.insert(dec.id, function);
        debug!("declared function `{}` as `{}`", name, symbol);

        if self.functions.defined_in_current_scope(name) {
            self.report(
                ErrorImpl::RedefinitionError {
                    kind: NameKind::Function,
                    name: name.clone(),
                },
                dec.span.start.clone(),
            );
            return;
        }
        self.functions.define(
            name.clone(),
            FunEntry {
                params: param_types,
                result,
                target: CallTarget::User(function),
            },
        );
    }

    fn check_var_dec(&mut self, dec: &Dec) {
        let DecKind::Var {
            name,
            type_name,
            init,
        } = &dec.kind
        else {
            return;
        };

        let init_type = self.check_exp(init);
        let ty = match type_name {
            Some(type_name) => {
                let declared = self.lookup_type(type_name, &dec.span.start);
                self.expect_type(declared, init_type, &init.span.start);
                declared
            }
            None => {
                if matches!(init_type, Ty::Nil | Ty::Void) {
                    // Without an annotation there is nothing to give the variable a record type.
                    self.report(
                        ErrorImpl::TypeMismatch {
                            expected: String::from("a typed value"),
                            received: self.registry.type_name(init_type),
                        },
                        init.span.start.clone(),
                    );
                    Ty::Error
                } else {
                    init_type
                }
            }
        };

        let slot = self.frames.allocate(ty);
        self.annotations.slots.insert(dec.id, slot);
        if self.values.defined_in_current_scope(name) {
            self.report(
                ErrorImpl::RedefinitionError {
                    kind: NameKind::Variable,
                    name: name.clone(),
                },
                dec.span.start.clone(),
            );
            return;
        }
        self.values.define(
            name.clone(),
            VarEntry {
                ty,
                slot,
                read_only: false,
            },
        );
    }

    fn check_function_body(&mut self, dec: &Dec) {
        let DecKind::Function {
            params,
            body,
            result: declared_result,
            ..
        } = &dec.kind
        else {
            return;
        };
        let Some(info) = self
            .annotations
            .function_decs
            .get(&dec.id)
            .and_then(|id| self.annotations.function(*id))
            .cloned()
        else {
            return;
        };

        self.frames.enter(info.frame);
        let outer_loop_depth = std::mem::replace(&mut self.loop_depth, 0);

        self.scoped(|checker| {
            for (param, ty) in params.iter().zip(info.params.iter()) {
                let slot = checker.frames.allocate(*ty);
                checker.annotations.slots.insert(param.id, slot);
                if checker.values.defined_in_current_scope(&param.name) {
                    checker.report(
                        ErrorImpl::RedefinitionError {
                            kind: NameKind::Variable,
                            name: param.name.clone(),
                        },
                        param.span.start.clone(),
                    );
                    continue;
                }
                checker.values.define(
                    param.name.clone(),
                    VarEntry {
                        ty: *ty,
                        slot,
                        read_only: false,
                    },
                );
            }

            let body_type = checker.check_exp(body);
            if declared_result.is_some() {
                checker.expect_type(info.result, body_type, &body.span.start);
            } else {
                checker.expect_type(Ty::Void, body_type, &body.span.start);
            }
        });

        self.loop_depth = outer_loop_depth;
        self.frames.exit();
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks a whole program, returning the checker state and every error found.
///
/// Code generation may only run when the returned list is empty.
pub fn type_check(ast: &Exp) -> (TypeChecker, Vec<Error>) {
    let mut type_checker = TypeChecker::new();
    let ty = type_checker.check_exp(ast);
    type_checker.frames.finish();

    info!(
        "checked program of type `{}` with {} error(s)",
        type_checker.registry.type_name(ty),
        type_checker.errors.len()
    );

    let errors = type_checker.errors.clone();
    (type_checker, errors)
}
