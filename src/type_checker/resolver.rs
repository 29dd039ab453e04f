//! Type name resolution.
//!
//! Names resolve lazily through the scoped type table. Records are registered
//! as placeholders before their fields are resolved, which lets a record
//! refer to itself or to a sibling that refers back to it. A chain of names
//! that loops back on itself without passing through a record can never
//! terminate and is reported as a cyclic definition.

use log::debug;

use crate::{
    ast::ast::TypeExpKind,
    errors::errors::{ErrorImpl, NameKind},
    Position,
};

use super::{type_checker::TypeChecker, types::Ty};

impl TypeChecker {
    /// Canonical type of `name`, resolving its declaration if needed.
    ///
    /// `visiting` holds the names currently being resolved on this chain.
    pub fn resolve_type(
        &mut self,
        name: &str,
        position: &Position,
        visiting: &mut Vec<String>,
    ) -> Ty {
        let Some(entry) = self.types.lookup(name) else {
            self.report(
                ErrorImpl::UndefinedName {
                    kind: NameKind::Type,
                    name: name.to_string(),
                },
                position.clone(),
            );
            return Ty::Error;
        };

        if let Some(ty) = entry.resolved {
            return ty;
        }
        let Some(decl) = entry.decl.clone() else {
            return Ty::Error;
        };
        let declared_at = entry.position.clone();

        if let Some(index) = visiting.iter().position(|visited| visited == name) {
            let through_record = visiting[index + 1..]
                .iter()
                .any(|visited| self.is_record_declaration(visited));
            if through_record {
                // The record in between is already registered, so a fresh walk stops there.
                return self.resolve_type(name, position, &mut vec![]);
            }

            self.report(
                ErrorImpl::CyclicTypeDefinition {
                    name: name.to_string(),
                },
                declared_at,
            );
            for visited in visiting[index..].to_vec() {
                self.set_resolved(&visited, Ty::Error);
            }
            return Ty::Error;
        }

        visiting.push(name.to_string());
        let ty = match &decl.kind {
            TypeExpKind::Name(other) => self.resolve_type(other, &decl.span.start, visiting),
            TypeExpKind::Array(element) => {
                let element = self.resolve_type(element, &decl.span.start, visiting);
                match self.resolved(name) {
                    Some(ty) => ty,
                    None if element.is_error() => Ty::Error,
                    None => self.registry.new_array(name, element),
                }
            }
            TypeExpKind::Record(fields) => {
                let ty = self.registry.new_record(name);
                self.set_resolved(name, ty);

                let mut resolved_fields: Vec<(String, Ty)> = vec![];
                for field in fields {
                    if resolved_fields.iter().any(|(seen, _)| seen == &field.name) {
                        self.report(
                            ErrorImpl::RedefinitionError {
                                kind: NameKind::Field,
                                name: field.name.clone(),
                            },
                            field.span.start.clone(),
                        );
                        continue;
                    }
                    let field_type = self.resolve_type(&field.type_name, &field.span.start, visiting);
                    resolved_fields.push((field.name.clone(), field_type));
                }

                if let Ty::Record(id) = ty {
                    self.registry.complete_record(id, resolved_fields);
                }
                ty
            }
        };
        visiting.pop();

        // A cycle found further down may already have settled this name.
        let ty = self.resolved(name).unwrap_or(ty);
        self.set_resolved(name, ty);
        debug!(
            "resolved type `{}` to `{}`",
            name,
            self.registry.type_name(ty)
        );
        ty
    }

    fn resolved(&self, name: &str) -> Option<Ty> {
        self.types.lookup(name).and_then(|entry| entry.resolved)
    }

    fn set_resolved(&mut self, name: &str, ty: Ty) {
        if let Some(entry) = self.types.lookup_mut(name) {
            entry.resolved = Some(ty);
        }
    }

    fn is_record_declaration(&self, name: &str) -> bool {
        self.types
            .lookup(name)
            .and_then(|entry| entry.decl.as_ref())
            .is_some_and(|decl| matches!(decl.kind, TypeExpKind::Record(_)))
    }
}
