//! Semantic analysis.
//!
//! A single walk over the syntax tree that:
//!
//! - Resolves type names, including recursive record definitions
//! - Checks every expression and declaration against the typing rules
//! - Lays out frames and records where every variable lives
//! - Records which function every call refers to
//!
//! Results land in an [`annotations::Annotations`] side table keyed by node id.
//! Errors are collected rather than thrown: a failing node gets the
//! [`types::Ty::Error`] sentinel and checking carries on.

pub mod annotations;
pub mod expr;
pub mod frame;
pub mod resolver;
pub mod symbol_table;
pub mod type_checker;
pub mod types;

#[cfg(test)]
mod tests;
