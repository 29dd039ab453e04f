//! Code generation module for the compiler.
//!
//! This module lowers a checked syntax tree to LLVM IR. It handles:
//!
//! - Frame structs with static links for nested functions
//! - Record and array layout and allocation through the runtime
//! - Expressions, control flow and calls
//! - Declaration of runtime primitives on first use

pub mod compiler;
pub mod decl;
pub mod expr;
