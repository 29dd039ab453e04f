//! Side table written by the checker and read by code generation.
//!
//! Everything is keyed by the parser-assigned [`NodeId`], which keeps the
//! syntax tree immutable across passes.

use std::collections::HashMap;

use crate::ast::ast::NodeId;

use super::{
    frame::{FrameId, SlotLocation},
    types::Ty,
};

pub type FunctionId = usize;

/// What a call expression resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// Runtime primitive, called by its ABI symbol without a static link.
    Runtime(&'static str),
    User(FunctionId),
}

/// A use of a variable together with the level of the code reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRef {
    pub slot: SlotLocation,
    pub use_level: usize,
}

impl VarRef {
    pub fn hops(&self) -> usize {
        super::frame::static_link_hops(self.use_level, self.slot.level)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    /// Mangled symbol, unique within the module.
    pub symbol: String,
    pub frame: FrameId,
    pub level: usize,
    pub params: Vec<Ty>,
    pub result: Ty,
}

#[derive(Debug, Default)]
pub struct Annotations {
    pub exp_types: HashMap<NodeId, Ty>,
    pub var_types: HashMap<NodeId, Ty>,
    /// Slots of `var` declarations, `for` loop variables and parameters.
    pub slots: HashMap<NodeId, SlotLocation>,
    pub var_refs: HashMap<NodeId, VarRef>,
    pub calls: HashMap<NodeId, CallTarget>,
    pub function_decs: HashMap<NodeId, FunctionId>,
    pub functions: Vec<FunctionInfo>,
}

impl Annotations {
    pub fn exp_type(&self, id: NodeId) -> Ty {
        self.exp_types.get(&id).copied().unwrap_or(Ty::Error)
    }

    pub fn var_type(&self, id: NodeId) -> Ty {
        self.var_types.get(&id).copied().unwrap_or(Ty::Error)
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionInfo> {
        self.functions.get(id)
    }
}
