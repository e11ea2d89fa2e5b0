//! Entity references into the program arena.
//!
//! Each ref type is a thin `u32` wrapper providing type-safe indexing
//! into `PrimaryMap` storage in [`Program`](crate::Program).

use cranelift_entity::entity_impl;
use std::fmt;

/// Reference to an operation in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpRef(u32);
entity_impl!(OpRef, "op");

/// Reference to an SSA variable in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarRef(u32);
entity_impl!(VarRef, "var");

/// Reference to a scope (ordered op list with declared outputs).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeRef(u32);
entity_impl!(ScopeRef, "scope");

/// Reference to a function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncRef(u32);
entity_impl!(FuncRef, "func");

/// Where a variable is defined: either an operation output or a scope input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarDef {
    /// Output of an operation at the given index.
    OpOutput(OpRef, u32),
    /// Input of a scope at the given index (function parameter, loop-carried value).
    ScopeInput(ScopeRef, u32),
}

impl fmt::Display for VarDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarDef::OpOutput(op, idx) => write!(f, "{}#{}", op, idx),
            VarDef::ScopeInput(scope, idx) => write!(f, "{}#{}", scope, idx),
        }
    }
}

/// What owns a scope: a function (root scope) or a control-flow operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeOwner {
    Function(FuncRef),
    Op(OpRef),
}
