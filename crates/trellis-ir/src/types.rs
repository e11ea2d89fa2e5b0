//! Operation kinds, input bindings and attribute values.

use smallvec::{SmallVec, smallvec};

use crate::refs::{ScopeRef, VarRef};
use crate::symbol::Symbol;

// ============================================================================
// OpKind
// ============================================================================

/// The kind of an operation.
///
/// Only control-flow kinds carry nested scopes, so "does this op own
/// scopes" is answered by matching on the variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Straight-line operation identified by its op type (`const`, `matmul`, ...).
    Plain(Symbol),
    /// Two-way branch. Exactly one scope runs; both declare the op's outputs.
    Cond {
        then_branch: ScopeRef,
        else_branch: ScopeRef,
    },
    /// Loop with a condition scope and a body scope, both taking the
    /// loop-carried values as scope inputs.
    WhileLoop { cond: ScopeRef, body: ScopeRef },
}

impl OpKind {
    /// The op type name used in text and diagnostics.
    pub fn op_type(&self) -> Symbol {
        match self {
            OpKind::Plain(op_type) => *op_type,
            OpKind::Cond { .. } => Symbol::new("cond"),
            OpKind::WhileLoop { .. } => Symbol::new("while_loop"),
        }
    }

    /// Nested scopes owned by this kind, in declaration order.
    pub fn scopes(&self) -> SmallVec<[ScopeRef; 2]> {
        match *self {
            OpKind::Plain(_) => SmallVec::new(),
            OpKind::Cond {
                then_branch,
                else_branch,
            } => smallvec![then_branch, else_branch],
            OpKind::WhileLoop { cond, body } => smallvec![cond, body],
        }
    }
}

// ============================================================================
// Input
// ============================================================================

/// The value bound to one named operation parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Input {
    Single(VarRef),
    /// Ordered variadic parameter (e.g. the `values` of a `concat`).
    Multi(SmallVec<[VarRef; 4]>),
}

impl Input {
    /// All variables referenced by this binding.
    pub fn vars(&self) -> &[VarRef] {
        match self {
            Input::Single(v) => std::slice::from_ref(v),
            Input::Multi(vs) => vs.as_slice(),
        }
    }
}

impl From<VarRef> for Input {
    fn from(value: VarRef) -> Self {
        Input::Single(value)
    }
}

// ============================================================================
// Attribute
// ============================================================================

/// Compile-time attribute values attached to operations.
///
/// Liveness never looks at attributes; they only travel through the
/// printer and parser.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Bool(bool),
    Int(i64),
    /// Float constant stored as raw bits.
    FloatBits(u64),
    String(String),
    List(Vec<Attribute>),
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Int(value)
    }
}

impl From<f64> for Attribute {
    fn from(value: f64) -> Self {
        Attribute::FloatBits(value.to_bits())
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(value: Vec<Attribute>) -> Self {
        Attribute::List(value)
    }
}
