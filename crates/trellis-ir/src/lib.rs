//! Trellis IR crate.
//!
//! A hierarchical SSA IR held in `cranelift-entity` arenas: functions own a
//! root scope, scopes hold ordered operations, and control-flow operations
//! own nested scopes that may capture values from enclosing ones.

pub mod context;
pub mod diagnostic;
pub mod parser;
pub mod printer;
pub mod refs;
pub mod symbol;
pub mod transforms;
pub mod types;
pub mod validation;
pub mod walk;

pub use context::{
    FunctionData, OperationData, OperationDataBuilder, Program, ScopeData, VariableData,
};
pub use diagnostic::{DiagnosticSink, NullSink, RemovedOp, TracingSink};
pub use parser::{ParseError, parse_program};
pub use printer::print_program;
pub use refs::{FuncRef, OpRef, ScopeOwner, ScopeRef, VarDef, VarRef};
pub use symbol::Symbol;
pub use types::{Attribute, Input, OpKind};
pub use validation::{ValidationError, ValidationReport, validate_program};
pub use walk::WalkAction;
