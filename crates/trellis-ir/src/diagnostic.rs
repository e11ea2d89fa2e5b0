//! Records emitted when a transformation removes an operation.

use crate::refs::ScopeRef;
use crate::symbol::Symbol;

/// One removed operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedOp {
    pub name: Symbol,
    pub op_type: Symbol,
    /// Scope the operation was detached from.
    pub scope: ScopeRef,
}

impl std::fmt::Display for RemovedOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "removing op \"{}\" (type: {})", self.name, self.op_type)
    }
}

/// Receiver for removal records.
pub trait DiagnosticSink {
    fn op_removed(&mut self, removed: &RemovedOp);
}

/// Logs every record at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn op_removed(&mut self, removed: &RemovedOp) {
        tracing::info!(scope = %removed.scope, "{removed}");
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn op_removed(&mut self, _removed: &RemovedOp) {}
}

impl DiagnosticSink for Vec<RemovedOp> {
    fn op_removed(&mut self, removed: &RemovedOp) {
        self.push(removed.clone());
    }
}
