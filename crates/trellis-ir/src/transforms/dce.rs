//! Dead Code Elimination (DCE) by backward liveness.
//!
//! Each scope is swept once in reverse definition order, starting from its
//! declared outputs. An operation none of whose outputs is live is dead:
//! its inputs are not marked and its nested scopes are not visited, so a
//! dead control-flow op drops its whole subtree. A live operation marks
//! every input variable and sweeps its nested scopes, whose free variables
//! (values captured from enclosing scopes) become live in the parent.
//!
//! Removal is mark-then-compact: the sweep only collects dead ops, and the
//! scope's op list is compacted afterwards, keeping survivors in order.
//!
//! Liveness is the only criterion. Operations without outputs are never
//! live, regardless of their op type.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::context::Program;
use crate::diagnostic::{DiagnosticSink, RemovedOp};
use crate::refs::{OpRef, ScopeRef, VarRef};

/// Variables required by the scope being swept.
pub type LiveSet = HashSet<VarRef>;

/// Result of running dead code elimination over a program.
#[derive(Debug, Default)]
pub struct DceResult {
    /// Total number of operations removed.
    pub removed_count: usize,
    /// Every removal record, in emission order.
    pub removed: Vec<RemovedOp>,
}

/// Eliminate dead code from every function of a program, in function
/// insertion order.
pub fn eliminate_dead_code(prog: &mut Program, sink: &mut dyn DiagnosticSink) -> DceResult {
    let mut recorder = Recorder {
        inner: sink,
        removed: Vec::new(),
    };
    let funcs: Vec<_> = prog.functions().collect();
    for func in funcs {
        let root = prog.function(func).root;
        let before = recorder.removed.len();
        eliminate(prog, root, &mut recorder);
        tracing::debug!(
            function = %prog.function(func).name,
            removed = recorder.removed.len() - before,
            "dead code elimination finished"
        );
    }

    DceResult {
        removed_count: recorder.removed.len(),
        removed: recorder.removed,
    }
}

/// Sweep one scope, removing every operation that does not contribute to
/// its outputs.
///
/// Returns the scope's free variables: those it (or a live nested scope)
/// consumes without defining them itself. Variables produced by the
/// scope's own operations and the scope's inputs are never included.
pub fn eliminate(prog: &mut Program, scope: ScopeRef, sink: &mut dyn DiagnosticSink) -> LiveSet {
    let mut live: LiveSet = prog.scope(scope).outputs.iter().copied().collect();
    let ops: SmallVec<[OpRef; 8]> = prog.scope(scope).ops.clone();

    // Mark, in reverse order.
    let mut dead: Vec<OpRef> = Vec::new();
    for &op in ops.iter().rev() {
        let outputs = prog.op_outputs(op);
        if !outputs.iter().any(|v| live.contains(v)) {
            dead.push(op);
            continue;
        }
        for v in outputs {
            live.remove(v);
        }
        live.extend(prog.op_input_vars(op));

        for nested in prog.op_scopes(op) {
            let free = eliminate(prog, nested, sink);
            live.extend(free);
        }
    }

    for v in prog.scope_inputs(scope) {
        live.remove(v);
    }

    if !dead.is_empty() {
        // Compact.
        let dead_set: HashSet<OpRef> = dead.iter().copied().collect();
        prog.retain_ops(scope, |op| !dead_set.contains(&op));

        for &op in &dead {
            let data = prog.op(op);
            sink.op_removed(&RemovedOp {
                name: data.name,
                op_type: data.kind.op_type(),
                scope,
            });
        }
    }

    tracing::debug!(
        %scope,
        kept = ops.len() - dead.len(),
        removed = dead.len(),
        free = live.len(),
        "swept scope"
    );
    live
}

/// Forwards records to the caller's sink while keeping a copy.
struct Recorder<'s> {
    inner: &'s mut dyn DiagnosticSink,
    removed: Vec<RemovedOp>,
}

impl DiagnosticSink for Recorder<'_> {
    fn op_removed(&mut self, removed: &RemovedOp) {
        self.inner.op_removed(removed);
        self.removed.push(removed.clone());
    }
}
