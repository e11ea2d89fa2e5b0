//! Pre-order traversal of the operations nested under a scope.
//!
//! The callback receives the scope an op is listed in alongside the op, so
//! structural checks can compare the two without tracking the path.

use std::convert::Infallible;
use std::ops::ControlFlow;

use crate::context::Program;
use crate::refs::{OpRef, ScopeRef};

/// What to do after visiting an op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Descend into the op's nested scopes.
    Descend,
    /// Leave the op's nested scopes unvisited.
    SkipNested,
}

/// Callback type for [`walk_scope`]: `(listing scope, op)`.
pub type Visitor<'f, B> = dyn FnMut(ScopeRef, OpRef) -> ControlFlow<B, WalkAction> + 'f;

/// Visit every op listed in `scope`, then the ops of their nested scopes,
/// in definition order. Stops at the first `Break`.
pub fn walk_scope<B>(
    prog: &Program,
    scope: ScopeRef,
    visit: &mut Visitor<'_, B>,
) -> ControlFlow<B> {
    for &op in &prog.scope(scope).ops {
        match visit(scope, op)? {
            WalkAction::SkipNested => {}
            WalkAction::Descend => {
                for nested in prog.op_scopes(op) {
                    walk_scope(prog, nested, visit)?;
                }
            }
        }
    }
    ControlFlow::Continue(())
}

/// Every op reachable from `scope`, pre-order.
pub fn collect_ops(prog: &Program, scope: ScopeRef) -> Vec<OpRef> {
    let mut ops = Vec::new();
    let ControlFlow::Continue(()) = walk_scope::<Infallible>(prog, scope, &mut |_, op| {
        ops.push(op);
        ControlFlow::Continue(WalkAction::Descend)
    });
    ops
}
