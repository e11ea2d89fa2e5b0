//! Well-formedness checks for programs.
//!
//! Checks the lexical visibility invariant (every input and scope output
//! refers to a Variable defined earlier in the same scope or an enclosing
//! one), unique op names per scope, parent links, and single definition of
//! every Variable along the walk.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::ops::ControlFlow;

use derive_more::{Display, Error};

use crate::context::Program;
use crate::refs::{FuncRef, OpRef, ScopeRef, VarRef};
use crate::symbol::Symbol;
use crate::walk::{WalkAction, walk_scope};

// ============================================================================
// Error types
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum ValidationError {
    #[display("in @{function}: input '{param}' of op @{op} references %{var}, which is not visible")]
    UndefinedInput {
        function: Symbol,
        op: Symbol,
        param: Symbol,
        var: Symbol,
    },
    #[display("in @{function}: scope output %{var} is not visible")]
    UndefinedOutput { function: Symbol, var: Symbol },
    #[display("in @{function}: op name @{op} is used twice in one scope")]
    DuplicateOpName { function: Symbol, op: Symbol },
    #[display("in @{function}: op @{op} is listed in {listed}, parent is {recorded:?}")]
    ParentMismatch {
        function: Symbol,
        op: Symbol,
        listed: ScopeRef,
        recorded: Option<ScopeRef>,
    },
    #[display("in @{function}: %{var} is defined more than once")]
    Redefinition { function: Symbol, var: Symbol },
}

/// Result of validation.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "validation passed");
        }
        writeln!(f, "{} validation error(s) found:", self.errors.len())?;
        for err in &self.errors {
            writeln!(f, "  - {}", err)?;
        }
        Ok(())
    }
}

// ============================================================================
// Validation
// ============================================================================

struct Validator<'a> {
    prog: &'a Program,
    function: Symbol,
    defined: HashSet<VarRef>,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn define(&mut self, v: VarRef, visible: &mut HashSet<VarRef>) {
        if !self.defined.insert(v) {
            self.errors.push(ValidationError::Redefinition {
                function: self.function,
                var: self.prog.var_name(v),
            });
        }
        visible.insert(v);
    }

    /// Parent links and op name uniqueness, per listing scope.
    fn check_structure(&mut self, root: ScopeRef) {
        let (prog, function) = (self.prog, self.function);
        let errors = &mut self.errors;
        let mut names = HashSet::new();
        let mut check = |scope: ScopeRef, op: OpRef| {
            let data = prog.op(op);
            if data.parent_scope != Some(scope) {
                errors.push(ValidationError::ParentMismatch {
                    function,
                    op: data.name,
                    listed: scope,
                    recorded: data.parent_scope,
                });
            }
            if !names.insert((scope, data.name)) {
                errors.push(ValidationError::DuplicateOpName {
                    function,
                    op: data.name,
                });
            }
            ControlFlow::<Infallible, _>::Continue(WalkAction::Descend)
        };
        let ControlFlow::Continue(()) = walk_scope(prog, root, &mut check);
    }

    /// Lexical visibility and single definition.
    fn check_scope(&mut self, scope: ScopeRef, mut visible: HashSet<VarRef>) {
        let prog = self.prog;
        for &v in prog.scope_inputs(scope) {
            self.define(v, &mut visible);
        }

        for &op in &prog.scope(scope).ops {
            let data = prog.op(op);
            for (param, input) in &data.inputs {
                for &v in input.vars() {
                    if !visible.contains(&v) {
                        self.errors.push(ValidationError::UndefinedInput {
                            function: self.function,
                            op: data.name,
                            param: *param,
                            var: prog.var_name(v),
                        });
                    }
                }
            }
            for nested in data.kind.scopes() {
                self.check_scope(nested, visible.clone());
            }
            for &v in prog.op_outputs(op) {
                self.define(v, &mut visible);
            }
        }

        for &v in &prog.scope(scope).outputs {
            if !visible.contains(&v) {
                self.errors.push(ValidationError::UndefinedOutput {
                    function: self.function,
                    var: prog.var_name(v),
                });
            }
        }
    }
}

/// Validate a single function.
pub fn validate_function(prog: &Program, func: FuncRef) -> Vec<ValidationError> {
    let data = prog.function(func);
    let mut validator = Validator {
        prog,
        function: data.name,
        defined: HashSet::new(),
        errors: Vec::new(),
    };
    validator.check_structure(data.root);
    validator.check_scope(data.root, HashSet::new());
    validator.errors
}

/// Validate every function of a program.
pub fn validate_program(prog: &Program) -> ValidationReport {
    ValidationReport {
        errors: prog
            .functions()
            .flat_map(|f| validate_function(prog, f))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{OperationDataBuilder, ScopeData};
    use crate::parser::parse_test_program;
    use crate::types::OpKind;

    #[test]
    fn parsed_programs_are_valid() {
        let prog = parse_test_program(
            "func @main(%x, %p) {
  %c = const {val = 2}
  %r = cond(pred = %p) {
    %a = add(x = %x, y = %c)
  } -> (%a) (%e) {
  } -> (%e)
  print @log(v = %r)
} -> (%r)

func @other() {
} -> ()",
        );
        let report = validate_program(&prog);
        assert!(report.is_ok(), "{report}");
        assert_eq!(report.to_string(), "validation passed");
    }

    #[test]
    fn reports_sibling_scope_reference() {
        // then-branch defines %t; else-branch returns it.
        let mut prog = Program::new();
        let root = prog.create_scope(ScopeData::new([Symbol::new("p")]));
        let p = prog.scope_input(root, 0);

        let then_branch = prog.create_scope(ScopeData::new([]));
        let t = prog.create_op(OperationDataBuilder::plain("t", "const").build());
        prog.push_op(then_branch, t);
        let t_out = prog.op_output(t, 0);
        prog.set_scope_outputs(then_branch, [t_out]);

        let else_branch = prog.create_scope(ScopeData::new([]));
        prog.set_scope_outputs(else_branch, [t_out]);

        let r = prog.create_op(
            OperationDataBuilder::new(
                "r",
                OpKind::Cond {
                    then_branch,
                    else_branch,
                },
            )
            .output("r")
            .input("pred", p)
            .build(),
        );
        prog.push_op(root, r);
        prog.set_scope_outputs(root, [prog.op_output(r, 0)]);
        prog.create_function(Symbol::new("f"), root);

        let report = validate_program(&prog);
        assert_eq!(
            report.errors,
            vec![ValidationError::UndefinedOutput {
                function: Symbol::new("f"),
                var: Symbol::new("t"),
            }]
        );
    }

    #[test]
    fn reports_use_before_definition() {
        let mut prog = Program::new();
        let root = prog.create_scope(ScopeData::new([]));
        let late = prog.create_op(OperationDataBuilder::plain("late", "const").build());
        let early = prog.create_op(
            OperationDataBuilder::plain("early", "neg")
                .input("x", prog.op_output(late, 0))
                .build(),
        );
        prog.push_op(root, early);
        prog.push_op(root, late);
        prog.create_function(Symbol::new("f"), root);

        let report = validate_program(&prog);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0].to_string(),
            "in @f: input 'x' of op @early references %late, which is not visible"
        );
    }

    #[test]
    fn reports_duplicate_op_and_redefinition() {
        let mut prog = Program::new();
        let root = prog.create_scope(ScopeData::new([]));
        let a = prog.create_op(OperationDataBuilder::plain("a", "const").build());
        prog.push_op(root, a);
        prog.op_mut(a).parent_scope = None;
        prog.push_op(root, a);
        prog.create_function(Symbol::new("f"), root);

        let errors = validate_function(&prog, FuncRef::from_u32(0));
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateOpName {
                    function: Symbol::new("f"),
                    op: Symbol::new("a"),
                },
                ValidationError::Redefinition {
                    function: Symbol::new("f"),
                    var: Symbol::new("a"),
                },
            ]
        );
    }

    #[test]
    fn op_names_are_checked_per_nested_scope() {
        // Sibling branches may reuse %a; a name listed twice in one branch may not.
        let mut prog = parse_test_program(
            "func @f(%p) {
  %r = cond(pred = %p) {
    %a = const {val = 1}
  } -> (%a) {
    %a = const {val = 2}
  } -> (%a)
} -> (%r)",
        );
        assert!(validate_program(&prog).is_ok());

        let root = prog.function(FuncRef::from_u32(0)).root;
        let r = prog.scope(root).ops[0];
        let OpKind::Cond { else_branch, .. } = prog.op(r).kind else {
            panic!("expected cond");
        };
        let a = prog.scope(else_branch).ops[0];
        prog.op_mut(a).parent_scope = None;
        prog.push_op(else_branch, a);

        let report = validate_program(&prog);
        assert_eq!(
            report.errors[0],
            ValidationError::DuplicateOpName {
                function: Symbol::new("f"),
                op: Symbol::new("a"),
            }
        );
    }

    #[test]
    fn reports_parent_mismatch() {
        let mut prog = Program::new();
        let root = prog.create_scope(ScopeData::new([]));
        let other = prog.create_scope(ScopeData::new([]));
        let a = prog.create_op(OperationDataBuilder::plain("a", "const").build());
        prog.push_op(root, a);
        prog.op_mut(a).parent_scope = Some(other);
        prog.create_function(Symbol::new("f"), root);

        let report = validate_program(&prog);
        assert!(matches!(
            report.errors.as_slice(),
            [ValidationError::ParentMismatch { recorded: Some(s), .. }] if *s == other
        ));
        assert!(report.to_string().starts_with("1 validation error(s) found:\n"));
    }
}
