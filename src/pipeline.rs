//! Pass registry and pass manager.
//!
//! ```text
//! text ─► parse_program ─► Program
//!                            │
//!          [verify_each] ────┤ validate before the first pass
//!                            ▼
//!                      pass 1 ─► [verify_each] validate
//!                            ▼
//!                      pass N ─► [verify_each] validate
//!                            ▼
//!                      PipelineReport
//! ```
//!
//! Passes are registered under namespaced names such as
//! `common::dead_code_elimination`; lookups also accept the bare name after
//! the last `::`.

use std::path::Path;

use trellis_ir::transforms::eliminate_dead_code;
use trellis_ir::{DiagnosticSink, Program, parse_program, validate_program};

use crate::errors::{TrellisError, TrellisResult};

// =============================================================================
// Passes
// =============================================================================

/// What a single pass run changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Number of operations detached from their scopes.
    pub removed_ops: usize,
}

/// A program transformation.
pub trait Pass {
    /// Fully qualified name (e.g., "common::dead_code_elimination").
    fn name(&self) -> &'static str;

    /// Transform the program in place, reporting removals to `sink`.
    fn run(&self, prog: &mut Program, sink: &mut dyn DiagnosticSink) -> PassStats;
}

/// Removes operations that do not contribute to any function output.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeadCodeElimination;

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "common::dead_code_elimination"
    }

    fn run(&self, prog: &mut Program, sink: &mut dyn DiagnosticSink) -> PassStats {
        let result = eliminate_dead_code(prog, sink);
        PassStats {
            removed_ops: result.removed_count,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

type PassConstructor = fn() -> Box<dyn Pass>;

/// Name → constructor table for passes.
pub struct PassRegistry {
    entries: Vec<(&'static str, PassConstructor)>,
}

impl PassRegistry {
    /// A registry holding every built-in pass.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("common::dead_code_elimination", || {
            Box::new(DeadCodeElimination)
        });
        registry
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a pass constructor.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn register(&mut self, name: &'static str, ctor: PassConstructor) {
        assert!(
            !self.entries.iter().any(|(n, _)| *n == name),
            "pass '{name}' is already registered",
        );
        self.entries.push((name, ctor));
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// Instantiate a pass by full or bare name. A bare name matches the
    /// first registered pass whose last path segment equals it.
    pub fn get(&self, name: &str) -> TrellisResult<Box<dyn Pass>> {
        let exact = self.entries.iter().find(|(n, _)| *n == name);
        let found = exact.or_else(|| {
            self.entries
                .iter()
                .find(|(n, _)| n.rsplit("::").next() == Some(name))
        });
        match found {
            Some((_, ctor)) => Ok(ctor()),
            None => Err(TrellisError::UnknownPass(name.to_owned())),
        }
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Manager
// =============================================================================

/// Stats for one executed pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassRun {
    pub name: &'static str,
    pub stats: PassStats,
}

/// Result of running a pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub runs: Vec<PassRun>,
}

impl PipelineReport {
    pub fn total_removed(&self) -> usize {
        self.runs.iter().map(|r| r.stats.removed_ops).sum()
    }
}

/// Runs passes in order over a program.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    verify_each: bool,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manager from pass names resolved through `registry`.
    pub fn from_names<S: AsRef<str>>(
        registry: &PassRegistry,
        names: impl IntoIterator<Item = S>,
    ) -> TrellisResult<Self> {
        let mut manager = Self::new();
        for name in names {
            manager.passes.push(registry.get(name.as_ref())?);
        }
        Ok(manager)
    }

    pub fn add_pass(mut self, pass: Box<dyn Pass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Validate before the first pass and after every pass.
    pub fn verify_each(mut self, enabled: bool) -> Self {
        self.verify_each = enabled;
        self
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|p| p.name())
    }

    pub fn run(
        &self,
        prog: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> TrellisResult<PipelineReport> {
        if self.verify_each {
            verify(prog, "before the first pass")?;
        }

        let mut report = PipelineReport::default();
        for pass in &self.passes {
            let span = tracing::info_span!("pass", name = pass.name());
            let _enter = span.enter();

            let stats = pass.run(prog, sink);
            tracing::debug!(removed = stats.removed_ops, "pass finished");
            report.runs.push(PassRun {
                name: pass.name(),
                stats,
            });

            if self.verify_each {
                verify(prog, &format!("after {}", pass.name()))?;
            }
        }
        Ok(report)
    }
}

/// Validate `prog`, naming `stage` in the error.
pub fn verify(prog: &Program, stage: &str) -> TrellisResult<()> {
    let report = validate_program(prog);
    if report.is_ok() {
        Ok(())
    } else {
        Err(TrellisError::Validation {
            stage: stage.to_owned(),
            report,
        })
    }
}

/// Read and parse a program from a text file.
pub fn load_program(path: &Path) -> TrellisResult<Program> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_program(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_ir::parser::parse_test_program;
    use trellis_ir::{
        NullSink, OperationDataBuilder, RemovedOp, ScopeData, Symbol, ValidationError,
        print_program,
    };

    const PROGRAM: &str = "func @main(%x) {
  %c = const {val = 1}
  %y = add(x = %x, y = %c)
  %z = neg(x = %y)
} -> (%y)
";

    /// Points the first function's output at a variable that no scope defines.
    struct CorruptOutputs;

    impl Pass for CorruptOutputs {
        fn name(&self) -> &'static str {
            "test::corrupt_outputs"
        }

        fn run(&self, prog: &mut Program, _sink: &mut dyn DiagnosticSink) -> PassStats {
            let func = prog.functions().next().expect("function");
            let root = prog.function(func).root;
            let stray = prog.create_op(OperationDataBuilder::plain("stray", "const").build());
            let v = prog.op_output(stray, 0);
            prog.set_scope_outputs(root, [v]);
            PassStats::default()
        }
    }

    #[test]
    fn registry_resolves_full_and_bare_names() {
        let registry = PassRegistry::new();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["common::dead_code_elimination"]
        );

        let full = registry
            .get("common::dead_code_elimination")
            .expect("full name");
        let bare = registry.get("dead_code_elimination").expect("bare name");
        assert_eq!(full.name(), bare.name());
    }

    #[test]
    fn registry_rejects_unknown_pass() {
        let registry = PassRegistry::new();
        let err = registry.get("common::constant_folding").err().expect("unknown");
        assert!(matches!(err, TrellisError::UnknownPass(ref n) if n == "common::constant_folding"));
        assert_eq!(err.to_string(), "unknown pass 'common::constant_folding'");

        let err = PassManager::from_names(&registry, ["dead_code_elimination", "nope"])
            .err()
            .expect("unknown");
        assert_eq!(err.to_string(), "unknown pass 'nope'");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_rejects_duplicate_names() {
        let mut registry = PassRegistry::new();
        registry.register("common::dead_code_elimination", || {
            Box::new(DeadCodeElimination)
        });
    }

    #[test]
    fn manager_runs_passes_and_reports_stats() {
        let mut prog = parse_test_program(PROGRAM);
        let manager = PassManager::from_names(&PassRegistry::new(), ["dead_code_elimination"])
            .expect("known pass")
            .verify_each(true);
        let mut sink: Vec<RemovedOp> = Vec::new();

        let report = manager.run(&mut prog, &mut sink).expect("pipeline succeeds");

        assert_eq!(
            report.runs,
            vec![PassRun {
                name: "common::dead_code_elimination",
                stats: PassStats { removed_ops: 1 },
            }]
        );
        assert_eq!(report.total_removed(), 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].name, "z");
        assert!(!print_program(&prog).contains("%z"));
    }

    #[test]
    fn manager_validates_input_before_first_pass() {
        let mut prog = Program::new();
        let root = prog.create_scope(ScopeData::new([]));
        let orphan = prog.create_op(OperationDataBuilder::plain("orphan", "const").build());
        prog.set_scope_outputs(root, [prog.op_output(orphan, 0)]);
        prog.create_function(Symbol::new("broken"), root);

        let manager = PassManager::new()
            .add_pass(Box::new(DeadCodeElimination))
            .verify_each(true);
        let err = manager.run(&mut prog, &mut NullSink).err().expect("invalid input");

        match err {
            TrellisError::Validation { stage, report } => {
                assert_eq!(stage, "before the first pass");
                assert!(matches!(
                    report.errors.as_slice(),
                    [ValidationError::UndefinedOutput { .. }]
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn manager_catches_pass_that_breaks_invariants() {
        let mut prog = parse_test_program(PROGRAM);
        let manager = PassManager::new()
            .add_pass(Box::new(DeadCodeElimination))
            .add_pass(Box::new(CorruptOutputs))
            .verify_each(true);
        assert_eq!(
            manager.pass_names().collect::<Vec<_>>(),
            vec!["common::dead_code_elimination", "test::corrupt_outputs"]
        );

        let err = manager.run(&mut prog, &mut NullSink).err().expect("corrupted");
        let msg = err.to_string();
        assert!(
            msg.starts_with("validation failed after test::corrupt_outputs:\n"),
            "{msg}"
        );
        assert!(msg.contains("scope output %stray is not visible"), "{msg}");
    }

    #[test]
    fn without_verification_passes_run_unchecked() {
        let mut prog = parse_test_program(PROGRAM);
        let manager = PassManager::new().add_pass(Box::new(CorruptOutputs));
        let report = manager.run(&mut prog, &mut NullSink).expect("no verification");
        assert_eq!(report.total_removed(), 0);
    }
}
