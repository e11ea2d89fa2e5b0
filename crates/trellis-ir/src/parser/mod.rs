//! Text format parser.
//!
//! Parses the format produced by [`crate::printer`] back into a [`Program`].
//!
//! # Two-stage parsing
//!
//! 1. **Raw parse**: winnow combinators parse text into `Raw*` structures
//!    holding unresolved names.
//! 2. **Build**: `Raw*` structures are converted to arena entities,
//!    resolving `%name` references against the lexically visible variables.

pub(crate) mod raw;

use std::collections::{HashMap, HashSet};

use winnow::prelude::*;

pub use raw::ParseError;
use raw::*;

use crate::context::{OperationDataBuilder, Program, ScopeData};
use crate::refs::{OpRef, ScopeRef, VarRef};
use crate::symbol::Symbol;
use crate::types::{Attribute, Input, OpKind};

// ============================================================================
// Program builder (Raw -> arena)
// ============================================================================

struct ProgramBuilder<'p> {
    prog: &'p mut Program,
    /// Maps variable name (without %) -> VarRef for everything in scope.
    value_map: HashMap<String, VarRef>,
}

fn build_error(message: String) -> ParseError {
    ParseError { message, offset: 0 }
}

impl<'p> ProgramBuilder<'p> {
    fn new(prog: &'p mut Program) -> Self {
        Self {
            prog,
            value_map: HashMap::new(),
        }
    }

    fn build_attribute(raw: &RawAttribute) -> Attribute {
        match raw {
            RawAttribute::Bool(b) => Attribute::Bool(*b),
            RawAttribute::Int(n) => Attribute::Int(*n),
            RawAttribute::Float(f) => Attribute::FloatBits(f.to_bits()),
            RawAttribute::String(s) => Attribute::String(s.clone()),
            RawAttribute::List(items) => {
                Attribute::List(items.iter().map(Self::build_attribute).collect())
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<VarRef, ParseError> {
        self.value_map
            .get(name)
            .copied()
            .ok_or_else(|| build_error(format!("undefined variable '%{name}'")))
    }

    /// Make `name` visible, rejecting names that would shadow a visible one.
    fn define(&mut self, name: &str, v: VarRef) -> Result<(), ParseError> {
        if self.value_map.insert(name.to_owned(), v).is_some() {
            return Err(build_error(format!("duplicate definition of '%{name}'")));
        }
        Ok(())
    }

    fn build_function(&mut self, raw: &RawFunction<'_>) -> Result<(), ParseError> {
        let name = Symbol::from_dynamic(raw.name);
        if self.prog.function_by_name(name).is_some() {
            return Err(build_error(format!("duplicate function '@{}'", raw.name)));
        }
        let root = self.build_scope(&raw.body)?;
        self.prog.create_function(name, root);
        Ok(())
    }

    /// Build a scope. Names defined inside it are dropped from the visible
    /// set once the scope is closed.
    fn build_scope(&mut self, raw: &RawScope<'_>) -> Result<ScopeRef, ParseError> {
        let saved_values = self.value_map.clone();
        let result = self.build_scope_inner(raw);
        self.value_map = saved_values;
        result
    }

    fn build_scope_inner(&mut self, raw: &RawScope<'_>) -> Result<ScopeRef, ParseError> {
        let scope = self.prog.create_scope(ScopeData::new(Symbol::intern_all(&raw.inputs)));
        for (idx, name) in raw.inputs.iter().enumerate() {
            let v = self.prog.scope_input(scope, idx as u32);
            self.define(name, v)?;
        }

        let mut op_names = HashSet::new();
        for raw_op in &raw.ops {
            let op = self.build_operation(raw_op)?;
            let op_name = self.prog.op(op).name;
            if !op_names.insert(op_name) {
                return Err(build_error(format!(
                    "duplicate operation name '@{op_name}' in scope"
                )));
            }
            self.prog.push_op(scope, op);
        }

        let outputs = raw
            .outputs
            .iter()
            .map(|n| self.resolve(n))
            .collect::<Result<Vec<_>, _>>()?;
        self.prog.set_scope_outputs(scope, outputs);
        Ok(scope)
    }

    fn build_operation(&mut self, raw: &RawOperation<'_>) -> Result<OpRef, ParseError> {
        let name = match (raw.name, raw.outputs.first().copied()) {
            (Some(name), _) | (None, Some(name)) => Symbol::from_dynamic(name),
            (None, None) => {
                return Err(build_error(format!(
                    "'{}' operation has no outputs and no @name",
                    raw.op_type
                )));
            }
        };

        // Inputs resolve against names visible before this op.
        let mut inputs = Vec::with_capacity(raw.inputs.len());
        for (param, raw_input) in &raw.inputs {
            let input = match raw_input {
                RawInput::Single(v) => Input::Single(self.resolve(v)?),
                RawInput::Multi(vs) => Input::Multi(
                    vs.iter()
                        .map(|v| self.resolve(v))
                        .collect::<Result<_, _>>()?,
                ),
            };
            inputs.push((Symbol::from_dynamic(param), input));
        }

        // Nested scopes see the enclosing names but not this op's outputs.
        let scopes = raw
            .scopes
            .iter()
            .map(|s| self.build_scope(s))
            .collect::<Result<Vec<_>, _>>()?;
        let kind = match (raw.op_type, scopes.as_slice()) {
            ("cond", &[then_branch, else_branch]) => OpKind::Cond {
                then_branch,
                else_branch,
            },
            ("while_loop", &[cond, body]) => OpKind::WhileLoop { cond, body },
            ("cond" | "while_loop", _) => {
                return Err(build_error(format!(
                    "'{}' requires exactly 2 scopes, found {}",
                    raw.op_type,
                    scopes.len()
                )));
            }
            (op_type, []) => OpKind::Plain(Symbol::from_dynamic(op_type)),
            (op_type, _) => {
                return Err(build_error(format!(
                    "'{op_type}' operation cannot own scopes"
                )));
            }
        };

        let mut builder =
            OperationDataBuilder::new(name, kind).outputs(Symbol::intern_all(&raw.outputs));
        for (key, val) in &raw.attributes {
            builder = builder.attr(Symbol::from_dynamic(key), Self::build_attribute(val));
        }
        let mut data = builder.build();
        data.inputs = inputs;
        let op = self.prog.create_op(data);

        for (idx, out) in raw.outputs.iter().enumerate() {
            let v = self.prog.op_output(op, idx as u32);
            self.define(out, v)?;
        }
        Ok(op)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a program in the text format.
pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    let mut remaining = input;
    let mut raw_funcs = Vec::new();
    loop {
        ws.parse_next(&mut remaining).map_err(|e| ParseError {
            message: format!("lexer error: {}", e),
            offset: input.len() - remaining.len(),
        })?;
        if remaining.is_empty() {
            break;
        }
        let raw_func = raw_function
            .parse_next(&mut remaining)
            .map_err(|e| ParseError {
                message: format!("parse error: {}", e),
                offset: input.len() - remaining.len(),
            })?;
        raw_funcs.push(raw_func);
    }

    let mut prog = Program::new();
    let mut builder = ProgramBuilder::new(&mut prog);
    for raw_func in &raw_funcs {
        builder.build_function(raw_func)?;
    }
    Ok(prog)
}

/// Parse a program for tests, panicking with a readable message on failure.
pub fn parse_test_program(input: &str) -> Program {
    parse_program(input).unwrap_or_else(|e| {
        panic!(
            "Failed to parse test IR at offset {}:\n  {}\n\nInput:\n{}",
            e.offset, e.message, input
        );
    })
}

// ============================================================================
// Tests
// ============================================================================
