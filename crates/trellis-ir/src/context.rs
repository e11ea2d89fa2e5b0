//! Program: arena-based mutable IR storage.
//!
//! All IR entities (operations, variables, scopes, functions) are stored in
//! `PrimaryMap`s owned by [`Program`]. Operation outputs and scope inputs
//! use `EntityList + ListPool` for compact 4-byte per-field storage.
//!
//! Removing an operation only detaches it from its scope's op list. The
//! arena slot and the variables it defined stay allocated, unreachable from
//! any function.

use cranelift_entity::{EntityList, ListPool, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

use crate::refs::*;
use crate::symbol::Symbol;
use crate::types::{Attribute, Input, OpKind};

// ============================================================================
// Entity data types
// ============================================================================

/// Data for a single operation in the arena.
pub struct OperationData {
    /// Name, unique within the owning scope.
    pub name: Symbol,
    pub kind: OpKind,
    /// Named parameters in declaration order.
    pub inputs: Vec<(Symbol, Input)>,
    /// Attributes in declaration order, keys unique.
    pub attributes: Vec<(Symbol, Attribute)>,
    /// Names of the output variables `create_op` allocates.
    pub output_names: SmallVec<[Symbol; 2]>,
    pub parent_scope: Option<ScopeRef>,
}

impl OperationData {
    /// Look up an attribute by key.
    pub fn attr(&self, key: Symbol) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Look up an input binding by parameter name.
    pub fn input(&self, param: Symbol) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, input)| input)
    }
}

/// Data for a single SSA variable.
pub struct VariableData {
    pub name: Symbol,
    pub def: VarDef,
}

/// Data for a scope.
pub struct ScopeData {
    /// Names of the input variables `create_scope` allocates.
    pub input_names: Vec<Symbol>,
    pub ops: SmallVec<[OpRef; 8]>,
    pub outputs: SmallVec<[VarRef; 2]>,
    pub owner: Option<ScopeOwner>,
}

impl ScopeData {
    /// An empty scope with the given input names.
    pub fn new(input_names: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            input_names: input_names.into_iter().collect(),
            ops: SmallVec::new(),
            outputs: SmallVec::new(),
            owner: None,
        }
    }
}

/// Data for a function.
pub struct FunctionData {
    pub name: Symbol,
    /// Root scope; its inputs are the function parameters.
    pub root: ScopeRef,
}

// ============================================================================
// Program
// ============================================================================

/// Arena-based mutable program.
///
/// Owns all IR entities and provides methods for creating, querying,
/// and mutating them. Functions are kept in insertion order.
pub struct Program {
    ops: PrimaryMap<OpRef, OperationData>,
    vars: PrimaryMap<VarRef, VariableData>,
    scopes: PrimaryMap<ScopeRef, ScopeData>,
    funcs: PrimaryMap<FuncRef, FunctionData>,

    /// Backing pool for EntityList storage.
    var_pool: ListPool<VarRef>,

    /// Mapping from operation to its output VarRefs.
    op_outputs: SecondaryMap<OpRef, EntityList<VarRef>>,
    /// Mapping from scope to its input VarRefs.
    scope_inputs: SecondaryMap<ScopeRef, EntityList<VarRef>>,
}

impl Program {
    /// Create a new empty program.
    pub fn new() -> Self {
        Self {
            ops: PrimaryMap::new(),
            vars: PrimaryMap::new(),
            scopes: PrimaryMap::new(),
            funcs: PrimaryMap::new(),
            var_pool: ListPool::new(),
            op_outputs: SecondaryMap::new(),
            scope_inputs: SecondaryMap::new(),
        }
    }

    // ========================================================================
    // Operation
    // ========================================================================

    /// Create a new operation and allocate its output variables.
    ///
    /// Nested scopes named by the op kind are back-linked to the new
    /// operation. Use `push_op` to attach the operation to a scope.
    ///
    /// # Panics
    ///
    /// Panics if `data.parent_scope` is `Some`, or if any nested scope
    /// already has an owner.
    pub fn create_op(&mut self, data: OperationData) -> OpRef {
        assert!(
            data.parent_scope.is_none(),
            "create_op: operation must not have parent_scope set; \
             use push_op to attach to a scope after creation",
        );

        let output_names = data.output_names.clone();
        let nested = data.kind.scopes();
        let op = self.ops.push(data);

        for &s in &nested {
            if let Some(existing) = self.scopes[s].owner {
                panic!(
                    "create_op: scope {s} already belongs to {existing:?}; \
                     cannot reassign to {op}",
                );
            }
            self.scopes[s].owner = Some(ScopeOwner::Op(op));
        }

        let mut outputs = EntityList::new();
        for (idx, name) in output_names.into_iter().enumerate() {
            let v = self.vars.push(VariableData {
                name,
                def: VarDef::OpOutput(op, idx as u32),
            });
            outputs.push(v, &mut self.var_pool);
        }
        self.op_outputs[op] = outputs;

        op
    }

    /// Get immutable reference to operation data.
    pub fn op(&self, op: OpRef) -> &OperationData {
        &self.ops[op]
    }

    /// Get mutable reference to operation data.
    ///
    /// **Warning**: changing `kind` here does not update scope ownership.
    pub fn op_mut(&mut self, op: OpRef) -> &mut OperationData {
        &mut self.ops[op]
    }

    /// Get the i-th output variable of an operation.
    pub fn op_output(&self, op: OpRef, index: u32) -> VarRef {
        self.op_outputs[op].as_slice(&self.var_pool)[index as usize]
    }

    /// Get all output variables of an operation.
    pub fn op_outputs(&self, op: OpRef) -> &[VarRef] {
        self.op_outputs[op].as_slice(&self.var_pool)
    }

    /// Every variable the operation reads, flattening multi-input parameters.
    pub fn op_input_vars(&self, op: OpRef) -> impl Iterator<Item = VarRef> + '_ {
        self.ops[op]
            .inputs
            .iter()
            .flat_map(|(_, input)| input.vars().iter().copied())
    }

    /// Nested scopes owned by an operation.
    pub fn op_scopes(&self, op: OpRef) -> SmallVec<[ScopeRef; 2]> {
        self.ops[op].kind.scopes()
    }

    // ========================================================================
    // Variable
    // ========================================================================

    /// Get immutable reference to variable data.
    pub fn var(&self, v: VarRef) -> &VariableData {
        &self.vars[v]
    }

    pub fn var_name(&self, v: VarRef) -> Symbol {
        self.vars[v].name
    }

    pub fn var_def(&self, v: VarRef) -> VarDef {
        self.vars[v].def
    }

    // ========================================================================
    // Scope
    // ========================================================================

    /// Create a new scope and allocate its input variables.
    ///
    /// # Panics
    ///
    /// Panics if `data.owner` is `Some`; owners are linked by `create_op`
    /// and `create_function`.
    pub fn create_scope(&mut self, data: ScopeData) -> ScopeRef {
        assert!(
            data.owner.is_none(),
            "create_scope: scope must not have an owner set",
        );
        let input_names = data.input_names.clone();
        let ops: SmallVec<[OpRef; 8]> = data.ops.clone();
        let scope = self.scopes.push(data);

        let mut inputs = EntityList::new();
        for (idx, name) in input_names.into_iter().enumerate() {
            let v = self.vars.push(VariableData {
                name,
                def: VarDef::ScopeInput(scope, idx as u32),
            });
            inputs.push(v, &mut self.var_pool);
        }
        self.scope_inputs[scope] = inputs;

        for op in ops {
            assert!(
                self.ops[op].parent_scope.is_none(),
                "create_scope: operation {op} already belongs to a scope",
            );
            self.ops[op].parent_scope = Some(scope);
        }

        scope
    }

    /// Get immutable reference to scope data.
    pub fn scope(&self, s: ScopeRef) -> &ScopeData {
        &self.scopes[s]
    }

    /// Get the i-th input variable of a scope.
    pub fn scope_input(&self, s: ScopeRef, index: u32) -> VarRef {
        self.scope_inputs[s].as_slice(&self.var_pool)[index as usize]
    }

    /// Get all input variables of a scope.
    pub fn scope_inputs(&self, s: ScopeRef) -> &[VarRef] {
        self.scope_inputs[s].as_slice(&self.var_pool)
    }

    /// Replace the declared outputs of a scope.
    pub fn set_scope_outputs(&mut self, s: ScopeRef, outputs: impl IntoIterator<Item = VarRef>) {
        self.scopes[s].outputs = outputs.into_iter().collect();
    }

    /// Append an operation to the end of a scope.
    ///
    /// # Panics
    ///
    /// Panics if the operation already belongs to a scope.
    pub fn push_op(&mut self, scope: ScopeRef, op: OpRef) {
        if let Some(existing) = self.ops[op].parent_scope {
            panic!(
                "push_op: operation {op} already belongs to {existing}; \
                 remove it from the old scope first",
            );
        }
        self.ops[op].parent_scope = Some(scope);
        self.scopes[scope].ops.push(op);
    }

    /// Keep only the operations for which `keep` returns `true`, preserving
    /// their order. Returns the detached operations in their original order.
    pub fn retain_ops(
        &mut self,
        scope: ScopeRef,
        mut keep: impl FnMut(OpRef) -> bool,
    ) -> Vec<OpRef> {
        let mut detached = Vec::new();
        self.scopes[scope].ops.retain(|o| {
            if keep(*o) {
                true
            } else {
                detached.push(*o);
                false
            }
        });
        for &op in &detached {
            self.ops[op].parent_scope = None;
        }
        detached
    }

    // ========================================================================
    // Function
    // ========================================================================

    /// Register a function whose body is `root`.
    ///
    /// # Panics
    ///
    /// Panics if a function with the same name exists or `root` already
    /// has an owner.
    pub fn create_function(&mut self, name: Symbol, root: ScopeRef) -> FuncRef {
        assert!(
            self.function_by_name(name).is_none(),
            "create_function: function @{name} already exists",
        );
        if let Some(existing) = self.scopes[root].owner {
            panic!("create_function: scope {root} already belongs to {existing:?}");
        }
        let func = self.funcs.push(FunctionData { name, root });
        self.scopes[root].owner = Some(ScopeOwner::Function(func));
        func
    }

    pub fn function(&self, f: FuncRef) -> &FunctionData {
        &self.funcs[f]
    }

    pub fn function_by_name(&self, name: Symbol) -> Option<FuncRef> {
        self.funcs
            .iter()
            .find(|(_, data)| data.name == name)
            .map(|(f, _)| f)
    }

    /// All functions in insertion order.
    pub fn functions(&self) -> impl Iterator<Item = FuncRef> + '_ {
        self.funcs.keys()
    }

    /// Function parameters (root scope inputs).
    pub fn function_params(&self, f: FuncRef) -> &[VarRef] {
        self.scope_inputs(self.funcs[f].root)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// OperationDataBuilder
// ============================================================================

/// Builder for constructing `OperationData`.
pub struct OperationDataBuilder {
    name: Symbol,
    kind: OpKind,
    inputs: Vec<(Symbol, Input)>,
    attributes: Vec<(Symbol, Attribute)>,
    output_names: SmallVec<[Symbol; 2]>,
}

impl OperationDataBuilder {
    pub fn new(name: impl Into<Symbol>, kind: OpKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            attributes: Vec::new(),
            output_names: SmallVec::new(),
        }
    }

    /// Shorthand for a `Plain` op whose name matches its single output.
    pub fn plain(name: &'static str, op_type: &'static str) -> Self {
        Self::new(name, OpKind::Plain(Symbol::new(op_type))).output(name)
    }

    pub fn input(mut self, param: impl Into<Symbol>, v: VarRef) -> Self {
        self.inputs.push((param.into(), Input::Single(v)));
        self
    }

    pub fn multi_input(
        mut self,
        param: impl Into<Symbol>,
        vs: impl IntoIterator<Item = VarRef>,
    ) -> Self {
        self.inputs
            .push((param.into(), Input::Multi(vs.into_iter().collect())));
        self
    }

    /// Set an attribute, replacing an earlier value for the same key.
    pub fn attr(mut self, key: impl Into<Symbol>, val: impl Into<Attribute>) -> Self {
        let (key, val) = (key.into(), val.into());
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = val,
            None => self.attributes.push((key, val)),
        }
        self
    }

    pub fn output(mut self, name: impl Into<Symbol>) -> Self {
        self.output_names.push(name.into());
        self
    }

    pub fn outputs<S: Into<Symbol>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.output_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> OperationData {
        OperationData {
            name: self.name,
            kind: self.kind,
            inputs: self.inputs,
            attributes: self.attributes,
            output_names: self.output_names,
            parent_scope: None,
        }
    }
}
