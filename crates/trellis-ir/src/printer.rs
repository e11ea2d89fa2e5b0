//! Text format printer.
//!
//! ```text
//! func @main(%x) {
//!   %c = const {val = 2}
//!   %m = mul(x = %x, y = %c)
//!   %r = cond(pred = %p) {
//!     %a = add(x = %m, y = %m)
//!   } -> (%a) {
//!     %b = identity(x = %m)
//!   } -> (%b)
//! } -> (%r)
//! ```
//!
//! Operations print `@name` only when the name differs from the first
//! output's name (or there are no outputs), so the common case stays terse.

use std::fmt;
use std::fmt::Write;

use crate::context::Program;
use crate::refs::*;
use crate::types::{Attribute, Input};

const INDENT: &str = "  ";

// ============================================================================
// Public API
// ============================================================================

/// Print every function of a program, separated by blank lines.
pub fn print_program(prog: &Program) -> String {
    let mut out = String::new();
    for (i, func) in prog.functions().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_function(prog, &mut out, func).expect("fmt::Write to String never fails");
    }
    out
}

/// Print a single function.
pub fn print_function(prog: &Program, func: FuncRef) -> String {
    let mut out = String::new();
    write_function(prog, &mut out, func).expect("fmt::Write to String never fails");
    out
}

/// Print an operation (and its nested scopes) at indentation level zero.
pub fn print_op(prog: &Program, op: OpRef) -> String {
    let mut out = String::new();
    write_op(prog, &mut out, op, 0).expect("fmt::Write to String never fails");
    out
}

// ============================================================================
// Structure printing
// ============================================================================

fn write_function(prog: &Program, f: &mut impl Write, func: FuncRef) -> fmt::Result {
    let data = prog.function(func);
    write!(f, "func @{}", data.name)?;
    write_var_list(prog, f, prog.function_params(func))?;
    f.write_char(' ')?;
    write_scope_body(prog, f, data.root, 0)?;
    f.write_char('\n')
}

/// `{ ops } -> (outputs)`, closing brace at `indent`.
fn write_scope_body(
    prog: &Program,
    f: &mut impl Write,
    scope: ScopeRef,
    indent: usize,
) -> fmt::Result {
    f.write_str("{\n")?;
    for &op in &prog.scope(scope).ops {
        write_op(prog, f, op, indent + 1)?;
    }
    write_indent(f, indent)?;
    f.write_str("} -> ")?;
    write_var_list(prog, f, &prog.scope(scope).outputs)
}

fn write_op(prog: &Program, f: &mut impl Write, op: OpRef, indent: usize) -> fmt::Result {
    let data = prog.op(op);
    let outputs = prog.op_outputs(op);
    write_indent(f, indent)?;

    if !outputs.is_empty() {
        for (i, &v) in outputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_var(prog, f, v)?;
        }
        f.write_str(" = ")?;
    }

    write!(f, "{}", data.kind.op_type())?;
    let named_after_output = outputs
        .first()
        .is_some_and(|&v| prog.var_name(v) == data.name);
    if !named_after_output {
        write!(f, " @{}", data.name)?;
    }

    if !data.inputs.is_empty() {
        f.write_char('(')?;
        for (i, (param, input)) in data.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param} = ")?;
            match input {
                Input::Single(v) => write_var(prog, f, *v)?,
                Input::Multi(vs) => write_var_list(prog, f, vs)?,
            }
        }
        f.write_char(')')?;
    }

    if !data.attributes.is_empty() {
        f.write_str(" {")?;
        for (i, (key, val)) in data.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} = ")?;
            write_attribute(f, val)?;
        }
        f.write_char('}')?;
    }

    for scope in data.kind.scopes() {
        f.write_char(' ')?;
        let inputs = prog.scope_inputs(scope);
        if !inputs.is_empty() {
            write_var_list(prog, f, inputs)?;
            f.write_char(' ')?;
        }
        write_scope_body(prog, f, scope, indent)?;
    }

    f.write_char('\n')
}

fn write_indent(f: &mut impl Write, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_var(prog: &Program, f: &mut impl Write, v: VarRef) -> fmt::Result {
    write!(f, "%{}", prog.var_name(v))
}

fn write_var_list(prog: &Program, f: &mut impl Write, vars: &[VarRef]) -> fmt::Result {
    f.write_char('(')?;
    for (i, &v) in vars.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_var(prog, f, v)?;
    }
    f.write_char(')')
}

// ============================================================================
// Attribute printing
// ============================================================================

fn write_attribute(f: &mut impl Write, attr: &Attribute) -> fmt::Result {
    match attr {
        Attribute::Bool(b) => write!(f, "{b}"),
        Attribute::Int(v) => write!(f, "{v}"),
        Attribute::FloatBits(bits) => {
            let v = f64::from_bits(*bits);
            let s = format!("{v}");
            f.write_str(&s)?;
            // Ensure decimal point for finite whole numbers (don't corrupt inf/NaN)
            if v.is_finite() && !s.contains('.') && !s.contains('e') && !s.contains('E') {
                f.write_str(".0")?;
            }
            Ok(())
        }
        Attribute::String(s) => {
            f.write_char('"')?;
            write_escaped_string(f, s)?;
            f.write_char('"')
        }
        Attribute::List(list) => {
            f.write_char('[')?;
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_attribute(f, item)?;
            }
            f.write_char(']')
        }
    }
}

fn write_escaped_string(f: &mut impl Write, s: &str) -> fmt::Result {
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}
