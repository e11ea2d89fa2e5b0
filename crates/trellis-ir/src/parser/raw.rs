//! Raw (unresolved) parse structures and winnow combinators for the text format.
//!
//! This module contains the "stage 1" parser: text → `Raw*` structs.
//! Names stay unresolved strings until [`super::ProgramBuilder`] binds them.

use winnow::ascii;
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

// ============================================================================
// Error type
// ============================================================================

/// Parse error for the IR text format.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Raw (unresolved) AST structures
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct RawFunction<'a> {
    pub name: &'a str,
    /// Parameters are the body's scope inputs.
    pub body: RawScope<'a>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawScope<'a> {
    pub inputs: Vec<&'a str>,
    pub ops: Vec<RawOperation<'a>>,
    pub outputs: Vec<&'a str>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawOperation<'a> {
    pub outputs: Vec<&'a str>,
    pub op_type: &'a str,
    /// Optional explicit name from `@name` after the op type.
    pub name: Option<&'a str>,
    pub inputs: Vec<(&'a str, RawInput<'a>)>,
    pub attributes: Vec<(&'a str, RawAttribute)>,
    pub scopes: Vec<RawScope<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawInput<'a> {
    Single(&'a str),
    Multi(Vec<&'a str>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawAttribute {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<RawAttribute>),
}

// ============================================================================
// Winnow parsers
// ============================================================================

/// Skip whitespace and `//` line comments.
pub(crate) fn ws(input: &mut &str) -> ModalResult<()> {
    loop {
        take_while(0.., |c: char| c.is_ascii_whitespace())
            .void()
            .parse_next(input)?;
        if input.starts_with("//") {
            take_till(0.., '\n').void().parse_next(input)?;
        } else {
            return Ok(());
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse an identifier: [a-zA-Z_][a-zA-Z0-9_]*
pub(crate) fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_name_char),
    )
        .take()
        .parse_next(input)
}

/// Parse a variable reference: %name
pub(crate) fn var_ref<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded('%', take_while(1.., is_name_char)).parse_next(input)
}

/// Parse a symbol reference: @name
pub(crate) fn symbol_ref<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded('@', take_while(1.., is_name_char)).parse_next(input)
}

/// Parse a parenthesized variable list: (%a, %b) or ()
pub(crate) fn var_list<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    delimited(
        ('(', ws),
        separated(0.., (ws, var_ref, ws).map(|(_, v, _)| v), ','),
        (ws, ')'),
    )
    .parse_next(input)
}

fn int_lit(input: &mut &str) -> ModalResult<i64> {
    ascii::dec_int.parse_next(input)
}

/// Parse a float literal that MUST contain a decimal point.
/// Accepts optional exponent notation: `3.14`, `-1.0e10`, `2.5e-3`.
/// This prevents `42` from being parsed as a float.
pub(crate) fn float_with_dot(input: &mut &str) -> ModalResult<f64> {
    let s = (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['+', '-'])),
            take_while(1.., |c: char| c.is_ascii_digit()),
        )),
    )
        .take()
        .parse_next(input)?;
    s.parse::<f64>()
        .map_err(|_| winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new()))
}

/// Parse a string literal: "content"
pub(crate) fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            '"' => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
            _ => result.push(c),
        }
    }
    Ok(result)
}

/// Parse an attribute value.
pub(crate) fn raw_attr_value(input: &mut &str) -> ModalResult<RawAttribute> {
    alt((
        "true".value(RawAttribute::Bool(true)),
        "false".value(RawAttribute::Bool(false)),
        string_lit.map(RawAttribute::String),
        delimited(
            ('[', ws),
            separated(0.., (ws, raw_attr_value, ws).map(|(_, a, _)| a), ','),
            (ws, ']'),
        )
        .map(RawAttribute::List),
        float_with_dot.map(RawAttribute::Float),
        int_lit.map(RawAttribute::Int),
    ))
    .parse_next(input)
}

/// Parse an attribute dict: {key = value, ...}
///
/// At least one entry is required so that an empty scope body `{ }` is
/// never mistaken for attributes.
pub(crate) fn raw_attr_dict<'a>(input: &mut &'a str) -> ModalResult<Vec<(&'a str, RawAttribute)>> {
    delimited(
        ('{', ws),
        separated(
            1..,
            (ws, ident, ws, '=', ws, raw_attr_value, ws).map(|(_, k, _, _, _, v, _)| (k, v)),
            ',',
        ),
        (ws, '}'),
    )
    .parse_next(input)
}

/// Parse one input binding: `param = %v` or `param = (%a, %b)`
fn input_binding<'a>(input: &mut &'a str) -> ModalResult<(&'a str, RawInput<'a>)> {
    (
        ws,
        ident,
        ws,
        '=',
        ws,
        alt((var_ref.map(RawInput::Single), var_list.map(RawInput::Multi))),
        ws,
    )
        .map(|(_, param, _, _, _, value, _)| (param, value))
        .parse_next(input)
}

/// Parse the input list: (param = %v, ...)
fn input_list<'a>(input: &mut &'a str) -> ModalResult<Vec<(&'a str, RawInput<'a>)>> {
    delimited(
        ('(', ws),
        separated(0.., input_binding, ','),
        (ws, ')'),
    )
    .parse_next(input)
}

/// Parse output list: %a = or %a, %b =
fn output_list<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    let outputs: Vec<&str> =
        separated(1.., (ws, var_ref, ws).map(|(_, v, _)| v), ',').parse_next(input)?;
    ws.parse_next(input)?;
    '='.parse_next(input)?;
    Ok(outputs)
}

/// Parse a single operation.
///
/// Grammar:
/// ```text
/// [outputs =] op_type [@name] [(param = %v | param = (%a, ...), ...)]
///   [{attrs}] [scope]*
/// ```
pub(crate) fn raw_operation<'a>(input: &mut &'a str) -> ModalResult<RawOperation<'a>> {
    ws.parse_next(input)?;

    let outputs = opt(output_list).parse_next(input)?.unwrap_or_default();
    ws.parse_next(input)?;

    let op_type = ident.parse_next(input)?;
    let name = opt(preceded(ws, symbol_ref)).parse_next(input)?;

    // A `(` that does not hold `param = ...` bindings opens a scope input list.
    let inputs = opt(preceded(ws, input_list))
        .parse_next(input)?
        .unwrap_or_default();

    let attributes = opt(preceded(ws, raw_attr_dict))
        .parse_next(input)?
        .unwrap_or_default();

    let mut scopes = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.starts_with('(') || input.starts_with('{') {
            scopes.push(raw_scope.parse_next(input)?);
        } else {
            break;
        }
    }

    Ok(RawOperation {
        outputs,
        op_type,
        name,
        inputs,
        attributes,
        scopes,
    })
}

/// Parse a scope: [(%inputs)] { ops... } -> (%outputs)
pub(crate) fn raw_scope<'a>(input: &mut &'a str) -> ModalResult<RawScope<'a>> {
    let inputs = opt(var_list).parse_next(input)?.unwrap_or_default();
    ws.parse_next(input)?;
    '{'.parse_next(input)?;

    let mut ops = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.starts_with('}') || input.is_empty() {
            break;
        }
        ops.push(raw_operation.parse_next(input)?);
    }

    '}'.parse_next(input)?;
    ws.parse_next(input)?;
    "->".parse_next(input)?;
    ws.parse_next(input)?;
    let outputs = var_list.parse_next(input)?;

    Ok(RawScope {
        inputs,
        ops,
        outputs,
    })
}

/// Parse a function: func @name(%params) { ops... } -> (%outputs)
pub(crate) fn raw_function<'a>(input: &mut &'a str) -> ModalResult<RawFunction<'a>> {
    ws.parse_next(input)?;
    "func".parse_next(input)?;
    ws.parse_next(input)?;
    let name = symbol_ref.parse_next(input)?;
    ws.parse_next(input)?;
    let body = raw_scope.parse_next(input)?;
    Ok(RawFunction { name, body })
}

// ============================================================================
// Tests (pure combinator tests)
// ============================================================================
