//! Program transformation passes.
//!
//! Passes mutate a [`crate::Program`] in place and report what they did
//! through a [`crate::DiagnosticSink`].

pub mod dce;

pub use dce::{DceResult, LiveSet, eliminate, eliminate_dead_code};
