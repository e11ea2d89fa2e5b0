//! Interned names for operations, variables, functions and attribute keys.
//!
//! Every name in a program goes through one process-wide `lasso` table, so a
//! `Symbol` is a 4-byte key that compares and hashes without touching text.

use std::fmt;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;
use smallvec::SmallVec;

static NAMES: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// An interned name.
///
/// Ordering is by first interning, not by text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Intern a literal name.
    pub fn new(text: &'static str) -> Self {
        Self::intern_with(text, |names| names.get_or_intern_static(text))
    }

    /// Intern a name borrowed from input text.
    pub fn from_dynamic(text: &str) -> Self {
        Self::intern_with(text, |names| names.get_or_intern(text))
    }

    /// Intern a run of names (scope inputs, op outputs) under one write lock.
    pub fn intern_all(texts: &[&str]) -> SmallVec<[Symbol; 4]> {
        let mut names = NAMES.write();
        texts
            .iter()
            .map(|text| Symbol(names.get_or_intern(text)))
            .collect()
    }

    fn intern_with(text: &str, insert: impl FnOnce(&mut Rodeo) -> Spur) -> Self {
        if let Some(key) = NAMES.read().get(text) {
            return Symbol(key);
        }
        Symbol(insert(&mut NAMES.write()))
    }

    /// Borrow the name's text for the duration of `f`.
    ///
    /// `f` may itself resolve other symbols.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let names = NAMES.read_recursive();
        f(names.resolve(&self.0))
    }
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl PartialEq<Symbol> for &str {
    fn eq(&self, other: &Symbol) -> bool {
        other == self
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}
