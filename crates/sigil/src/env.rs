//! Name lookup for POSIX expansion.
//!
//! [`posix::expand`](crate::posix::expand) resolves `$NAME` through
//! [`VarLookup`]. Renders use [`ProcessEnv`]; plain maps work for expanding
//! against a fixed set of names.

use std::collections::{BTreeMap, HashMap};

/// Resolves a parameter name to its value, `None` when unset.
pub trait VarLookup {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The current process environment. Non-UTF-8 values count as unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl VarLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VarLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
