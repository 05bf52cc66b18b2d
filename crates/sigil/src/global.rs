//! Process-wide default engine.
//!
//! Free functions operating on a shared [`Sigil`] instance, for callers that
//! want one global configuration instead of passing an engine around.
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! sigil::set_delimiters("[[ ]]");
//! let out = sigil::execute("[[ who ]]", &HashMap::from([("who".into(), "ops".into())]), "motd").unwrap();
//! assert_eq!(out, "ops");
//! # sigil::reset();
//! ```
//!
//! Renders take a snapshot of the default engine and run outside its lock,
//! so a registered function may itself call into this module.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::engine::Sigil;
use crate::error::Result;
use crate::functions::Function;
use crate::input::Input;

static DEFAULT_ENGINE: Lazy<Mutex<Sigil>> = Lazy::new(|| Mutex::new(Sigil::new()));

fn with_default<T>(f: impl FnOnce(&mut Sigil) -> T) -> T {
    let mut guard = DEFAULT_ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// A copy of the default engine as currently configured.
pub fn default_engine() -> Sigil {
    with_default(|engine| engine.clone())
}

/// Restores the default engine to its initial state.
pub fn reset() {
    with_default(|engine| *engine = Sigil::new());
}

/// Merges functions into the default registry.
pub fn register<I, K>(functions: I)
where
    I: IntoIterator<Item = (K, Function)>,
    K: Into<String>,
{
    with_default(|engine| engine.register(functions));
}

/// Sets the default `"LEFT RIGHT"` delimiter string.
pub fn set_delimiters(delimiters: impl Into<String>) {
    with_default(|engine| engine.set_delimiters(delimiters));
}

pub fn delimiters() -> String {
    with_default(|engine| engine.delimiters().to_string())
}

/// Enables or disables POSIX preprocessing for default renders.
pub fn set_posix_preprocess(enabled: bool) {
    with_default(|engine| engine.set_posix_preprocess(enabled));
}

pub fn posix_preprocess() -> bool {
    with_default(|engine| engine.posix_preprocess())
}

/// Pushes onto the default search path.
pub fn push_path(dir: impl Into<PathBuf>) {
    with_default(|engine| engine.push_path(dir));
}

/// Pops from the default search path.
///
/// # Panics
///
/// Panics if the default search path is empty.
pub fn pop_path() {
    with_default(|engine| engine.pop_path());
}

/// Resolves `file` against the default search path.
pub fn look_path(file: impl AsRef<Path>) -> Result<PathBuf> {
    let engine = default_engine();
    engine.look_path(file)
}

/// Renders with the default engine. See [`Sigil::execute`].
pub fn execute(body: &str, vars: &HashMap<String, String>, name: &str) -> Result<String> {
    default_engine().execute(body, vars, name)
}

/// Renders an [`Input`] with the default engine. See [`Sigil::execute_input`].
pub fn execute_input(input: Input, vars: &HashMap<String, String>, name: &str) -> Result<String> {
    default_engine().execute_input(input, vars, name)
}
