//! Scoped mutation of the process environment.
//!
//! [`EnvScope`] snapshots the whole environment when entered and restores it
//! exactly when dropped: every key present afterward but absent before is
//! removed, and every original key gets its original value back. Because the
//! restore runs in `Drop`, it happens on every exit path of a render.
//!
//! The environment is process-wide, so scopes also hold a process-wide lock.
//! Two renders on different threads serialize instead of restoring each
//! other's variables. A render nested inside another on the same thread (a
//! registered function that renders a sub-template) reuses the outer lock.

use std::cell::Cell;
use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::error::{Result, SigilError};

static RENDER_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Captured environment, in the order the OS reported it.
pub type EnvSnapshot = Vec<(OsString, OsString)>;

/// Guard that restores the process environment when dropped.
pub struct EnvScope {
    snapshot: EnvSnapshot,
    _lock: Option<MutexGuard<'static, ()>>,
}

impl EnvScope {
    /// Snapshots the environment, taking the render lock unless this thread
    /// already holds it.
    pub fn enter() -> Self {
        let depth = DEPTH.with(Cell::get);
        let lock = if depth == 0 {
            Some(RENDER_LOCK.lock().unwrap_or_else(PoisonError::into_inner))
        } else {
            None
        };
        DEPTH.with(|d| d.set(depth + 1));

        let snapshot: EnvSnapshot = env::vars_os().collect();
        debug!(vars = snapshot.len(), depth, "entered environment scope");
        Self {
            snapshot,
            _lock: lock,
        }
    }

    /// Writes one variable into the process environment.
    ///
    /// Names that are empty or contain `=` or NUL, and values containing
    /// NUL, are rejected instead of reaching the OS.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let reason = if key.is_empty() {
            Some("name is empty")
        } else if key.contains('=') {
            Some("name contains '='")
        } else if key.contains('\0') {
            Some("name contains a NUL byte")
        } else if value.contains('\0') {
            Some("value contains a NUL byte")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(SigilError::Environment {
                key: key.to_string(),
                reason: reason.to_string(),
            });
        }

        env::set_var(key, value);
        Ok(())
    }

    /// The environment as it was when the scope was entered.
    pub fn snapshot(&self) -> &[(OsString, OsString)] {
        &self.snapshot
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        restore_env(&self.snapshot);
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
        debug!("restored environment");
    }
}

/// Clears the environment, then re-applies every captured pair.
pub fn restore_env(snapshot: &[(OsString, OsString)]) {
    for (key, _) in env::vars_os() {
        if settable(&key) {
            env::remove_var(&key);
        }
    }
    for (key, value) in snapshot {
        if settable(key) {
            env::set_var(key, value);
        } else {
            warn!(key = ?key, "skipping unrestorable environment entry");
        }
    }
}

fn settable(key: &OsStr) -> bool {
    let bytes = key.as_encoded_bytes();
    !bytes.is_empty() && !bytes.contains(&b'=') && !bytes.contains(&0)
}
