//! # Sigil - Configuration Templates with POSIX Pre-Expansion
//!
//! `sigil` renders text templates for configuration files and scripts. Values
//! come from a caller-supplied variable map, and optionally from the process
//! environment through shell-style `$VAR` / `${VAR}` references that are
//! expanded before the template itself is evaluated.
//!
//! ## Core Concepts
//!
//! - [`Sigil`]: An engine holding delimiters, the POSIX flag, the include
//!   search path and registered functions
//! - [`Delimiters`]: The `"LEFT RIGHT"` pair that configures template syntax
//! - [`SearchPath`]: Stack of directories used to resolve included templates
//! - [`FunctionRegistry`]: Callables exposed to every template
//! - [`Input`]: A template body as text, a named stream, or any `Display` value
//! - [`EnvScope`]: Snapshot/restore of the process environment around a render
//!
//! ## Quick Start
//!
//! ```rust
//! use sigil::Sigil;
//! use std::collections::HashMap;
//!
//! let engine = Sigil::new();
//! let vars = HashMap::from([
//!     ("server".to_string(), "db.internal".to_string()),
//!     ("port".to_string(), "5432".to_string()),
//! ]);
//!
//! let out = engine
//!     .execute("url = postgres://{{ server }}:{{ port }}\n", &vars, "db.conf")
//!     .unwrap();
//! assert_eq!(out, "url = postgres://db.internal:5432\n");
//! ```
//!
//! ## Environment
//!
//! During a render, every variable is also exported into the process
//! environment so POSIX references can see it. The environment is restored
//! exactly once the render returns, on success and on error. Renders
//! serialize on a process-wide lock while the environment is modified.
//!
//! ## Global Engine
//!
//! The free functions ([`execute`], [`register`], [`push_path`], ...) act on
//! a process-wide default [`Sigil`], for programs that want a single shared
//! configuration.

mod config;
mod delimiters;
mod engine;
pub mod env;
mod error;
mod functions;
mod global;
mod input;
mod path;
pub mod posix;
pub mod scope;

pub use config::SigilConfig;
pub use delimiters::{decode_delimiters, Delimiters, DEFAULT_DELIMITERS};
pub use engine::Sigil;
pub use env::{ProcessEnv, VarLookup};
pub use error::{Result, SigilError};
pub use functions::{Function, FunctionRegistry};
pub use global::{
    default_engine, delimiters, execute, execute_input, look_path, pop_path, posix_preprocess,
    push_path, register, reset, set_delimiters, set_posix_preprocess,
};
pub use input::{Input, NamedReader, Source};
pub use path::SearchPath;
pub use scope::EnvScope;

// Re-export for function authors.
pub use minijinja;
