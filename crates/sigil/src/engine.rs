//! The render pipeline.
//!
//! [`Sigil`] owns everything that shapes a render (delimiters, the POSIX
//! flag, the include search path and the function registry) and runs one
//! template body against a map of named values:
//!
//! 1. Snapshot the process environment ([`EnvScope`]).
//! 2. Resolve the delimiter pair.
//! 3. Export each variable into the environment and declare it in a
//!    prologue of `set` statements.
//! 4. Expand POSIX references in the body, if enabled.
//! 5. Collapse escaped line continuations (`\}}` + newline + `{{`).
//! 6. Parse prologue + body under the resolved syntax.
//! 7. Render with the variables as data context.
//! 8. Restore the environment, whatever happened above.
//!
//! POSIX expansion runs strictly before template parsing and only consumes
//! `$`-prefixed tokens, so both syntaxes can be mixed in one body:
//!
//! ```rust
//! use sigil::Sigil;
//! use std::collections::HashMap;
//!
//! let mut engine = Sigil::new();
//! engine.set_posix_preprocess(true);
//!
//! let vars = HashMap::from([("port".to_string(), "8080".to_string())]);
//! let out = engine
//!     .execute("listen ${port};{% if port == '8080' %} # default{% endif %}", &vars, "site")
//!     .unwrap();
//! assert_eq!(out, "listen 8080; # default");
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind};
use tracing::debug;

use crate::config::SigilConfig;
use crate::delimiters::{decode_delimiters, Delimiters, DEFAULT_DELIMITERS};
use crate::env::ProcessEnv;
use crate::error::{Result, SigilError};
use crate::functions::{Function, FunctionRegistry};
use crate::input::Input;
use crate::path::SearchPath;
use crate::posix;
use crate::scope::EnvScope;

/// A configured template renderer.
///
/// Cloning is cheap: registered functions are shared.
#[derive(Debug, Clone)]
pub struct Sigil {
    delimiters: String,
    posix: bool,
    search_path: SearchPath,
    functions: FunctionRegistry,
}

impl Default for Sigil {
    fn default() -> Self {
        Self::new()
    }
}

impl Sigil {
    /// Creates an engine with `{{ }}` delimiters, POSIX preprocessing off,
    /// an empty search path and no functions.
    pub fn new() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_string(),
            posix: false,
            search_path: SearchPath::new(),
            functions: FunctionRegistry::new(),
        }
    }

    /// Creates an engine from loaded configuration.
    pub fn with_config(config: SigilConfig) -> Self {
        Self {
            delimiters: config.delimiters,
            posix: config.posix,
            search_path: SearchPath::from(config.search_path),
            functions: FunctionRegistry::new(),
        }
    }

    /// Current settings, without the function registry.
    pub fn config(&self) -> SigilConfig {
        SigilConfig {
            delimiters: self.delimiters.clone(),
            posix: self.posix,
            search_path: self.search_path.dirs().to_vec(),
        }
    }

    /// Sets the raw `"LEFT RIGHT"` delimiter string.
    ///
    /// The string is validated when a render starts, not here.
    pub fn set_delimiters(&mut self, delimiters: impl Into<String>) {
        self.delimiters = delimiters.into();
    }

    pub fn delimiters(&self) -> &str {
        &self.delimiters
    }

    /// Parses the configured delimiter string.
    pub fn decode_delimiters(&self) -> Result<Delimiters> {
        decode_delimiters(&self.delimiters)
    }

    pub fn set_posix_preprocess(&mut self, enabled: bool) {
        self.posix = enabled;
    }

    pub fn posix_preprocess(&self) -> bool {
        self.posix
    }

    /// Merges functions into the registry, overwriting existing names.
    pub fn register<I, K>(&mut self, functions: I)
    where
        I: IntoIterator<Item = (K, Function)>,
        K: Into<String>,
    {
        self.functions.register(functions);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Makes `dir` the most preferred include directory.
    pub fn push_path(&mut self, dir: impl Into<PathBuf>) {
        self.search_path.push(dir);
    }

    /// Discards the most recently pushed include directory.
    ///
    /// # Panics
    ///
    /// Panics if the search path is empty.
    pub fn pop_path(&mut self) {
        self.search_path.pop();
    }

    /// Resolves `file` against the current directory and the search path.
    pub fn look_path(&self, file: impl AsRef<Path>) -> Result<PathBuf> {
        self.search_path.look(file)
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Renders `body` with `vars`, naming the template `name` in errors.
    ///
    /// Every variable is exported to the environment. Only names that are
    /// assignable identifiers get a prologue declaration. The process
    /// environment is identical before and after the call, whether or not
    /// the render succeeds.
    pub fn execute(&self, body: &str, vars: &HashMap<String, String>, name: &str) -> Result<String> {
        let scope = EnvScope::enter();

        let delims = self.decode_delimiters()?;
        debug!(name, vars = vars.len(), delimiters = %delims, posix = self.posix, "rendering template");

        let mut keys: Vec<&String> = vars.keys().collect();
        keys.sort();
        let mut source = String::new();
        for key in keys {
            let value = &vars[key];
            scope.set(key, value)?;
            if assignable(key) {
                source.push_str(&delims.statement(&format!("set {key} = {}", quote(value))));
            }
        }

        source.push_str(&prepare_body(body, &delims, self.posix)?);

        let mut env = self.environment(&delims)?;
        env.add_template_owned(name.to_string(), source)
            .map_err(|e| SigilError::parse(name, e))?;
        let tmpl = env
            .get_template(name)
            .map_err(|e| SigilError::parse(name, e))?;
        let output = tmpl
            .render(vars)
            .map_err(|e| SigilError::execute(name, e))?;

        drop(scope);
        debug!(name, output_len = output.len(), "rendered template");
        Ok(output)
    }

    /// Renders an [`Input`], falling back to the input's own name when
    /// `name` is empty.
    pub fn execute_input(
        &self,
        input: Input,
        vars: &HashMap<String, String>,
        name: &str,
    ) -> Result<String> {
        let source = input.into_source();
        let name = if name.is_empty() { source.name.as_str() } else { name };
        self.execute(&source.text, vars, name)
    }

    fn environment(&self, delims: &Delimiters) -> Result<Environment<'static>> {
        let mut env = Environment::new();
        env.set_syntax(delims.syntax()?);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        self.functions.install(&mut env);

        let search = self.search_path.clone();
        let loader_delims = delims.clone();
        let posix = self.posix;
        env.set_loader(move |name| load_include(name, &search, &loader_delims, posix));
        Ok(env)
    }
}

/// POSIX expansion (when enabled) followed by continuation rewriting.
fn prepare_body(body: &str, delims: &Delimiters, posix: bool) -> Result<String> {
    if posix {
        let expanded = posix::expand(body, &ProcessEnv)?;
        Ok(delims.rewrite_continuations(&expanded))
    } else {
        Ok(delims.rewrite_continuations(body))
    }
}

/// Loader for `include`, `import` and `extends`.
///
/// Names that do not resolve are reported as missing templates by the
/// evaluator. Included bodies go through the same preparation as the
/// top-level body.
fn load_include(
    name: &str,
    search: &SearchPath,
    delims: &Delimiters,
    posix: bool,
) -> std::result::Result<Option<String>, minijinja::Error> {
    let Ok(path) = search.look(name) else {
        return Ok(None);
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot read template {}", path.display()),
            )
            .with_source(err))
        }
    };

    prepare_body(&text, delims, posix).map(Some).map_err(|err| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot prepare template {}", path.display()),
        )
        .with_source(err)
    })
}

/// Names the evaluator refuses as `set` targets.
const RESERVED: &[&str] = &[
    "true", "True", "false", "False", "none", "None", "loop", "self", "in", "is", "and", "or",
    "not", "if", "else",
];

/// Whether `name` can be declared in the prologue. Other names still reach
/// the template through the render context.
fn assignable(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.contains(&name)
}

/// Quotes `value` as a template string literal that parses back to it.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
