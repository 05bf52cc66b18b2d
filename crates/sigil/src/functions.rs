//! Template function registry.
//!
//! Functions registered here are available to every template rendered by
//! the owning engine, both as calls (`{{ upper(name) }}`) and in pipelines
//! (`{{ name | upper }}`, where the piped value becomes the first argument).
//!
//! Registration merges: new names are added and existing names are
//! overwritten. Nothing is ever removed.
//!
//! ```rust
//! use sigil::{Function, Sigil};
//! use sigil::minijinja::value::{from_args, Value};
//! use std::collections::HashMap;
//!
//! let mut engine = Sigil::new();
//! engine.register([(
//!     "shout",
//!     Function::new(|args| {
//!         let (text,): (String,) = from_args(args)?;
//!         Ok(Value::from(text.to_uppercase()))
//!     }),
//! )]);
//!
//! let out = engine.execute("{{ 'hi' | shout }}", &HashMap::new(), "greeting").unwrap();
//! assert_eq!(out, "HI");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Rest, Value};
use minijinja::Environment;

type Callable = dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync;

/// A callable exposed to templates.
#[derive(Clone)]
pub struct Function(Arc<Callable>);

impl Function {
    /// Wraps a closure taking the call's positional arguments.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Value]) -> Result<Value, minijinja::Error> {
        (self.0)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function(..)")
    }
}

/// Name to callable mapping consulted at every render.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Function>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `functions` into the registry, overwriting existing names.
    pub fn register<I, K>(&mut self, functions: I)
    where
        I: IntoIterator<Item = (K, Function)>,
        K: Into<String>,
    {
        for (name, function) in functions {
            self.functions.insert(name.into(), function);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Exposes every function as a global callable and as a filter.
    pub(crate) fn install(&self, env: &mut Environment<'_>) {
        for (name, function) in &self.functions {
            let call = function.clone();
            env.add_function(name.clone(), move |args: Rest<Value>| call.call(&args));
            let filter = function.clone();
            env.add_filter(name.clone(), move |args: Rest<Value>| filter.call(&args));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::value::from_args;

    fn constant(text: &'static str) -> Function {
        Function::new(move |_| Ok(Value::from(text)))
    }

    #[test]
    fn test_register_adds_and_overwrites() {
        let mut registry = FunctionRegistry::new();
        registry.register([("a", constant("1")), ("b", constant("2"))]);
        registry.register([("b", constant("3"))]);

        assert_eq!(registry.len(), 2);
        let b = registry.get("b").unwrap().call(&[]).unwrap();
        assert_eq!(b.as_str(), Some("3"));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = FunctionRegistry::new();
        registry.register([("zeta", constant("")), ("alpha", constant(""))]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_install_exposes_call_and_filter() {
        let mut registry = FunctionRegistry::new();
        registry.register([(
            "join_with",
            Function::new(|args| {
                let (items, sep): (Vec<String>, String) = from_args(args)?;
                Ok(Value::from(items.join(&sep)))
            }),
        )]);

        let mut env = Environment::new();
        registry.install(&mut env);
        let called = env
            .render_str("{{ join_with(['a', 'b'], '-') }}", ())
            .unwrap();
        let piped = env.render_str("{{ ['a', 'b'] | join_with(',') }}", ()).unwrap();
        assert_eq!(called, "a-b");
        assert_eq!(piped, "a,b");
    }

    #[test]
    fn test_function_errors_surface() {
        let mut registry = FunctionRegistry::new();
        registry.register([(
            "fail",
            Function::new(|_| {
                Err(minijinja::Error::new(
                    minijinja::ErrorKind::InvalidOperation,
                    "nope",
                ))
            }),
        )]);
        let mut env = Environment::new();
        registry.install(&mut env);
        assert!(env.render_str("{{ fail() }}", ()).is_err());
    }
}
