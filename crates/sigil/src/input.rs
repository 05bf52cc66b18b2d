//! Template input coercion.
//!
//! A template body can arrive as plain text, as a named stream (a file or
//! stdin, where the name is used in diagnostics), or as any value with a
//! textual representation. [`Input`] is the tagged form of all three;
//! [`Input::from_any`] classifies a dynamically typed value into it.

use std::any::Any;
use std::fmt;
use std::io::Read;

use crate::error::{Result, SigilError};

/// A readable byte stream paired with a name for error messages.
///
/// Reading is one-shot: converting the reader into text drains it.
pub struct NamedReader {
    name: String,
    reader: Box<dyn Read>,
}

impl NamedReader {
    /// Wraps `reader` under `name`.
    pub fn new(name: impl Into<String>, reader: impl Read + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    /// The name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NamedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedReader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A template body in one of the accepted representations.
pub enum Input {
    /// Plain text.
    Text(String),
    /// A named stream, drained on conversion.
    Named(NamedReader),
    /// Any value rendered through its `Display` implementation.
    Display(Box<dyn fmt::Display>),
}

/// Template text together with the name it came from.
///
/// `name` is empty unless the input was a [`NamedReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub text: String,
    pub name: String,
}

impl Input {
    /// Classifies a dynamically typed value.
    ///
    /// Accepts `String`, `&'static str`, [`NamedReader`], [`Input`] and
    /// `Box<dyn Display>`. Anything else is [`SigilError::UnsupportedInput`].
    ///
    /// ```rust
    /// use sigil::Input;
    ///
    /// assert!(Input::from_any(Box::new("port: 80".to_string())).is_ok());
    /// assert!(Input::from_any(Box::new(42_i64)).is_err());
    /// ```
    pub fn from_any(value: Box<dyn Any>) -> Result<Self> {
        let value = match value.downcast::<Input>() {
            Ok(input) => return Ok(*input),
            Err(value) => value,
        };
        let value = match value.downcast::<String>() {
            Ok(text) => return Ok(Input::Text(*text)),
            Err(value) => value,
        };
        let value = match value.downcast::<&'static str>() {
            Ok(text) => return Ok(Input::Text(text.to_string())),
            Err(value) => value,
        };
        let value = match value.downcast::<NamedReader>() {
            Ok(reader) => return Ok(Input::Named(*reader)),
            Err(value) => value,
        };
        match value.downcast::<Box<dyn fmt::Display>>() {
            Ok(display) => Ok(Input::Display(*display)),
            Err(_) => Err(SigilError::UnsupportedInput),
        }
    }

    /// Converts the input into text and its diagnostic name.
    ///
    /// # Panics
    ///
    /// Panics if a named stream fails to read. A supplied stream is expected
    /// to be readable; a failure here is an environment defect, not a
    /// template error.
    pub fn into_source(self) -> Source {
        match self {
            Input::Text(text) => Source {
                text,
                name: String::new(),
            },
            Input::Named(mut named) => {
                let mut text = String::new();
                if let Err(err) = named.reader.read_to_string(&mut text) {
                    panic!("failed to read template input {:?}: {err}", named.name);
                }
                Source {
                    text,
                    name: named.name,
                }
            }
            Input::Display(value) => Source {
                text: value.to_string(),
                name: String::new(),
            },
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Input::Named(named) => f.debug_tuple("Named").field(named).finish(),
            Input::Display(_) => f.write_str("Display(..)"),
        }
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<NamedReader> for Input {
    fn from(reader: NamedReader) -> Self {
        Input::Named(reader)
    }
}
