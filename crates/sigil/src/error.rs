//! Error types for template rendering.
//!
//! Every fallible operation in the crate returns [`SigilError`]. The variants
//! follow the render pipeline, so a caller can tell from the variant alone
//! which stage failed and what needs fixing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or running a render.
#[derive(Debug, Error)]
pub enum SigilError {
    /// Malformed configuration, such as a delimiter string that does not
    /// split into two tokens.
    #[error("configuration error: {0}")]
    Config(String),

    /// A variable could not be written into the process environment.
    #[error("cannot set environment variable {key:?}: {reason}")]
    Environment { key: String, reason: String },

    /// Malformed POSIX expression in the template body.
    #[error("posix expansion failed at byte {offset}: {message}")]
    Preprocess { offset: usize, message: String },

    /// Template syntax error.
    #[error("failed to parse template {name:?}: {source}")]
    Parse {
        name: String,
        line: Option<usize>,
        #[source]
        source: minijinja::Error,
    },

    /// Runtime failure while evaluating a parsed template.
    #[error("failed to execute template {name:?}: {source}")]
    Execute {
        name: String,
        line: Option<usize>,
        #[source]
        source: minijinja::Error,
    },

    /// Path resolution exhausted the search list.
    #[error("not found in path: {file} {search:?}")]
    NotFound { file: String, search: Vec<PathBuf> },

    /// Input coercion could not classify the value.
    #[error("unsupported input type")]
    UnsupportedInput,
}

impl SigilError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn parse(name: &str, source: minijinja::Error) -> Self {
        Self::Parse {
            name: name.to_string(),
            line: source.line(),
            source,
        }
    }

    pub(crate) fn execute(name: &str, source: minijinja::Error) -> Self {
        Self::Execute {
            name: name.to_string(),
            line: source.line(),
            source,
        }
    }

    /// Line reported by the template evaluator, for parse and execute errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::Execute { line, .. } => *line,
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for SigilError {
    fn from(err: serde_yaml::Error) -> Self {
        SigilError::Config(err.to_string())
    }
}

/// Result type for sigil operations.
pub type Result<T> = std::result::Result<T, SigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_lists_search_path() {
        let err = SigilError::NotFound {
            file: "base.tmpl".into(),
            search: vec![PathBuf::from("/etc/tmpl"), PathBuf::from("/opt/tmpl")],
        };
        let msg = err.to_string();
        assert!(msg.contains("base.tmpl"));
        assert!(msg.contains("/etc/tmpl"));
        assert!(msg.contains("/opt/tmpl"));
    }

    #[test]
    fn test_parse_error_keeps_name_and_line() {
        let source = minijinja::Error::new(minijinja::ErrorKind::SyntaxError, "unexpected end");
        let err = SigilError::parse("nginx.conf", source);
        assert!(err.to_string().contains("nginx.conf"));
        assert!(matches!(err, SigilError::Parse { .. }));
    }

    #[test]
    fn test_from_yaml_error_is_config() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{").unwrap_err();
        let err: SigilError = yaml_err.into();
        assert!(matches!(err, SigilError::Config(_)));
    }
}
