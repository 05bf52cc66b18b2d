//! Engine configuration.
//!
//! [`SigilConfig`] holds the settings that shape every render: the
//! delimiter string, whether POSIX preprocessing runs, and the template
//! search path. It can be built in code or loaded from YAML:
//!
//! ```rust
//! use sigil::SigilConfig;
//!
//! let config = SigilConfig::from_yaml(r#"
//! delimiters: "[[ ]]"
//! posix: true
//! search_path:
//!   - /etc/app/templates
//!   - /usr/share/app/templates
//! "#).unwrap();
//!
//! assert_eq!(config.delimiters, "[[ ]]");
//! assert!(config.posix);
//! ```
//!
//! Missing keys take their defaults (`"{{ }}"`, POSIX off, empty path).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::delimiters::DEFAULT_DELIMITERS;
use crate::error::{Result, SigilError};

/// Render settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigilConfig {
    /// `"LEFT RIGHT"` delimiter string.
    pub delimiters: String,
    /// Expand `$VAR` / `${VAR}` before template evaluation.
    pub posix: bool,
    /// Include directories, most preferred first.
    pub search_path: Vec<PathBuf>,
}

impl Default for SigilConfig {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_string(),
            posix: false,
            search_path: Vec::new(),
        }
    }
}

impl SigilConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            SigilError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }
}
