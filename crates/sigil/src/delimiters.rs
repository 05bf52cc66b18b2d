//! Delimiter configuration.
//!
//! A single configuration string such as `"{{ }}"` or `"[[ ]]"` names the
//! left and right markers of a template expression. Statement and comment
//! markers are derived from that pair so one string configures the whole
//! syntax:
//!
//! | Config    | Expressions | Statements   | Comments  |
//! |-----------|-------------|--------------|-----------|
//! | `{{ }}`   | `{{ x }}`   | `{% if %}`   | `{# c #}` |
//! | `[[ ]]`   | `[[ x ]]`   | `[% if %]`   | `[# c #]` |
//! | `<% %>`   | `<% x %>`   | `<%% if %%>` | `<# c #>` |
//!
//! When the short marker would equal the left delimiter, the marker is built
//! from the whole pair instead (`LEFT%` ... `%RIGHT`).

use std::fmt;
use std::str::FromStr;

use minijinja::syntax::SyntaxConfig;

use crate::error::{Result, SigilError};

/// Delimiter string used when none is configured.
pub const DEFAULT_DELIMITERS: &str = "{{ }}";

/// A parsed left/right delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

/// Splits a delimiter configuration string into its two tokens.
///
/// Only the first run of whitespace separates the tokens; everything after
/// it is the right delimiter, as-is.
///
/// # Example
///
/// ```rust
/// use sigil::decode_delimiters;
///
/// let d = decode_delimiters("[[ ]]").unwrap();
/// assert_eq!((d.left.as_str(), d.right.as_str()), ("[[", "]]"));
/// assert!(decode_delimiters("{{").is_err());
/// ```
pub fn decode_delimiters(config: &str) -> Result<Delimiters> {
    let malformed = || {
        SigilError::config(format!(
            "found malformed delimiter: {config:?}, use '{{{{ }}}}' or '[[ ]]'"
        ))
    };

    let split = config.find(char::is_whitespace).ok_or_else(malformed)?;
    let left = &config[..split];
    let right = config[split..].trim_start();
    if left.is_empty() || right.is_empty() {
        return Err(malformed());
    }

    Ok(Delimiters {
        left: left.to_string(),
        right: right.to_string(),
    })
}

impl Delimiters {
    /// Markers bracketing statements such as `set`, `if` and `for`.
    pub fn block(&self) -> (String, String) {
        self.derived('%')
    }

    /// Markers bracketing comments.
    pub fn comment(&self) -> (String, String) {
        self.derived('#')
    }

    fn derived(&self, marker: char) -> (String, String) {
        let mut open = String::new();
        open.extend(self.left.chars().next());
        open.push(marker);

        if open == self.left {
            return (
                format!("{}{marker}", self.left),
                format!("{marker}{}", self.right),
            );
        }

        let mut close = String::new();
        close.push(marker);
        close.extend(self.right.chars().last());

        (open, close)
    }

    /// Builds the evaluator syntax for this pair.
    pub fn syntax(&self) -> Result<SyntaxConfig> {
        let (block_open, block_close) = self.block();
        let (comment_open, comment_close) = self.comment();
        SyntaxConfig::builder()
            .block_delimiters(block_open, block_close)
            .variable_delimiters(self.left.clone(), self.right.clone())
            .comment_delimiters(comment_open, comment_close)
            .build()
            .map_err(|e| SigilError::config(format!("delimiters {self} rejected: {e}")))
    }

    /// Wraps `body` in statement markers, e.g. `{% body %}`.
    pub fn statement(&self, body: &str) -> String {
        let (open, close) = self.block();
        format!("{open} {body} {close}")
    }

    /// Collapses escaped line continuations between adjacent actions.
    ///
    /// `\RIGHT` + newline + `LEFT` becomes `RIGHTLEFT`. Matching is literal
    /// and non-overlapping, scanning left to right.
    pub fn rewrite_continuations(&self, body: &str) -> String {
        let escaped = format!("\\{}\n{}", self.right, self.left);
        let joined = format!("{}{}", self.right, self.left);
        body.replace(&escaped, &joined)
    }
}

impl FromStr for Delimiters {
    type Err = SigilError;

    fn from_str(s: &str) -> Result<Self> {
        decode_delimiters(s)
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            left: "{{".into(),
            right: "}}".into(),
        }
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(left: &str, right: &str) -> Delimiters {
        Delimiters {
            left: left.into(),
            right: right.into(),
        }
    }

    #[test]
    fn test_decode_braces() {
        assert_eq!(decode_delimiters("{{ }}").unwrap(), pair("{{", "}}"));
    }

    #[test]
    fn test_decode_brackets() {
        assert_eq!(decode_delimiters("[[ ]]").unwrap(), pair("[[", "]]"));
    }

    #[test]
    fn test_decode_single_token_fails() {
        let err = decode_delimiters("{{").unwrap_err();
        assert!(matches!(err, SigilError::Config(_)));
        assert!(err.to_string().contains("\"{{\""));
        assert!(err.to_string().contains("'{{ }}' or '[[ ]]'"));
    }

    #[test]
    fn test_decode_empty_fails() {
        assert!(matches!(
            decode_delimiters("").unwrap_err(),
            SigilError::Config(_)
        ));
    }

    #[test]
    fn test_decode_leading_space_fails() {
        assert!(decode_delimiters(" }}").is_err());
    }

    #[test]
    fn test_decode_trailing_space_only_fails() {
        assert!(decode_delimiters("{{ ").is_err());
    }

    #[test]
    fn test_decode_right_keeps_inner_spaces() {
        assert_eq!(decode_delimiters("<< >> x").unwrap(), pair("<<", ">> x"));
    }

    #[test]
    fn test_decode_whitespace_run() {
        assert_eq!(decode_delimiters("{{ \t }}").unwrap(), pair("{{", "}}"));
    }

    #[test]
    fn test_derived_markers_for_braces_are_jinja() {
        let d = pair("{{", "}}");
        assert_eq!(d.block(), ("{%".to_string(), "%}".to_string()));
        assert_eq!(d.comment(), ("{#".to_string(), "#}".to_string()));
    }

    #[test]
    fn test_derived_markers_for_brackets() {
        let d = pair("[[", "]]");
        assert_eq!(d.block(), ("[%".to_string(), "%]".to_string()));
        assert_eq!(d.statement("set x = 1"), "[% set x = 1 %]");
    }

    #[test]
    fn test_rewrite_escaped_continuation() {
        let d = pair("{{", "}}");
        assert_eq!(d.rewrite_continuations("a\\}}\n{{ b"), "a}}{{ b");
    }

    #[test]
    fn test_rewrite_leaves_unescaped_newline() {
        let d = pair("{{", "}}");
        assert_eq!(d.rewrite_continuations("a}}\n{{ b"), "a}}\n{{ b");
    }

    #[test]
    fn test_rewrite_is_literal_for_regex_characters() {
        let d = pair("$(", ")$");
        assert_eq!(d.rewrite_continuations("x\\)$\n$(y"), "x)$$(y");
        assert_eq!(d.rewrite_continuations("x\\)\n$(y"), "x\\)\n$(y");
    }

    #[test]
    fn test_rewrite_with_identical_delimiters() {
        let d = pair("%%", "%%");
        assert_eq!(d.rewrite_continuations("a\\%%\n%%b"), "a%%%%b");
    }

    #[test]
    fn test_rewrite_with_nested_substring_delimiters() {
        // Right is a prefix of left: only the exact escaped sequence matches.
        let d = pair("<<<", "<<");
        assert_eq!(d.rewrite_continuations("\\<<\n<<<x"), "<<<<<x");
        assert_eq!(d.rewrite_continuations("\\<<\n<<x"), "\\<<\n<<x");
    }

    #[test]
    fn test_rewrite_multiple_occurrences() {
        let d = pair("[[", "]]");
        assert_eq!(
            d.rewrite_continuations("[[ a \\]]\n[[ b \\]]\n[[ c ]]"),
            "[[ a ]][[ b ]][[ c ]]"
        );
    }

    #[test]
    fn test_from_str_and_display_agree() {
        let d: Delimiters = "[[ ]]".parse().unwrap();
        assert_eq!(d.to_string(), "[[ ]]");
    }

    #[test]
    fn test_syntax_builds_for_common_pairs() {
        assert!(pair("{{", "}}").syntax().is_ok());
        assert!(pair("[[", "]]").syntax().is_ok());
    }

    #[test]
    fn test_colliding_block_marker_uses_whole_pair() {
        let d = pair("<%", "%>");
        assert_eq!(d.block(), ("<%%".to_string(), "%%>".to_string()));
        assert_eq!(d.comment(), ("<#".to_string(), "#>".to_string()));
        assert_eq!(d.statement("set x = 1"), "<%% set x = 1 %%>");
    }

    #[test]
    fn test_colliding_comment_marker_uses_whole_pair() {
        let d = pair("{#", "#}");
        assert_eq!(d.block(), ("{%".to_string(), "%}".to_string()));
        assert_eq!(d.comment(), ("{##".to_string(), "##}".to_string()));
    }

    #[test]
    fn test_syntax_builds_for_jinja_marker_pairs() {
        for config in ["<% %>", "{% %}", "{# #}", "<< >>", "${ }", "{ }"] {
            let d = decode_delimiters(config).unwrap();
            assert!(d.syntax().is_ok(), "{config} rejected");
        }
    }
}
