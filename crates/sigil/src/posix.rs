//! POSIX-style variable expansion.
//!
//! Expands shell parameter references in a template body before the
//! template evaluator sees it. Only `$`-prefixed forms are consumed, so
//! template delimiters pass through untouched.
//!
//! | Form                 | Expands to                                        |
//! |----------------------|---------------------------------------------------|
//! | `$NAME`, `${NAME}`   | the value, or nothing when unset                  |
//! | `${NAME:-word}`      | `word` when unset or empty                        |
//! | `${NAME-word}`       | `word` when unset                                 |
//! | `${NAME:=word}`      | like `:-`, and `NAME` keeps `word` for the rest   |
//! | `${NAME:?msg}`       | error `NAME: msg` when unset or empty             |
//! | `${NAME:+word}`      | `word` when set and non-empty, else nothing       |
//! | `$$`                 | a literal `$`                                     |
//!
//! The colon-less `=`, `?` and `+` forms test only whether the name is set.
//! Words are expanded recursively, and only when they are used.
//!
//! ```rust
//! use std::collections::HashMap;
//! use sigil::posix::expand;
//!
//! let env = HashMap::from([("PORT".to_string(), "8080".to_string())]);
//! let out = expand("listen ${PORT}; host ${HOST:-localhost}", &env).unwrap();
//! assert_eq!(out, "listen 8080; host localhost");
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::env::VarLookup;
use crate::error::{Result, SigilError};

/// Expands POSIX parameter references in `input` against `env`.
pub fn expand<R: VarLookup + ?Sized>(input: &str, env: &R) -> Result<String> {
    let mut expander = Expander {
        src: input,
        pos: 0,
        env,
        assigned: HashMap::new(),
    };
    let out = expander.scan(false, true);
    debug!(input_len = input.len(), "posix expansion done");
    out
}

#[derive(Clone, Copy)]
enum Op {
    Default,
    Assign,
    Error,
    Alternate,
}

struct Expander<'a, R: ?Sized> {
    src: &'a str,
    pos: usize,
    env: &'a R,
    assigned: HashMap<String, String>,
}

impl<R: VarLookup + ?Sized> Expander<'_, R> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> SigilError {
        SigilError::Preprocess {
            offset,
            message: message.into(),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.assigned
            .get(name)
            .cloned()
            .or_else(|| self.env.lookup(name))
    }

    /// Copies text until end of input, or until an unmatched `}` when
    /// `nested`. The `}` itself is left for the caller.
    fn scan(&mut self, nested: bool, active: bool) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            match c {
                '}' if nested => break,
                '$' => {
                    let start = self.pos;
                    self.bump();
                    self.dollar(start, active, &mut out)?;
                }
                _ => {
                    out.push(c);
                    self.bump();
                }
            }
        }
        Ok(out)
    }

    fn dollar(&mut self, start: usize, active: bool, out: &mut String) -> Result<()> {
        match self.peek() {
            Some('$') => {
                self.bump();
                out.push('$');
            }
            Some('{') => {
                self.bump();
                let value = self.braced(start, active)?;
                out.push_str(&value);
            }
            Some(c) if is_name_start(c) => {
                let name = self.name();
                if active {
                    out.push_str(&self.lookup(&name).unwrap_or_default());
                }
            }
            _ => out.push('$'),
        }
        Ok(())
    }

    fn name(&mut self) -> String {
        let begin = self.pos;
        if self.peek().is_some_and(is_name_start) {
            self.bump();
            while self.peek().is_some_and(is_name_char) {
                self.bump();
            }
        }
        self.src[begin..self.pos].to_string()
    }

    fn braced(&mut self, start: usize, active: bool) -> Result<String> {
        let name = self.name();
        if name.is_empty() {
            return Err(match self.peek() {
                None => self.error(start, "unterminated ${"),
                Some('}') => self.error(start, "empty variable name in ${}"),
                Some(c) => self.error(self.pos, format!("bad variable name starting with {c:?}")),
            });
        }

        let colon = self.eat(':');
        let op = match self.peek() {
            Some('}') if !colon => {
                self.bump();
                return Ok(if active {
                    self.lookup(&name).unwrap_or_default()
                } else {
                    String::new()
                });
            }
            Some('-') => Op::Default,
            Some('=') => Op::Assign,
            Some('?') => Op::Error,
            Some('+') => Op::Alternate,
            None => return Err(self.error(start, "unterminated ${")),
            Some(c) => {
                return Err(self.error(self.pos, format!("bad substitution operator {c:?}")))
            }
        };
        self.bump();

        let value = if active { self.lookup(&name) } else { None };
        let present = value.as_ref().is_some_and(|v| !colon || !v.is_empty());
        let use_word = match op {
            Op::Alternate => present,
            Op::Default | Op::Assign | Op::Error => !present,
        };

        let word = self.scan(true, active && use_word)?;
        if !self.eat('}') {
            return Err(self.error(start, "unterminated ${"));
        }
        if !active {
            return Ok(String::new());
        }

        if !use_word {
            return Ok(match op {
                Op::Alternate => String::new(),
                Op::Default | Op::Assign | Op::Error => value.unwrap_or_default(),
            });
        }

        match op {
            Op::Default | Op::Alternate => Ok(word),
            Op::Assign => {
                self.assigned.insert(name, word.clone());
                Ok(word)
            }
            Op::Error => {
                let message = if word.is_empty() {
                    "parameter null or not set".to_string()
                } else {
                    word
                };
                Err(self.error(start, format!("{name}: {message}")))
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env() -> BTreeMap<String, String> {
        [("HOST", "db.internal"), ("EMPTY", ""), ("PORT", "5432")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(input: &str) -> String {
        expand(input, &env()).unwrap()
    }

    #[test]
    fn test_plain_and_braced() {
        assert_eq!(run("$HOST:${PORT}"), "db.internal:5432");
    }

    #[test]
    fn test_unset_expands_to_nothing() {
        assert_eq!(run("[$MISSING][${MISSING}]"), "[][]");
    }

    #[test]
    fn test_name_stops_at_non_identifier() {
        assert_eq!(run("$HOST.local $PORT/tcp"), "db.internal.local 5432/tcp");
    }

    #[test]
    fn test_default_forms() {
        assert_eq!(run("${MISSING:-a}"), "a");
        assert_eq!(run("${EMPTY:-a}"), "a");
        assert_eq!(run("${EMPTY-a}"), "");
        assert_eq!(run("${HOST:-a}"), "db.internal");
    }

    #[test]
    fn test_nested_default() {
        assert_eq!(run("${MISSING:-${HOST}:${PORT}}"), "db.internal:5432");
    }

    #[test]
    fn test_assign_persists_for_rest_of_input() {
        assert_eq!(run("${USER:=admin} $USER"), "admin admin");
        assert_eq!(run("${EMPTY=admin}"), "");
    }

    #[test]
    fn test_alternate_forms() {
        assert_eq!(run("${HOST:+set}"), "set");
        assert_eq!(run("${EMPTY:+set}"), "");
        assert_eq!(run("${EMPTY+set}"), "set");
        assert_eq!(run("${MISSING+set}"), "");
    }

    #[test]
    fn test_error_form() {
        let err = expand("x ${MISSING:?must be set}", &env()).unwrap_err();
        assert!(matches!(err, SigilError::Preprocess { offset: 2, .. }));
        assert!(err.to_string().contains("MISSING: must be set"));

        let err = expand("${EMPTY:?}", &env()).unwrap_err();
        assert!(err.to_string().contains("parameter null or not set"));

        assert_eq!(run("${EMPTY?unused}"), "");
    }

    #[test]
    fn test_unused_word_is_not_evaluated() {
        assert_eq!(run("${HOST:-${MISSING:?boom}}"), "db.internal");
    }

    #[test]
    fn test_dollar_escapes_and_lone_dollar() {
        assert_eq!(run("cost: $$5"), "cost: $5");
        assert_eq!(run("$ $1 $@ end$"), "$ $1 $@ end$");
    }

    #[test]
    fn test_template_delimiters_untouched() {
        assert_eq!(
            run("{{ name }} {% if x %}${PORT}{% endif %}"),
            "{{ name }} {% if x %}5432{% endif %}"
        );
        assert_eq!(run("}} } {"), "}} } {");
    }

    #[test]
    fn test_unterminated_brace_errors() {
        let err = expand("abc ${HOST", &env()).unwrap_err();
        assert!(matches!(err, SigilError::Preprocess { offset: 4, .. }));
        assert!(expand("${HOST:-abc", &env()).is_err());
        assert!(expand("${", &env()).is_err());
    }

    #[test]
    fn test_bad_names_and_operators_error() {
        assert!(expand("${}", &env()).is_err());
        assert!(expand("${1}", &env()).is_err());
        assert!(expand("${HOST%x}", &env()).is_err());
    }

    #[test]
    fn test_non_ascii_text_passes_through() {
        assert_eq!(run("héllo ${HOST} ✓"), "héllo db.internal ✓");
    }
}
