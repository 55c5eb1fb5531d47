//! Wildcard pattern compilation
//!
//! Resource patterns, `StringLike`/`StringNotLike` values and `ArnLike`/`ArnNotLike` values
//! all share the same glob dialect: `*` matches any run of characters (including none) and
//! `?` matches exactly one character. Every other character is literal.
//!
//! Patterns are compiled once, when the owning statement or condition is constructed, and
//! always match against the whole input string. A pattern too large to compile is an error,
//! so the statement carrying it is rejected instead of silently matching nothing.

use crate::error::PolicyError;

use std::fmt;

use regex::Regex;

/// A compiled full-match wildcard pattern.
///
/// # Example
/// ```
/// # use s3s_policy::WildcardPattern;
/// let pattern = WildcardPattern::new("my-bucket/*").unwrap();
/// assert!(pattern.is_match("my-bucket/readme.txt"));
/// assert!(!pattern.is_match("other-bucket/x"));
/// ```
#[derive(Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compiles a wildcard expression.
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if the expression is too large to compile.
    pub fn new(source: impl Into<String>) -> Result<Self, PolicyError> {
        let source = source.into();
        let regex = Regex::new(&to_regex_source(&source)).map_err(PolicyError::InvalidPattern)?;
        Ok(Self { source, regex })
    }

    /// Returns the original wildcard expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if `input` matches the pattern in its entirety.
    #[must_use]
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WildcardPattern").field(&self.source).finish()
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for WildcardPattern {}

/// Translates a wildcard expression into an anchored regular expression.
fn to_regex_source(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 8);
    out.push_str("(?s)^");

    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                if !literal.is_empty() {
                    out.push_str(&regex::escape(&literal));
                    literal.clear();
                }
                out.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    if !literal.is_empty() {
        out.push_str(&regex::escape(&literal));
    }

    out.push('$');
    out
}
