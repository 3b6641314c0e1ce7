//! Error types for TOML parsing, decoding and encoding.
//!
//! Every failure raised while turning TOML text into a tree is a
//! [`Error::Parse`] carrying the 1-based source line where it was detected.
//! For constructs that span several physical lines (multiline strings and
//! arrays) the reported line is the one where the construct *started*.
//!
//! ## Error Categories
//!
//! - **Parse errors**: unbalanced quotes, invalid escapes, bad bare-key
//!   characters, missing `=`, malformed table headers, unterminated multiline
//!   constructs
//! - **Internal errors**: an ambiguous table lookup in the tree, which points at
//!   a bug in tree insertion rather than at malformed input
//! - **Decode errors**: the tree is well formed but does not fit the target type
//! - **Encode errors**: the value cannot be represented as TOML
//!
//! ## Examples
//!
//! ```rust
//! use serde_toml_tree::{parse_str, Error};
//!
//! let err = parse_str("a = \"unterminated").unwrap_err();
//! assert_eq!(err.line(), Some(1));
//! assert!(matches!(err, Error::Parse { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed TOML input
    #[error("Parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// Tree consistency violation detected while looking up tables
    #[error("Internal error at line {line}: {msg}")]
    Internal { line: usize, msg: String },

    /// A key that the target type does not declare
    #[error("Unknown name '{name}' at line {line}: set `ignore_unknown_names` to skip unknown keys")]
    UnknownName { name: String, line: usize },

    /// The value at `line` could not be converted into the requested type
    #[error("Decoding error at line {line}: {msg}")]
    Decode { line: usize, msg: String },

    /// A Rust value that has no TOML representation
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error raised through serde
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a parse error at the given 1-based line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_toml_tree::Error;
    ///
    /// let err = Error::parse(7, "missing '=' in key-value pair");
    /// assert!(err.to_string().contains("line 7"));
    /// ```
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            line,
            msg: msg.into(),
        }
    }

    /// Creates an internal consistency error at the given line.
    pub fn internal(line: usize, msg: impl Into<String>) -> Self {
        Error::Internal {
            line,
            msg: msg.into(),
        }
    }

    /// Creates an unknown-name error for a key the decoder does not expect.
    pub fn unknown_name(name: &str, line: usize) -> Self {
        Error::UnknownName {
            name: name.to_string(),
            line,
        }
    }

    /// Creates a decode error tied to a source line.
    pub fn decode(line: usize, msg: impl Into<String>) -> Self {
        Error::Decode {
            line,
            msg: msg.into(),
        }
    }

    /// Creates an unsupported type error for values that cannot be encoded.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the source line this error refers to, when it has one.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Parse { line, .. }
            | Error::Internal { line, .. }
            | Error::UnknownName { line, .. }
            | Error::Decode { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Attaches a line to an error raised by a serde visitor.
    ///
    /// Errors that already carry a line keep it; the innermost location wins.
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::Custom(msg) => Error::Decode { line, msg },
            other => other,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_reported() {
        assert_eq!(Error::parse(5, "x").line(), Some(5));
        assert_eq!(Error::internal(3, "x").line(), Some(3));
        assert_eq!(Error::unknown_name("k", 9).line(), Some(9));
        assert_eq!(Error::custom("x").line(), None);
    }

    #[test]
    fn test_at_line_only_tags_custom_errors() {
        let tagged = Error::custom("invalid type").at_line(4);
        assert_eq!(tagged, Error::decode(4, "invalid type"));

        let kept = Error::unknown_name("k", 2).at_line(10);
        assert_eq!(kept.line(), Some(2));
    }

    #[test]
    fn test_display_mentions_line() {
        let err = Error::parse(12, "invalid escape sequence '\\q'");
        assert_eq!(
            err.to_string(),
            "Parse error at line 12: invalid escape sequence '\\q'"
        );
    }
}
