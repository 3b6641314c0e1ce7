//! Bare, quoted and dotted keys.
//!
//! A key is split into segments on every `.` that sits outside quotes, so
//! `site."google.com".port` has three segments. Each segment keeps how it
//! was written ([`Quoting`]) next to its unquoted content.
//!
//! Table lookups compare keys by their *canonical* spelling: bare when the
//! content only uses `A-Za-z0-9_-`, double-quoted otherwise. That makes
//! `[a."b"]` and `[a.b]` name the same table.
//!
//! ```rust
//! use serde_toml_tree::Key;
//!
//! let key = Key::parse("site.\"google.com\".port", 1).unwrap();
//! assert!(key.is_dotted());
//! assert_eq!(key.content(), "port");
//! assert_eq!(
//!     key.tables_list(),
//!     vec!["site", "site.\"google.com\"", "site.\"google.com\".port"]
//! );
//! ```

use crate::literal::unescape_basic;
use crate::{Error, Result};
use std::fmt;

/// How a key segment was written in the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quoting {
    Bare,
    /// `"segment"`, escapes resolved in the content
    Basic,
    /// `'segment'`, taken verbatim
    Literal,
}

/// One dot-separated part of a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySegment {
    raw: String,
    content: String,
    quoting: Quoting,
}

impl KeySegment {
    /// Builds a segment from its content, quoting it only when it needs to be.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let raw = format_segment(&content);
        let quoting = if is_bare(&content) {
            Quoting::Bare
        } else {
            Quoting::Basic
        };
        KeySegment {
            raw,
            content,
            quoting,
        }
    }

    /// The segment as written, quotes included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The segment with quotes stripped.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn quoting(&self) -> Quoting {
        self.quoting
    }

    /// Canonical spelling used for table names.
    #[must_use]
    pub fn canonical(&self) -> String {
        format_segment(&self.content)
    }
}

/// A parsed key: the raw text and its ordered segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    raw: String,
    parts: Vec<KeySegment>,
}

fn is_bare_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

fn is_bare(content: &str) -> bool {
    !content.is_empty() && content.chars().all(is_bare_char)
}

/// Spells a key segment the way it has to appear in TOML text.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::key::format_segment;
///
/// assert_eq!(format_segment("server-1"), "server-1");
/// assert_eq!(format_segment("a.b"), "\"a.b\"");
/// assert_eq!(format_segment(""), "\"\"");
/// ```
#[must_use]
pub fn format_segment(content: &str) -> String {
    if is_bare(content) {
        content.to_string()
    } else {
        let mut out = String::with_capacity(content.len() + 2);
        crate::value::write_basic_string(&mut out, content);
        out
    }
}

fn parse_segment(raw: &str, key: &str, line: usize) -> Result<KeySegment> {
    if raw.is_empty() {
        return Err(Error::parse(
            line,
            format!("empty segment in key '{}'", key),
        ));
    }

    let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'');
    match quote {
        Some(q) => {
            if raw.len() < 2 || !raw.ends_with(q) {
                return Err(Error::parse(
                    line,
                    format!("unexpected characters after quoted segment in key '{}'", key),
                ));
            }
            let inner = &raw[1..raw.len() - 1];
            let content = if q == '"' {
                if has_unescaped_quote(inner) {
                    return Err(Error::parse(
                        line,
                        format!("unexpected '\"' inside quoted segment of key '{}'", key),
                    ));
                }
                unescape_basic(inner, line)?
            } else {
                if inner.contains('\'') {
                    return Err(Error::parse(
                        line,
                        format!("unexpected ''' inside quoted segment of key '{}'", key),
                    ));
                }
                inner.to_string()
            };
            Ok(KeySegment {
                raw: raw.to_string(),
                content,
                quoting: if q == '"' {
                    Quoting::Basic
                } else {
                    Quoting::Literal
                },
            })
        }
        None => {
            if let Some(bad) = raw.chars().find(|c| !is_bare_char(*c)) {
                return Err(Error::parse(
                    line,
                    format!(
                        "bare key '{}' contains invalid character '{}'; only A-Za-z0-9_- are allowed unless the key is quoted",
                        key, bad
                    ),
                ));
            }
            Ok(KeySegment {
                raw: raw.to_string(),
                content: raw.to_string(),
                quoting: Quoting::Bare,
            })
        }
    }
}

fn has_unescaped_quote(inner: &str) -> bool {
    let mut escaped = false;
    for ch in inner.chars() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return true;
        }
    }
    false
}

/// Splits `raw` into key segments, validating quoting and bare characters.
pub fn parse_key(raw: &str, line: usize) -> Result<Key> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::parse(line, "empty key"));
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for ch in trimmed.chars() {
        if in_double {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_double = false;
            }
            continue;
        }
        if in_single {
            current.push(ch);
            if ch == '\'' {
                in_single = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_double = true;
                current.push(ch);
            }
            '\'' => {
                in_single = true;
                current.push(ch);
            }
            '.' => pieces.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if in_single || in_double {
        return Err(Error::parse(
            line,
            format!("unbalanced quotes in key '{}'", trimmed),
        ));
    }
    pieces.push(current);

    let parts = pieces
        .iter()
        .map(|piece| parse_segment(piece.trim(), trimmed, line))
        .collect::<Result<Vec<_>>>()?;

    Ok(Key {
        raw: trimmed.to_string(),
        parts,
    })
}

impl Key {
    /// Parses a key; same as [`parse_key`].
    pub fn parse(raw: &str, line: usize) -> Result<Self> {
        parse_key(raw, line)
    }

    /// Builds a key from already-unquoted segment contents. An empty
    /// iterator yields a key with one empty segment.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts: Vec<KeySegment> = segments.into_iter().map(KeySegment::new).collect();
        if parts.is_empty() {
            parts.push(KeySegment::new(""));
        }
        Self::from_parts(parts)
    }

    fn from_parts(parts: Vec<KeySegment>) -> Self {
        let raw = parts
            .iter()
            .map(|p| p.raw.as_str())
            .collect::<Vec<_>>()
            .join(".");
        Key { raw, parts }
    }

    /// The key as written, trimmed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn parts(&self) -> &[KeySegment] {
        &self.parts
    }

    /// Unquoted content of the last segment: the node's own name.
    #[must_use]
    pub fn content(&self) -> &str {
        self.parts.last().map(|p| p.content.as_str()).unwrap_or("")
    }

    /// `true` when the key has more than one segment.
    #[must_use]
    pub fn is_dotted(&self) -> bool {
        self.parts.len() > 1
    }

    /// The last segment as a key of its own.
    #[must_use]
    pub fn leaf(&self) -> Key {
        Self::from_parts(self.parts[self.parts.len() - 1..].to_vec())
    }

    /// Every segment but the last, or `None` for a single-segment key.
    #[must_use]
    pub fn prefix(&self) -> Option<Key> {
        if self.is_dotted() {
            Some(Self::from_parts(self.parts[..self.parts.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// `self` followed by the segments of `other`.
    #[must_use]
    pub fn join(&self, other: &Key) -> Key {
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        Self::from_parts(parts)
    }

    /// The first `len` segments.
    #[must_use]
    pub(crate) fn truncated(&self, len: usize) -> Key {
        Self::from_parts(self.parts[..len.min(self.parts.len())].to_vec())
    }

    /// Canonical dotted name of the whole key.
    #[must_use]
    pub fn name(&self) -> String {
        self.parts
            .iter()
            .map(KeySegment::canonical)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Cumulative canonical prefixes: `a.b.c` gives `["a", "a.b", "a.b.c"]`.
    #[must_use]
    pub fn tables_list(&self) -> Vec<String> {
        let mut list = Vec::with_capacity(self.parts.len());
        let mut acc = String::new();
        for part in &self.parts {
            if !acc.is_empty() {
                acc.push('.');
            }
            acc.push_str(&part.canonical());
            list.push(acc.clone());
        }
        list
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_key() {
        let key = parse_key("  server-name_1 ", 1).unwrap();
        assert!(!key.is_dotted());
        assert_eq!(key.content(), "server-name_1");
        assert_eq!(key.parts()[0].quoting(), Quoting::Bare);
    }

    #[test]
    fn test_dots_inside_quotes_do_not_split() {
        let key = parse_key("a.\"b.c\".'d.e'", 1).unwrap();
        assert_eq!(key.parts().len(), 3);
        assert_eq!(key.parts()[1].content(), "b.c");
        assert_eq!(key.parts()[2].content(), "d.e");
        assert_eq!(key.parts()[2].quoting(), Quoting::Literal);
        assert_eq!(key.content(), "d.e");
    }

    #[test]
    fn test_whitespace_around_dots() {
        let key = parse_key("fruit . color", 3).unwrap();
        assert_eq!(key.name(), "fruit.color");
    }

    #[test]
    fn test_quoted_key_escapes() {
        let key = parse_key("\"tab\\there\"", 1).unwrap();
        assert_eq!(key.content(), "tab\there");
    }

    #[test]
    fn test_canonical_names_ignore_redundant_quotes() {
        let quoted = parse_key("a.\"b\"", 1).unwrap();
        let bare = parse_key("a.b", 1).unwrap();
        assert_eq!(quoted.tables_list(), bare.tables_list());
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(parse_key("a b", 4).unwrap_err().line(), Some(4));
        assert!(parse_key("a..b", 1).is_err());
        assert!(parse_key("\"open", 1).is_err());
        assert!(parse_key("'open", 1).is_err());
        assert!(parse_key("\"a\"b", 1).is_err());
        assert!(parse_key("a$", 1).is_err());
        assert!(parse_key("   ", 1).is_err());
    }

    #[test]
    fn test_prefix_leaf_join() {
        let key = parse_key("a.b.c", 1).unwrap();
        assert_eq!(key.prefix().unwrap().name(), "a.b");
        assert_eq!(key.leaf().name(), "c");
        assert!(key.leaf().prefix().is_none());

        let joined = parse_key("x", 1).unwrap().join(&key);
        assert_eq!(joined.name(), "x.a.b.c");
    }

    #[test]
    fn test_from_segments_quotes_when_needed() {
        let key = Key::from_segments(["servers", "alpha beta"]);
        assert_eq!(key.raw(), "servers.\"alpha beta\"");
        assert_eq!(key.content(), "alpha beta");
    }
}
