//! The top-level parse loop.
//!
//! [`TomlParser`] feeds each logical line from the
//! [`LineClassifier`](crate::lines::LineClassifier) to the key parser, the
//! value parser and the tree inserter, in source order. Comment lines are
//! held back and attached to the next node; whatever is left at the end of
//! the document becomes the tree's trailing comments.
//!
//! A table that is followed by another header, or by the end of the input,
//! without receiving any pair gets exactly one stub child.
//!
//! ```rust
//! use serde_toml_tree::{TomlInputConfig, TomlParser};
//!
//! let parser = TomlParser::new(TomlInputConfig::new());
//! let tree = parser.parse_str("[empty]\n[other]\nkey = 1").unwrap();
//!
//! let empty = tree.children(tree.root())[0];
//! assert!(tree.node(tree.children(empty)[0]).is_stub());
//! ```

use crate::insert::{insert_key_value, insert_table, ParserState};
use crate::key::parse_key;
use crate::lines::{LineClassifier, LineKind};
use crate::literal::parse_value;
use crate::options::TomlInputConfig;
use crate::tree::{Node, NodeKind, TableType, TomlTree};
use crate::{Error, Result};
use tracing::{debug, trace};

/// Parses TOML text into a [`TomlTree`].
#[derive(Clone, Debug, Default)]
pub struct TomlParser {
    config: TomlInputConfig,
}

impl TomlParser {
    #[must_use]
    pub fn new(config: TomlInputConfig) -> Self {
        TomlParser { config }
    }

    #[must_use]
    pub fn config(&self) -> &TomlInputConfig {
        &self.config
    }

    /// Parses a whole document.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Parse`] found, with its source line.
    pub fn parse_str(&self, text: &str) -> Result<TomlTree> {
        let classifier = LineClassifier::new(text, &self.config);
        let physical_lines = classifier.physical_lines();
        debug!(lines = physical_lines, "parsing TOML document");

        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        let mut pending_comments = Vec::new();

        for logical in classifier {
            let logical = logical?;
            let line = logical.line;
            match logical.kind {
                LineKind::Blank => {}
                LineKind::Comment(text) => pending_comments.push(text),
                LineKind::TableHeader {
                    key,
                    array,
                    inline_comment,
                } => {
                    close_table(&mut tree, &state);

                    let key = parse_key(&key, line)?;
                    let table_type = if array {
                        TableType::Array
                    } else {
                        TableType::Primitive
                    };
                    trace!(table = %key, line, "table header");
                    let id =
                        insert_table(&mut tree, &mut state, &key, table_type, line, &self.config)?;
                    tree.add_comments(id, std::mem::take(&mut pending_comments));
                    tree.set_inline_comment(id, inline_comment);
                    state.current = id;
                }
                LineKind::KeyValue {
                    key,
                    value,
                    inline_comment,
                } => {
                    let key = parse_key(&key, line)?;
                    let value = parse_value(&value, line, &self.config)?;
                    let id =
                        insert_key_value(&mut tree, &mut state, &key, value, line, &self.config)?;
                    tree.add_comments(id, std::mem::take(&mut pending_comments));
                    tree.set_inline_comment(id, inline_comment);
                }
            }
        }

        close_table(&mut tree, &state);
        tree.set_trailing_comments(pending_comments);

        if !self.config.allow_empty_toml && tree.children(tree.root()).is_empty() {
            return Err(Error::parse(
                physical_lines.max(1),
                "document holds no tables or key-value pairs; set `allow_empty_toml` to accept it",
            ));
        }

        debug!(
            lines = physical_lines,
            nodes = tree.node_count(),
            "parsed TOML document"
        );
        Ok(tree)
    }

    /// Parses a document given as separate lines.
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<TomlTree>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self.parse_str(&text)
    }
}

/// Gives the current table a stub child if nothing was inserted into it.
fn close_table(tree: &mut TomlTree, state: &ParserState) {
    let current = state.current;
    if current != tree.root() && tree.children(current).is_empty() {
        let line = tree.node(current).line();
        tree.add_child(current, Node::new(NodeKind::Stub, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<TomlTree> {
        TomlParser::default().parse_str(text)
    }

    #[test]
    fn test_comments_attach_to_next_node() {
        let tree = parse("# about a\na = 1 # inline\n\n# about t\n[t] # header\n# dangling").unwrap();
        let root = tree.children(tree.root());

        let a = tree.node(root[0]);
        assert_eq!(a.comments(), &[" about a".to_string()]);
        assert_eq!(a.inline_comment(), Some(" inline"));

        let t = tree.node(root[1]);
        assert_eq!(t.comments(), &[" about t".to_string()]);
        assert_eq!(t.inline_comment(), Some(" header"));
        assert_eq!(tree.trailing_comments(), &[" dangling".to_string()]);
    }

    #[test]
    fn test_stub_for_empty_tables() {
        let tree = parse("[a]\n[b]\nx = 1\n[c]").unwrap();
        let root = tree.children(tree.root());
        let stub_count = |id| {
            tree.children(id)
                .iter()
                .filter(|&&c| tree.node(c).is_stub())
                .count()
        };
        assert_eq!(stub_count(root[0]), 1);
        assert_eq!(stub_count(root[1]), 0);
        assert_eq!(stub_count(root[2]), 1);
        assert_eq!(tree.children(root[2]).len(), 1);
    }

    #[test]
    fn test_empty_bucket_gets_stub() {
        let tree = parse("[[a]]\n[[a]]\nx = 1").unwrap();
        let a = tree.children(tree.root())[0];
        let buckets = tree.children(a);
        assert!(tree.node(tree.children(buckets[0])[0]).is_stub());
        assert!(!tree.node(tree.children(buckets[1])[0]).is_stub());
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(parse("").unwrap().node_count(), 1);
        assert_eq!(parse("# only a comment\n\n").unwrap().trailing_comments().len(), 1);

        let strict = TomlParser::new(TomlInputConfig::new().with_allow_empty_toml(false));
        assert!(strict.parse_str("# nothing").is_err());
        assert!(strict.parse_str("a = 1").is_ok());
    }

    #[test]
    fn test_errors_carry_lines() {
        let err = parse("a = 1\nb = \"x\ny = 2").unwrap_err();
        assert_eq!(err.line(), Some(2));

        let err = parse("a = 1\n\n[bad key]").unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_parse_lines() {
        let tree = TomlParser::default()
            .parse_lines(["[a]", "b = 1"])
            .unwrap();
        assert_eq!(tree.node_count(), 3);
    }
}
