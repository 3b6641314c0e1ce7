//! Writing a tree back to TOML text.
//!
//! Rendering is push-based: [`TomlTree::write`] walks the tree and drives an
//! [`Emitter`], which only needs to know how to append text, end a line and
//! change the indentation level. [`StringEmitter`] collects the output into a
//! `String`.
//!
//! Within every table the pairs are written before the nested tables. A
//! synthetic table gets a header only when it holds pairs of its own or
//! `explicit_tables` is set. Stubs are never written.
//!
//! ```rust
//! use serde_toml_tree::{parse_str, tree_to_string, Indentation, TomlOutputConfig};
//!
//! let tree = parse_str("a.b.c = 1").unwrap();
//! let config = TomlOutputConfig::new().with_indentation(Indentation::None);
//! assert_eq!(tree_to_string(&tree, &config), "[a.b]\nc = 1\n");
//! ```

use crate::key::Key;
use crate::options::TomlOutputConfig;
use crate::tree::{NodeId, NodeKind, TableType, TomlTree};
use crate::TomlValue;

/// Receiver of rendered TOML text.
pub trait Emitter {
    /// Appends text to the current line.
    fn emit_str(&mut self, s: &str);

    /// Ends the current line.
    fn emit_newline(&mut self);

    fn indent(&mut self);

    fn dedent(&mut self);

    fn emit_key(&mut self, key: &Key) {
        self.emit_str(&key.name());
    }

    fn emit_value(&mut self, value: &TomlValue) {
        match value {
            TomlValue::Array(elements) => {
                self.start_array();
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.emit_str(", ");
                    }
                    self.emit_value(element);
                }
                self.end_array();
            }
            TomlValue::Table(map) if !map.is_empty() => {
                self.start_inline_table();
                for (i, (name, value)) in map.iter().enumerate() {
                    if i > 0 {
                        self.emit_str(", ");
                    }
                    self.emit_str(&crate::key::format_segment(name));
                    self.emit_str(" = ");
                    self.emit_value(value);
                }
                self.end_inline_table();
            }
            scalar => self.emit_str(&scalar.to_string()),
        }
    }

    /// Writes a comment line; `text` is everything after the `#`.
    fn emit_comment(&mut self, text: &str) {
        self.emit_str("#");
        self.emit_str(text);
        self.emit_newline();
    }

    fn start_array(&mut self) {
        self.emit_str("[");
    }

    fn end_array(&mut self) {
        self.emit_str("]");
    }

    fn start_inline_table(&mut self) {
        self.emit_str("{ ");
    }

    fn end_inline_table(&mut self) {
        self.emit_str(" }");
    }

    fn emit_table_header(&mut self, key: &Key, array: bool) {
        let (open, close) = if array { ("[[", "]]") } else { ("[", "]") };
        self.emit_str(open);
        self.emit_key(key);
        self.emit_str(close);
    }
}

/// An [`Emitter`] that renders into a `String`.
///
/// Indentation is written at the start of each line begun by
/// [`Emitter::emit_newline`]; newlines embedded in emitted text, such as
/// those of a multiline string, are not indented.
#[derive(Clone, Debug)]
pub struct StringEmitter {
    out: String,
    unit: &'static str,
    level: usize,
    at_line_start: bool,
}

impl StringEmitter {
    #[must_use]
    pub fn new(config: &TomlOutputConfig) -> Self {
        StringEmitter {
            out: String::new(),
            unit: config.indentation.as_str(),
            level: 0,
            at_line_start: true,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.out
    }
}

impl Emitter for StringEmitter {
    fn emit_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.level {
                self.out.push_str(self.unit);
            }
            self.at_line_start = false;
        }
        self.out.push_str(s);
    }

    fn emit_newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }
}

/// Tracks whether anything has been written, to separate tables by a blank
/// line.
struct WriteState {
    started: bool,
}

impl TomlTree {
    /// Writes the whole tree, trailing comments included.
    pub fn write<E: Emitter>(&self, emitter: &mut E, config: &TomlOutputConfig) {
        let mut state = WriteState { started: false };
        self.write_inner(self.root(), emitter, config, &mut state);
        if !self.trailing_comments().is_empty() && state.started {
            emitter.emit_newline();
        }
        for comment in self.trailing_comments() {
            emitter.emit_comment(comment);
        }
    }

    /// Writes one node and its descendants.
    pub fn write_node<E: Emitter>(&self, id: NodeId, emitter: &mut E, config: &TomlOutputConfig) {
        let mut state = WriteState { started: false };
        self.write_inner(id, emitter, config, &mut state);
    }

    fn write_inner<E: Emitter>(
        &self,
        id: NodeId,
        emitter: &mut E,
        config: &TomlOutputConfig,
        state: &mut WriteState,
    ) {
        let node = self.node(id);
        match node.kind() {
            NodeKind::File => self.write_body(id, emitter, config, state),
            NodeKind::Stub => {}
            NodeKind::KeyValue(pair) => {
                if pair.value.is_null() && config.ignore_null_values {
                    return;
                }
                for comment in node.comments() {
                    emitter.emit_comment(comment);
                }
                emitter.emit_key(&pair.key);
                emitter.emit_str(" = ");
                emitter.emit_value(&pair.value);
                write_inline_comment(emitter, node.inline_comment());
                emitter.emit_newline();
                state.started = true;
            }
            NodeKind::Table(table) if table.table_type == TableType::Array => {
                for &bucket in node.children() {
                    self.write_inner(bucket, emitter, config, state);
                }
            }
            NodeKind::Table(table) => {
                let has_pairs = node
                    .children()
                    .iter()
                    .any(|&c| self.node(c).as_key_value().is_some());
                if table.synthetic && !has_pairs && !config.explicit_tables {
                    self.write_body(id, emitter, config, state);
                    return;
                }
                self.write_header(id, &table.key, false, emitter, state);
                emitter.indent();
                self.write_body(id, emitter, config, state);
                emitter.dedent();
            }
            NodeKind::ArrayOfTablesElement => {
                let Some(key) = self.table_key_of(id) else {
                    return;
                };
                self.write_header(id, key, true, emitter, state);
                emitter.indent();
                self.write_body(id, emitter, config, state);
                emitter.dedent();
            }
        }
    }

    fn write_header<E: Emitter>(
        &self,
        id: NodeId,
        key: &Key,
        array: bool,
        emitter: &mut E,
        state: &mut WriteState,
    ) {
        let node = self.node(id);
        if state.started {
            emitter.emit_newline();
        }
        for comment in node.comments() {
            emitter.emit_comment(comment);
        }
        emitter.emit_table_header(key, array);
        write_inline_comment(emitter, node.inline_comment());
        emitter.emit_newline();
        state.started = true;
    }

    /// Pairs first, then tables, each group in source order.
    fn write_body<E: Emitter>(
        &self,
        id: NodeId,
        emitter: &mut E,
        config: &TomlOutputConfig,
        state: &mut WriteState,
    ) {
        let children = self.children(id);
        let (pairs, rest): (Vec<NodeId>, Vec<NodeId>) = children
            .iter()
            .partition(|&&c| self.node(c).as_key_value().is_some());
        for child in pairs.into_iter().chain(rest) {
            self.write_inner(child, emitter, config, state);
        }
    }
}

fn write_inline_comment<E: Emitter>(emitter: &mut E, comment: Option<&str>) {
    if let Some(comment) = comment {
        emitter.emit_str(" #");
        emitter.emit_str(comment);
    }
}

/// Renders `tree` to a string with [`StringEmitter`].
#[must_use]
pub fn tree_to_string(tree: &TomlTree, config: &TomlOutputConfig) -> String {
    let mut emitter = StringEmitter::new(config);
    tree.write(&mut emitter, config);
    emitter.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Indentation;
    use crate::parse_str;

    fn render(text: &str, config: &TomlOutputConfig) -> String {
        tree_to_string(&parse_str(text).unwrap(), config)
    }

    fn flat() -> TomlOutputConfig {
        TomlOutputConfig::new().with_indentation(Indentation::None)
    }

    #[test]
    fn test_pairs_before_tables_and_blank_lines() {
        let text = "[t]\nx = 1\n";
        assert_eq!(render(text, &flat()), "[t]\nx = 1\n");

        let text = "a = 1\n[t]\nb = 'lit'\n[t.u]\nc = 2.0";
        assert_eq!(
            render(text, &TomlOutputConfig::new()),
            "a = 1\n\n[t]\n    b = 'lit'\n\n    [t.u]\n        c = 2.0\n"
        );
    }

    #[test]
    fn test_array_of_tables() {
        let text = "[[p]]\nn = 1\n[[p]]\nn = 2\n";
        assert_eq!(render(text, &flat()), "[[p]]\nn = 1\n\n[[p]]\nn = 2\n");
    }

    #[test]
    fn test_synthetic_tables_suppressed_unless_explicit() {
        let text = "[a.b]\nx = 1";
        assert_eq!(render(text, &flat()), "[a.b]\nx = 1\n");
        assert_eq!(
            render(text, &flat().with_explicit_tables(true)),
            "[a]\n\n[a.b]\nx = 1\n"
        );
    }

    #[test]
    fn test_nulls_and_stubs() {
        let text = "a = null\n[empty]";
        assert_eq!(render(text, &flat()), "[empty]\n");
        assert_eq!(
            render(text, &flat().with_ignore_null_values(false)),
            "a = null\n\n[empty]\n"
        );
    }

    #[test]
    fn test_comments_survive() {
        let text = "# top\na = 1 # one\n\n# table\n[t] # hdr\nb = 2\n# end";
        assert_eq!(
            render(text, &flat()),
            "# top\na = 1 # one\n\n# table\n[t] # hdr\nb = 2\n\n# end\n"
        );
    }

    #[test]
    fn test_multiline_string_is_not_indented() {
        let text = "[t]\ns = \"\"\"\nline one\nline two\"\"\"";
        assert_eq!(
            render(text, &TomlOutputConfig::new().with_indentation(Indentation::TwoSpaces)),
            "[t]\n  s = \"\"\"\nline one\nline two\"\"\"\n"
        );
    }

    #[test]
    fn test_write_node_renders_subtree() {
        let tree = parse_str("[t]\nx = [1, 2]\ny = { z = true }").unwrap();
        let t = tree.children(tree.root())[0];
        let mut emitter = StringEmitter::new(&flat());
        tree.write_node(t, &mut emitter, &flat());
        assert_eq!(emitter.into_inner(), "[t]\nx = [1, 2]\n\n[t.y]\nz = true\n");
    }
}
