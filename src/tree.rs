//! The syntax tree produced by the parser.
//!
//! Nodes live in a single arena owned by [`TomlTree`] and refer to each other
//! through [`NodeId`] indices: a node lists its children in source order and
//! points back at its parent. Nodes are never removed.
//!
//! The node kinds are:
//!
//! - `File`: the root, always [`TomlTree::root`]
//! - `Table`: a `[a.b]` or `[[a.b]]` table, real or synthetic
//! - `ArrayOfTablesElement`: one `[[a.b]]` occurrence, a child of an array
//!   table (a "bucket")
//! - `KeyValue`: a `key = value` pair
//! - `Stub`: the single placeholder child of a table declared with no pairs
//!
//! Inline tables do not get a node kind of their own: a key-value pair whose
//! value is an inline table is promoted into a real table when inserted.
//!
//! ```rust
//! use serde_toml_tree::parse_str;
//!
//! let tree = parse_str("[[fruit]]\nname = \"apple\"\n[[fruit]]\nname = \"pear\"").unwrap();
//! let fruit = tree.find_table_by_name(tree.root(), "fruit", 1).unwrap().unwrap();
//! assert_eq!(tree.children(fruit).len(), 2);
//!
//! print!("{}", tree.pretty_print());
//! ```

use crate::key::Key;
use crate::{Error, Result, TomlValue};
use std::fmt::Write as _;

/// Index of a node in its [`TomlTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Whether a table was declared with `[...]` or `[[...]]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableType {
    Primitive,
    Array,
}

/// Payload of a table node.
#[derive(Clone, Debug, PartialEq)]
pub struct TableNode {
    /// Full key from the document root
    pub key: Key,
    pub table_type: TableType,
    /// Created to hold a nested table or a dotted key, not declared itself
    pub synthetic: bool,
    /// Cumulative canonical prefixes of `key`
    pub tables_list: Vec<String>,
}

impl TableNode {
    #[must_use]
    pub fn new(key: Key, table_type: TableType, synthetic: bool) -> Self {
        let tables_list = key.tables_list();
        TableNode {
            key,
            table_type,
            synthetic,
            tables_list,
        }
    }

    /// Canonical full name, the last entry of `tables_list`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.tables_list.last().map(String::as_str).unwrap_or("")
    }
}

/// Payload of a key-value node.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValueNode {
    /// The pair's own key; dotted prefixes become tables
    pub key: Key,
    pub value: TomlValue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    File,
    Table(TableNode),
    ArrayOfTablesElement,
    KeyValue(KeyValueNode),
    Stub,
}

/// A node of the tree with its comments and links.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    kind: NodeKind,
    line: usize,
    comments: Vec<String>,
    inline_comment: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Creates a detached node. Nodes built outside a parse use line `0`.
    #[must_use]
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Node {
            kind,
            line,
            comments: Vec::new(),
            inline_comment: None,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// 1-based source line where the node starts.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Comment lines written above the node, without their `#`.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    #[must_use]
    pub fn inline_comment(&self) -> Option<&str> {
        self.inline_comment.as_deref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn as_table(&self) -> Option<&TableNode> {
        match &self.kind {
            NodeKind::Table(table) => Some(table),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_key_value(&self) -> Option<&KeyValueNode> {
        match &self.kind {
            NodeKind::KeyValue(pair) => Some(pair),
            _ => None,
        }
    }

    /// The key of a table or key-value node.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match &self.kind {
            NodeKind::Table(table) => Some(&table.key),
            NodeKind::KeyValue(pair) => Some(&pair.key),
            _ => None,
        }
    }

    /// The value of a key-value node.
    #[must_use]
    pub fn value(&self) -> Option<&TomlValue> {
        self.as_key_value().map(|pair| &pair.value)
    }

    #[must_use]
    pub fn is_bucket(&self) -> bool {
        matches!(self.kind, NodeKind::ArrayOfTablesElement)
    }

    #[must_use]
    pub fn is_stub(&self) -> bool {
        matches!(self.kind, NodeKind::Stub)
    }

    /// Name of the node kind, as shown by [`TomlTree::pretty_print`].
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::File => "File",
            NodeKind::Table(_) => "Table",
            NodeKind::ArrayOfTablesElement => "ArrayOfTablesElement",
            NodeKind::KeyValue(_) => "KeyValue",
            NodeKind::Stub => "StubEmptyNode",
        }
    }
}

/// An arena of nodes rooted at a `File` node.
#[derive(Clone, Debug, PartialEq)]
pub struct TomlTree {
    nodes: Vec<Node>,
    trailing_comments: Vec<String>,
}

impl Default for TomlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TomlTree {
    /// Creates a tree holding only the `File` root.
    #[must_use]
    pub fn new() -> Self {
        TomlTree {
            nodes: vec![Node::new(NodeKind::File, 1)],
            trailing_comments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Total number of nodes, the root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a detached node to the arena.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Appends `child` to `parent`'s children and links it back.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Pushes `node` and appends it under `parent` in one step.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.push(node);
        self.append_child(parent, id);
        id
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The children of `id`'s parent, `id` included. Empty for the root.
    #[must_use]
    pub fn neighbour_nodes(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &[],
        }
    }

    /// Comments found after the last node of the document.
    #[must_use]
    pub fn trailing_comments(&self) -> &[String] {
        &self.trailing_comments
    }

    pub(crate) fn set_trailing_comments(&mut self, comments: Vec<String>) {
        self.trailing_comments = comments;
    }

    pub(crate) fn add_comments(&mut self, id: NodeId, comments: Vec<String>) {
        self.nodes[id.0].comments.extend(comments);
    }

    pub(crate) fn set_inline_comment(&mut self, id: NodeId, comment: Option<String>) {
        if comment.is_some() {
            self.nodes[id.0].inline_comment = comment;
        }
    }

    /// Looks up a table named `name` among the tables directly under `parent`
    /// and the tables one level down inside `parent`'s buckets.
    ///
    /// `name` is the canonical full name (see [`Key::name`]). More than one
    /// match means the tree was built inconsistently and is reported as
    /// [`Error::Internal`] at `line`.
    pub fn find_table_by_name(
        &self,
        parent: NodeId,
        name: &str,
        line: usize,
    ) -> Result<Option<NodeId>> {
        let mut found = None;
        let mut matches = 0;

        let mut check = |id: NodeId| {
            if let Some(table) = self.node(id).as_table() {
                if table.name() == name {
                    found = Some(id);
                    matches += 1;
                }
            }
        };

        for &child in self.children(parent) {
            if self.node(child).is_bucket() {
                for &nested in self.children(child) {
                    check(nested);
                }
            } else {
                check(child);
            }
        }

        if matches > 1 {
            return Err(Error::internal(
                line,
                format!("found {} tables named [{}] at the same level", matches, name),
            ));
        }
        Ok(found)
    }

    /// The full key a pair under `id` is relative to: the table's own key,
    /// the owning table's key for a bucket, `None` at the root.
    #[must_use]
    pub fn table_key_of(&self, id: NodeId) -> Option<&Key> {
        match self.node(id).kind() {
            NodeKind::Table(table) => Some(&table.key),
            NodeKind::ArrayOfTablesElement => self
                .parent(id)
                .and_then(|parent| self.node(parent).as_table())
                .map(|table| &table.key),
            _ => None,
        }
    }

    /// Renders the node structure as an indented outline, one node per line.
    ///
    /// Lines and comments are left out so two documents with the same shape
    /// print the same outline.
    #[must_use]
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        self.pretty_print_node(self.root(), 0, &mut out);
        out
    }

    fn pretty_print_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{}- {}", "  ".repeat(depth), node.kind_name());
        match node.kind() {
            NodeKind::Table(table) => {
                let _ = write!(out, " [{}]", table.name());
                if table.table_type == TableType::Array {
                    out.push_str(" array");
                }
                if table.synthetic {
                    out.push_str(" synthetic");
                }
            }
            NodeKind::KeyValue(pair) => {
                let _ = write!(out, " ({} = {})", pair.key, pair.value);
            }
            _ => {}
        }
        out.push('\n');

        for &child in node.children() {
            self.pretty_print_node(child, depth + 1, out);
        }
    }
}
