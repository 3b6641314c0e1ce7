//! Placing tables and pairs into the tree.
//!
//! Every table header is inserted from the root by walking its cumulative
//! prefixes (`a`, `a.b`, `a.b.c`). At each level the table with that name is
//! looked up under the cursor:
//!
//! - an array table is entered through its most recent bucket, so
//!   `[[a]] [[a.b]] [[a]] [[a.b]]` puts the second `a.b` into the second `a`
//! - a missing intermediate level gets a synthetic primitive table
//! - the last level is created, or reused according to its type
//!
//! Dotted keys do the same walk starting from the current table, and a pair
//! whose value is an inline table is promoted into a real table.

use crate::key::Key;
use crate::options::TomlInputConfig;
use crate::tree::{KeyValueNode, Node, NodeId, NodeKind, TableNode, TableType, TomlTree};
use crate::{Error, Result, TomlMap, TomlValue};
use tracing::{debug, trace};

/// Cursor state threaded through the parse loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserState {
    /// Node that receives the next plain key-value pair
    pub current: NodeId,
    /// Bucket created by the most recent `[[...]]` header
    pub latest_bucket: Option<NodeId>,
}

impl ParserState {
    #[must_use]
    pub fn new(root: NodeId) -> Self {
        ParserState {
            current: root,
            latest_bucket: None,
        }
    }
}

/// Enters a table found during descent; array tables are entered through
/// their latest bucket.
fn enter(tree: &TomlTree, state: &ParserState, table: NodeId, line: usize) -> Result<NodeId> {
    let Some(node) = tree.node(table).as_table() else {
        return Err(Error::internal(line, "descent reached a node that is not a table"));
    };
    if node.table_type == TableType::Primitive {
        return Ok(table);
    }

    if let Some(bucket) = state.latest_bucket {
        if tree.parent(bucket) == Some(table) {
            return Ok(bucket);
        }
    }
    tree.children(table).last().copied().ok_or_else(|| {
        Error::internal(
            line,
            format!("array of tables [{}] has no elements", node.name()),
        )
    })
}

fn has_pair_named(tree: &TomlTree, parent: NodeId, name: &str) -> bool {
    tree.children(parent).iter().any(|&child| {
        tree.node(child)
            .as_key_value()
            .is_some_and(|pair| pair.key.content() == name)
    })
}

fn new_table(
    tree: &mut TomlTree,
    parent: NodeId,
    key: Key,
    table_type: TableType,
    synthetic: bool,
    line: usize,
) -> Result<NodeId> {
    if has_pair_named(tree, parent, key.content()) {
        return Err(Error::parse(
            line,
            format!("key '{}' is already defined as a value, not a table", key),
        ));
    }
    let node = Node::new(
        NodeKind::Table(TableNode::new(key, table_type, synthetic)),
        line,
    );
    Ok(tree.add_child(parent, node))
}

/// Walks `path` below `start`, creating synthetic tables for missing levels.
/// `base` is the full key of `start`.
fn descend(
    tree: &mut TomlTree,
    state: &ParserState,
    start: NodeId,
    base: Option<&Key>,
    path: &Key,
    line: usize,
) -> Result<NodeId> {
    let mut cursor = start;
    for level in 1..=path.parts().len() {
        let relative = path.truncated(level);
        let full = match base {
            Some(base) => base.join(&relative),
            None => relative,
        };
        cursor = match tree.find_table_by_name(cursor, &full.name(), line)? {
            Some(found) => enter(tree, state, found, line)?,
            None => {
                trace!(table = %full, line, "creating synthetic table");
                new_table(tree, cursor, full, TableType::Primitive, true, line)?
            }
        };
    }
    Ok(cursor)
}

/// Inserts the table named by a `[key]` or `[[key]]` header and returns the
/// node that receives the pairs that follow it: the table itself, or the new
/// bucket for an array of tables.
pub fn insert_table(
    tree: &mut TomlTree,
    state: &mut ParserState,
    key: &Key,
    table_type: TableType,
    line: usize,
    config: &TomlInputConfig,
) -> Result<NodeId> {
    trace!(table = %key, ?table_type, line, "inserting table header");

    let root = tree.root();
    let parent = match key.prefix() {
        Some(prefix) => descend(tree, state, root, None, &prefix, line)?,
        None => root,
    };
    attach_table(tree, state, parent, key.clone(), table_type, line, config)
}

/// Attaches the last level of a table under `parent`.
fn attach_table(
    tree: &mut TomlTree,
    state: &mut ParserState,
    parent: NodeId,
    key: Key,
    table_type: TableType,
    line: usize,
    config: &TomlInputConfig,
) -> Result<NodeId> {
    let found = tree.find_table_by_name(parent, &key.name(), line)?;

    match table_type {
        TableType::Array => {
            let table = match found {
                Some(existing) => {
                    let is_array = tree
                        .node(existing)
                        .as_table()
                        .is_some_and(|t| t.table_type == TableType::Array);
                    if !is_array {
                        return Err(Error::parse(
                            line,
                            format!("[{}] is already defined as a table, not an array of tables", key),
                        ));
                    }
                    existing
                }
                None => new_table(tree, parent, key.clone(), TableType::Array, false, line)?,
            };
            let bucket = tree.add_child(table, Node::new(NodeKind::ArrayOfTablesElement, line));
            state.latest_bucket = Some(bucket);
            trace!(table = %key, line, buckets = tree.children(table).len(), "created bucket");
            Ok(bucket)
        }
        TableType::Primitive => {
            let Some(existing) = found else {
                return new_table(tree, parent, key, TableType::Primitive, false, line);
            };
            let (is_array, synthetic) = match tree.node(existing).as_table() {
                Some(t) => (t.table_type == TableType::Array, t.synthetic),
                None => (false, false),
            };
            if is_array {
                return Err(Error::parse(
                    line,
                    format!("[{}] is already defined as an array of tables", key),
                ));
            }
            if synthetic {
                if let NodeKind::Table(table) = tree.node_mut(existing).kind_mut() {
                    table.synthetic = false;
                }
                return Ok(existing);
            }
            if !config.allow_duplicate_tables {
                return Err(Error::parse(
                    line,
                    format!(
                        "table [{}] is declared twice (first at line {}); set `allow_duplicate_tables` to merge them",
                        key,
                        tree.node(existing).line()
                    ),
                ));
            }
            debug!(
                table = %key,
                line,
                first_line = tree.node(existing).line(),
                "merging redeclared table into its first declaration"
            );
            Ok(existing)
        }
    }
}

/// Inserts a `key = value` pair under `state.current` and returns the new
/// node.
///
/// A dotted key creates synthetic tables for its prefix. An inline table
/// value is promoted into a real table whose entries become pairs and
/// nested tables; the returned node is then that table.
pub fn insert_key_value(
    tree: &mut TomlTree,
    state: &mut ParserState,
    key: &Key,
    value: TomlValue,
    line: usize,
    config: &TomlInputConfig,
) -> Result<NodeId> {
    let current = state.current;
    let base = tree.table_key_of(current).cloned();

    let parent = match key.prefix() {
        Some(prefix) => descend(tree, state, current, base.as_ref(), &prefix, line)?,
        None => current,
    };

    let leaf = key.leaf();
    match value {
        TomlValue::Table(map) => {
            let full = match tree.table_key_of(parent) {
                Some(parent_key) => parent_key.join(&leaf),
                None => leaf,
            };
            promote_inline_table(tree, state, parent, full, map, line, config)
        }
        value => {
            if tree.find_table_by_name(parent, &full_name(tree, parent, &leaf), line)?.is_some() {
                return Err(Error::parse(
                    line,
                    format!("key '{}' is already defined as a table", key),
                ));
            }
            let pair = KeyValueNode { key: leaf, value };
            Ok(tree.add_child(parent, Node::new(NodeKind::KeyValue(pair), line)))
        }
    }
}

fn full_name(tree: &TomlTree, parent: NodeId, leaf: &Key) -> String {
    match tree.table_key_of(parent) {
        Some(parent_key) => parent_key.join(leaf).name(),
        None => leaf.name(),
    }
}

fn promote_inline_table(
    tree: &mut TomlTree,
    state: &mut ParserState,
    parent: NodeId,
    full: Key,
    map: TomlMap,
    line: usize,
    config: &TomlInputConfig,
) -> Result<NodeId> {
    trace!(table = %full, line, "promoting inline table");
    let table = attach_table(tree, state, parent, full.clone(), TableType::Primitive, line, config)?;

    let mut nested = Vec::new();
    for (name, value) in map {
        let leaf = Key::from_segments([name]);
        match value {
            TomlValue::Table(inner) => nested.push((full.join(&leaf), inner)),
            value => {
                let pair = KeyValueNode { key: leaf, value };
                tree.add_child(table, Node::new(NodeKind::KeyValue(pair), line));
            }
        }
    }
    for (key, inner) in nested {
        promote_inline_table(tree, state, table, key, inner, line, config)?;
    }

    if tree.children(table).is_empty() {
        tree.add_child(table, Node::new(NodeKind::Stub, line));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(
        tree: &mut TomlTree,
        state: &mut ParserState,
        raw: &str,
        table_type: TableType,
    ) -> Result<NodeId> {
        let key = Key::parse(raw, 1).unwrap();
        let id = insert_table(tree, state, &key, table_type, 1, &TomlInputConfig::new())?;
        state.current = id;
        Ok(id)
    }

    fn pair(tree: &mut TomlTree, state: &mut ParserState, raw: &str, value: i64) -> NodeId {
        let key = Key::parse(raw, 1).unwrap();
        insert_key_value(tree, state, &key, TomlValue::from(value), 1, &TomlInputConfig::new())
            .unwrap()
    }

    #[test]
    fn test_nested_header_creates_synthetic_parents() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        let c = header(&mut tree, &mut state, "a.b.c", TableType::Primitive).unwrap();

        let table = tree.node(c).as_table().unwrap();
        assert!(!table.synthetic);
        assert_eq!(table.tables_list, vec!["a", "a.b", "a.b.c"]);

        let b = tree.parent(c).unwrap();
        let a = tree.parent(b).unwrap();
        assert!(tree.node(b).as_table().unwrap().synthetic);
        assert!(tree.node(a).as_table().unwrap().synthetic);
        assert_eq!(tree.parent(a), Some(tree.root()));
    }

    #[test]
    fn test_declaring_synthetic_table_makes_it_real() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        header(&mut tree, &mut state, "a.b", TableType::Primitive).unwrap();
        let a = header(&mut tree, &mut state, "a", TableType::Primitive).unwrap();

        assert!(!tree.node(a).as_table().unwrap().synthetic);
        assert_eq!(tree.children(tree.root()), &[a]);
    }

    #[test]
    fn test_nested_array_follows_latest_bucket() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        let first = header(&mut tree, &mut state, "a", TableType::Array).unwrap();
        let first_b = header(&mut tree, &mut state, "a.b", TableType::Array).unwrap();
        let second = header(&mut tree, &mut state, "a", TableType::Array).unwrap();
        let second_b = header(&mut tree, &mut state, "a.b", TableType::Array).unwrap();

        let a = tree.parent(first).unwrap();
        assert_eq!(tree.children(a), &[first, second]);

        let b_in_first = tree.parent(first_b).unwrap();
        let b_in_second = tree.parent(second_b).unwrap();
        assert_eq!(tree.parent(b_in_first), Some(first));
        assert_eq!(tree.parent(b_in_second), Some(second));
        assert_eq!(state.latest_bucket, Some(second_b));
    }

    #[test]
    fn test_type_conflicts() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        header(&mut tree, &mut state, "a", TableType::Primitive).unwrap();
        assert!(header(&mut tree, &mut state, "a", TableType::Array).is_err());

        header(&mut tree, &mut state, "b", TableType::Array).unwrap();
        assert!(header(&mut tree, &mut state, "b", TableType::Primitive).is_err());
    }

    #[test]
    fn test_redeclaration_depends_on_config() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        let first = header(&mut tree, &mut state, "a", TableType::Primitive).unwrap();
        let again = header(&mut tree, &mut state, "a", TableType::Primitive).unwrap();
        assert_eq!(first, again);

        let key = Key::parse("a", 1).unwrap();
        let strict = TomlInputConfig::strict();
        let err = insert_table(&mut tree, &mut state, &key, TableType::Primitive, 9, &strict)
            .unwrap_err();
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn test_dotted_pair_is_relative_to_current_table() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        header(&mut tree, &mut state, "server", TableType::Primitive).unwrap();
        let id = pair(&mut tree, &mut state, "tls.port", 443);

        let tls = tree.parent(id).unwrap();
        let tls_table = tree.node(tls).as_table().unwrap();
        assert_eq!(tls_table.name(), "server.tls");
        assert!(tls_table.synthetic);
        assert_eq!(tree.node(id).key().map(Key::content), Some("port"));
    }

    #[test]
    fn test_value_and_table_conflicts() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        pair(&mut tree, &mut state, "a", 1);
        let key = Key::parse("a.b", 1).unwrap();
        assert!(insert_key_value(
            &mut tree,
            &mut state,
            &key,
            TomlValue::from(2),
            2,
            &TomlInputConfig::new()
        )
        .is_err());
    }

    #[test]
    fn test_inline_table_is_promoted() {
        let mut tree = TomlTree::new();
        let mut state = ParserState::new(tree.root());
        let mut inner = TomlMap::new();
        inner.insert("x".to_string(), TomlValue::from(1));
        let mut deeper = TomlMap::new();
        deeper.insert("z".to_string(), TomlValue::from(3));
        inner.insert("nested".to_string(), TomlValue::Table(deeper));

        let key = Key::parse("point", 1).unwrap();
        let table = insert_key_value(
            &mut tree,
            &mut state,
            &key,
            TomlValue::Table(inner),
            1,
            &TomlInputConfig::new(),
        )
        .unwrap();

        assert_eq!(tree.node(table).as_table().unwrap().name(), "point");
        let children = tree.children(table);
        assert_eq!(children.len(), 2);
        assert_eq!(
            tree.node(children[1]).as_table().unwrap().name(),
            "point.nested"
        );
        assert_eq!(state.current, tree.root());
    }
}
