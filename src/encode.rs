//! Building a tree from a [`TomlValue`].
//!
//! The encoder produces the same node shapes as the parser, so a tree built
//! here can be written with [`TomlTree::write`] like any parsed tree. Nodes
//! created here report line `0`.

use crate::key::Key;
use crate::options::TomlOutputConfig;
use crate::tree::{KeyValueNode, Node, NodeId, NodeKind, TableNode, TableType, TomlTree};
use crate::{Error, Result, TomlMap, TomlValue};

fn is_table_array(value: &TomlValue) -> bool {
    matches!(value, TomlValue::Array(items) if !items.is_empty() && items.iter().all(TomlValue::is_table))
}

fn is_table_like(value: &TomlValue) -> bool {
    value.is_table() || is_table_array(value)
}

impl TomlTree {
    /// Builds a tree from a table value.
    ///
    /// Within each table the scalar and array pairs come first, then the
    /// nested tables, each in map order. A non-empty array whose elements
    /// are all tables becomes an array of tables. A table that only holds
    /// other tables is marked synthetic, and an empty one gets a stub.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedType`] when `value` is not a table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_toml_tree::{to_value, tree_to_string, TomlOutputConfig, TomlTree};
    /// use std::collections::BTreeMap;
    ///
    /// let mut servers = BTreeMap::new();
    /// servers.insert("alpha", BTreeMap::from([("ip", "10.0.0.1")]));
    /// let value = to_value(&BTreeMap::from([("servers", servers)])).unwrap();
    ///
    /// let config = TomlOutputConfig::new();
    /// let tree = TomlTree::from_value(&value, &config).unwrap();
    /// assert_eq!(
    ///     tree_to_string(&tree, &config),
    ///     "[servers.alpha]\n    ip = \"10.0.0.1\"\n"
    /// );
    /// ```
    pub fn from_value(value: &TomlValue, config: &TomlOutputConfig) -> Result<TomlTree> {
        let TomlValue::Table(map) = value else {
            return Err(Error::unsupported_type(&format!(
                "a TOML document must be a table, found {}",
                value.type_name()
            )));
        };

        let mut tree = TomlTree::new();
        let root = tree.root();
        build_body(&mut tree, root, None, map, config);
        Ok(tree)
    }
}

fn build_body(
    tree: &mut TomlTree,
    parent: NodeId,
    base: Option<&Key>,
    map: &TomlMap,
    config: &TomlOutputConfig,
) {
    for (name, value) in map {
        if is_table_like(value) || (value.is_null() && config.ignore_null_values) {
            continue;
        }
        let pair = KeyValueNode {
            key: Key::from_segments([name.as_str()]),
            value: value.clone(),
        };
        tree.add_child(parent, Node::new(NodeKind::KeyValue(pair), 0));
    }

    for (name, value) in map {
        let leaf = Key::from_segments([name.as_str()]);
        let key = match base {
            Some(base) => base.join(&leaf),
            None => leaf,
        };
        match value {
            TomlValue::Table(inner) => build_table(tree, parent, key, inner, config),
            TomlValue::Array(items) if is_table_array(value) => {
                let table = tree.add_child(
                    parent,
                    Node::new(
                        NodeKind::Table(TableNode::new(key.clone(), TableType::Array, false)),
                        0,
                    ),
                );
                for item in items {
                    let bucket =
                        tree.add_child(table, Node::new(NodeKind::ArrayOfTablesElement, 0));
                    if let TomlValue::Table(inner) = item {
                        build_body(tree, bucket, Some(&key), inner, config);
                    }
                    add_stub_if_empty(tree, bucket);
                }
            }
            _ => {}
        }
    }
}

fn build_table(
    tree: &mut TomlTree,
    parent: NodeId,
    key: Key,
    map: &TomlMap,
    config: &TomlOutputConfig,
) {
    let only_tables = !map.is_empty() && map.values().all(is_table_like);
    let table = tree.add_child(
        parent,
        Node::new(
            NodeKind::Table(TableNode::new(key.clone(), TableType::Primitive, only_tables)),
            0,
        ),
    );
    build_body(tree, table, Some(&key), map, config);
    add_stub_if_empty(tree, table);
}

fn add_stub_if_empty(tree: &mut TomlTree, id: NodeId) {
    if tree.children(id).is_empty() {
        tree.add_child(id, Node::new(NodeKind::Stub, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: Vec<(&str, TomlValue)>) -> TomlValue {
        TomlValue::Table(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_pairs_come_before_tables() {
        let value = table(vec![
            ("inner", table(vec![("x", TomlValue::from(1))])),
            ("name", TomlValue::from("n")),
        ]);
        let tree = TomlTree::from_value(&value, &TomlOutputConfig::new()).unwrap();
        let root = tree.children(tree.root());
        assert!(tree.node(root[0]).as_key_value().is_some());
        assert_eq!(tree.node(root[1]).as_table().unwrap().name(), "inner");
    }

    #[test]
    fn test_table_arrays_get_buckets() {
        let value = table(vec![(
            "items",
            TomlValue::Array(vec![
                table(vec![("id", TomlValue::from(1))]),
                table(vec![]),
            ]),
        )]);
        let tree = TomlTree::from_value(&value, &TomlOutputConfig::new()).unwrap();
        let items = tree.children(tree.root())[0];
        let node = tree.node(items).as_table().unwrap();
        assert_eq!(node.table_type, TableType::Array);

        let buckets = tree.children(items);
        assert_eq!(buckets.len(), 2);
        assert!(tree.node(tree.children(buckets[1])[0]).is_stub());
    }

    #[test]
    fn test_mixed_arrays_stay_values() {
        let value = table(vec![(
            "mixed",
            TomlValue::Array(vec![TomlValue::from(1), table(vec![])]),
        )]);
        let tree = TomlTree::from_value(&value, &TomlOutputConfig::new()).unwrap();
        let first = tree.children(tree.root())[0];
        assert!(tree.node(first).value().is_some_and(TomlValue::is_array));
    }

    #[test]
    fn test_non_table_root_is_rejected() {
        let err = TomlTree::from_value(&TomlValue::from(1), &TomlOutputConfig::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }
}
