//! TOML deserialization.
//!
//! This module provides the [`Deserializer`] implementation that walks a
//! parsed [`TomlTree`] into Rust data structures.
//!
//! ## Overview
//!
//! - The document root, primitive tables and array-of-tables buckets are
//!   maps over their children; stubs are skipped
//! - An array of tables is a sequence of its buckets
//! - A key-value pair is its value, read through [`ValueDeserializer`]
//! - A key repeated inside one table, which lenient table redeclaration
//!   allows, keeps its first position and its last value
//! - Date-times are handed to the visitor as their TOML text
//!
//! Errors raised by a visitor are tagged with the line of the pair or table
//! being read.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde_toml_tree::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Shape { name: String, points: Vec<Point> }
//!
//! let text = "name = \"line\"\n[[points]]\nx = 0\ny = 0\n[[points]]\nx = 3\ny = 4\n";
//! let shape: Shape = from_str(text).unwrap();
//! assert_eq!(shape.points[1], Point { x: 3, y: 4 });
//! ```
//!
//! ## Unknown Keys
//!
//! A key the target struct does not declare is an error unless
//! `ignore_unknown_names` is set:
//!
//! ```rust
//! use serde_toml_tree::{from_str, from_str_with_config, Error, TomlInputConfig};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug)]
//! struct Config { port: u16 }
//!
//! let err = from_str::<Config>("port = 80\nhost = \"x\"").unwrap_err();
//! assert!(matches!(err, Error::UnknownName { line: 2, .. }));
//!
//! let config = TomlInputConfig::new().with_ignore_unknown_names(true);
//! let parsed: Config = from_str_with_config("port = 80\nhost = \"x\"", &config).unwrap();
//! assert_eq!(parsed.port, 80);
//! ```

use crate::options::TomlInputConfig;
use crate::tree::{NodeId, NodeKind, TableType, TomlTree};
use crate::{Error, Result, TomlValue};
use indexmap::IndexMap;
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};

/// Deserializer over one node of a [`TomlTree`].
pub struct Deserializer<'a> {
    tree: &'a TomlTree,
    id: NodeId,
    config: &'a TomlInputConfig,
}

impl<'a> Deserializer<'a> {
    /// Starts at the root of `tree`.
    #[must_use]
    pub fn new(tree: &'a TomlTree, config: &'a TomlInputConfig) -> Self {
        Self::at_node(tree, tree.root(), config)
    }

    /// Starts at an arbitrary node, for example one table of a larger file.
    #[must_use]
    pub fn at_node(tree: &'a TomlTree, id: NodeId, config: &'a TomlInputConfig) -> Self {
        Deserializer { tree, id, config }
    }

    fn line(&self) -> usize {
        self.tree.node(self.id).line()
    }

    fn value(&self) -> Option<ValueDeserializer<'a>> {
        self.tree
            .node(self.id)
            .value()
            .map(|value| ValueDeserializer::new(value, self.line(), self.config))
    }

    fn is_array_table(&self) -> bool {
        self.tree
            .node(self.id)
            .as_table()
            .is_some_and(|t| t.table_type == TableType::Array)
    }

    /// Children by name; a repeated name keeps its first position and its
    /// last node.
    fn entries(&self) -> IndexMap<String, NodeId> {
        let mut entries = IndexMap::new();
        for &child in self.tree.children(self.id) {
            let name = match self.tree.node(child).kind() {
                NodeKind::KeyValue(pair) => pair.key.content(),
                NodeKind::Table(table) => table.key.content(),
                _ => continue,
            };
            entries.insert(name.to_string(), child);
        }
        entries
    }

    fn map_access(&self, entries: IndexMap<String, NodeId>) -> NodeMapAccess<'a> {
        NodeMapAccess {
            tree: self.tree,
            config: self.config,
            iter: entries.into_iter(),
            pending: None,
        }
    }
}

fn check_fields<'k>(
    keys: impl Iterator<Item = (&'k str, usize)>,
    fields: &'static [&'static str],
    config: &TomlInputConfig,
) -> Result<()> {
    if config.ignore_unknown_names {
        return Ok(());
    }
    for (key, line) in keys {
        if !fields.contains(&key) {
            return Err(Error::unknown_name(key, line));
        }
    }
    Ok(())
}

impl<'de, 'a> de::Deserializer<'de> for Deserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if let Some(value) = self.value() {
            return value.deserialize_any(visitor);
        }
        if self.is_array_table() {
            return visitor.visit_seq(BucketSeqAccess {
                tree: self.tree,
                config: self.config,
                iter: self.tree.children(self.id).iter(),
            });
        }
        let entries = self.entries();
        visitor.visit_map(self.map_access(entries))
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value() {
            Some(value) => value.deserialize_option(visitor),
            None => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if let Some(value) = self.value() {
            return value.deserialize_struct(name, fields, visitor);
        }
        if self.is_array_table() {
            return self.deserialize_any(visitor);
        }

        let entries = self.entries();
        check_fields(
            entries
                .iter()
                .map(|(key, &id)| (key.as_str(), self.tree.node(id).line())),
            fields,
            self.config,
        )?;
        visitor.visit_map(self.map_access(entries))
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if let Some(value) = self.value() {
            return value.deserialize_enum(name, variants, visitor);
        }

        let mut entries = self.entries();
        match entries.pop() {
            Some((variant, id)) if entries.is_empty() => visitor.visit_enum(EnumAccess {
                variant,
                content: Deserializer::at_node(self.tree, id, self.config),
            }),
            _ => Err(Error::decode(
                self.line(),
                format!("expected a table with exactly one key for enum {}", name),
            )),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map identifier ignored_any
    }
}

struct NodeMapAccess<'a> {
    tree: &'a TomlTree,
    config: &'a TomlInputConfig,
    iter: indexmap::map::IntoIter<String, NodeId>,
    pending: Option<NodeId>,
}

impl<'de, 'a> de::MapAccess<'de> for NodeMapAccess<'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, id)) => {
                self.pending = Some(id);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let id = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("next_value_seed called before next_key_seed"))?;
        let line = self.tree.node(id).line();
        seed.deserialize(Deserializer::at_node(self.tree, id, self.config))
            .map_err(|e| e.at_line(line))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct BucketSeqAccess<'a> {
    tree: &'a TomlTree,
    config: &'a TomlInputConfig,
    iter: std::slice::Iter<'a, NodeId>,
}

impl<'de, 'a> de::SeqAccess<'de> for BucketSeqAccess<'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(&bucket) => {
                let line = self.tree.node(bucket).line();
                seed.deserialize(Deserializer::at_node(self.tree, bucket, self.config))
                    .map(Some)
                    .map_err(|e| e.at_line(line))
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Deserializer over a single [`TomlValue`].
///
/// `line` is used to tag errors and unknown names found inside the value.
pub struct ValueDeserializer<'a> {
    value: &'a TomlValue,
    line: usize,
    config: &'a TomlInputConfig,
}

impl<'a> ValueDeserializer<'a> {
    #[must_use]
    pub fn new(value: &'a TomlValue, line: usize, config: &'a TomlInputConfig) -> Self {
        ValueDeserializer {
            value,
            line,
            config,
        }
    }

    fn nested(&self, value: &'a TomlValue) -> Self {
        ValueDeserializer::new(value, self.line, self.config)
    }
}

impl<'de, 'a> de::Deserializer<'de> for ValueDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            TomlValue::Null => visitor.visit_unit(),
            TomlValue::Bool(b) => visitor.visit_bool(*b),
            TomlValue::Integer(i) => visitor.visit_i64(*i),
            TomlValue::UnsignedInteger(u) => visitor.visit_u64(*u),
            TomlValue::Float(f) => visitor.visit_f64(*f),
            TomlValue::String { content, .. } => visitor.visit_str(content),
            TomlValue::DateTime(dt) => visitor.visit_string(dt.to_string()),
            TomlValue::Array(items) => visitor.visit_seq(ValueSeqAccess {
                parent: self.nested(self.value),
                iter: items.iter(),
            }),
            TomlValue::Table(map) => visitor.visit_map(ValueMapAccess {
                parent: self.nested(self.value),
                iter: map.iter(),
                pending: None,
            }),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            TomlValue::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if let TomlValue::Table(map) = self.value {
            check_fields(
                map.keys().map(|key| (key.as_str(), self.line)),
                fields,
                self.config,
            )?;
        }
        self.deserialize_any(visitor)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            TomlValue::String { content, .. } => {
                visitor.visit_enum(content.as_str().into_deserializer())
            }
            TomlValue::Table(map) if map.len() == 1 => {
                let Some((variant, value)) = map.iter().next() else {
                    return Err(Error::decode(self.line, "empty enum table"));
                };
                visitor.visit_enum(EnumAccess {
                    variant: variant.clone(),
                    content: self.nested(value),
                })
            }
            other => Err(Error::decode(
                self.line,
                format!("expected a string or a one-key table for enum {}, found {}", name, other.type_name()),
            )),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map identifier ignored_any
    }
}

struct ValueSeqAccess<'a> {
    parent: ValueDeserializer<'a>,
    iter: std::slice::Iter<'a, TomlValue>,
}

impl<'de, 'a> de::SeqAccess<'de> for ValueSeqAccess<'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(self.parent.nested(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct ValueMapAccess<'a> {
    parent: ValueDeserializer<'a>,
    iter: indexmap::map::Iter<'a, String, TomlValue>,
    pending: Option<&'a TomlValue>,
}

impl<'de, 'a> de::MapAccess<'de> for ValueMapAccess<'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(key.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some(value) => seed.deserialize(self.parent.nested(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumAccess<D> {
    variant: String,
    content: D,
}

impl<'de, D> de::EnumAccess<'de> for EnumAccess<D>
where
    D: de::Deserializer<'de, Error = Error>,
{
    type Error = Error;
    type Variant = VariantAccess<D>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let name: de::value::StringDeserializer<Error> = self.variant.into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((
            variant,
            VariantAccess {
                content: self.content,
            },
        ))
    }
}

struct VariantAccess<D> {
    content: D,
}

impl<'de, D> de::VariantAccess<'de> for VariantAccess<D>
where
    D: de::Deserializer<'de, Error = Error>,
{
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        <de::IgnoredAny as de::Deserialize>::deserialize(self.content).map(|_| ())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.content)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.content.deserialize_seq(visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.content.deserialize_struct("", fields, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_str;
    use serde::Deserialize;
    use std::collections::HashMap;

    fn decode<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T> {
        let tree = parse_str(text)?;
        let config = TomlInputConfig::new();
        T::deserialize(Deserializer::new(&tree, &config))
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Owner {
        name: String,
        dob: String,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Database {
        ports: Vec<u16>,
        enabled: bool,
        temp_targets: HashMap<String, f64>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Document {
        title: String,
        owner: Owner,
        database: Database,
    }

    #[test]
    fn test_nested_tables() {
        let text = r#"
title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
enabled = true
ports = [ 8000, 8001, 8002 ]
temp_targets = { cpu = 79.5, case = 72 }
"#;
        let doc: Document = decode(text).unwrap();
        assert_eq!(doc.title, "TOML Example");
        assert_eq!(doc.owner.dob, "1979-05-27T07:32:00-08:00");
        assert_eq!(doc.database.ports, vec![8000, 8001, 8002]);
        assert_eq!(doc.database.temp_targets["case"], 72.0);
    }

    #[test]
    fn test_redeclared_key_last_value_wins() {
        let map: IndexMap<String, IndexMap<String, i64>> =
            decode("[a]\nx = 1\ny = 2\n[b]\n[a]\nx = 3").unwrap();
        let a = &map["a"];
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(a["x"], 3);
    }

    #[test]
    fn test_overflow_reports_line() {
        #[derive(Deserialize, Debug)]
        struct Small {
            #[allow(dead_code)]
            v: u8,
        }
        let err = decode::<Small>("\n\nv = 300").unwrap_err();
        assert!(matches!(err, Error::Decode { line: 3, .. }));
    }

    #[test]
    fn test_options_and_nulls() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Opt {
            a: Option<i32>,
            b: Option<i32>,
            c: Option<i32>,
        }
        let opt: Opt = decode("a = 1\nb = null").unwrap();
        assert_eq!(
            opt,
            Opt {
                a: Some(1),
                b: None,
                c: None
            }
        );
    }

    #[test]
    fn test_enums() {
        #[derive(Deserialize, Debug, PartialEq)]
        enum Mode {
            Fast,
            Limited(u32),
            Custom { level: i32 },
        }
        #[derive(Deserialize, Debug, PartialEq)]
        struct Settings {
            a: Mode,
            b: Mode,
            c: Mode,
        }
        let settings: Settings =
            decode("a = \"Fast\"\nb = { Limited = 5 }\n[c.Custom]\nlevel = 2").unwrap();
        assert_eq!(settings.a, Mode::Fast);
        assert_eq!(settings.b, Mode::Limited(5));
        assert_eq!(settings.c, Mode::Custom { level: 2 });
    }

    #[test]
    fn test_unknown_names_inside_array_values() {
        #[derive(Deserialize, Debug)]
        struct Item {
            #[allow(dead_code)]
            id: i32,
        }
        #[derive(Deserialize, Debug)]
        struct List {
            #[allow(dead_code)]
            items: Vec<Item>,
        }
        let err = decode::<List>("\nitems = [{ id = 1, extra = 2 }]").unwrap_err();
        assert_eq!(err, Error::unknown_name("extra", 2));
    }

    #[test]
    fn test_empty_table_decodes_to_empty_map() {
        let map: HashMap<String, HashMap<String, i32>> = decode("[empty]").unwrap();
        assert!(map["empty"].is_empty());
    }
}
