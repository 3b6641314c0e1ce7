//! Ordered map type for TOML tables.
//!
//! [`TomlMap`] wraps an [`IndexMap`] so that keys keep the order in which they
//! appeared in the source. Inline tables are parsed into a `TomlMap`, and a
//! decoded document is a `TomlMap` at the top level.
//!
//! ## Examples
//!
//! ```rust
//! use serde_toml_tree::{TomlMap, TomlValue};
//!
//! let mut map = TomlMap::new();
//! map.insert("name".to_string(), TomlValue::from("Alice"));
//! map.insert("age".to_string(), TomlValue::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::TomlValue;
use indexmap::IndexMap;

/// An insertion-ordered map of string keys to TOML values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TomlMap(IndexMap<String, TomlValue>);

impl TomlMap {
    #[must_use]
    pub fn new() -> Self {
        TomlMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TomlMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the value is replaced in place
    /// (the key keeps its original position) and the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_toml_tree::{TomlMap, TomlValue};
    ///
    /// let mut map = TomlMap::new();
    /// assert!(map.insert("key".to_string(), TomlValue::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), TomlValue::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: TomlValue) -> Option<TomlValue> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TomlValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TomlValue> {
        self.0.get_mut(key)
    }

    /// Gets the entry for `key` for in-place manipulation.
    pub fn entry(&mut self, key: String) -> indexmap::map::Entry<'_, String, TomlValue> {
        self.0.entry(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, TomlValue> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, TomlValue> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, TomlValue> {
        self.0.iter()
    }
}

impl IntoIterator for TomlMap {
    type Item = (String, TomlValue);
    type IntoIter = indexmap::map::IntoIter<String, TomlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TomlMap {
    type Item = (&'a String, &'a TomlValue);
    type IntoIter = indexmap::map::Iter<'a, String, TomlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, TomlValue)> for TomlMap {
    fn from_iter<T: IntoIterator<Item = (String, TomlValue)>>(iter: T) -> Self {
        TomlMap(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinsert_keeps_position() {
        let mut map = TomlMap::new();
        map.insert("a".to_string(), TomlValue::from(1));
        map.insert("b".to_string(), TomlValue::from(2));
        map.insert("a".to_string(), TomlValue::from(3));

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get("a").and_then(|v| v.as_i64()), Some(3));
    }
}
