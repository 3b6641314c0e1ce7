//! # serde_toml_tree
//!
//! A TOML parser that keeps the document as a tree, with a Serde layer on top.
//!
//! ## What is kept in the tree?
//!
//! Parsing produces a [`TomlTree`]: an arena of nodes for the file root,
//! tables, array-of-tables elements, key-value pairs and stubs for empty
//! tables. Every node remembers its source line, the comment lines above it
//! and its inline comment. Tables implied by a dotted header or a dotted key
//! are created as *synthetic* tables, so `a.b.c = 1` and `[a.b]\nc = 1`
//! produce the same shape.
//!
//! ## Key Features
//!
//! - **Line-accurate errors**: every parse error names the line where the
//!   offending construct started
//! - **Lenient by default**: null values, empty values, repeated table
//!   headers and `\'` in literal strings are accepted unless disabled through
//!   [`TomlInputConfig`]
//! - **Serde compatible**: decode into and encode from any
//!   `#[derive(Serialize, Deserialize)]` type
//! - **Comment preserving**: comments survive a parse and write cycle
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_toml_tree::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Package {
//!     name: String,
//!     version: String,
//!     authors: Vec<String>,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Manifest {
//!     package: Package,
//! }
//!
//! let text = r#"
//! [package]
//! name = "demo"
//! version = "0.1.0"
//! authors = ["Ada", "Grace"]
//! "#;
//!
//! let manifest: Manifest = from_str(text).unwrap();
//! assert_eq!(manifest.package.authors.len(), 2);
//!
//! let written = to_string(&manifest).unwrap();
//! let back: Manifest = from_str(&written).unwrap();
//! assert_eq!(manifest, back);
//! ```
//!
//! ### Working with the tree
//!
//! ```rust
//! use serde_toml_tree::{parse_str, TomlValue};
//!
//! let tree = parse_str("[[fruit]]\nname = \"apple\"\n[[fruit]]\nname = \"pear\"").unwrap();
//! let fruit = tree.children(tree.root())[0];
//! let buckets = tree.children(fruit);
//! assert_eq!(buckets.len(), 2);
//!
//! let pair = tree.children(buckets[1])[0];
//! assert_eq!(tree.node(pair).value(), Some(&TomlValue::from("pear")));
//! assert_eq!(tree.node(pair).line(), 4);
//! ```
//!
//! ## Pipeline
//!
//! - [`lines`] turns text into logical lines, joining multiline strings and
//!   arrays
//! - [`key`] and [`literal`] parse keys and values
//! - [`insert`] places tables and pairs into the [`tree`]
//! - [`parser`] drives the above over a whole document
//! - [`de`] decodes a tree through Serde; [`ser`] and [`encode`] build a tree
//!   from a Rust value; [`emitter`] writes a tree back to text
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for document-level progress and
//! table merges, `trace` for each table insertion) and never installs a
//! subscriber itself.

pub mod de;
pub mod emitter;
pub mod encode;
pub mod error;
pub mod insert;
pub mod key;
pub mod lines;
pub mod literal;
pub mod map;
pub mod options;
pub mod parser;
pub mod ser;
pub mod tree;
pub mod value;

pub use de::{Deserializer, ValueDeserializer};
pub use emitter::{tree_to_string, Emitter, StringEmitter};
pub use error::{Error, Result};
pub use key::Key;
pub use map::TomlMap;
pub use options::{Indentation, TomlInputConfig, TomlOutputConfig};
pub use parser::TomlParser;
pub use ser::ValueSerializer;
pub use tree::{NodeId, TomlTree};
pub use value::{TomlDateTime, TomlValue};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Parse TOML text into a [`TomlTree`] with the default configuration.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::parse_str;
///
/// let tree = parse_str("[server]\nport = 8080").unwrap();
/// assert_eq!(tree.node_count(), 3);
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] with the offending line when the text is not
/// valid TOML.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str(text: &str) -> Result<TomlTree> {
    parse_str_with_config(text, &TomlInputConfig::default())
}

/// Parse TOML text into a [`TomlTree`] with a custom configuration.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::{parse_str_with_config, TomlInputConfig};
///
/// let strict = TomlInputConfig::strict();
/// assert!(parse_str_with_config("a = null", &strict).is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] when the text is not valid TOML under `config`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str_with_config(text: &str, config: &TomlInputConfig) -> Result<TomlTree> {
    TomlParser::new(config.clone()).parse_str(text)
}

/// Deserialize an instance of type `T` from an already parsed tree.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::{from_tree, parse_str, TomlInputConfig};
/// use std::collections::BTreeMap;
///
/// let tree = parse_str("a = 1\nb = 2").unwrap();
/// let map: BTreeMap<String, i64> = from_tree(&tree, &TomlInputConfig::new()).unwrap();
/// assert_eq!(map["b"], 2);
/// ```
///
/// # Errors
///
/// Returns [`Error::Decode`] or [`Error::UnknownName`] when the tree does
/// not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_tree<T>(tree: &TomlTree, config: &TomlInputConfig) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(tree, config))
}

/// Deserialize an instance of type `T` from a string of TOML text.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x = 1\ny = 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid TOML or cannot be deserialized
/// to type `T`. Error messages include the source line.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str_with_config(s, &TomlInputConfig::default())
}

/// Deserialize an instance of type `T` from TOML text with a custom
/// configuration.
///
/// # Errors
///
/// Returns an error if the input is not valid TOML under `config` or cannot
/// be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_config<T>(s: &str, config: &TomlInputConfig) -> Result<T>
where
    T: DeserializeOwned,
{
    let tree = parse_str_with_config(s, config)?;
    from_tree(&tree, config)
}

/// Deserialize an instance of type `T` from an I/O stream of TOML.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let cursor = Cursor::new(b"x = 1\ny = 2");
/// let point: Point = from_reader(cursor).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails, the input is not valid
/// TOML, or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from bytes of TOML text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid TOML, or
/// cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Deserialize an instance of type `T` from a [`TomlValue`].
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::{from_value, TomlValue};
///
/// let value = TomlValue::Array(vec![TomlValue::from(1), TomlValue::from(2)]);
/// let numbers: Vec<u8> = from_value(&value).unwrap();
/// assert_eq!(numbers, vec![1, 2]);
/// ```
///
/// # Errors
///
/// Returns an error if the value does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: &TomlValue) -> Result<T>
where
    T: DeserializeOwned,
{
    let config = TomlInputConfig::default();
    T::deserialize(ValueDeserializer::new(value, 0, &config))
}

/// Convert any `T: Serialize` to a [`TomlValue`].
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::{to_value, TomlValue};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_table());
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] for map keys that are not strings.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<TomlValue>
where
    T: ?Sized + Serialize,
{
    ser::to_toml_value(value)
}

/// Build a [`TomlTree`] from any `T: Serialize`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] when `value` does not serialize to a
/// table.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_tree<T>(value: &T, config: &TomlOutputConfig) -> Result<TomlTree>
where
    T: ?Sized + Serialize,
{
    TomlTree::from_value(&to_value(value)?, config)
}

/// Serialize any `T: Serialize` to a TOML string.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), "x = 1\ny = 2\n");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a TOML document.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_config(value, &TomlOutputConfig::default())
}

/// Serialize any `T: Serialize` to a TOML string with custom output options.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::{to_string_with_config, Indentation, TomlOutputConfig};
/// use std::collections::BTreeMap;
///
/// let doc = BTreeMap::from([("db", BTreeMap::from([("port", 5432)]))]);
/// let config = TomlOutputConfig::new().with_indentation(Indentation::TwoSpaces);
/// assert_eq!(to_string_with_config(&doc, &config).unwrap(), "[db]\n  port = 5432\n");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a TOML document.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_config<T>(value: &T, config: &TomlOutputConfig) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let tree = to_tree(value, config)?;
    Ok(tree_to_string(&tree, config))
}

/// Serialize any `T: Serialize` to a writer as TOML.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_config(writer, value, &TomlOutputConfig::default())
}

/// Serialize any `T: Serialize` to a writer as TOML with custom output
/// options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_config<W, T>(mut writer: W, value: &T, config: &TomlOutputConfig) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_config(value, config)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
        home: Point,
        visits: Vec<Point>,
    }

    fn user() -> User {
        User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
            home: Point { x: 1, y: 2 },
            visits: vec![Point { x: 3, y: 4 }, Point { x: 5, y: 6 }],
        }
    }

    #[test]
    fn test_serialize_deserialize_point() {
        let point = Point { x: 1, y: 2 };
        let toml = to_string(&point).unwrap();
        let point_back: Point = from_str(&toml).unwrap();
        assert_eq!(point, point_back);
    }

    #[test]
    fn test_serialize_deserialize_user() {
        let toml = to_string(&user()).unwrap();
        assert_eq!(
            toml,
            "id = 123\nname = \"Alice\"\nactive = true\ntags = [\"admin\", \"user\"]\n\n\
             [home]\n    x = 1\n    y = 2\n\n\
             [[visits]]\n    x = 3\n    y = 4\n\n\
             [[visits]]\n    x = 5\n    y = 6\n"
        );
        let user_back: User = from_str(&toml).unwrap();
        assert_eq!(user(), user_back);
    }

    #[test]
    fn test_custom_config() {
        let config = TomlOutputConfig::new().with_indentation(Indentation::Tab);
        let toml = to_string_with_config(&user(), &config).unwrap();
        assert!(toml.contains("[home]\n\tx = 1\n"));
        let user_back: User = from_str(&toml).unwrap();
        assert_eq!(user(), user_back);
    }

    #[test]
    fn test_writer_and_reader() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &user()).unwrap();
        let from_bytes: User = from_slice(&buffer).unwrap();
        let from_io: User = from_reader(buffer.as_slice()).unwrap();
        assert_eq!(from_bytes, from_io);
    }

    #[test]
    fn test_non_table_documents_are_rejected() {
        assert!(matches!(to_string(&5), Err(Error::UnsupportedType(_))));
        assert!(matches!(
            to_string(&vec![1, 2]),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(from_slice::<Point>(&[0xff, 0xfe]).is_err());
    }
}
