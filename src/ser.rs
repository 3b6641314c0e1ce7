//! TOML serialization.
//!
//! This module provides [`ValueSerializer`], which converts Rust data
//! structures into a [`TomlValue`]. Text output is a second step: the value
//! is turned into a tree with [`TomlTree::from_value`](crate::TomlTree::from_value)
//! and written by the [`emitter`](crate::emitter).
//!
//! ## Overview
//!
//! - Integers become [`TomlValue::Integer`]; a `u64` above `i64::MAX` becomes
//!   [`TomlValue::UnsignedInteger`]
//! - `None` and `()` become [`TomlValue::Null`], which the writer drops by
//!   default
//! - Unit variants become strings; newtype, tuple and struct variants become
//!   a table with the variant name as its only key
//! - Map keys must serialize to strings
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde_toml_tree::{to_string, to_value, TomlValue};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Server { host: String, port: u16 }
//!
//! let server = Server { host: "localhost".into(), port: 8080 };
//! assert_eq!(to_string(&server).unwrap(), "host = \"localhost\"\nport = 8080\n");
//!
//! let value = to_value(&server).unwrap();
//! assert_eq!(value.as_table().unwrap().get("port"), Some(&TomlValue::Integer(8080)));
//! ```

use crate::literal::parse_datetime;
use crate::value::DATETIME_TOKEN;
use crate::{Error, Result, TomlMap, TomlValue};
use serde::{ser, Serialize};

/// Serializer that builds a [`TomlValue`].
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<TomlValue>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: TomlMap,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

/// Wraps `value` in a one-key table named after the variant.
fn variant_table(variant: &'static str, value: TomlValue) -> TomlValue {
    let mut map = TomlMap::with_capacity(1);
    map.insert(variant.to_string(), value);
    TomlValue::Table(map)
}

impl ser::Serializer for ValueSerializer {
    type Ok = TomlValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<TomlValue> {
        Ok(TomlValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<TomlValue> {
        Ok(TomlValue::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<TomlValue> {
        Ok(TomlValue::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<TomlValue> {
        Ok(TomlValue::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<TomlValue> {
        Ok(TomlValue::basic_string(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<TomlValue> {
        Ok(TomlValue::basic_string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<TomlValue> {
        let vec = v.iter().map(|&b| TomlValue::from(b)).collect();
        Ok(TomlValue::Array(vec))
    }

    fn serialize_none(self) -> Result<TomlValue> {
        Ok(TomlValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<TomlValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<TomlValue> {
        Ok(TomlValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<TomlValue> {
        Ok(TomlValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<TomlValue> {
        Ok(TomlValue::basic_string(variant))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<TomlValue>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(self)?;
        if name != DATETIME_TOKEN {
            return Ok(inner);
        }
        match inner.as_str().and_then(parse_datetime) {
            Some(dt) => Ok(TomlValue::DateTime(dt)),
            None => Err(Error::unsupported_type(&format!(
                "{} is not a TOML date-time",
                inner
            ))),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<TomlValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(variant_table(variant, to_toml_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_toml_value(value)?);
        Ok(())
    }

    fn finish(self) -> TomlValue {
        let array = TomlValue::Array(self.vec);
        match self.variant {
            Some(variant) => variant_table(variant, array),
            None => array,
        }
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: TomlMap::new(),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> TomlValue {
        let table = TomlValue::Table(self.map);
        match self.variant {
            Some(variant) => variant_table(variant, table),
            None => table,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_toml_value(key)? {
            TomlValue::String { content, .. } => {
                self.current_key = Some(content);
                Ok(())
            }
            other => Err(Error::unsupported_type(&format!(
                "table keys must be strings, found {}",
                other.type_name()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_toml_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_toml_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = TomlValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_toml_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<TomlValue> {
        Ok(self.finish())
    }
}

pub(crate) fn to_toml_value<T: Serialize + ?Sized>(value: &T) -> Result<TomlValue> {
    value.serialize(ValueSerializer)
}
