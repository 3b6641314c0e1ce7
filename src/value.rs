//! Typed values carried by key-value nodes.
//!
//! [`TomlValue`] is the payload of every key-value pair in the tree and the
//! dynamic representation of a decoded document. Strings remember how they
//! were written (basic or literal, single or multiline) so that a tree can
//! be written back close to its source form.
//!
//! ## Creating Values
//!
//! ```rust
//! use serde_toml_tree::TomlValue;
//!
//! let boolean = TomlValue::from(true);
//! let number = TomlValue::from(42);
//! let text = TomlValue::from("hello");
//!
//! assert!(boolean.is_bool());
//! assert_eq!(number.as_i64(), Some(42));
//! assert_eq!(text.to_string(), "\"hello\"");
//! ```
//!
//! ## Date-times
//!
//! TOML has four date-time shapes; [`TomlDateTime`] keeps them apart instead
//! of forcing everything into UTC:
//!
//! ```rust
//! use serde_toml_tree::{parse_str, TomlDateTime};
//!
//! let tree = parse_str("d = 1979-05-27").unwrap();
//! let pair = tree.children(tree.root())[0];
//! let value = tree.node(pair).value().unwrap();
//! assert!(matches!(value.as_datetime(), Some(TomlDateTime::LocalDate(_))));
//! ```

use crate::TomlMap;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A value as it appears on the right-hand side of `key = value`.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum TomlValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers in `2^63 ..= 2^64 - 1`, which do not fit an `i64`
    UnsignedInteger(u64),
    Float(f64),
    String {
        content: String,
        literal: bool,
        multiline: bool,
    },
    DateTime(TomlDateTime),
    Array(Vec<TomlValue>),
    /// An inline table, or a whole table once a tree is decoded
    Table(TomlMap),
}

/// One of the four TOML date-time shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TomlDateTime {
    /// `1979-05-27T07:32:00Z`, `1979-05-27T00:32:00-07:00`
    OffsetDateTime(DateTime<FixedOffset>),
    /// `1979-05-27T07:32:00`
    LocalDateTime(NaiveDateTime),
    /// `1979-05-27`
    LocalDate(NaiveDate),
    /// `07:32:00`
    LocalTime(NaiveTime),
}

/// Newtype name under which date-times travel through serde, so that
/// [`crate::to_value`] can tell them apart from plain strings.
pub(crate) const DATETIME_TOKEN: &str = "$__serde_toml_tree_datetime";

impl fmt::Display for TomlDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TomlDateTime::OffsetDateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            TomlDateTime::LocalDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            TomlDateTime::LocalDate(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TomlDateTime::LocalTime(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
        }
    }
}

impl TomlValue {
    /// Creates a single-line basic (double-quoted) string.
    #[must_use]
    pub fn basic_string(content: impl Into<String>) -> Self {
        TomlValue::String {
            content: content.into(),
            literal: false,
            multiline: false,
        }
    }

    /// Creates a single-line literal (single-quoted) string.
    #[must_use]
    pub fn literal_string(content: impl Into<String>) -> Self {
        TomlValue::String {
            content: content.into(),
            literal: true,
            multiline: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, TomlValue::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, TomlValue::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, TomlValue::Integer(_) | TomlValue::UnsignedInteger(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, TomlValue::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, TomlValue::String { .. })
    }

    #[inline]
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(self, TomlValue::DateTime(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, TomlValue::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, TomlValue::Table(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TomlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string of any style, returns its content.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_toml_tree::TomlValue;
    ///
    /// assert_eq!(TomlValue::literal_string("C:\\x").as_str(), Some("C:\\x"));
    /// assert_eq!(TomlValue::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TomlValue::String { content, .. } => Some(content),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TomlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            TomlValue::Integer(i) => u64::try_from(*i).ok(),
            TomlValue::UnsignedInteger(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the value as a float; integers are widened.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TomlValue::Float(f) => Some(*f),
            TomlValue::Integer(i) => Some(*i as f64),
            TomlValue::UnsignedInteger(u) => Some(*u as f64),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> Option<&TomlDateTime> {
        match self {
            TomlValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<TomlValue>> {
        match self {
            TomlValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&TomlMap> {
        match self {
            TomlValue::Table(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the value's type, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            TomlValue::Null => "null",
            TomlValue::Bool(_) => "boolean",
            TomlValue::Integer(_) | TomlValue::UnsignedInteger(_) => "integer",
            TomlValue::Float(_) => "float",
            TomlValue::String { .. } => "string",
            TomlValue::DateTime(_) => "date-time",
            TomlValue::Array(_) => "array",
            TomlValue::Table(_) => "inline table",
        }
    }
}

/// Writes `s` as a single-line basic string, quotes included.
pub(crate) fn write_basic_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_multiline_basic_string(out: &mut String, s: &str) {
    // Leading newline is trimmed by the parser, so content starting with a
    // newline survives a round trip.
    out.push_str("\"\"\"\n");
    let mut quotes = 0;
    for ch in s.chars() {
        if ch == '"' {
            quotes += 1;
            if quotes == 3 {
                out.push_str("\\\"");
                quotes = 0;
                continue;
            }
        } else {
            quotes = 0;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' | '\t' | '\r' => out.push(ch),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push_str("\"\"\"");
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("nan");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "inf" } else { "-inf" });
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        out.push_str(&format!("{:.1}", f));
    } else if f.abs() >= 1e16 {
        let exp = format!("{:e}", f);
        match exp.split_once('e') {
            Some((mantissa, power)) if !mantissa.contains('.') => {
                out.push_str(&format!("{}.0e{}", mantissa, power));
            }
            _ => out.push_str(&exp),
        }
    } else {
        out.push_str(&f.to_string());
    }
}

/// A multiline literal would join a line ending in `\` with the next one.
fn has_continued_line(content: &str) -> bool {
    let mut lines = content.split('\n').rev().skip(1);
    lines.any(|line| line.trim_end_matches(&[' ', '\t'][..]).ends_with('\\'))
}

pub(crate) fn write_value(out: &mut String, value: &TomlValue) {
    match value {
        TomlValue::Null => out.push_str("null"),
        TomlValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        TomlValue::Integer(i) => out.push_str(&i.to_string()),
        TomlValue::UnsignedInteger(u) => out.push_str(&u.to_string()),
        TomlValue::Float(f) => write_float(out, *f),
        TomlValue::String {
            content,
            literal,
            multiline,
        } => match (literal, multiline) {
            (true, false) if !content.contains('\'') && !content.contains('\n') => {
                out.push('\'');
                out.push_str(content);
                out.push('\'');
            }
            (true, true) if !content.contains("'''") && !has_continued_line(content) => {
                out.push_str("'''\n");
                out.push_str(content);
                out.push_str("'''");
            }
            (_, true) => write_multiline_basic_string(out, content),
            _ => write_basic_string(out, content),
        },
        TomlValue::DateTime(dt) => out.push_str(&dt.to_string()),
        TomlValue::Array(arr) => {
            out.push('[');
            for (i, element) in arr.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, element);
            }
            out.push(']');
        }
        TomlValue::Table(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&crate::key::format_segment(key));
                out.push_str(" = ");
                write_value(out, value);
            }
            out.push_str(" }");
        }
    }
}

/// Renders the value as a TOML literal.
///
/// Whole-number floats always gain a trailing `.0`, multiline strings always
/// start on a fresh line, and offset date-times in UTC are written with `Z`.
impl fmt::Display for TomlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_value(&mut out, self);
        f.write_str(&out)
    }
}

impl Serialize for TomlValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TomlValue::Null => serializer.serialize_unit(),
            TomlValue::Bool(b) => serializer.serialize_bool(*b),
            TomlValue::Integer(i) => serializer.serialize_i64(*i),
            TomlValue::UnsignedInteger(u) => serializer.serialize_u64(*u),
            TomlValue::Float(f) => serializer.serialize_f64(*f),
            TomlValue::String { content, .. } => serializer.serialize_str(content),
            TomlValue::DateTime(dt) => {
                serializer.serialize_newtype_struct(DATETIME_TOKEN, &dt.to_string())
            }
            TomlValue::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            TomlValue::Table(map) => {
                use serde::ser::SerializeMap;
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    state.serialize_entry(k, v)?;
                }
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for TomlValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct TomlValueVisitor;

        impl<'de> Visitor<'de> for TomlValueVisitor {
            type Value = TomlValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid TOML value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(TomlValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(TomlValue::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(TomlValue::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(TomlValue::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(TomlValue::basic_string(value))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(TomlValue::basic_string(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(TomlValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(TomlValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(TomlValue::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = TomlMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(TomlValue::Table(values))
            }
        }

        deserializer.deserialize_any(TomlValueVisitor)
    }
}

impl TryFrom<TomlValue> for i64 {
    type Error = crate::Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        match value {
            TomlValue::Integer(i) => Ok(i),
            TomlValue::UnsignedInteger(u) => Err(crate::Error::custom(format!(
                "integer {} does not fit in i64",
                u
            ))),
            other => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<TomlValue> for f64 {
    type Error = crate::Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        value.as_f64().ok_or_else(|| {
            crate::Error::custom(format!("expected float, found {}", value.type_name()))
        })
    }
}

impl TryFrom<TomlValue> for bool {
    type Error = crate::Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        match value {
            TomlValue::Bool(b) => Ok(b),
            other => Err(crate::Error::custom(format!(
                "expected boolean, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<TomlValue> for String {
    type Error = crate::Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        match value {
            TomlValue::String { content, .. } => Ok(content),
            other => Err(crate::Error::custom(format!(
                "expected string, found {}",
                other.type_name()
            ))),
        }
    }
}

impl From<bool> for TomlValue {
    fn from(value: bool) -> Self {
        TomlValue::Bool(value)
    }
}

macro_rules! from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for TomlValue {
                fn from(value: $ty) -> Self {
                    TomlValue::Integer(value as i64)
                }
            }
        )*
    };
}

from_signed!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for TomlValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => TomlValue::Integer(i),
            Err(_) => TomlValue::UnsignedInteger(value),
        }
    }
}

impl From<f32> for TomlValue {
    fn from(value: f32) -> Self {
        TomlValue::Float(value as f64)
    }
}

impl From<f64> for TomlValue {
    fn from(value: f64) -> Self {
        TomlValue::Float(value)
    }
}

impl From<String> for TomlValue {
    fn from(value: String) -> Self {
        TomlValue::basic_string(value)
    }
}

impl From<&str> for TomlValue {
    fn from(value: &str) -> Self {
        TomlValue::basic_string(value)
    }
}

impl From<TomlDateTime> for TomlValue {
    fn from(value: TomlDateTime) -> Self {
        TomlValue::DateTime(value)
    }
}

impl From<Vec<TomlValue>> for TomlValue {
    fn from(value: Vec<TomlValue>) -> Self {
        TomlValue::Array(value)
    }
}

impl From<TomlMap> for TomlValue {
    fn from(value: TomlMap) -> Self {
        TomlValue::Table(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_floats_gain_fraction() {
        assert_eq!(TomlValue::Float(3.0).to_string(), "3.0");
        assert_eq!(TomlValue::Float(-0.5).to_string(), "-0.5");
        assert_eq!(TomlValue::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(TomlValue::Float(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(TomlValue::Float(f64::NAN).to_string(), "nan");
        assert_eq!(TomlValue::Float(1e16).to_string(), "1.0e16");
        assert_eq!(TomlValue::Float(-3e20).to_string(), "-3.0e20");
        assert_eq!(TomlValue::Float(1.5e17).to_string(), "1.5e17");
    }

    #[test]
    fn test_string_styles() {
        assert_eq!(TomlValue::basic_string("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(TomlValue::literal_string("C:\\dir").to_string(), "'C:\\dir'");
        // a literal string that cannot hold its content falls back to basic
        assert_eq!(TomlValue::literal_string("it's").to_string(), "\"it's\"");

        let multiline = TomlValue::String {
            content: "first line\nsecond line".to_string(),
            literal: false,
            multiline: true,
        };
        assert_eq!(
            multiline.to_string(),
            "\"\"\"\nfirst line\nsecond line\"\"\""
        );

        let continued = TomlValue::String {
            content: "ends with \\\nnext".to_string(),
            literal: true,
            multiline: true,
        };
        assert_eq!(continued.to_string(), "\"\"\"\nends with \\\\\nnext\"\"\"");
    }

    #[test]
    fn test_collections_render_inline() {
        let mut map = TomlMap::new();
        map.insert("x".to_string(), TomlValue::from(1));
        map.insert("a b".to_string(), TomlValue::from(true));
        let value = TomlValue::Array(vec![TomlValue::from(1), TomlValue::Table(map)]);
        assert_eq!(value.to_string(), "[1, { x = 1, \"a b\" = true }]");
    }

    #[test]
    fn test_u64_conversion() {
        assert_eq!(TomlValue::from(5u64), TomlValue::Integer(5));
        assert_eq!(
            TomlValue::from(u64::MAX),
            TomlValue::UnsignedInteger(u64::MAX)
        );
        assert_eq!(TomlValue::UnsignedInteger(u64::MAX).as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(TomlValue::Integer(42)).unwrap(), 42);
        assert!(i64::try_from(TomlValue::UnsignedInteger(u64::MAX)).is_err());
        assert_eq!(f64::try_from(TomlValue::Integer(2)).unwrap(), 2.0);
        assert!(bool::try_from(TomlValue::Integer(1)).is_err());
        assert_eq!(
            String::try_from(TomlValue::literal_string("x")).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_datetime_display() {
        let date = NaiveDate::from_ymd_opt(1979, 5, 27).unwrap();
        assert_eq!(TomlDateTime::LocalDate(date).to_string(), "1979-05-27");

        let time = NaiveTime::from_hms_milli_opt(7, 32, 0, 500).unwrap();
        assert_eq!(TomlDateTime::LocalTime(time).to_string(), "07:32:00.500");

        let offset = DateTime::parse_from_rfc3339("1979-05-27T07:32:00+00:00").unwrap();
        assert_eq!(
            TomlDateTime::OffsetDateTime(offset).to_string(),
            "1979-05-27T07:32:00Z"
        );
    }
}
