//! Parsing of the text to the right of `=` into a [`TomlValue`].
//!
//! By the time [`parse_value`] runs, the line classifier has already joined
//! multiline strings and arrays into one piece of text and removed any
//! trailing comment. What is left is dispatched on its first character:
//!
//! - `'` / `'''` literal strings, `"` / `"""` basic strings
//! - `[` arrays, split on commas outside nested brackets and quotes
//! - `{` inline tables, whose dotted keys become nested tables
//! - anything else is tried as an integer, a float and a date-time, in that
//!   order, and kept as a plain string when none of them fits
//!
//! ```rust
//! use serde_toml_tree::literal::parse_value;
//! use serde_toml_tree::{TomlInputConfig, TomlValue};
//!
//! let config = TomlInputConfig::new();
//! assert_eq!(parse_value("1_000", 1, &config).unwrap(), TomlValue::Integer(1000));
//! assert_eq!(parse_value("0xff", 1, &config).unwrap(), TomlValue::Integer(255));
//! assert!(parse_value("[[1, 2], [3]]", 1, &config).unwrap().is_array());
//! ```

use crate::key::parse_key;
use crate::options::TomlInputConfig;
use crate::value::{TomlDateTime, TomlValue};
use crate::{Error, Result, TomlMap};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const NULL_LITERALS: [&str; 4] = ["null", "nil", "NULL", "NIL"];

/// Parses one value literal found on source line `line`.
pub fn parse_value(text: &str, line: usize, config: &TomlInputConfig) -> Result<TomlValue> {
    let text = text.trim();

    if text.is_empty() {
        if !config.allow_empty_values {
            return Err(Error::parse(
                line,
                "missing value after '='; set `allow_empty_values` to accept empty values",
            ));
        }
        return null_value(line, config);
    }
    if NULL_LITERALS.contains(&text) {
        return null_value(line, config);
    }

    match text {
        "true" => return Ok(TomlValue::Bool(true)),
        "false" => return Ok(TomlValue::Bool(false)),
        _ => {}
    }

    if text.starts_with("'''") {
        return parse_multiline_literal(text, line);
    }
    if text.starts_with('\'') {
        return parse_literal_string(text, line, config);
    }
    if text.starts_with("\"\"\"") {
        return parse_multiline_basic(text, line);
    }
    if text.starts_with('"') {
        return parse_basic_string(text, line);
    }
    if text.starts_with('[') {
        return parse_array(text, line, config);
    }
    if text.starts_with('{') {
        return parse_inline_table(text, line, config);
    }

    if let Some(value) = parse_integer(text) {
        return Ok(value);
    }
    if let Some(f) = parse_float(text) {
        return Ok(TomlValue::Float(f));
    }
    if let Some(dt) = parse_datetime(text) {
        return Ok(TomlValue::DateTime(dt));
    }

    Ok(TomlValue::basic_string(text))
}

fn null_value(line: usize, config: &TomlInputConfig) -> Result<TomlValue> {
    if config.allow_null_values {
        Ok(TomlValue::Null)
    } else {
        Err(Error::parse(
            line,
            "null values are not allowed; set `allow_null_values` to accept them",
        ))
    }
}

/// Expands the escape sequences of a basic string body.
///
/// A backslash at the end of a line swallows the newline and every space,
/// tab and newline after it.
pub(crate) fn unescape_basic(s: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = match chars.next() {
            Some(c) => c,
            None => {
                return Err(Error::parse(line, "string ends with an unfinished escape"));
            }
        };
        match escaped {
            't' => out.push('\t'),
            'b' => out.push('\u{0008}'),
            'r' => out.push('\r'),
            'n' => out.push('\n'),
            'f' => out.push('\u{000C}'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'u' => out.push(unicode_escape(&mut chars, 4, line)?),
            'U' => out.push(unicode_escape(&mut chars, 8, line)?),
            ' ' | '\t' | '\n' => {
                let mut saw_newline = escaped == '\n';
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        saw_newline = true;
                    } else if next != ' ' && next != '\t' {
                        break;
                    }
                    chars.next();
                }
                if !saw_newline {
                    return Err(Error::parse(
                        line,
                        "invalid escape sequence '\\ ' in basic string",
                    ));
                }
            }
            other => {
                return Err(Error::parse(
                    line,
                    format!("invalid escape sequence '\\{}' in basic string", other),
                ));
            }
        }
    }
    Ok(out)
}

fn unicode_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    len: usize,
    line: usize,
) -> Result<char> {
    let hex: String = chars.by_ref().take(len).collect();
    if hex.len() != len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::parse(
            line,
            format!("invalid unicode escape '{}': expected {} hex digits", hex, len),
        ));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            Error::parse(
                line,
                format!("unicode escape '{}' is not a valid scalar value", hex),
            )
        })
}

fn parse_basic_string(text: &str, line: usize) -> Result<TomlValue> {
    if text.len() < 2 || !text.ends_with('"') || ends_with_escaped_quote(text) {
        return Err(Error::parse(
            line,
            format!("unterminated basic string {}", text),
        ));
    }
    let inner = &text[1..text.len() - 1];

    let mut escaped = false;
    for ch in inner.chars() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Err(Error::parse(
                line,
                format!("unescaped '\"' inside basic string {}", text),
            ));
        }
    }

    Ok(TomlValue::basic_string(unescape_basic(inner, line)?))
}

/// `"abc\"` ends with a quote that belongs to the string body.
fn ends_with_escaped_quote(text: &str) -> bool {
    let body = &text[1..text.len() - 1];
    let backslashes = body.chars().rev().take_while(|c| *c == '\\').count();
    backslashes % 2 == 1
}

fn parse_literal_string(
    text: &str,
    line: usize,
    config: &TomlInputConfig,
) -> Result<TomlValue> {
    if text.len() < 2 || !text.ends_with('\'') {
        return Err(Error::parse(
            line,
            format!("unterminated literal string {}", text),
        ));
    }
    let inner = &text[1..text.len() - 1];

    let mut content = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if config.allow_escaped_quotes_in_literal_strings && chars.peek() == Some(&'\'') => {
                chars.next();
                content.push('\'');
            }
            '\'' => {
                let hint = if config.allow_escaped_quotes_in_literal_strings {
                    "; write it as \\'"
                } else {
                    ""
                };
                return Err(Error::parse(
                    line,
                    format!("unexpected ''' inside literal string {}{}", text, hint),
                ));
            }
            c => content.push(c),
        }
    }

    Ok(TomlValue::literal_string(content))
}

/// Strips the delimiters of a multiline string, keeping up to two extra
/// quote characters in front of the closing delimiter as content.
fn multiline_body<'a>(text: &'a str, delim: &str, line: usize) -> Result<&'a str> {
    if text.len() < 6 || !text.ends_with(delim) {
        return Err(Error::parse(
            line,
            format!("unterminated multiline string, expected closing {}", delim),
        ));
    }
    let body = &text[3..text.len() - 3];
    let body = body.strip_prefix('\n').unwrap_or(body);
    Ok(body)
}

fn longest_quote_run(body: &str, quote: char, basic: bool) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut escaped = false;
    for ch in body.chars() {
        if escaped {
            escaped = false;
            run = 0;
            continue;
        }
        if basic && ch == '\\' {
            escaped = true;
            run = 0;
        } else if ch == quote {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

fn parse_multiline_basic(text: &str, line: usize) -> Result<TomlValue> {
    let body = multiline_body(text, "\"\"\"", line)?;
    if longest_quote_run(body, '"', true) >= 3 {
        return Err(Error::parse(
            line,
            "unexpected '\"\"\"' inside multiline basic string",
        ));
    }
    Ok(TomlValue::String {
        content: unescape_basic(body, line)?,
        literal: false,
        multiline: true,
    })
}

fn parse_multiline_literal(text: &str, line: usize) -> Result<TomlValue> {
    let body = multiline_body(text, "'''", line)?;
    if longest_quote_run(body, '\'', false) >= 3 {
        return Err(Error::parse(
            line,
            "unexpected ''''' inside multiline literal string",
        ));
    }
    Ok(TomlValue::String {
        content: join_continued_lines(body),
        literal: true,
        multiline: true,
    })
}

/// Removes each line-ending backslash together with the newline and the
/// whitespace that follow it. No other escapes are processed.
fn join_continued_lines(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(pos) = rest.find('\\') {
        let after = &rest[pos + 1..];
        let blank = after.trim_start_matches(&[' ', '\t'][..]);
        if blank.starts_with('\n') {
            out.push_str(&rest[..pos]);
            rest = blank.trim_start_matches(&[' ', '\t', '\n'][..]);
        } else {
            out.push_str(&rest[..=pos]);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Splits the body of an array or inline table on top-level commas.
///
/// Commas inside nested `[]`/`{}` or inside quoted strings do not split.
/// A single trailing comma is dropped; any other empty element is an error.
pub(crate) fn split_elements<'a>(
    inner: &'a str,
    line: usize,
    config: &TomlInputConfig,
) -> Result<Vec<&'a str>> {
    let mut elements = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in inner.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\'
                && (q == '"' || config.allow_escaped_quotes_in_literal_strings)
            {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::parse(line, format!("unbalanced '{}' in value", ch)));
                }
            }
            ',' if depth == 0 => {
                elements.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(Error::parse(line, "unterminated string inside collection"));
    }
    if depth != 0 {
        return Err(Error::parse(line, "unbalanced brackets in value"));
    }

    let last = inner[start..].trim();
    if !last.is_empty() {
        elements.push(last);
    } else if elements.is_empty() {
        return Ok(elements);
    }

    if elements.iter().any(|e| e.is_empty()) {
        return Err(Error::parse(line, "empty element between commas"));
    }
    Ok(elements)
}

fn parse_array(text: &str, line: usize, config: &TomlInputConfig) -> Result<TomlValue> {
    if !text.ends_with(']') {
        return Err(Error::parse(
            line,
            format!("missing closing ']' in array {}", text),
        ));
    }
    let inner = &text[1..text.len() - 1];
    let elements = split_elements(inner, line, config)?
        .into_iter()
        .map(|element| parse_value(element, line, config))
        .collect::<Result<Vec<_>>>()?;
    Ok(TomlValue::Array(elements))
}

/// Returns the byte index of the first `target` outside quotes.
pub(crate) fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q == '"' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        } else if ch == target {
            return Some(i);
        }
    }
    None
}

fn parse_inline_table(text: &str, line: usize, config: &TomlInputConfig) -> Result<TomlValue> {
    if !text.ends_with('}') {
        return Err(Error::parse(
            line,
            format!("missing closing '}}' in inline table {}", text),
        ));
    }
    let inner = &text[1..text.len() - 1];

    let mut table = TomlMap::new();
    for entry in split_elements(inner, line, config)? {
        let eq = find_unquoted(entry, '=').ok_or_else(|| {
            Error::parse(line, format!("missing '=' in inline table entry '{}'", entry))
        })?;
        let key = parse_key(&entry[..eq], line)?;
        let value = parse_value(&entry[eq + 1..], line, config)?;

        let mut target = &mut table;
        let segments = key.parts();
        for segment in &segments[..segments.len() - 1] {
            let slot = target
                .entry(segment.content().to_string())
                .or_insert_with(|| TomlValue::Table(TomlMap::new()));
            target = match slot {
                TomlValue::Table(map) => map,
                other => {
                    return Err(Error::parse(
                        line,
                        format!(
                            "key '{}' in inline table is already a {}, not a table",
                            segment.content(),
                            other.type_name()
                        ),
                    ));
                }
            };
        }
        if target.contains_key(key.content()) {
            return Err(Error::parse(
                line,
                format!("duplicate key '{}' in inline table", key.raw()),
            ));
        }
        target.insert(key.content().to_string(), value);
    }

    Ok(TomlValue::Table(table))
}

fn valid_underscores(digits: &str, is_digit: impl Fn(char) -> bool) -> bool {
    let chars: Vec<char> = digits.chars().collect();
    if chars.is_empty() {
        return false;
    }
    chars.iter().enumerate().all(|(i, &c)| {
        if c == '_' {
            i > 0 && i + 1 < chars.len() && is_digit(chars[i - 1]) && is_digit(chars[i + 1])
        } else {
            is_digit(c)
        }
    })
}

/// `None` when `text` is not integer-shaped or does not fit in 64 bits; the
/// range check for the target type belongs to the decoder.
fn parse_integer(text: &str) -> Option<TomlValue> {
    let (negative, unsigned) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let signed = unsigned.len() != text.len();

    let radix = match unsigned.get(..2) {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => 10,
    };

    if radix != 10 {
        let digits = &unsigned[2..];
        if signed || !valid_underscores(digits, |c| c.is_digit(radix)) {
            return None;
        }
        let cleaned = digits.replace('_', "");
        return u64::from_str_radix(&cleaned, radix)
            .ok()
            .map(TomlValue::from);
    }

    if !valid_underscores(unsigned, |c| c.is_ascii_digit()) {
        return None;
    }
    let cleaned = unsigned.replace('_', "");
    if cleaned.len() > 1 && cleaned.starts_with('0') {
        return None;
    }

    let with_sign = if negative {
        format!("-{}", cleaned)
    } else {
        cleaned.clone()
    };
    if let Ok(i) = with_sign.parse::<i64>() {
        return Some(TomlValue::Integer(i));
    }
    if negative {
        return None;
    }
    cleaned.parse::<u64>().ok().map(TomlValue::UnsignedInteger)
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "inf" | "+inf" => return Some(f64::INFINITY),
        "-inf" => return Some(f64::NEG_INFINITY),
        "nan" | "+nan" | "-nan" => return Some(f64::NAN),
        _ => {}
    }

    let unsigned = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(|c| c == 'e' || c == 'E') {
        Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], Some(&mantissa[pos + 1..])),
        None => (mantissa, None),
    };
    if frac_part.is_none() && exponent.is_none() {
        return None;
    }

    let is_digit = |c: char| c.is_ascii_digit();
    if !valid_underscores(int_part, is_digit) {
        return None;
    }
    let int_clean = int_part.replace('_', "");
    if int_clean.len() > 1 && int_clean.starts_with('0') {
        return None;
    }
    if let Some(frac) = frac_part {
        if !valid_underscores(frac, is_digit) {
            return None;
        }
    }
    if let Some(exp) = exponent {
        let exp_digits = exp.strip_prefix(&['+', '-'][..]).unwrap_or(exp);
        if !valid_underscores(exp_digits, is_digit) {
            return None;
        }
    }

    text.replace('_', "").parse::<f64>().ok()
}

fn has_date_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10 && b[4] == b'-' && b[7] == b'-'
}

fn has_time_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 8 && b[2] == b':' && b[5] == b':'
}

/// Tries offset date-time, local date-time, local date and local time.
///
/// A single space between the date and the time is accepted in place of `T`.
pub(crate) fn parse_datetime(text: &str) -> Option<TomlDateTime> {
    if has_date_shape(text) {
        let normalized = if text.as_bytes().get(10) == Some(&b' ') {
            format!("{}T{}", &text[..10], &text[11..])
        } else {
            text.to_string()
        };

        return DateTime::parse_from_rfc3339(&normalized)
            .ok()
            .map(TomlDateTime::OffsetDateTime)
            .or_else(|| {
                NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(TomlDateTime::LocalDateTime)
            })
            .or_else(|| {
                (normalized.len() == 10)
                    .then(|| NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok())
                    .flatten()
                    .map(TomlDateTime::LocalDate)
            });
    }

    if has_time_shape(text) {
        return NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .ok()
            .map(TomlDateTime::LocalTime);
    }
    None
}
