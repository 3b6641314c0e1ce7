//! Line classification and multiline aggregation.
//!
//! [`LineClassifier`] walks the physical lines of a document and yields one
//! [`LogicalLine`] per comment, blank line, table header or key-value pair.
//! A key-value pair whose value opens a multiline string (`"""`, `'''`) or an
//! array that is not closed on the same line keeps consuming physical lines
//! until the construct closes; the logical line reports the line where it
//! started.
//!
//! Inside a multiline string every character is content, `#` included.
//! Inside a multiline array each physical line may end in a comment, which is
//! dropped.
//!
//! ```rust
//! use serde_toml_tree::lines::{LineClassifier, LineKind};
//! use serde_toml_tree::TomlInputConfig;
//!
//! let config = TomlInputConfig::new();
//! let text = "# header\n[server]\nports = [\n  80,\n  443,\n]\n";
//! let lines: Vec<_> = LineClassifier::new(text, &config)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(lines.len(), 3);
//! assert_eq!(lines[2].line, 3);
//! assert!(matches!(&lines[2].kind, LineKind::KeyValue { key, .. } if key == "ports"));
//! ```

use crate::options::TomlInputConfig;
use crate::{Error, Result};

/// What a logical line holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// Text after the `#`
    Comment(String),
    TableHeader {
        /// Text between the brackets, untrimmed
        key: String,
        /// `[[...]]` rather than `[...]`
        array: bool,
        inline_comment: Option<String>,
    },
    KeyValue {
        key: String,
        /// Value text, joined across lines and stripped of its comment
        value: String,
        inline_comment: Option<String>,
    },
}

/// One classified unit of input with the 1-based line it starts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalLine {
    pub line: usize,
    pub kind: LineKind,
}

/// Tracks quoting while scanning a line for brackets and comments.
#[derive(Clone, Copy, Debug, Default)]
struct QuoteState {
    quote: Option<char>,
    escaped: bool,
    literal_escapes: bool,
}

impl QuoteState {
    fn new(config: &TomlInputConfig) -> Self {
        QuoteState {
            literal_escapes: config.allow_escaped_quotes_in_literal_strings,
            ..QuoteState::default()
        }
    }

    /// Feeds one character; returns `true` when it is outside any string.
    fn feed(&mut self, ch: char) -> bool {
        match self.quote {
            Some(q) => {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' && (q == '"' || self.literal_escapes) {
                    self.escaped = true;
                } else if ch == q {
                    self.quote = None;
                }
                false
            }
            None if ch == '"' || ch == '\'' => {
                self.quote = Some(ch);
                false
            }
            None => true,
        }
    }
}

/// Splits `s` at the first `#` outside quotes.
fn split_comment<'a>(s: &'a str, config: &TomlInputConfig) -> (&'a str, Option<&'a str>) {
    let mut state = QuoteState::new(config);
    for (i, ch) in s.char_indices() {
        if state.feed(ch) && ch == '#' {
            return (&s[..i], Some(&s[i + 1..]));
        }
    }
    (s, None)
}

/// Where a bracket scan over one physical line stopped.
enum BracketScan {
    /// Depth returned to zero just before this byte index
    Closed(usize),
    /// A comment starts at this byte index
    Comment(usize),
    Open,
}

struct BracketState {
    depth: usize,
    quotes: QuoteState,
}

impl BracketState {
    fn in_string(&self) -> bool {
        self.quotes.quote.is_some()
    }

    fn scan(&mut self, s: &str) -> BracketScan {
        for (i, ch) in s.char_indices() {
            if !self.quotes.feed(ch) {
                continue;
            }
            match ch {
                '[' | '{' => self.depth += 1,
                ']' | '}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return BracketScan::Closed(i + 1);
                    }
                }
                '#' => return BracketScan::Comment(i),
                _ => {}
            }
        }
        BracketScan::Open
    }
}

/// Finds the end of a triple-quote delimiter in `s`, including up to two
/// extra quote characters that belong to the string content.
fn find_closing_delimiter(s: &str, quote: char, basic: bool) -> Option<usize> {
    let bytes = s.as_bytes();
    let q = quote as u8;
    let mut i = 0;
    while i < bytes.len() {
        if basic && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == q {
            let run = bytes[i..].iter().take_while(|b| **b == q).count();
            if run >= 3 {
                return Some(i + run);
            }
            i += run;
            continue;
        }
        i += 1;
    }
    None
}

fn trailing_comment(
    rest: &str,
    line: usize,
    config: &TomlInputConfig,
) -> Result<Option<String>> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(None);
    }
    match split_comment(rest, config) {
        ("", Some(comment)) => Ok(Some(comment.trim_end().to_string())),
        _ => Err(Error::parse(
            line,
            format!("unexpected text '{}' after value", rest),
        )),
    }
}

/// Iterator over the logical lines of a document.
pub struct LineClassifier<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    config: &'a TomlInputConfig,
}

impl<'a> LineClassifier<'a> {
    /// Splits `text` on `\n` and `\r\n`.
    pub fn new(text: &'a str, config: &'a TomlInputConfig) -> Self {
        LineClassifier {
            lines: text.lines().collect(),
            pos: 0,
            config,
        }
    }

    /// Number of physical lines in the input.
    #[must_use]
    pub fn physical_lines(&self) -> usize {
        self.lines.len()
    }

    fn next_physical(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.pos).copied();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    fn classify(&mut self, raw: &'a str, line: usize) -> Result<LineKind> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(LineKind::Blank);
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            return Ok(LineKind::Comment(comment.trim_end().to_string()));
        }
        if trimmed.starts_with('[') {
            return self.table_header(trimmed, line);
        }
        self.key_value(trimmed, line)
    }

    fn table_header(&self, trimmed: &str, line: usize) -> Result<LineKind> {
        let array = trimmed.starts_with("[[");
        let body = if array { &trimmed[2..] } else { &trimmed[1..] };
        let closing = if array { "]]" } else { "]" };

        let mut state = QuoteState::new(self.config);
        let mut end = None;
        for (i, ch) in body.char_indices() {
            if state.feed(ch) && body[i..].starts_with(closing) {
                end = Some(i);
                break;
            }
        }
        let end = end.ok_or_else(|| {
            Error::parse(
                line,
                format!("missing closing '{}' in table header {}", closing, trimmed),
            )
        })?;

        let key = &body[..end];
        if key.trim().is_empty() {
            return Err(Error::parse(line, "table header has an empty name"));
        }

        let rest = body[end + closing.len()..].trim();
        let inline_comment = if rest.is_empty() {
            None
        } else if let Some(comment) = rest.strip_prefix('#') {
            Some(comment.trim_end().to_string())
        } else if rest.starts_with(']') {
            return Err(Error::parse(
                line,
                format!("unexpected ']' after table header {}", trimmed),
            ));
        } else {
            return Err(Error::parse(
                line,
                format!("unexpected text '{}' after table header", rest),
            ));
        };

        Ok(LineKind::TableHeader {
            key: key.to_string(),
            array,
            inline_comment,
        })
    }

    fn key_value(&mut self, trimmed: &'a str, line: usize) -> Result<LineKind> {
        let mut state = QuoteState::new(self.config);
        let eq = trimmed
            .char_indices()
            .find(|&(_, ch)| state.feed(ch) && ch == '=')
            .map(|(i, _)| i)
            .ok_or_else(|| {
                Error::parse(
                    line,
                    format!("missing '=' in key-value pair '{}'", trimmed),
                )
            })?;

        let key = trimmed[..eq].trim_end().to_string();
        let value_part = trimmed[eq + 1..].trim_start();

        let (value, inline_comment) = if value_part.starts_with("\"\"\"") {
            self.multiline_string(value_part, '"', line)?
        } else if value_part.starts_with("'''") {
            self.multiline_string(value_part, '\'', line)?
        } else if value_part.starts_with('[') {
            self.array(value_part, line)?
        } else {
            let (value, comment) = split_comment(value_part, self.config);
            (
                value.trim_end().to_string(),
                comment.map(|c| c.trim_end().to_string()),
            )
        };

        Ok(LineKind::KeyValue {
            key,
            value,
            inline_comment,
        })
    }

    /// Collects a triple-quoted string, continuing over physical lines
    /// verbatim until the closing delimiter.
    fn multiline_string(
        &mut self,
        value_part: &str,
        quote: char,
        line: usize,
    ) -> Result<(String, Option<String>)> {
        let basic = quote == '"';
        if let Some(end) = find_closing_delimiter(&value_part[3..], quote, basic) {
            let end = end + 3;
            let comment = trailing_comment(&value_part[end..], line, self.config)?;
            return Ok((value_part[..end].to_string(), comment));
        }

        let mut value = value_part.to_string();
        loop {
            let raw = self.next_physical().ok_or_else(|| {
                Error::parse(
                    line,
                    format!("unterminated multiline string, expected closing {}", quote.to_string().repeat(3)),
                )
            })?;
            value.push('\n');
            if let Some(end) = find_closing_delimiter(raw, quote, basic) {
                value.push_str(&raw[..end]);
                let comment = trailing_comment(&raw[end..], line, self.config)?;
                return Ok((value, comment));
            }
            value.push_str(raw);
        }
    }

    /// Collects an array, continuing over physical lines until its brackets
    /// balance. Comments on continuation lines are dropped. Lines that start
    /// or end inside a string element are kept verbatim.
    fn array(&mut self, value_part: &str, line: usize) -> Result<(String, Option<String>)> {
        let mut state = BracketState {
            depth: 0,
            quotes: QuoteState::new(self.config),
        };

        let mut value = String::new();
        let mut current = value_part;
        loop {
            match state.scan(current) {
                BracketScan::Closed(end) => {
                    value.push_str(&current[..end]);
                    let comment = trailing_comment(&current[end..], line, self.config)?;
                    return Ok((value, comment));
                }
                BracketScan::Comment(at) => value.push_str(current[..at].trim_end()),
                BracketScan::Open if state.in_string() => value.push_str(current),
                BracketScan::Open => value.push_str(current.trim_end()),
            }

            let raw = self
                .next_physical()
                .ok_or_else(|| Error::parse(line, "unterminated array, expected closing ']'"))?;
            current = if state.in_string() { raw } else { raw.trim() };
            value.push('\n');
        }
    }
}

impl<'a> Iterator for LineClassifier<'a> {
    type Item = Result<LogicalLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.next_physical()?;
        let line = self.pos;
        Some(self.classify(raw, line).map(|kind| LogicalLine { line, kind }))
    }
}
