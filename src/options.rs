//! Configuration for parsing, decoding and emitting TOML.
//!
//! - [`TomlInputConfig`]: consumed by the parser and by the decoder
//! - [`TomlOutputConfig`]: consumed by the tree writer and the encoder
//! - [`Indentation`]: indentation unit used for nested table bodies
//!
//! Both configs are plain values that are passed by reference into every
//! routine that needs them.
//!
//! ## Examples
//!
//! ```rust
//! use serde_toml_tree::{Indentation, TomlInputConfig, TomlOutputConfig};
//!
//! let input = TomlInputConfig::new().with_ignore_unknown_names(true);
//! assert!(input.allow_null_values);
//!
//! let output = TomlOutputConfig::new().with_indentation(Indentation::TwoSpaces);
//! assert_eq!(output.indentation.as_str(), "  ");
//! ```

/// Indentation unit for nested table bodies.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::Indentation;
///
/// assert_eq!(Indentation::None.as_str(), "");
/// assert_eq!(Indentation::Tab.as_str(), "\t");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Indentation {
    None,
    TwoSpaces,
    #[default]
    FourSpaces,
    Tab,
}

impl Indentation {
    /// Returns the text written once per nesting level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Indentation::None => "",
            Indentation::TwoSpaces => "  ",
            Indentation::FourSpaces => "    ",
            Indentation::Tab => "\t",
        }
    }
}

/// Options recognised while parsing TOML text and decoding the tree.
///
/// The defaults are lenient: null and empty values are accepted, a literal
/// string may embed `\'`, and a table header may be repeated.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::TomlInputConfig;
///
/// let strict = TomlInputConfig::strict();
/// assert!(!strict.allow_null_values);
/// assert!(!strict.allow_duplicate_tables);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TomlInputConfig {
    /// Skip keys the target type does not declare instead of failing
    pub ignore_unknown_names: bool,
    /// Accept `key =` with nothing after the `=` as a null value
    pub allow_empty_values: bool,
    /// Accept `null`, `nil`, `NULL` and `NIL` as null values
    pub allow_null_values: bool,
    /// Accept `\'` inside a literal string as an embedded single quote
    pub allow_escaped_quotes_in_literal_strings: bool,
    /// Accept input that holds no key-value pairs or tables at all
    pub allow_empty_toml: bool,
    /// Merge a repeated `[table]` header into the first declaration
    pub allow_duplicate_tables: bool,
}

impl Default for TomlInputConfig {
    fn default() -> Self {
        TomlInputConfig {
            ignore_unknown_names: false,
            allow_empty_values: true,
            allow_null_values: true,
            allow_escaped_quotes_in_literal_strings: true,
            allow_empty_toml: true,
            allow_duplicate_tables: true,
        }
    }
}

impl TomlInputConfig {
    /// Creates the default, lenient configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration closer to the TOML specification: no null or
    /// empty values, no escapes in literal strings, no repeated tables.
    #[must_use]
    pub fn strict() -> Self {
        TomlInputConfig {
            ignore_unknown_names: false,
            allow_empty_values: false,
            allow_null_values: false,
            allow_escaped_quotes_in_literal_strings: false,
            allow_empty_toml: true,
            allow_duplicate_tables: false,
        }
    }

    #[must_use]
    pub fn with_ignore_unknown_names(mut self, ignore: bool) -> Self {
        self.ignore_unknown_names = ignore;
        self
    }

    #[must_use]
    pub fn with_allow_empty_values(mut self, allow: bool) -> Self {
        self.allow_empty_values = allow;
        self
    }

    #[must_use]
    pub fn with_allow_null_values(mut self, allow: bool) -> Self {
        self.allow_null_values = allow;
        self
    }

    #[must_use]
    pub fn with_allow_escaped_quotes_in_literal_strings(mut self, allow: bool) -> Self {
        self.allow_escaped_quotes_in_literal_strings = allow;
        self
    }

    #[must_use]
    pub fn with_allow_empty_toml(mut self, allow: bool) -> Self {
        self.allow_empty_toml = allow;
        self
    }

    #[must_use]
    pub fn with_allow_duplicate_tables(mut self, allow: bool) -> Self {
        self.allow_duplicate_tables = allow;
        self
    }
}

/// Options for writing a tree back to TOML text.
///
/// # Examples
///
/// ```rust
/// use serde_toml_tree::{Indentation, TomlOutputConfig};
///
/// let options = TomlOutputConfig::new()
///     .with_indentation(Indentation::None)
///     .with_explicit_tables(true);
/// assert!(options.ignore_null_values);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TomlOutputConfig {
    /// Indentation unit applied once per table nesting level
    pub indentation: Indentation,
    /// Leave out key-value pairs whose value is null
    pub ignore_null_values: bool,
    /// Write headers for synthetic tables even when they hold no pairs
    pub explicit_tables: bool,
}

impl Default for TomlOutputConfig {
    fn default() -> Self {
        TomlOutputConfig {
            indentation: Indentation::default(),
            ignore_null_values: true,
            explicit_tables: false,
        }
    }
}

impl TomlOutputConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    #[must_use]
    pub fn with_ignore_null_values(mut self, ignore: bool) -> Self {
        self.ignore_null_values = ignore;
        self
    }

    #[must_use]
    pub fn with_explicit_tables(mut self, explicit: bool) -> Self {
        self.explicit_tables = explicit;
        self
    }
}
