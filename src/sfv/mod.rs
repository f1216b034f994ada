//! Structured field values as defined by RFC 8941.
//!
//! Covers the three top-level shapes (lists, dictionaries, items) plus bare
//! items and parameters, with strict parsing and strict serialization. The
//! signature machinery is built entirely on top of this module: component
//! names are `sf-string`s, `Signature-Input` is a dictionary of inner lists,
//! and `Signature` is a dictionary of byte sequences.

use crate::{error::Error, Result};
use indexmap::IndexMap;
use std::{
    fmt,
    hash::{Hash, Hasher},
};

pub use self::parse::{ParseError, Parser};

mod parse;
pub(crate) mod ser;

/// A bare item (RFC 8941, section 3.3).
///
/// Integers must stay within ±999,999,999,999,999 and strings must consist
/// of printable ASCII to serialize into valid field values; values obtained
/// from [`Parser`] always satisfy both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BareItem {
    /// `sf-integer`
    Integer(i64),
    /// `sf-decimal`
    Decimal(Decimal),
    /// `sf-string`
    String(String),
    /// `sf-token`
    Token(Token),
    /// `sf-binary`
    ByteSequence(Vec<u8>),
    /// `sf-boolean`
    Boolean(bool),
}

impl BareItem {
    /// Human-readable name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(..) => "an integer",
            Self::Decimal(..) => "a decimal",
            Self::String(..) => "a string",
            Self::Token(..) => "a token",
            Self::ByteSequence(..) => "a byte sequence",
            Self::Boolean(..) => "a boolean",
        }
    }
}

impl From<i64> for BareItem {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for BareItem {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<String> for BareItem {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for BareItem {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Token> for BareItem {
    fn from(value: Token) -> Self {
        Self::Token(value)
    }
}

impl From<Vec<u8>> for BareItem {
    fn from(value: Vec<u8>) -> Self {
        Self::ByteSequence(value)
    }
}

impl From<bool> for BareItem {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A fixed-point decimal (RFC 8941, section 3.3.2), stored in thousandths.
///
/// The integer component is limited to twelve digits, the fractional
/// component to three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decimal(i64);

impl Decimal {
    const MAX_THOUSANDTHS: u64 = 999_999_999_999_999;

    /// Create a decimal from a value expressed in thousandths.
    pub fn from_thousandths(thousandths: i64) -> Result<Self> {
        if thousandths.unsigned_abs() > Self::MAX_THOUSANDTHS {
            return Err(Error::DecimalOutOfRange(thousandths));
        }

        Ok(Self(thousandths))
    }

    /// The value in thousandths.
    #[must_use]
    pub fn as_thousandths(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let (integral, fractional) = (magnitude / 1000, magnitude % 1000);

        let mut fraction = format!("{fractional:03}");
        while fraction.len() > 1 && fraction.ends_with('0') {
            fraction.pop();
        }

        if self.0 < 0 {
            write!(f, "-")?;
        }

        write!(f, "{integral}.{fraction}")
    }
}

/// An `sf-token` (RFC 8941, section 3.3.4).
///
/// Modeled distinctly from strings: tokens serialize as their bare
/// characters, while strings serialize quoted and escaped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Create a token, validating it against the `sf-token` grammar.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();

        let mut chars = token.chars();
        let valid = chars
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '*')
            && chars.all(is_token_char);

        if valid {
            Ok(Self(token))
        } else {
            Err(Error::InvalidToken(token))
        }
    }

    pub(crate) fn from_validated(token: String) -> Self {
        Self(token)
    }

    /// The token characters.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_token_char(ch: char) -> bool {
    // tchar / ":" / "/"
    matches!(
        ch,
        '!' | '#'
            | '$'
            | '%'
            | '&'
            | '\''
            | '*'
            | '+'
            | '-'
            | '.'
            | '^'
            | '_'
            | '`'
            | '|'
            | '~'
            | ':'
            | '/'
    ) || ch.is_ascii_alphanumeric()
}

/// Parameters attached to an item, inner list, or dictionary member
/// (RFC 8941, section 3.1.2).
///
/// Insertion order is preserved for serialization. Equality is
/// order-insensitive, and so is the `Hash` implementation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameters {
    inner: IndexMap<String, BareItem>,
}

impl Parameters {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, replacing (in place) any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<BareItem>) -> Option<BareItem> {
        self.inner.insert(key.into(), value.into())
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BareItem> {
        self.inner.get(key)
    }

    /// Remove a parameter, shifting the ones after it down.
    pub fn remove(&mut self, key: &str) -> Option<BareItem> {
        self.inner.shift_remove(key)
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BareItem)> {
        self.inner.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the parameter set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Typed accessor for a string-valued parameter.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(BareItem::String(value)) => Ok(Some(value)),
            Some(..) => Err(Error::ParameterType {
                key: key.to_owned(),
                expected: "a string",
            }),
        }
    }

    /// Typed accessor for an integer-valued parameter.
    pub fn get_integer(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(BareItem::Integer(value)) => Ok(Some(*value)),
            Some(..) => Err(Error::ParameterType {
                key: key.to_owned(),
                expected: "an integer",
            }),
        }
    }

    /// Typed accessor for a boolean flag. An absent parameter reads as false.
    pub fn get_flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(BareItem::Boolean(value)) => Ok(*value),
            Some(..) => Err(Error::ParameterType {
                key: key.to_owned(),
                expected: "a boolean",
            }),
        }
    }
}

impl Hash for Parameters {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equality ignores insertion order, so the hash has to as well.
        let mut keys: Vec<_> = self.inner.keys().collect();
        keys.sort_unstable();

        for key in keys {
            key.hash(state);
            self.inner[key.as_str()].hash(state);
        }
    }
}

/// An item with its parameters (RFC 8941, section 3.3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// The bare item.
    pub bare_item: BareItem,
    /// Parameters attached to the item.
    pub params: Parameters,
}

impl Item {
    /// Create an item without parameters.
    pub fn new(bare_item: impl Into<BareItem>) -> Self {
        Self {
            bare_item: bare_item.into(),
            params: Parameters::new(),
        }
    }

    /// Attach parameters to the item.
    #[must_use]
    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }
}

/// An inner list with its parameters (RFC 8941, section 3.1.1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InnerList {
    /// The items of the inner list.
    pub items: Vec<Item>,
    /// Parameters attached to the inner list as a whole.
    pub params: Parameters,
}

/// A member of a list or dictionary: either an item or an inner list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEntry {
    /// A single item.
    Item(Item),
    /// An inner list.
    InnerList(InnerList),
}

/// A top-level list (RFC 8941, section 3.1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct List(
    /// The members of the list.
    pub Vec<ListEntry>,
);

/// A top-level dictionary (RFC 8941, section 3.2).
///
/// Member keys are unique; inserting a duplicate key overwrites the previous
/// value while keeping its position, matching the parsing rules of RFC 8941.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    inner: IndexMap<String, ListEntry>,
}

impl Dictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, replacing (in place) any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: ListEntry) -> Option<ListEntry> {
        self.inner.insert(key.into(), value)
    }

    /// Look up a member value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ListEntry> {
        self.inner.get(key)
    }

    /// Iterate over the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ListEntry)> {
        self.inner.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the dictionary has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
