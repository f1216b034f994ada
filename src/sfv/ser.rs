//! Strict structured field serialization (RFC 8941, section 4.1).

use super::{BareItem, Dictionary, InnerList, Item, List, ListEntry, Parameters};
use std::fmt;

pub(crate) fn write_string(value: &str, out: &mut String) {
    out.push('"');

    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }

    out.push('"');
}

pub(crate) fn write_byte_sequence(value: &[u8], out: &mut String) {
    out.push(':');
    out.push_str(&base64_simd::STANDARD.encode_to_string(value));
    out.push(':');
}

impl BareItem {
    /// Serialize the bare item into its strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the bare item, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        match self {
            Self::Integer(value) => out.push_str(&value.to_string()),
            Self::Decimal(value) => out.push_str(&value.to_string()),
            Self::String(value) => write_string(value, out),
            Self::Token(value) => out.push_str(value.as_str()),
            Self::ByteSequence(value) => write_byte_sequence(value, out),
            Self::Boolean(value) => out.push_str(if *value { "?1" } else { "?0" }),
        }
    }
}

impl Parameters {
    /// Serialize the parameters into their strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the parameters, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        for (key, value) in self.iter() {
            out.push(';');
            out.push_str(key);

            // A boolean true value is omitted, leaving the bare key.
            if matches!(value, BareItem::Boolean(true)) {
                continue;
            }

            out.push('=');
            value.serialize_to(out);
        }
    }
}

impl Item {
    /// Serialize the item into its strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the item, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        self.bare_item.serialize_to(out);
        self.params.serialize_to(out);
    }
}

impl InnerList {
    /// Serialize the inner list into its strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the inner list, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        out.push('(');

        for (index, item) in self.items.iter().enumerate() {
            if index != 0 {
                out.push(' ');
            }
            item.serialize_to(out);
        }

        out.push(')');
        self.params.serialize_to(out);
    }
}

impl ListEntry {
    /// Serialize the member into its strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the member, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        match self {
            Self::Item(item) => item.serialize_to(out),
            Self::InnerList(inner_list) => inner_list.serialize_to(out),
        }
    }
}

impl List {
    /// Serialize the list into its strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the list, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        for (index, entry) in self.0.iter().enumerate() {
            if index != 0 {
                out.push_str(", ");
            }
            entry.serialize_to(out);
        }
    }
}

impl Dictionary {
    /// Serialize the dictionary into its strict wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    /// Serialize the dictionary, appending to `out`.
    pub fn serialize_to(&self, out: &mut String) {
        for (index, (key, entry)) in self.iter().enumerate() {
            if index != 0 {
                out.push_str(", ");
            }

            out.push_str(key);

            // A member whose value is boolean true collapses to the bare
            // key followed by the value's parameters.
            if let ListEntry::Item(item) = entry {
                if matches!(item.bare_item, BareItem::Boolean(true)) {
                    item.params.serialize_to(out);
                    continue;
                }
            }

            out.push('=');
            entry.serialize_to(out);
        }
    }
}

impl fmt::Display for BareItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Display for InnerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
