use crate::{
    error::Error,
    metadata::SignatureMetadata,
    sfv::{ser, BareItem, ListEntry, Parser},
    Result,
};
use indexmap::IndexMap;
use std::fmt;

/// The `Signature-Input` HTTP field (RFC 9421, section 4.1): an
/// insertion-ordered mapping from signature label to signature metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureInputField {
    members: IndexMap<String, SignatureMetadata>,
}

impl SignatureInputField {
    /// Create an empty field value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the value of a `Signature-Input` HTTP field.
    ///
    /// Every member must be an inner list whose elements are string items;
    /// each element is validated as a component identifier.
    pub fn parse(field_value: &str) -> Result<Self> {
        let dictionary = Parser::parse_dictionary(field_value)?;
        let mut members = IndexMap::new();

        for (label, entry) in dictionary.iter() {
            let ListEntry::InnerList(inner_list) = entry else {
                return Err(Error::NotInnerList {
                    label: label.to_owned(),
                });
            };

            let metadata = SignatureMetadata::parse(label, inner_list)?;
            members.insert(label.to_owned(), metadata);
        }

        Ok(Self { members })
    }

    /// Add a member, replacing (in place) any metadata under the same label.
    ///
    /// The label must be a valid structured field key for the serialized
    /// form to be a valid field value.
    pub fn insert(
        &mut self,
        label: impl Into<String>,
        metadata: SignatureMetadata,
    ) -> Option<SignatureMetadata> {
        self.members.insert(label.into(), metadata)
    }

    /// The metadata stored under the given label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SignatureMetadata> {
        self.members.get(label)
    }

    /// Iterate over the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignatureMetadata)> {
        self.members
            .iter()
            .map(|(label, metadata)| (label.as_str(), metadata))
    }

    /// Iterate over the labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the field value has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Serialize the field value.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        for (index, (label, metadata)) in self.members.iter().enumerate() {
            if index != 0 {
                out.push_str(", ");
            }

            out.push_str(label);
            out.push('=');
            metadata.serialize_to(&mut out);
        }

        out
    }
}

impl fmt::Display for SignatureInputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// The `Signature` HTTP field (RFC 9421, section 4.2): an insertion-ordered
/// mapping from signature label to raw signature bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureField {
    members: IndexMap<String, Vec<u8>>,
}

impl SignatureField {
    /// Create an empty field value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the value of a `Signature` HTTP field.
    ///
    /// Every member value must be a byte sequence item.
    pub fn parse(field_value: &str) -> Result<Self> {
        let dictionary = Parser::parse_dictionary(field_value)?;
        let mut members = IndexMap::new();

        for (label, entry) in dictionary.iter() {
            let ListEntry::Item(item) = entry else {
                return Err(Error::NotByteSequence {
                    label: label.to_owned(),
                });
            };
            let BareItem::ByteSequence(signature) = &item.bare_item else {
                return Err(Error::NotByteSequence {
                    label: label.to_owned(),
                });
            };

            members.insert(label.to_owned(), signature.clone());
        }

        Ok(Self { members })
    }

    /// Add a member, replacing (in place) any signature under the same label.
    pub fn insert(&mut self, label: impl Into<String>, signature: Vec<u8>) -> Option<Vec<u8>> {
        self.members.insert(label.into(), signature)
    }

    /// The signature bytes stored under the given label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&[u8]> {
        self.members.get(label).map(Vec::as_slice)
    }

    /// Iterate over the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.members
            .iter()
            .map(|(label, signature)| (label.as_str(), signature.as_slice()))
    }

    /// Iterate over the labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the field value has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Serialize the field value, emitting each signature as `:base64:`.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        for (index, (label, signature)) in self.members.iter().enumerate() {
            if index != 0 {
                out.push_str(", ");
            }

            out.push_str(label);
            out.push('=');
            ser::write_byte_sequence(signature, &mut out);
        }

        out
    }
}

impl fmt::Display for SignatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
