#![allow(missing_docs)]

use crate::{sfv::ParseError, BoxError};
use ring::error::Unspecified;
use std::time::SystemTimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("decimal value '{0}' is outside the range representable by RFC 8941")]
    DecimalOutOfRange(i64),

    #[error("the value of the derived component '{identifier}' is not available")]
    DerivedValueUnavailable { identifier: String },

    #[error("the dictionary member '{key}' of the '{field}' HTTP field is covered by the signature, but no such member exists")]
    DictionaryMemberMissing { field: String, key: String },

    #[error("duplicate component identifier '{identifier}' in the covered components")]
    DuplicateComponent { identifier: String },

    #[error("the '{field}' HTTP field is covered by the signature, but it is missing")]
    FieldMissing { field: String },

    #[error("the component identifier '{name}' combines the 'bs' flag with 'sf' or 'key', which is prohibited")]
    IncompatibleParameters { name: String },

    #[error("'{0}' is not a valid three-digit HTTP status code")]
    InvalidStatusCode(u16),

    #[error("'{0}' does not conform to the sf-token format of RFC 8941, section 3.3.4")]
    InvalidToken(String),

    #[error("the value of the '{field}' HTTP field could not be parsed as {expected}")]
    MalformedField {
        field: String,
        expected: &'static str,
    },

    #[error("the '@query-param' component identifier is missing the 'name' parameter")]
    MissingNameParameter,

    #[error("the value of the member labeled '{label}' is not a byte sequence")]
    NotByteSequence { label: String },

    #[error("the element at index {index} of the signature metadata labeled '{label}' is not a string item")]
    NotComponentName { label: String, index: usize },

    #[error("the value of the member labeled '{label}' is not an inner list")]
    NotInnerList { label: String },

    #[error("the value of the '{field}' HTTP field is not valid UTF-8; cover it with the 'bs' flag instead")]
    OpaqueFieldValue { field: String },

    #[error("the value of the '{key}' parameter is not {expected}")]
    ParameterType {
        key: String,
        expected: &'static str,
    },

    #[error("'@signature-params' must not appear in the covered components")]
    ProhibitedComponent,

    #[error(transparent)]
    RingUnspecified(#[from] Unspecified),

    #[error(transparent)]
    Signature(BoxError),

    #[error(transparent)]
    StructuredField(#[from] ParseError),

    #[error(transparent)]
    SystemTime(#[from] SystemTimeError),

    #[error("the value of the '{key}' parameter, {value}, is outside the valid range for seconds since the Unix epoch")]
    TimestampRange { key: String, value: i64 },

    #[error("the structured data type of the '{field}' HTTP field is unknown")]
    UnknownDataType { field: String },

    #[error("the component name '{name}' starts with '@', but it is not a registered derived component name")]
    UnknownDerivedComponent { name: String },

    #[error("the component name '{name}' contains one or more uppercase characters")]
    UppercaseComponentName { name: String },
}
