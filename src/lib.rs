//!
//! HTTP message signatures library
//!
//! Implements RFC 9421 on top of an RFC 8941 structured field codec: typed
//! models for component identifiers, signature metadata, and the
//! `Signature-Input`/`Signature` fields; a deterministic signature base
//! builder over a pluggable component value context; and a narrow byte-level
//! sign/verify boundary with `ring`-backed reference implementations.
//!

#![forbid(rust_2018_idioms, unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::error::Error as StdError;

pub use crate::error::Error;
pub use crate::{
    base::{SignatureBase, SignatureBaseBuilder, SignatureBaseLine, SignatureParamsLine},
    component::{derived, ComponentIdentifier, ComponentParameters},
    crypto::{HttpSigner, HttpVerifier, RsaSigner},
    field::{SignatureField, SignatureInputField},
    metadata::{SignatureMetadata, SignatureMetadataParameters},
    provider::{ComponentValueProvider, SignatureContext, Status, StructuredDataType},
};
pub use ring;

pub mod sfv;

mod base;
mod component;
mod crypto;
mod error;
mod field;
mod metadata;
mod provider;

type BoxError = Box<dyn StdError + Send + Sync>;
type Result<T, E = Error> = std::result::Result<T, E>;
