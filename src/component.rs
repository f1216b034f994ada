use crate::{
    error::Error,
    sfv::{ser, BareItem, Item, Parameters},
    Result,
};
use std::fmt;

/// Registered derived component names (RFC 9421, section 2.2).
pub mod derived {
    /// `@authority`: the authority component of the target URI.
    pub const AUTHORITY: &str = "@authority";
    /// `@method`: the HTTP method of the request.
    pub const METHOD: &str = "@method";
    /// `@path`: the path component of the target URI.
    pub const PATH: &str = "@path";
    /// `@query`: the query component of the target URI.
    pub const QUERY: &str = "@query";
    /// `@query-param`: a single named query parameter.
    pub const QUERY_PARAM: &str = "@query-param";
    /// `@request-target`: the full request target.
    pub const REQUEST_TARGET: &str = "@request-target";
    /// `@scheme`: the scheme of the target URI.
    pub const SCHEME: &str = "@scheme";
    /// `@signature-params`: the signature parameters line itself.
    pub const SIGNATURE_PARAMS: &str = "@signature-params";
    /// `@status`: the status code of the response.
    pub const STATUS: &str = "@status";
    /// `@target-uri`: the full target URI of the request.
    pub const TARGET_URI: &str = "@target-uri";

    pub(crate) fn is_registered(name: &str) -> bool {
        matches!(
            name,
            AUTHORITY
                | METHOD
                | PATH
                | QUERY
                | QUERY_PARAM
                | REQUEST_TARGET
                | SCHEME
                | SIGNATURE_PARAMS
                | STATUS
                | TARGET_URI
        )
    }
}

/// Parameters of a component identifier (RFC 9421, section 2.1, and the IANA
/// HTTP Signature Component Parameters registry).
///
/// Insertion order is preserved when serializing, but equality and hashing
/// ignore it, in line with the identifier comparison rules of RFC 9421.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentParameters {
    inner: Parameters,
}

impl ComponentParameters {
    /// `"bs"`: byte sequence wrapping indicator.
    pub const BS: &'static str = "bs";
    /// `"key"`: single member of a dictionary structured field.
    pub const KEY: &'static str = "key";
    /// `"name"`: single named query parameter.
    pub const NAME: &'static str = "name";
    /// `"req"`: component sourced from the related request.
    pub const REQ: &'static str = "req";
    /// `"sf"`: strict structured field serialization.
    pub const SF: &'static str = "sf";
    /// `"tr"`: component sourced from the trailer section.
    pub const TR: &'static str = "tr";

    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `bs` flag is set.
    pub fn bs(&self) -> Result<bool> {
        self.inner.get_flag(Self::BS)
    }

    /// The value of the `key` parameter.
    pub fn key(&self) -> Result<Option<&str>> {
        self.inner.get_str(Self::KEY)
    }

    /// The value of the `name` parameter.
    pub fn name(&self) -> Result<Option<&str>> {
        self.inner.get_str(Self::NAME)
    }

    /// Whether the `req` flag is set.
    pub fn req(&self) -> Result<bool> {
        self.inner.get_flag(Self::REQ)
    }

    /// Whether the `sf` flag is set.
    pub fn sf(&self) -> Result<bool> {
        self.inner.get_flag(Self::SF)
    }

    /// Whether the `tr` flag is set.
    pub fn tr(&self) -> Result<bool> {
        self.inner.get_flag(Self::TR)
    }

    /// Set the `bs` flag.
    #[must_use]
    pub fn with_bs(mut self, bs: bool) -> Self {
        self.inner.insert(Self::BS, bs);
        self
    }

    /// Set the `key` parameter.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.inner.insert(Self::KEY, key.into());
        self
    }

    /// Set the `name` parameter.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.inner.insert(Self::NAME, name.into());
        self
    }

    /// Set the `req` flag.
    #[must_use]
    pub fn with_req(mut self, req: bool) -> Self {
        self.inner.insert(Self::REQ, req);
        self
    }

    /// Set the `sf` flag.
    #[must_use]
    pub fn with_sf(mut self, sf: bool) -> Self {
        self.inner.insert(Self::SF, sf);
        self
    }

    /// Set the `tr` flag.
    #[must_use]
    pub fn with_tr(mut self, tr: bool) -> Self {
        self.inner.insert(Self::TR, tr);
        self
    }

    /// Insert an arbitrary parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<BareItem>) {
        self.inner.insert(key, value);
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BareItem> {
        self.inner.get(key)
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BareItem)> {
        self.inner.iter()
    }

    /// Whether the parameter set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Serialize the parameters into their wire form.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.inner.serialize()
    }

    pub(crate) fn serialize_to(&self, out: &mut String) {
        self.inner.serialize_to(out);
    }
}

impl From<Parameters> for ComponentParameters {
    fn from(inner: Parameters) -> Self {
        Self { inner }
    }
}

/// A component identifier: a component name with its parameters.
///
/// The component name is either a lowercase HTTP field name or a registered
/// derived component name starting with `@`. Two identifiers are equal when
/// their names match and their parameters contain the same entries, in any
/// order; `"foo";bar;baz` and `"foo";baz;bar` compare (and hash) equal even
/// though their serializations differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentIdentifier {
    name: String,
    params: ComponentParameters,
}

impl ComponentIdentifier {
    /// Create an identifier without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ComponentParameters::new(),
        }
    }

    /// Create an identifier with parameters.
    pub fn with_params(name: impl Into<String>, params: ComponentParameters) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// The component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameters of the identifier.
    #[must_use]
    pub fn params(&self) -> &ComponentParameters {
        &self.params
    }

    /// Whether the name refers to a derived component, i.e. starts with `@`.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.name.starts_with('@')
    }

    /// Serialize the identifier: the quoted name followed by its parameters.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    pub(crate) fn serialize_to(&self, out: &mut String) {
        ser::write_string(&self.name, out);
        self.params.serialize_to(out);
    }

    /// Parse and validate an identifier from one element of a covered
    /// components inner list.
    pub(crate) fn parse(label: &str, index: usize, item: &Item) -> Result<Self> {
        let BareItem::String(name) = &item.bare_item else {
            return Err(Error::NotComponentName {
                label: label.to_owned(),
                index,
            });
        };

        let params = ComponentParameters::from(item.params.clone());
        validate(name, &params)?;

        Ok(Self {
            name: name.clone(),
            params,
        })
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Wire-level validation, applied when parsing `Signature-Input`. Typed
/// construction deliberately skips these checks.
fn validate(name: &str, params: &ComponentParameters) -> Result<()> {
    if name.starts_with('@') {
        if !derived::is_registered(name) {
            return Err(Error::UnknownDerivedComponent {
                name: name.to_owned(),
            });
        }

        if name == derived::SIGNATURE_PARAMS {
            return Err(Error::ProhibitedComponent);
        }
    } else if name.chars().any(|ch| ch.is_uppercase()) {
        return Err(Error::UppercaseComponentName {
            name: name.to_owned(),
        });
    }

    if params.bs()? && (params.sf()? || params.key()?.is_some()) {
        return Err(Error::IncompatibleParameters {
            name: name.to_owned(),
        });
    }

    if name == derived::QUERY_PARAM && params.name()?.is_none() {
        return Err(Error::MissingNameParameter);
    }

    Ok(())
}
