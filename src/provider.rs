use crate::{
    component::{derived, ComponentIdentifier},
    error::Error,
    metadata::SignatureMetadata,
    sfv::{ser, Parser},
    Result,
};
use http::{uri::Uri, HeaderMap, StatusCode};
use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::{collections::HashMap, fmt};
use typed_builder::TypedBuilder;

/// The structured data type of an HTTP field (RFC 8941, section 3),
/// consulted when resolving components carrying the `sf` flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuredDataType {
    /// A list (RFC 8941, section 3.1).
    List,
    /// A dictionary (RFC 8941, section 3.2).
    Dictionary,
    /// An item (RFC 8941, section 3.3).
    Item,
}

impl StructuredDataType {
    /// Look up the data type of an IANA-registered structured field.
    ///
    /// Returns `None` for fields the registry does not classify.
    #[must_use]
    pub fn by_field_name(field_name: &str) -> Option<Self> {
        let data_type = match field_name.to_lowercase().as_str() {
            "accept-ch" | "cache-status" | "client-cert-chain" | "proxy-status" => Self::List,

            "cdn-cache-control" | "content-digest" | "priority" | "repr-digest" | "signature"
            | "signature-input" | "want-content-digest" | "want-repr-digest" => Self::Dictionary,

            "client-cert"
            | "cross-origin-embedder-policy"
            | "cross-origin-embedder-policy-report-only"
            | "cross-origin-opener-policy"
            | "cross-origin-opener-policy-report-only"
            | "origin-agent-cluster" => Self::Item,

            // Fields RFC 8941 uses in its examples.
            "example-list" => Self::List,
            "example-dict" => Self::Dictionary,
            "example-boolean" | "example-bytesequence" | "example-decimal" | "example-integer"
            | "example-string" | "example-token" => Self::Item,

            _ => return None,
        };

        Some(data_type)
    }

    fn expected(self) -> &'static str {
        match self {
            Self::List => "a list",
            Self::Dictionary => "a dictionary",
            Self::Item => "an item",
        }
    }
}

/// A three-digit HTTP status code, the value of the `@status` component.
///
/// Accepts 100 through 999; `http::StatusCode` converts infallibly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(u16);

impl Status {
    /// The numeric status code.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Status {
    type Error = Error;

    fn try_from(status: u16) -> Result<Self> {
        if (100..=999).contains(&status) {
            Ok(Self(status))
        } else {
            Err(Error::InvalidStatusCode(status))
        }
    }
}

impl From<StatusCode> for Status {
    fn from(status: StatusCode) -> Self {
        Self(status.as_u16())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The data source component values are drawn from during signature base
/// construction (RFC 9421, section 1.1, "signature context").
pub trait SignatureContext {
    /// Resolve the value of one covered component.
    ///
    /// Returns `Ok(None)` when the value is unavailable; the builder turns
    /// that into an empty base line for HTTP fields and into an error for
    /// derived components.
    fn component_value(
        &self,
        metadata: &SignatureMetadata,
        identifier: &ComponentIdentifier,
    ) -> Result<Option<String>>;
}

// URLEncoder-style encode set: everything except ALPHA / DIGIT / "." / "-" /
// "*" / "_" is percent-encoded, with space always emitted as %20.
const QUERY_PARAM_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// Component value provider: resolves both derived components (from the
/// request line, target URI, and status) and HTTP field components (from
/// up to four field pools selected by the `req` and `tr` flags).
///
/// All configuration happens up front through the builder (or the
/// [`from_request`](Self::from_request) / [`from_response`](Self::from_response)
/// conveniences); resolution itself never mutates the provider, so one
/// instance can serve concurrent signing threads.
#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct ComponentValueProvider {
    /// HTTP method of the request, as given.
    #[builder(default, setter(strip_option, into))]
    method: Option<String>,

    /// Target URI of the request.
    #[builder(default, setter(strip_option))]
    target_uri: Option<Uri>,

    /// Caller-supplied `@request-target` value; never derived from the URI.
    #[builder(default, setter(strip_option, into))]
    request_target: Option<String>,

    /// Status code of the response.
    #[builder(default, setter(strip_option, into))]
    status: Option<Status>,

    /// Header fields of the target message.
    #[builder(default, setter(strip_option))]
    headers: Option<HeaderMap>,

    /// Trailer fields of the target message.
    #[builder(default, setter(strip_option))]
    trailers: Option<HeaderMap>,

    /// Header fields of the related request, consulted under `req`.
    #[builder(default, setter(strip_option))]
    request_headers: Option<HeaderMap>,

    /// Trailer fields of the related request, consulted under `req` + `tr`.
    #[builder(default, setter(strip_option))]
    request_trailers: Option<HeaderMap>,

    /// Additional field name to structured data type mappings, consulted
    /// before the IANA registry when processing the `sf` flag.
    #[builder(default)]
    data_types: HashMap<String, StructuredDataType>,
}

impl ComponentValueProvider {
    /// Provider over a request: method, target URI, and header fields.
    #[must_use]
    pub fn from_request(parts: &http::request::Parts) -> Self {
        Self::builder()
            .method(parts.method.as_str())
            .target_uri(parts.uri.clone())
            .headers(parts.headers.clone())
            .build()
    }

    /// Provider over a response: status and header fields.
    ///
    /// Request-bound components (`req`, and the URI-derived components)
    /// come from the request the response answers; attach them through the
    /// builder when covering such components.
    #[must_use]
    pub fn from_response(parts: &http::response::Parts) -> Self {
        Self::builder()
            .status(parts.status)
            .headers(parts.headers.clone())
            .build()
    }

    /// Register a field name to structured data type mapping, consulted
    /// before the IANA registry when processing the `sf` flag.
    pub fn set_data_type(&mut self, field_name: &str, data_type: StructuredDataType) {
        self.data_types
            .insert(field_name.to_lowercase(), data_type);
    }

    /// The HTTP method, the value of `@method`.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The target URI, the source of `@target-uri` and its derivations.
    #[must_use]
    pub fn target_uri(&self) -> Option<&Uri> {
        self.target_uri.as_ref()
    }

    /// The value of `@authority`: userinfo as given, lowercase host, and
    /// the port unless it is the default for the scheme.
    #[must_use]
    pub fn authority(&self) -> Option<String> {
        let uri = self.target_uri.as_ref()?;
        let authority = uri.authority()?;

        let userinfo = authority
            .as_str()
            .rsplit_once('@')
            .map(|(userinfo, _)| userinfo);
        let host = authority.host().to_lowercase();

        let port = authority.port_u16().filter(|&port| {
            !matches!(
                (uri.scheme_str(), port),
                (Some("http"), 80) | (Some("https"), 443)
            )
        });

        let mut value = String::new();
        if let Some(userinfo) = userinfo {
            value.push_str(userinfo);
            value.push('@');
        }
        value.push_str(&host);
        if let Some(port) = port {
            value.push(':');
            value.push_str(&port.to_string());
        }

        Some(value)
    }

    /// The value of `@scheme`, normalized to lowercase.
    #[must_use]
    pub fn scheme(&self) -> Option<String> {
        let scheme = self.target_uri.as_ref()?.scheme_str()?;
        Some(scheme.to_lowercase())
    }

    /// The value of `@path`; an empty path is normalized to `/`.
    #[must_use]
    pub fn path(&self) -> Option<String> {
        let uri = self.target_uri.as_ref()?;

        let path = uri.path();
        if path.is_empty() {
            Some("/".to_owned())
        } else {
            Some(path.to_owned())
        }
    }

    /// The value of `@query`: the raw query prefixed with `?`, or `?` alone
    /// when the request has no query.
    #[must_use]
    pub fn query(&self) -> Option<String> {
        let uri = self.target_uri.as_ref()?;
        Some(format!("?{}", uri.query().unwrap_or_default()))
    }

    /// The value of `@query-param` for the given (encoded) parameter name.
    ///
    /// Both names and values are percent-decoded and re-encoded so that the
    /// serialization is canonical: `+` is treated as a space when decoding
    /// and spaces re-encode as `%20`. When a name occurs multiple times the
    /// last occurrence wins.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_params()?.get(name).cloned()
    }

    /// The caller-supplied value of `@request-target`.
    #[must_use]
    pub fn request_target(&self) -> Option<&str> {
        self.request_target.as_deref()
    }

    /// The status code, the value of `@status`.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Resolve the value of the component the identifier refers to.
    ///
    /// Returns `Ok(None)` when the value is unavailable.
    pub fn component_value(&self, identifier: &ComponentIdentifier) -> Result<Option<String>> {
        if identifier.is_derived() {
            self.derived_component_value(identifier)
        } else {
            self.normal_component_value(identifier)
        }
    }

    fn derived_component_value(
        &self,
        identifier: &ComponentIdentifier,
    ) -> Result<Option<String>> {
        let value = match identifier.name() {
            derived::METHOD => self.method.clone(),
            derived::TARGET_URI => self.target_uri.as_ref().map(Uri::to_string),
            derived::AUTHORITY => self.authority(),
            derived::SCHEME => self.scheme(),
            derived::REQUEST_TARGET => self.request_target.clone(),
            derived::PATH => self.path(),
            derived::QUERY => self.query(),
            derived::QUERY_PARAM => identifier
                .params()
                .name()?
                .and_then(|name| self.query_param(name)),
            derived::STATUS => self.status.map(|status| status.to_string()),
            _ => None,
        };

        Ok(value)
    }

    fn normal_component_value(
        &self,
        identifier: &ComponentIdentifier,
    ) -> Result<Option<String>> {
        let field_name = identifier.name();
        let params = identifier.params();

        // The (req, tr) flags select which of the four pools is consulted.
        let source = match (params.req()?, params.tr()?) {
            (false, false) => self.headers.as_ref(),
            (false, true) => self.trailers.as_ref(),
            (true, false) => self.request_headers.as_ref(),
            (true, true) => self.request_trailers.as_ref(),
        };

        if params.bs()? {
            return extract_field_value(source, field_name, true);
        }

        if let Some(key) = params.key()? {
            return extract_dictionary_member(source, field_name, key).map(Some);
        }

        if params.sf()? {
            return self.extract_structured_field_value(source, field_name);
        }

        extract_field_value(source, field_name, false)
    }

    fn extract_structured_field_value(
        &self,
        source: Option<&HeaderMap>,
        field_name: &str,
    ) -> Result<Option<String>> {
        let data_type = self
            .data_types
            .get(field_name)
            .copied()
            .or_else(|| StructuredDataType::by_field_name(field_name))
            .ok_or_else(|| Error::UnknownDataType {
                field: field_name.to_owned(),
            })?;

        let Some(field_value) = extract_field_value(source, field_name, false)? else {
            return Ok(None);
        };

        let malformed = |_| Error::MalformedField {
            field: field_name.to_owned(),
            expected: data_type.expected(),
        };

        // Round-trip through the strict serializer to normalize the value.
        let value = match data_type {
            StructuredDataType::List => Parser::parse_list(&field_value)
                .map_err(malformed)?
                .serialize(),
            StructuredDataType::Dictionary => Parser::parse_dictionary(&field_value)
                .map_err(malformed)?
                .serialize(),
            StructuredDataType::Item => Parser::parse_item(&field_value)
                .map_err(malformed)?
                .serialize(),
        };

        Ok(Some(value))
    }

    fn query_params(&self) -> Option<IndexMap<String, String>> {
        let query = self.target_uri.as_ref()?.query()?;
        let mut params = IndexMap::new();

        for pair in query.split('&') {
            let (name, value) = match pair.split_once('=') {
                Some((name, value)) => (name, value),
                None => (pair, ""),
            };

            // A repeated name overwrites the earlier occurrence.
            params.insert(pct_normalize(name), pct_normalize(value));
        }

        Some(params)
    }
}

impl SignatureContext for ComponentValueProvider {
    fn component_value(
        &self,
        _metadata: &SignatureMetadata,
        identifier: &ComponentIdentifier,
    ) -> Result<Option<String>> {
        Self::component_value(self, identifier)
    }
}

/// Percent-decode, then re-encode canonically. `+` counts as a space on the
/// way in; spaces come out as `%20`, never `+`.
fn pct_normalize(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded: Vec<u8> = percent_decode_str(&spaced).collect();

    percent_encode(&decoded, QUERY_PARAM_ENCODE).to_string()
}

fn extract_field_value(
    source: Option<&HeaderMap>,
    field_name: &str,
    bs: bool,
) -> Result<Option<String>> {
    let Some(values) = extract_field_values(source, field_name, bs)? else {
        return Ok(None);
    };

    // Multiple field lines combine into one value with ", " separators.
    Ok(Some(values.join(", ")))
}

fn extract_field_values(
    source: Option<&HeaderMap>,
    field_name: &str,
    bs: bool,
) -> Result<Option<Vec<String>>> {
    let Some(source) = source else {
        return Ok(None);
    };

    let mut values = Vec::new();

    for value in source.get_all(field_name) {
        let canonical = canonicalize_field_value(value.as_bytes());
        if canonical.is_empty() {
            continue;
        }

        if bs {
            // Each line is wrapped into its own byte sequence before the
            // lines are combined.
            let mut wrapped = String::new();
            ser::write_byte_sequence(&canonical, &mut wrapped);
            values.push(wrapped);
        } else {
            let canonical =
                String::from_utf8(canonical).map_err(|_| Error::OpaqueFieldValue {
                    field: field_name.to_owned(),
                })?;
            values.push(canonical);
        }
    }

    if values.is_empty() {
        return Ok(None);
    }

    Ok(Some(values))
}

/// Strip leading and trailing whitespace and collapse any obsolete line
/// folding (`OWS CRLF RWS`, RFC 9112, section 5.2) into a single space.
fn canonicalize_field_value(value: &[u8]) -> Vec<u8> {
    let is_space = |byte: &u8| matches!(byte, b' ' | b'\t' | b'\r' | b'\n');

    let start = value
        .iter()
        .position(|byte| !is_space(byte))
        .unwrap_or(value.len());
    let end = value
        .iter()
        .rposition(|byte| !is_space(byte))
        .map_or(start, |position| position + 1);
    let trimmed = &value[start..end];

    let mut out = Vec::with_capacity(trimmed.len());
    let mut index = 0;

    while index < trimmed.len() {
        let is_fold = trimmed[index] == b'\r'
            && trimmed.get(index + 1) == Some(&b'\n')
            && matches!(trimmed.get(index + 2), Some(b' ' | b'\t'));

        if is_fold {
            while matches!(out.last(), Some(b' ' | b'\t')) {
                out.pop();
            }

            index += 2;
            while matches!(trimmed.get(index), Some(b' ' | b'\t')) {
                index += 1;
            }

            out.push(b' ');
        } else {
            out.push(trimmed[index]);
            index += 1;
        }
    }

    out
}

fn extract_dictionary_member(
    source: Option<&HeaderMap>,
    field_name: &str,
    key: &str,
) -> Result<String> {
    // A missing field, unlike an absent plain component, is an error here.
    let field_value =
        extract_field_value(source, field_name, false)?.ok_or_else(|| Error::FieldMissing {
            field: field_name.to_owned(),
        })?;

    let dictionary = Parser::parse_dictionary(&field_value).map_err(|_| Error::MalformedField {
        field: field_name.to_owned(),
        expected: "a dictionary",
    })?;

    let member = dictionary
        .get(key)
        .ok_or_else(|| Error::DictionaryMemberMissing {
            field: field_name.to_owned(),
            key: key.to_owned(),
        })?;

    Ok(member.serialize())
}
