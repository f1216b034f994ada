use crate::{
    component::ComponentIdentifier,
    error::Error,
    sfv::{BareItem, InnerList, Parameters},
    Result,
};
use std::{
    fmt, slice,
    time::{Duration, SystemTime},
};

/// Signature metadata parameters (RFC 9421, section 2.3, and the IANA HTTP
/// Signature Metadata Parameters registry).
///
/// Six parameters are registered; unrecognized parameters are carried
/// verbatim so that parsed field values re-serialize losslessly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureMetadataParameters {
    inner: Parameters,
}

impl SignatureMetadataParameters {
    /// `"alg"`: explicitly declared signature algorithm.
    pub const ALG: &'static str = "alg";
    /// `"created"`: creation timestamp, in seconds since the Unix epoch.
    pub const CREATED: &'static str = "created";
    /// `"expires"`: expiration timestamp, in seconds since the Unix epoch.
    pub const EXPIRES: &'static str = "expires";
    /// `"keyid"`: identifier of the signing and verification key material.
    pub const KEYID: &'static str = "keyid";
    /// `"nonce"`: a single-use nonce.
    pub const NONCE: &'static str = "nonce";
    /// `"tag"`: an application-specific tag.
    pub const TAG: &'static str = "tag";

    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of the `alg` parameter.
    pub fn alg(&self) -> Result<Option<&str>> {
        self.inner.get_str(Self::ALG)
    }

    /// The value of the `created` parameter, as a timestamp.
    pub fn created(&self) -> Result<Option<SystemTime>> {
        self.timestamp(Self::CREATED)
    }

    /// The value of the `expires` parameter, as a timestamp.
    pub fn expires(&self) -> Result<Option<SystemTime>> {
        self.timestamp(Self::EXPIRES)
    }

    /// The value of the `keyid` parameter.
    pub fn keyid(&self) -> Result<Option<&str>> {
        self.inner.get_str(Self::KEYID)
    }

    /// The value of the `nonce` parameter.
    pub fn nonce(&self) -> Result<Option<&str>> {
        self.inner.get_str(Self::NONCE)
    }

    /// The value of the `tag` parameter.
    pub fn tag(&self) -> Result<Option<&str>> {
        self.inner.get_str(Self::TAG)
    }

    /// Set the `alg` parameter.
    #[must_use]
    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.inner.insert(Self::ALG, alg.into());
        self
    }

    /// Set the `created` parameter from Unix seconds.
    #[must_use]
    pub fn with_created(mut self, created: i64) -> Self {
        self.inner.insert(Self::CREATED, created);
        self
    }

    /// Set the `created` parameter from a timestamp.
    pub fn with_created_at(self, created: SystemTime) -> Result<Self> {
        let seconds = unix_seconds(created)?;
        Ok(self.with_created(seconds))
    }

    /// Set the `expires` parameter from Unix seconds.
    #[must_use]
    pub fn with_expires(mut self, expires: i64) -> Self {
        self.inner.insert(Self::EXPIRES, expires);
        self
    }

    /// Set the `expires` parameter from a timestamp.
    pub fn with_expires_at(self, expires: SystemTime) -> Result<Self> {
        let seconds = unix_seconds(expires)?;
        Ok(self.with_expires(seconds))
    }

    /// Set the `keyid` parameter.
    #[must_use]
    pub fn with_keyid(mut self, keyid: impl Into<String>) -> Self {
        self.inner.insert(Self::KEYID, keyid.into());
        self
    }

    /// Set the `nonce` parameter.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.inner.insert(Self::NONCE, nonce.into());
        self
    }

    /// Set the `tag` parameter.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.inner.insert(Self::TAG, tag.into());
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

    pub(crate) fn serialize_to(&self, out: &mut String) {
        self.inner.serialize_to(out);
    }

    fn timestamp(&self, key: &str) -> Result<Option<SystemTime>> {
        let Some(seconds) = self.inner.get_integer(key)? else {
            return Ok(None);
        };

        let seconds_unsigned = u64::try_from(seconds).map_err(|_| Error::TimestampRange {
            key: key.to_owned(),
            value: seconds,
        })?;

        Ok(Some(
            SystemTime::UNIX_EPOCH + Duration::from_secs(seconds_unsigned),
        ))
    }
}

impl From<Parameters> for SignatureMetadataParameters {
    fn from(inner: Parameters) -> Self {
        Self { inner }
    }
}

fn unix_seconds(time: SystemTime) -> Result<i64> {
    let duration = time.duration_since(SystemTime::UNIX_EPOCH)?;

    Ok(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
}

/// Signature metadata: the ordered covered components list together with its
/// parameter tail (RFC 9421, section 2.3).
///
/// Serializes as the inner list that appears both in `Signature-Input`
/// members and in the `"@signature-params"` line of the signature base.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureMetadata {
    identifiers: Vec<ComponentIdentifier>,
    parameters: SignatureMetadataParameters,
}

impl SignatureMetadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty metadata carrying the given parameters.
    #[must_use]
    pub fn with_parameters(parameters: SignatureMetadataParameters) -> Self {
        Self {
            identifiers: Vec::new(),
            parameters,
        }
    }

    /// Append a covered component.
    ///
    /// Fails when an equal identifier is already covered; within a single
    /// covered components list each identifier must occur only once.
    pub fn push(&mut self, identifier: ComponentIdentifier) -> Result<()> {
        if self.identifiers.contains(&identifier) {
            return Err(Error::DuplicateComponent {
                identifier: identifier.to_string(),
            });
        }

        self.identifiers.push(identifier);
        Ok(())
    }

    /// The covered component at the given position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ComponentIdentifier> {
        self.identifiers.get(index)
    }

    /// Iterate over the covered components in order.
    pub fn iter(&self) -> slice::Iter<'_, ComponentIdentifier> {
        self.identifiers.iter()
    }

    /// Number of covered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Whether no components are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// The metadata parameters.
    #[must_use]
    pub fn parameters(&self) -> &SignatureMetadataParameters {
        &self.parameters
    }

    /// Mutable access to the metadata parameters.
    pub fn parameters_mut(&mut self) -> &mut SignatureMetadataParameters {
        &mut self.parameters
    }

    /// Serialize the metadata as an inner list followed by its parameters.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.serialize_to(&mut out);
        out
    }

    pub(crate) fn serialize_to(&self, out: &mut String) {
        out.push('(');

        for (index, identifier) in self.identifiers.iter().enumerate() {
            if index != 0 {
                out.push(' ');
            }
            identifier.serialize_to(out);
        }

        out.push(')');
        self.parameters.serialize_to(out);
    }

    /// Parse one `Signature-Input` member value.
    pub(crate) fn parse(label: &str, inner_list: &InnerList) -> Result<Self> {
        let mut metadata =
            Self::with_parameters(SignatureMetadataParameters::from(inner_list.params.clone()));

        for (index, item) in inner_list.items.iter().enumerate() {
            let identifier = ComponentIdentifier::parse(label, index, item)?;
            metadata.push(identifier)?;
        }

        Ok(metadata)
    }
}

impl<'a> IntoIterator for &'a SignatureMetadata {
    type Item = &'a ComponentIdentifier;
    type IntoIter = slice::Iter<'a, ComponentIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for SignatureMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod test {
    use super::{SignatureMetadata, SignatureMetadataParameters};
    use crate::component::{ComponentIdentifier, ComponentParameters};
    use pretty_assertions::assert_eq;
    use std::time::{Duration, SystemTime};

    #[test]
    fn serialization() {
        let mut metadata = SignatureMetadata::with_parameters(
            SignatureMetadataParameters::new().with_tag("my_tag"),
        );
        metadata
            .push(ComponentIdentifier::new("@method"))
            .unwrap();
        metadata
            .push(ComponentIdentifier::with_params(
                "my-field",
                ComponentParameters::new().with_sf(true),
            ))
            .unwrap();

        assert_eq!(
            metadata.serialize(),
            "(\"@method\" \"my-field\";sf);tag=\"my_tag\""
        );
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let mut metadata = SignatureMetadata::new();
        metadata.push(ComponentIdentifier::new("date")).unwrap();

        assert!(metadata.push(ComponentIdentifier::new("date")).is_err());

        // Same name with reordered parameters is still the same identifier.
        metadata
            .push(ComponentIdentifier::with_params(
                "foo",
                ComponentParameters::new().with_req(true).with_tr(true),
            ))
            .unwrap();
        assert!(metadata
            .push(ComponentIdentifier::with_params(
                "foo",
                ComponentParameters::new().with_tr(true).with_req(true),
            ))
            .is_err());
    }

    #[test]
    fn timestamp_accessors() {
        let params = SignatureMetadataParameters::new().with_created(1_714_921_200);
        let expected = SystemTime::UNIX_EPOCH + Duration::from_secs(1_714_921_200);

        assert_eq!(params.created().unwrap(), Some(expected));
        assert_eq!(params.expires().unwrap(), None);

        let params = SignatureMetadataParameters::new()
            .with_expires_at(expected)
            .unwrap();
        assert_eq!(params.get("expires").unwrap().serialize(), "1714921200");
    }
}
