use crate::{
    component::ComponentIdentifier,
    crypto::{HttpSigner, HttpVerifier},
    error::Error,
    metadata::SignatureMetadata,
    provider::SignatureContext,
    Result,
};
use std::fmt;

/// One line of a signature base: a component identifier bound to its
/// resolved value (RFC 9421, section 2.5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBaseLine {
    identifier: ComponentIdentifier,
    value: Option<String>,
}

impl SignatureBaseLine {
    /// Create a base line. A missing value serializes as an empty string
    /// after the separator.
    #[must_use]
    pub fn new(identifier: ComponentIdentifier, value: Option<String>) -> Self {
        Self { identifier, value }
    }

    /// The component identifier of the line.
    #[must_use]
    pub fn identifier(&self) -> &ComponentIdentifier {
        &self.identifier
    }

    /// The component value of the line.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn serialize_to(&self, out: &mut String) {
        self.identifier.serialize_to(out);
        out.push_str(": ");

        if let Some(value) = &self.value {
            out.push_str(value);
        }
    }
}

impl fmt::Display for SignatureBaseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.serialize_to(&mut out);
        f.write_str(&out)
    }
}

/// The final line of a signature base, binding the literal
/// `"@signature-params"` name to the serialized metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureParamsLine {
    metadata: SignatureMetadata,
}

impl SignatureParamsLine {
    /// Create the params line for the given metadata.
    #[must_use]
    pub fn new(metadata: SignatureMetadata) -> Self {
        Self { metadata }
    }

    /// The signature metadata the line carries.
    #[must_use]
    pub fn metadata(&self) -> &SignatureMetadata {
        &self.metadata
    }

    fn serialize_to(&self, out: &mut String) {
        out.push_str("\"@signature-params\": ");
        self.metadata.serialize_to(out);
    }
}

impl fmt::Display for SignatureParamsLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.serialize_to(&mut out);
        f.write_str(&out)
    }
}

/// A complete signature base: the canonical byte string a signature is
/// computed over (RFC 9421, section 2.5).
///
/// Lines are joined by LF with no trailing newline; the bytes are the UTF-8
/// encoding of the serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBase {
    base_lines: Vec<SignatureBaseLine>,
    params_line: SignatureParamsLine,
}

impl SignatureBase {
    /// Assemble a signature base from its lines.
    #[must_use]
    pub fn new(base_lines: Vec<SignatureBaseLine>, params_line: SignatureParamsLine) -> Self {
        Self {
            base_lines,
            params_line,
        }
    }

    /// The component lines of the base.
    #[must_use]
    pub fn base_lines(&self) -> &[SignatureBaseLine] {
        &self.base_lines
    }

    /// The params line of the base.
    #[must_use]
    pub fn params_line(&self) -> &SignatureParamsLine {
        &self.params_line
    }

    /// Serialize the signature base.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        for line in &self.base_lines {
            line.serialize_to(&mut out);
            out.push('\n');
        }

        self.params_line.serialize_to(&mut out);
        out
    }

    /// The byte representation the signer and verifier operate on.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize().into_bytes()
    }

    /// Sign this base with the given signer capability.
    pub fn sign(&self, signer: &impl HttpSigner) -> Result<Vec<u8>> {
        signer.sign(&self.to_bytes())
    }

    /// Verify a signature over this base with the given verifier capability.
    pub fn verify(&self, verifier: &impl HttpVerifier, signature: &[u8]) -> Result<bool> {
        verifier.verify(&self.to_bytes(), signature)
    }
}

impl fmt::Display for SignatureBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Builds signature bases by resolving every covered component against a
/// [`SignatureContext`].
pub struct SignatureBaseBuilder<'a, C: ?Sized> {
    context: &'a C,
}

impl<'a, C> SignatureBaseBuilder<'a, C>
where
    C: SignatureContext + ?Sized,
{
    /// Create a builder over the given context.
    pub fn new(context: &'a C) -> Self {
        Self { context }
    }

    /// The context the builder resolves component values against.
    #[must_use]
    pub fn context(&self) -> &C {
        self.context
    }

    /// Build the signature base for the given metadata.
    ///
    /// Walks the covered components in order; a derived component without a
    /// resolvable value fails, while an absent HTTP field yields an empty
    /// line value.
    pub fn build(&self, metadata: &SignatureMetadata) -> Result<SignatureBase> {
        let mut base_lines = Vec::with_capacity(metadata.len());

        for identifier in metadata {
            let value = self.context.component_value(metadata, identifier)?;

            if value.is_none() && identifier.is_derived() {
                return Err(Error::DerivedValueUnavailable {
                    identifier: identifier.to_string(),
                });
            }

            base_lines.push(SignatureBaseLine::new(identifier.clone(), value));
        }

        Ok(SignatureBase::new(
            base_lines,
            SignatureParamsLine::new(metadata.clone()),
        ))
    }
}
