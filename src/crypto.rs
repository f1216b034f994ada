//! The sign/verify boundary.
//!
//! The builder output is handed to these two capabilities as an opaque byte
//! string; algorithm and key material are bound to the capability object.
//! Reference implementations over `ring` cover the common JOSE algorithms
//! (HS256, RS256, PS256, ES256, EdDSA). Anything else — ES256K included,
//! which `ring` does not support — plugs in through the same two traits.

use crate::Result;
use ring::{
    hmac,
    rand::SystemRandom,
    signature::{EcdsaKeyPair, Ed25519KeyPair, RsaEncoding, RsaKeyPair, UnparsedPublicKey},
};

/// A signing capability: computes a signature over a signature base.
pub trait HttpSigner {
    /// Sign the signature base and return the raw signature bytes.
    fn sign(&self, signature_base: &[u8]) -> Result<Vec<u8>>;
}

/// A verification capability: checks a signature over a signature base.
pub trait HttpVerifier {
    /// Verify the signature over the signature base.
    ///
    /// `Ok(false)` means the signature does not match; errors are reserved
    /// for operational failures.
    fn verify(&self, signature_base: &[u8], signature: &[u8]) -> Result<bool>;
}

impl HttpSigner for hmac::Key {
    fn sign(&self, signature_base: &[u8]) -> Result<Vec<u8>> {
        Ok(hmac::sign(self, signature_base).as_ref().to_vec())
    }
}

impl HttpVerifier for hmac::Key {
    fn verify(&self, signature_base: &[u8], signature: &[u8]) -> Result<bool> {
        Ok(hmac::verify(self, signature_base, signature).is_ok())
    }
}

impl HttpSigner for Ed25519KeyPair {
    fn sign(&self, signature_base: &[u8]) -> Result<Vec<u8>> {
        Ok(self.sign(signature_base).as_ref().to_vec())
    }
}

impl HttpSigner for EcdsaKeyPair {
    fn sign(&self, signature_base: &[u8]) -> Result<Vec<u8>> {
        let signature = self.sign(&SystemRandom::new(), signature_base)?;
        Ok(signature.as_ref().to_vec())
    }
}

/// An RSA signer: a key pair bound to a padding scheme.
pub struct RsaSigner {
    key_pair: RsaKeyPair,
    padding: &'static dyn RsaEncoding,
}

impl RsaSigner {
    /// RS256: RSASSA-PKCS1-v1_5 with SHA-256.
    #[must_use]
    pub fn rs256(key_pair: RsaKeyPair) -> Self {
        Self {
            key_pair,
            padding: &ring::signature::RSA_PKCS1_SHA256,
        }
    }

    /// PS256: RSASSA-PSS with SHA-256.
    #[must_use]
    pub fn ps256(key_pair: RsaKeyPair) -> Self {
        Self {
            key_pair,
            padding: &ring::signature::RSA_PSS_SHA256,
        }
    }
}

impl HttpSigner for RsaSigner {
    fn sign(&self, signature_base: &[u8]) -> Result<Vec<u8>> {
        let mut signature = vec![0; self.key_pair.public().modulus_len()];
        self.key_pair.sign(
            self.padding,
            &SystemRandom::new(),
            signature_base,
            &mut signature,
        )?;

        Ok(signature)
    }
}

impl<B> HttpVerifier for UnparsedPublicKey<B>
where
    B: AsRef<[u8]>,
{
    fn verify(&self, signature_base: &[u8], signature: &[u8]) -> Result<bool> {
        // ring reports a mismatched signature as an unspecified error; that
        // is a negative verification result, not an operational failure.
        Ok(self.verify(signature_base, signature).is_ok())
    }
}
