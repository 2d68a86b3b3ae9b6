//! PEM key envelopes
//!
//! Both halves of an engine key pair are stored as PEM blocks carrying
//! PKCS#1 DER: `RSA PRIVATE KEY` for the private key and `RSA PUBLIC KEY`
//! for the public key.

use crate::error::{KeyError, Result};
use pem::{EncodeConfig, LineEnding, Pem};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use zeroize::Zeroizing;

/// PEM tag of a private key envelope
pub const PRIVATE_KEY_TAG: &str = "RSA PRIVATE KEY";

/// PEM tag of a public key envelope
pub const PUBLIC_KEY_TAG: &str = "RSA PUBLIC KEY";

/// Which half of a key pair an envelope wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// PKCS#1 RSA private key
    Private,
    /// PKCS#1 RSA public key
    Public,
}

impl EnvelopeKind {
    /// PEM tag written for this kind
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Private => PRIVATE_KEY_TAG,
            Self::Public => PUBLIC_KEY_TAG,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            PRIVATE_KEY_TAG => Some(Self::Private),
            PUBLIC_KEY_TAG => Some(Self::Public),
            _ => None,
        }
    }
}

/// Textual PEM encoding of one half of an RSA key pair
#[derive(Clone, PartialEq, Eq)]
pub struct KeyEnvelope {
    kind: EnvelopeKind,
    pem: Zeroizing<String>,
}

impl KeyEnvelope {
    /// Wrap PKCS#1 DER bytes of the given kind
    #[must_use]
    pub fn from_der(kind: EnvelopeKind, der: &[u8]) -> Self {
        let block = Pem::new(kind.tag(), der.to_vec());
        let pem = pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF));
        Self {
            kind,
            pem: Zeroizing::new(pem),
        }
    }

    /// Parse stored envelope bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the bytes are not a single PEM block
    /// tagged as an RSA private or public key.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let block = pem::parse(bytes)
            .map_err(|e| KeyError::invalid_format(format!("PEM decoding failed: {e}")))?;

        let kind = EnvelopeKind::from_tag(block.tag()).ok_or_else(|| {
            KeyError::invalid_format(format!("unexpected PEM tag '{}'", block.tag()))
        })?;

        Ok(Self::from_der(kind, block.contents()))
    }

    /// Which half of the pair this envelope holds
    #[must_use]
    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// PEM text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pem
    }

    /// PEM text as bytes, the form written to storage
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.pem.as_bytes()
    }

    /// Decoded PKCS#1 DER contents
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the PEM text no longer parses.
    pub fn der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let block = pem::parse(self.pem.as_bytes())
            .map_err(|e| KeyError::invalid_format(format!("PEM decoding failed: {e}")))?;
        Ok(Zeroizing::new(block.contents().to_vec()))
    }

    /// Decode a private key envelope
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeMismatch` for a public envelope and
    /// `InvalidKeyFormat` if the DER is not a PKCS#1 private key.
    pub fn to_private_key(&self) -> Result<RsaPrivateKey> {
        self.expect_kind(EnvelopeKind::Private)?;
        let der = self.der()?;
        RsaPrivateKey::from_pkcs1_der(&der)
            .map_err(|e| KeyError::invalid_format(format!("Invalid RSA private key: {e}")))
    }

    /// Decode a public key envelope
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeMismatch` for a private envelope and
    /// `InvalidKeyFormat` if the DER is not a PKCS#1 public key.
    pub fn to_public_key(&self) -> Result<RsaPublicKey> {
        self.expect_kind(EnvelopeKind::Public)?;
        let der = self.der()?;
        RsaPublicKey::from_pkcs1_der(&der)
            .map_err(|e| KeyError::invalid_format(format!("Invalid RSA public key: {e}")))
    }

    fn expect_kind(&self, expected: EnvelopeKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(KeyError::EnvelopeMismatch {
                expected: expected.tag(),
                found: self.kind.tag().to_string(),
            })
        }
    }
}

impl fmt::Debug for KeyEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EnvelopeKind::Private => f
                .debug_struct("KeyEnvelope")
                .field("kind", &self.kind)
                .field("pem", &"<redacted>")
                .finish(),
            EnvelopeKind::Public => f
                .debug_struct("KeyEnvelope")
                .field("kind", &self.kind)
                .field("pem", &self.pem.as_str())
                .finish(),
        }
    }
}

/// A private and public envelope produced together
#[derive(Debug, Clone)]
pub struct KeyPair {
    private: KeyEnvelope,
    public: KeyEnvelope,
}

impl KeyPair {
    /// Pair up two envelopes, checking that each holds the expected half
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeMismatch` if the kinds are swapped or duplicated.
    pub fn from_parts(private: KeyEnvelope, public: KeyEnvelope) -> Result<Self> {
        private.expect_kind(EnvelopeKind::Private)?;
        public.expect_kind(EnvelopeKind::Public)?;
        Ok(Self { private, public })
    }

    /// Private key envelope
    #[must_use]
    pub fn private(&self) -> &KeyEnvelope {
        &self.private
    }

    /// Public key envelope
    #[must_use]
    pub fn public(&self) -> &KeyEnvelope {
        &self.public
    }

    /// Whether the public envelope is the public half of the private envelope
    ///
    /// # Errors
    ///
    /// Returns an error if either envelope fails to decode.
    pub fn is_matching(&self) -> Result<bool> {
        let private_key = self.private.to_private_key()?;
        let public_key = self.public.to_public_key()?;
        Ok(RsaPublicKey::from(&private_key) == public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_foreign_tag() {
        let block = Pem::new("CERTIFICATE", vec![1, 2, 3]);
        let text = pem::encode(&block);

        let err = KeyEnvelope::parse(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("CERTIFICATE"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(KeyEnvelope::parse(b"definitely not pem").is_err());
    }

    #[test]
    fn test_envelope_text_carries_tag() {
        let envelope = KeyEnvelope::from_der(EnvelopeKind::Public, &[0x30, 0x00]);
        assert!(envelope.as_str().starts_with("-----BEGIN RSA PUBLIC KEY-----"));
        assert!(envelope.as_str().trim_end().ends_with("-----END RSA PUBLIC KEY-----"));

        let reparsed = KeyEnvelope::parse(envelope.as_bytes()).unwrap();
        assert_eq!(reparsed, envelope);
    }

    #[test]
    fn test_private_envelope_debug_is_redacted() {
        let envelope = KeyEnvelope::from_der(EnvelopeKind::Private, &[0x30, 0x00]);
        let debug = format!("{envelope:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("BEGIN"));
    }

    #[test]
    fn test_kind_mismatch() {
        let public = KeyEnvelope::from_der(EnvelopeKind::Public, &[0x30, 0x00]);
        assert!(matches!(
            public.to_private_key(),
            Err(KeyError::EnvelopeMismatch { .. })
        ));
        assert!(KeyPair::from_parts(public.clone(), public).is_err());
    }
}
