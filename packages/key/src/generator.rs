//! RSA key pair generation
//!
//! Keys are generated with the thread-local CSPRNG and encoded as PKCS#1
//! DER before being wrapped into PEM envelopes.

use crate::envelope::{EnvelopeKind, KeyEnvelope, KeyPair};
use crate::error::{KeyError, Result};
use rand::rng;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

const SUPPORTED_SIZES: &str = "1024, 2048, 3072, 4096";

/// Validated RSA modulus size in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct KeySize(u32);

impl KeySize {
    /// Size used for engine keys unless configured otherwise
    pub const DEFAULT: KeySize = KeySize(2048);

    /// Every accepted size
    pub const ALL: [KeySize; 4] = [KeySize(1024), KeySize(2048), KeySize(3072), KeySize(4096)];

    /// Validate a bit length
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedKeySize` for anything other than 1024, 2048,
    /// 3072 or 4096.
    pub fn new(bits: u32) -> Result<Self> {
        if matches!(bits, 1024 | 2048 | 3072 | 4096) {
            Ok(Self(bits))
        } else {
            Err(KeyError::UnsupportedKeySize {
                actual: bits,
                supported: SUPPORTED_SIZES,
            })
        }
    }

    /// Bit length
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for KeySize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for KeySize {
    type Error = KeyError;

    fn try_from(bits: u32) -> Result<Self> {
        Self::new(bits)
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> Self {
        size.0
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.0)
    }
}

/// Source of fresh key pairs for engines
pub trait KeyPairGenerator: Send + Sync {
    /// Generate a new key pair of the given size
    ///
    /// # Errors
    ///
    /// Fails on entropy or encoding errors; callers treat these as fatal
    /// for the current write.
    fn generate(&self, size: KeySize) -> Result<KeyPair>;
}

/// RSA generator backed by the `rsa` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaKeyGenerator;

impl RsaKeyGenerator {
    /// Create new RSA key generator
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl KeyPairGenerator for RsaKeyGenerator {
    fn generate(&self, size: KeySize) -> Result<KeyPair> {
        let started = Instant::now();

        let mut rng = rng();
        let private_key = RsaPrivateKey::new(&mut rng, size.bits() as usize)
            .map_err(|e| KeyError::KeyGeneration(format!("RSA key generation failed: {e}")))?;

        let public_key = RsaPublicKey::from(&private_key);

        let private_der = private_key
            .to_pkcs1_der()
            .map_err(|e| KeyError::Encoding(format!("Private key encoding failed: {e}")))?;

        let public_der = public_key
            .to_pkcs1_der()
            .map_err(|e| KeyError::Encoding(format!("Public key encoding failed: {e}")))?;

        let pair = KeyPair::from_parts(
            KeyEnvelope::from_der(EnvelopeKind::Private, private_der.as_bytes()),
            KeyEnvelope::from_der(EnvelopeKind::Public, public_der.as_bytes()),
        )?;

        log::debug!(
            "Generated RSA key pair ({size}) in {}ms",
            started.elapsed().as_millis()
        );

        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_size_validation() {
        assert!(KeySize::new(2048).is_ok());
        assert!(KeySize::new(4096).is_ok());

        let err = KeySize::new(512).unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedKeySize { actual: 512, .. }));
        assert!(KeySize::new(2047).is_err());
        assert!(KeySize::new(0).is_err());
    }

    #[test]
    fn test_key_size_serde() {
        let size: KeySize = serde_json::from_str("3072").unwrap();
        assert_eq!(size.bits(), 3072);
        assert_eq!(serde_json::to_string(&size).unwrap(), "3072");
        assert!(serde_json::from_str::<KeySize>("1000").is_err());
    }

    #[test]
    fn test_generated_pair_round_trips() {
        let pair = RsaKeyGenerator::new().generate(KeySize::DEFAULT).unwrap();

        assert_eq!(pair.private().kind(), EnvelopeKind::Private);
        assert_eq!(pair.public().kind(), EnvelopeKind::Public);
        assert!(pair.private().as_str().contains("BEGIN RSA PRIVATE KEY"));
        assert!(pair.public().as_str().contains("BEGIN RSA PUBLIC KEY"));

        // Independently re-parse both halves from their stored text
        let private = KeyEnvelope::parse(pair.private().as_bytes()).unwrap();
        let public = KeyEnvelope::parse(pair.public().as_bytes()).unwrap();
        let derived = RsaPublicKey::from(&private.to_private_key().unwrap());
        assert_eq!(derived, public.to_public_key().unwrap());
    }

    #[test]
    fn test_round_trip_for_every_supported_size() {
        use rsa::traits::PublicKeyParts;

        let generator = RsaKeyGenerator::new();
        for size in KeySize::ALL {
            let pair = generator.generate(size).unwrap();
            assert!(pair.is_matching().unwrap(), "pair mismatch for {size}");

            let public_key = pair.public().to_public_key().unwrap();
            assert_eq!(public_key.size() * 8, size.bits() as usize);
        }
    }

    #[test]
    fn test_pairs_are_fresh() {
        let generator = RsaKeyGenerator::new();
        let first = generator.generate(KeySize::new(1024).unwrap()).unwrap();
        let second = generator.generate(KeySize::new(1024).unwrap()).unwrap();

        assert_ne!(first.public().as_str(), second.public().as_str());

        let mixed = KeyPair::from_parts(first.private().clone(), second.public().clone()).unwrap();
        assert!(!mixed.is_matching().unwrap());
    }
}
