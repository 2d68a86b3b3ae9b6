//! JSON Web Key export for engine public keys

use crate::envelope::KeyEnvelope;
use crate::error::{KeyError, Result};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::pkcs1::der::Decode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Public RSA key in JWK form (RFC 7517)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaJwk {
    /// Key type, always `RSA`
    pub kty: String,
    /// Intended use, always `sig`
    #[serde(rename = "use")]
    pub key_use: String,
    /// Signature algorithm
    pub alg: String,
    /// Key identifier
    pub kid: String,
    /// Modulus, base64url without padding
    pub n: String,
    /// Public exponent, base64url without padding
    pub e: String,
}

impl RsaJwk {
    /// Build a JWK from a public key envelope
    ///
    /// The key id is the first 16 hex characters of the SHA-256 digest of
    /// the PKCS#1 DER, so it changes whenever the key is rotated.
    ///
    /// # Errors
    ///
    /// Fails if the envelope is not a valid public key.
    pub fn from_public_envelope(envelope: &KeyEnvelope) -> Result<Self> {
        // Decoding validates the kind and the key itself
        envelope.to_public_key()?;
        let der = envelope.der()?;

        let parsed = rsa::pkcs1::RsaPublicKey::from_der(&der)
            .map_err(|e| KeyError::invalid_format(format!("Invalid RSA public key: {e}")))?;

        let digest = Sha256::digest(der.as_slice());
        let kid = hex::encode(&digest[..8]);

        Ok(Self {
            kty: "RSA".to_string(),
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            kid,
            n: URL_SAFE_NO_PAD.encode(parsed.modulus.as_bytes()),
            e: URL_SAFE_NO_PAD.encode(parsed.public_exponent.as_bytes()),
        })
    }
}

/// JWK set document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JwkSet {
    /// Keys in the set
    pub keys: Vec<RsaJwk>,
}

impl JwkSet {
    /// Set holding a single key
    #[must_use]
    pub fn single(key: RsaJwk) -> Self {
        Self { keys: vec![key] }
    }

    /// Find a key by id
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&RsaJwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}
