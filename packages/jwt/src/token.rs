//! Compact JWS serialization of engine tokens

use crate::claims::Claims;
use crate::error::{JwtError, JwtResult};
use crate::rs256::{sign_rs256, verify_rs256};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

/// Only algorithm engines sign with
pub const ALGORITHM: &str = "RS256";

/// JWT header structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    /// Signature algorithm
    pub alg: String,
    /// Token type
    pub typ: String,
    /// Id of the signing key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Claim checks applied after the signature verifies
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Required `iss`
    pub issuer: Option<String>,
    /// Required `aud`
    pub audience: Option<String>,
    /// Clock skew tolerated on `exp`, in seconds
    pub leeway: i64,
}

impl Validation {
    /// Require the given issuer and audience
    #[must_use]
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            audience: Some(audience.into()),
            leeway: 0,
        }
    }

    fn check(&self, claims: &Claims) -> JwtResult<()> {
        if Utc::now().timestamp() > claims.exp + self.leeway {
            return Err(JwtError::TokenExpired);
        }
        if claims.iat > claims.exp {
            return Err(JwtError::invalid_claims("iat is after exp"));
        }
        if self.issuer.is_some() && claims.iss != self.issuer {
            return Err(JwtError::InvalidIssuer);
        }
        if self.audience.is_some() && claims.aud != self.audience {
            return Err(JwtError::InvalidAudience);
        }
        Ok(())
    }
}

/// Sign claims into a compact `header.payload.signature` token
///
/// # Errors
/// Returns `Serialization` if the header or claims cannot be encoded.
pub fn encode(claims: &Claims, private_key: &RsaPrivateKey, kid: Option<&str>) -> JwtResult<String> {
    let header = JwtHeader {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
        kid: kid.map(str::to_string),
    };

    let header_json =
        serde_json::to_string(&header).map_err(|e| JwtError::serialization(&e.to_string()))?;
    let payload_json =
        serde_json::to_string(claims).map_err(|e| JwtError::serialization(&e.to_string()))?;

    let message = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json.as_bytes()),
        URL_SAFE_NO_PAD.encode(payload_json.as_bytes())
    );

    let signature = sign_rs256(&message, private_key);
    Ok(format!("{message}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify a token's signature and claims
///
/// # Errors
/// - `InvalidToken` for malformed tokens
/// - `UnsupportedAlgorithm` if the header is not RS256
/// - `InvalidSignature` if the signature does not verify against `public_key`
/// - `TokenExpired`, `InvalidIssuer`, `InvalidAudience` from claim checks
pub fn decode(token: &str, public_key: &RsaPublicKey, validation: &Validation) -> JwtResult<Claims> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::invalid_token("expected three segments"));
    };

    let header: JwtHeader = decode_segment(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(JwtError::UnsupportedAlgorithm(header.alg));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| JwtError::InvalidToken(format!("signature encoding: {e}")))?;

    let message = format!("{header_b64}.{payload_b64}");
    if !verify_rs256(&message, &signature, public_key)? {
        return Err(JwtError::InvalidSignature);
    }

    let claims: Claims = decode_segment(payload_b64, "payload")?;
    validation.check(&claims)?;
    Ok(claims)
}

/// Read the header without verifying anything
///
/// # Errors
/// Returns `InvalidToken` if the first segment is not a JSON header.
pub fn peek_header(token: &str) -> JwtResult<JwtHeader> {
    let header_b64 = token
        .split('.')
        .next()
        .ok_or_else(|| JwtError::invalid_token("empty token"))?;
    decode_segment(header_b64, "header")
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> JwtResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JwtError::InvalidToken(format!("{what} encoding: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| JwtError::InvalidToken(format!("{what} json: {e}")))
}
