//! JWT claims and builder with compile-time validation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Typestate markers for builder pattern.
pub mod ts {
    /// Marker for a field that has been set.
    pub struct Set;
    /// Marker for a field that has not been set.
    pub struct Unset;
}

/// Claims carried by engine-issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject.
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// JWT ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Compile-time checked builder for JWT claims.
pub struct ClaimsBuilder<Sub = ts::Unset, Exp = ts::Unset, Iat = ts::Unset> {
    sub: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    iss: Option<String>,
    aud: Option<String>,
    jti: Option<String>,
    _phantom: PhantomData<(Sub, Exp, Iat)>,
}

impl ClaimsBuilder {
    /// Create a new claims builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sub: None,
            exp: None,
            iat: None,
            iss: None,
            aud: None,
            jti: None,
            _phantom: PhantomData,
        }
    }
}

impl<Exp, Iat> ClaimsBuilder<ts::Unset, Exp, Iat> {
    /// Set the subject (sub) claim.
    pub fn subject(self, sub: impl Into<String>) -> ClaimsBuilder<ts::Set, Exp, Iat> {
        ClaimsBuilder {
            sub: Some(sub.into()),
            exp: self.exp,
            iat: self.iat,
            iss: self.iss,
            aud: self.aud,
            jti: self.jti,
            _phantom: PhantomData,
        }
    }
}

impl<Sub> ClaimsBuilder<Sub, ts::Unset, ts::Unset> {
    /// Set issued-at to now and expiry `ttl` later.
    pub fn valid_for(self, ttl: Duration) -> ClaimsBuilder<Sub, ts::Set, ts::Set> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        ClaimsBuilder {
            sub: self.sub,
            exp: Some(exp.timestamp()),
            iat: Some(now.timestamp()),
            iss: self.iss,
            aud: self.aud,
            jti: self.jti,
            _phantom: PhantomData,
        }
    }
}

impl<Sub, Exp, Iat> ClaimsBuilder<Sub, Exp, Iat> {
    /// Set the issuer (iss) claim.
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Set the audience (aud) claim.
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    /// Set the JWT ID (jti) claim.
    pub fn jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }
}

impl ClaimsBuilder<ts::Set, ts::Set, ts::Set> {
    /// Build the claims. All required fields must be set.
    pub fn build(self) -> Claims {
        Claims {
            // Type system guarantees these are Some() when build() is callable
            sub: self.sub.unwrap_or_else(|| {
                tracing::error!("ClaimsBuilder: subject field unexpectedly None despite type guarantees");
                String::new()
            }),
            exp: self.exp.unwrap_or_else(|| {
                tracing::error!("ClaimsBuilder: expiry field unexpectedly None despite type guarantees");
                Utc::now().timestamp()
            }),
            iat: self.iat.unwrap_or_else(|| {
                tracing::error!("ClaimsBuilder: issued-at field unexpectedly None despite type guarantees");
                Utc::now().timestamp()
            }),
            iss: self.iss,
            aud: self.aud,
            jti: self.jti,
        }
    }
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
