//! # JWKS Key Material
//!
//! RSA key pair generation for vault engines and the PEM envelopes the
//! pairs are stored in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jwks_key::{KeyPairGenerator, KeySize, RsaKeyGenerator};
//!
//! # fn main() -> jwks_key::Result<()> {
//! let pair = RsaKeyGenerator::new().generate(KeySize::DEFAULT)?;
//! assert!(pair.is_matching()?);
//! println!("{}", pair.public().as_str());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod envelope;
pub mod error;
pub mod generator;
pub mod jwk;

pub use envelope::{EnvelopeKind, KeyEnvelope, KeyPair, PRIVATE_KEY_TAG, PUBLIC_KEY_TAG};
pub use error::{KeyError, Result};
pub use generator::{KeyPairGenerator, KeySize, RsaKeyGenerator};
pub use jwk::{JwkSet, RsaJwk};
