//! JSON Web Tokens for vault engines
//!
//! This crate provides:
//! - RS256 signing and verification over `rsa` key types
//! - A typestate claims builder
//! - Compact token encoding with issuer/audience/expiry validation

pub mod claims;
mod error;
pub mod rs256;
pub mod token;

pub use claims::{Claims, ClaimsBuilder};
pub use error::*;
pub use token::{ALGORITHM, JwtHeader, Validation, decode, encode, peek_header};
