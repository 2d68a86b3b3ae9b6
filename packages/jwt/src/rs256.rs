//! RSA-SHA256 (RS256) signing and verification

use crate::error::JwtError;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Sign with RSA-SHA256 (RS256)
#[inline]
pub fn sign_rs256(message: &str, private_key: &RsaPrivateKey) -> Vec<u8> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key.sign(message.as_bytes());
    signature.to_bytes().as_ref().to_vec()
}

/// Verify RSA-SHA256 (RS256) signature
///
/// # Errors
/// Returns `Err` if the signature bytes are malformed. A well-formed
/// signature that does not match yields `Ok(false)`.
#[inline]
pub fn verify_rs256(
    message: &str,
    signature: &[u8],
    public_key: &RsaPublicKey,
) -> Result<bool, JwtError> {
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    let signature = Signature::try_from(signature).map_err(|_| JwtError::InvalidSignature)?;

    match verifying_key.verify(message.as_bytes(), &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}
