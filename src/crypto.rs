//! Cryptographic primitives for signed user records
//!
//! SHA-384 hashing, ECDSA P-384 public key parsing, signature
//! decoding and verification.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use p384::ecdsa::signature::Verifier as _;
use p384::ecdsa::{Signature, VerifyingKey};
use p384::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha384};

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Crypto operation errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid public key format: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature format: {0}")]
    InvalidSignature(String),
    #[error("Signature verification failed")]
    VerificationFailed,
    #[error("Base64 decode error: {0}")]
    Base64Error(String),
}

/// Size of a P-384 signature in fixed-width `r || s` form
pub const FIXED_SIGNATURE_LEN: usize = 96;

/// Length of a hex-encoded SHA-384 digest
pub const SHA384_HEX_LEN: usize = 96;

/// Compute SHA-384 hash of data (lowercase hex)
pub fn sha384_hex(data: &[u8]) -> String {
    let mut hasher = Sha384::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Parse an SPKI PEM-encoded P-384 public key
pub fn parse_public_key(pem: &str) -> CryptoResult<VerifyingKey> {
    VerifyingKey::from_public_key_pem(pem.trim())
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Decode a base64 signature.
///
/// ASN.1 DER is what OpenSSL-style signers emit and is tried first; a
/// 96-byte payload that is not valid DER is read as fixed-width `r || s`.
pub fn decode_signature(signature_b64: &str) -> CryptoResult<Signature> {
    let bytes = BASE64
        .decode(signature_b64.trim())
        .map_err(|e| CryptoError::Base64Error(e.to_string()))?;

    match Signature::from_der(&bytes) {
        Ok(sig) => Ok(sig),
        Err(_) if bytes.len() == FIXED_SIGNATURE_LEN => Signature::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string())),
        Err(e) => Err(CryptoError::InvalidSignature(e.to_string())),
    }
}

/// Verify a base64 signature over `message` (ECDSA P-384 / SHA-384)
pub fn verify_signature(
    public_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> CryptoResult<()> {
    let signature = decode_signature(signature_b64)?;
    public_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Short key identifier derived from the public key PEM
pub fn key_id(public_key_pem: &str) -> String {
    let fingerprint = sha384_hex(public_key_pem.as_bytes());
    format!("kid_{}", &fingerprint[..16])
}
