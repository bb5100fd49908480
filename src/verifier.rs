//! Verification of signed user records
//!
//! A record is trusted only if its identity hashes to the claimed hash and
//! the signature over that hash's hex text checks out against the server
//! public key. Anything else, including undecodable signatures, is a plain
//! `false`. Batches fail closed per record: rejected records are dropped
//! from the trusted view and reported on the side.

use p384::ecdsa::VerifyingKey;

use crate::codec::{identity_hash, ExportedUser};
use crate::crypto::{parse_public_key, verify_signature, CryptoResult};
use crate::keystore::KeyStore;
use crate::types::UserId;

pub const REJECTED_RECORDS_METRIC: &str = "signed_users_records_rejected_total";

/// Check one identity against its claimed hash and signature
pub fn verify(
    identity: &str,
    claimed_hash: &str,
    signature_b64: &str,
    public_key: &VerifyingKey,
) -> bool {
    if identity_hash(identity) != claimed_hash {
        return false;
    }
    verify_signature(public_key, claimed_hash.as_bytes(), signature_b64).is_ok()
}

/// Outcome of verifying an export batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    /// Records that passed, in input order
    pub trusted: Vec<ExportedUser>,
    /// Ids of records that failed, in input order
    pub rejected: Vec<UserId>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Verifier bound to one public key
#[derive(Debug, Clone)]
pub struct Verifier {
    public_key: VerifyingKey,
}

impl Verifier {
    pub fn new(keys: &KeyStore) -> Self {
        Self::from_public_key(keys.verifying_key().clone())
    }

    pub fn from_public_key(public_key: VerifyingKey) -> Self {
        Self { public_key }
    }

    pub fn from_public_key_pem(pem: &str) -> CryptoResult<Self> {
        Ok(Self::from_public_key(parse_public_key(pem)?))
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn verify(&self, identity: &str, claimed_hash: &str, signature_b64: &str) -> bool {
        verify(identity, claimed_hash, signature_b64, &self.public_key)
    }

    pub fn verify_record(&self, user: &ExportedUser) -> bool {
        self.verify(&user.email, &user.email_hash, &user.signature)
    }

    /// Split a decoded batch into trusted records and rejected ids
    pub fn verify_batch(&self, batch: Vec<ExportedUser>) -> VerificationReport {
        let mut report = VerificationReport::default();

        for user in batch {
            if self.verify_record(&user) {
                report.trusted.push(user);
            } else {
                tracing::warn!("Dropping user {} that failed verification", user.id);
                report.rejected.push(user.id);
            }
        }

        if !report.rejected.is_empty() {
            metrics::counter!(REJECTED_RECORDS_METRIC).increment(report.rejected.len() as u64);
        }

        report
    }
}
