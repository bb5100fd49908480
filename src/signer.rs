//! Server-side signing of identity hashes

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use p384::ecdsa::signature::Signer as _;
use p384::ecdsa::{Signature, SigningKey};

use crate::codec::identity_hash;
use crate::keystore::KeyStore;
use crate::types::SignedIdentity;

/// ECDSA P-384 / SHA-384 signer over the server's private key
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    pub fn new(keys: &KeyStore) -> Self {
        Self {
            key: keys.signing_key().clone(),
        }
    }

    /// Sign the UTF-8 bytes of `message` as given. Returns base64 DER.
    pub fn sign(&self, message: &str) -> String {
        let signature: Signature = self.key.sign(message.as_bytes());
        BASE64.encode(signature.to_der().as_bytes())
    }

    /// Hash an identity and sign the hex digest text
    pub fn sign_identity(&self, identity: &str) -> SignedIdentity {
        let hash = identity_hash(identity);
        let signature = self.sign(&hash);
        SignedIdentity {
            raw_identity: identity.to_string(),
            identity_hash: hash,
            signature,
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}
