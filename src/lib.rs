//! Signed Users
//!
//! Tamper-evident user registry export.
//! Every user's email is hashed with SHA-384 and the hex digest is signed
//! with the server's ECDSA P-384 key, so any holder of the public key can
//! verify exported records independently of transport.
//!
//! ## Architecture
//!
//! - **KeyStore**: loads or generates the PEM key pair on startup
//! - **Signer**: signs identity hashes with the private key
//! - **Codec**: protobuf export batch, structural checks only
//! - **Verifier**: recomputes hashes, checks signatures, drops failures

pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod signer;
pub mod state;
pub mod types;
pub mod validation;
pub mod verifier;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use keystore::KeyStore;
pub use signer::Signer;
pub use state::AppState;
pub use verifier::{VerificationReport, Verifier};
