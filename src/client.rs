//! Verifying client for the binary export
//!
//! Fetches the server public key once, then downloads, decodes and verifies
//! exports. Records that fail verification never reach the caller's trusted
//! set; their ids are listed in the report.

use reqwest::header::ACCEPT;
use tokio::sync::OnceCell;

use crate::api::OCTET_STREAM;
use crate::codec::{self, CodecError, ExportedUser};
use crate::crypto::CryptoError;
use crate::verifier::{VerificationReport, Verifier};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Invalid server public key: {0}")]
    PublicKey(#[from] CryptoError),
    #[error("Invalid export: {0}")]
    Codec(#[from] CodecError),
}

pub struct ExportClient {
    base_url: String,
    http: reqwest::Client,
    verifier: OnceCell<Verifier>,
}

impl ExportClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            verifier: OnceCell::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, accept: &str) -> ClientResult<reqwest::Response> {
        let url = self.url(path);
        let resp = self.http.get(&url).header(ACCEPT, accept).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(resp)
    }

    /// Verifier for the server key, fetched on first use
    pub async fn verifier(&self) -> ClientResult<&Verifier> {
        self.verifier
            .get_or_try_init(|| async {
                let pem = self.get("/keys/public.pem", "*/*").await?.text().await?;
                tracing::debug!("Fetched server public key from {}", self.base_url);
                Ok::<_, ClientError>(Verifier::from_public_key_pem(&pem)?)
            })
            .await
    }

    /// Download and decode the export without verifying it
    pub async fn fetch_export(&self) -> ClientResult<Vec<ExportedUser>> {
        let bytes = self.get("/users/export", OCTET_STREAM).await?.bytes().await?;
        Ok(codec::decode(&bytes)?)
    }

    /// Download the export and keep only records that verify
    pub async fn fetch_trusted(&self) -> ClientResult<VerificationReport> {
        let verifier = self.verifier().await?;
        let batch = self.fetch_export().await?;
        let report = verifier.verify_batch(batch);
        if !report.is_clean() {
            tracing::warn!(
                "{} exported users failed verification and were dropped",
                report.rejected.len()
            );
        }
        Ok(report)
    }
}
