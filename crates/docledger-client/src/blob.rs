//! # Blob Store Clients
//!
//! Document bytes live in a content-addressed store. An upload returns a
//! locator URI that later resolves to byte-identical content. The locator is
//! not linked to the ledger; integrity rests on the recorded content hash.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docledger_core::hash_bytes;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::config::BlobStoreConfig;
use crate::error::BlobError;
use crate::retry::retry_send;

/// Content-addressed storage for document bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return a retrieval locator.
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, BlobError>;

    /// Fetch the bytes behind a locator returned by [`BlobStore::upload`].
    async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, BlobError>;
}

/// Pinning-service client (Pinata-compatible `pinFileToIPFS`).
#[derive(Debug, Clone)]
pub struct PinningBlobStore {
    http: reqwest::Client,
    config: BlobStoreConfig,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinningBlobStore {
    /// Build a client from configuration.
    pub fn new(config: BlobStoreConfig) -> Result<Self, BlobError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BlobError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn pin_endpoint(&self) -> String {
        format!(
            "{}/pinning/pinFileToIPFS",
            self.config.api_url.as_str().trim_end_matches('/')
        )
    }

    /// Gateway locator for a content id.
    pub fn locator_for(&self, cid: &str) -> String {
        format!(
            "{}/ipfs/{cid}",
            self.config.gateway_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl BlobStore for PinningBlobStore {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let endpoint = self.pin_endpoint();
        let fail = |reason: String| BlobError::Upload {
            file_name: file_name.to_string(),
            reason,
        };

        // Pinning is content-addressed, so repeating an upload is harmless.
        let resp = retry_send("pinFileToIPFS", || {
            let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
            let form = reqwest::multipart::Form::new().part("file", part);
            self.http
                .post(&endpoint)
                .bearer_auth(self.config.jwt.as_str())
                .multipart(form)
                .send()
        })
        .await
        .map_err(|e| fail(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(fail(format!("pinning service returned {status}: {body}")));
        }

        let pinned: PinResponse = resp
            .json()
            .await
            .map_err(|e| fail(format!("unreadable pin response: {e}")))?;

        let locator = self.locator_for(&pinned.ipfs_hash);
        tracing::info!(file_name, cid = %pinned.ipfs_hash, "document pinned");
        Ok(locator)
    }

    async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, BlobError> {
        let fail = |reason: String| BlobError::Retrieve {
            locator: locator.to_string(),
            reason,
        };

        let resp = retry_send("gateway_fetch", || self.http.get(locator).send())
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(fail(format!("gateway returned {}", resp.status())));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| fail(e.to_string()))
    }
}

/// In-memory content-addressed store. Locators are `mem://sha256/<hex>`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    uploads: AtomicU64,
    reject_uploads: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail until switched back.
    pub fn set_reject_uploads(&self, reject: bool) {
        self.reject_uploads.store(reject, Ordering::SeqCst);
    }

    /// Number of upload attempts, including rejected ones.
    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, BlobError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(BlobError::Upload {
                file_name: file_name.to_string(),
                reason: "store is rejecting uploads".into(),
            });
        }
        let locator = format!("mem://sha256/{}", hash_bytes(bytes).to_hex());
        self.blobs.write().insert(locator.clone(), bytes.to_vec());
        Ok(locator)
    }

    async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .read()
            .get(locator)
            .cloned()
            .ok_or_else(|| BlobError::Retrieve {
                locator: locator.to_string(),
                reason: "no such blob".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_bytes() {
        let store = MemoryBlobStore::new();
        let locator = store.upload("DL1234_Transcript.pdf", b"pdf bytes").await.unwrap();
        assert!(locator.starts_with("mem://sha256/"));
        assert_eq!(store.retrieve(&locator).await.unwrap(), b"pdf bytes");
    }

    #[tokio::test]
    async fn memory_store_is_content_addressed() {
        let store = MemoryBlobStore::new();
        let a = store.upload("a.pdf", b"same").await.unwrap();
        let b = store.upload("b.pdf", b"same").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.upload_count(), 2);
    }

    #[tokio::test]
    async fn memory_store_rejects_when_told() {
        let store = MemoryBlobStore::new();
        store.set_reject_uploads(true);
        assert!(matches!(
            store.upload("x.pdf", b"x").await,
            Err(BlobError::Upload { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_locator_fails() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.retrieve("mem://sha256/00").await,
            Err(BlobError::Retrieve { .. })
        ));
    }

    #[test]
    fn gateway_locator_shape() {
        let cfg = BlobStoreConfig::new(
            url::Url::parse("https://api.pinata.cloud").unwrap(),
            url::Url::parse("https://gateway.example/").unwrap(),
            "jwt",
        );
        let store = PinningBlobStore::new(cfg).unwrap();
        assert_eq!(store.locator_for("QmXyz"), "https://gateway.example/ipfs/QmXyz");
    }
}
