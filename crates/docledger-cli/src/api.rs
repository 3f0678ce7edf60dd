//! # API Client
//!
//! Thin reqwest client over the DocLedger HTTP service. Issuance and lookup
//! go through the service; verification runs locally by plugging this client
//! in as the verification engine's [`RecordSource`].

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use docledger_core::{hash_bytes, parse_file_name, DocumentRecord, DocumentType, OwnerId};
use docledger_pipeline::{EntryHandler, EntryVerdict, RecordSource, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Issuance response returned by `/v1/documents/issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedDocument {
    pub transaction_id: String,
    pub block_number: u64,
    pub chain: String,
    pub locator: String,
    pub record: DocumentRecord,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Client for one DocLedger service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Issue `bytes` for `owner_id`. The locally computed hash is sent along
    /// so the service rejects content altered in transit.
    pub async fn issue(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        owner_id: &OwnerId,
        document_type: &DocumentType,
    ) -> Result<IssuedDocument> {
        let content_hash = hash_bytes(&bytes);
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("owner_id", owner_id.to_string())
            .text("document_type", document_type.to_string())
            .text("content_hash", content_hash.to_base64())
            .part("document", part);

        let url = self.endpoint("/v1/documents/issue");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        decode(response).await
    }

    /// All records for `owner_id`, oldest first.
    pub async fn lookup(&self, owner_id: &OwnerId) -> Result<Vec<DocumentRecord>> {
        let url = self.endpoint(&format!("/v1/documents/owner/{owner_id}"));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("unexpected response body");
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => match error.details {
            Some(details) => bail!("{} ({status}): {} {details}", error.code, error.message),
            None => bail!("{} ({status}): {}", error.code, error.message),
        },
        Err(_) => bail!("HTTP {status}: {body}"),
    }
}

#[async_trait]
impl RecordSource for ApiClient {
    async fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<DocumentRecord>, StoreError> {
        self.lookup(owner_id)
            .await
            .map_err(|e| StoreError::new(format!("{e:#}")))
    }
}

/// Issues each archive entry through the service. Owner and type come from
/// the entry's filename, which is checked before any request is sent.
#[async_trait]
impl EntryHandler for ApiClient {
    type Output = IssuedDocument;
    type Error = anyhow::Error;

    async fn handle(&self, file_name: &str, bytes: Vec<u8>) -> Result<EntryVerdict<IssuedDocument>> {
        let parsed = parse_file_name(file_name)?;
        let issued = self
            .issue(&parsed.file_name(), bytes, &parsed.owner_id, &parsed.document_type)
            .await?;
        Ok(EntryVerdict::Accepted(issued))
    }
}
