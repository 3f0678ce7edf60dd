//! Principal lookup against the external identity service.
//!
//! Registration, login, and approval all happen in that service. DocLedger
//! only asks it who an id belongs to: `GET {api_url}/v1/principals/{id}`
//! answers with a kind-tagged [`Principal`] or 404.

use std::time::Duration;

use async_trait::async_trait;
use docledger_core::{DirectoryError, Principal, PrincipalDirectory};
use reqwest::StatusCode;
use url::Url;

use crate::config::IdentityConfig;
use crate::retry::retry_send;

/// [`PrincipalDirectory`] backed by the identity service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPrincipalDirectory {
    http: reqwest::Client,
    config: IdentityConfig,
}

impl HttpPrincipalDirectory {
    /// Build a client from configuration.
    pub fn new(config: IdentityConfig) -> Result<Self, DirectoryError> {
        if config.api_url.cannot_be_a_base() {
            return Err(DirectoryError(format!(
                "identity service URL {} cannot be a base",
                config.api_url
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DirectoryError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Endpoint for one principal. The id is percent-encoded as a single
    /// path segment.
    pub fn principal_url(&self, id: &str) -> Url {
        let mut url = self.config.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1", "principals", id]);
        }
        url
    }
}

#[async_trait]
impl PrincipalDirectory for HttpPrincipalDirectory {
    async fn resolve(&self, id: &str) -> Result<Option<Principal>, DirectoryError> {
        let url = self.principal_url(id);
        let resp = retry_send("resolve_principal", || {
            let req = self.http.get(url.clone());
            match &self.config.token {
                Some(token) => req.bearer_auth(token.as_str()).send(),
                None => req.send(),
            }
        })
        .await
        .map_err(|e| DirectoryError(format!("identity service unreachable: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(principal_id = id, "principal not found");
                Ok(None)
            }
            status if status.is_success() => {
                let principal: Principal = resp
                    .json()
                    .await
                    .map_err(|e| DirectoryError(format!("unreadable principal for {id}: {e}")))?;
                if principal.id() != id {
                    return Err(DirectoryError(format!(
                        "identity service answered {} for {id}",
                        principal.id()
                    )));
                }
                Ok(Some(principal))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(DirectoryError(format!("identity service returned {status}: {body}")))
            }
        }
    }
}
