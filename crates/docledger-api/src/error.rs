//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Pipeline, ledger, and blob store failures are mapped to HTTP status codes
//! with a JSON body carrying a machine-readable code. Internal error details
//! are logged but never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docledger_client::LedgerError;
use docledger_core::{DirectoryError, FormatError};
use docledger_pipeline::{BatchError, PipelineError, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "LEDGER_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, e.g. the transaction id of a partial failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed validation, e.g. a non-conforming filename (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Ledger or blob store unreachable or misbehaving (502).
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Ledger refused or did not confirm the write (502).
    #[error("ledger rejected the transaction: {0}")]
    LedgerRejected(String),

    /// Document anchored and stored but not recorded (500). The details
    /// carry what an operator needs to reconcile.
    #[error("{message}")]
    PartialFailure {
        message: String,
        details: serde_json::Value,
    },

    /// Issuance stopped part way. Status and code follow `cause`; the
    /// details name the last stage reached.
    #[error("{cause}")]
    IssuanceFailed {
        cause: Box<AppError>,
        details: serde_json::Value,
    },

    /// Anchoring services are not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
            Self::LedgerRejected(_) => (StatusCode::BAD_GATEWAY, "LEDGER_REJECTED"),
            Self::PartialFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_FAILURE"),
            Self::IssuanceFailed { cause, .. } => cause.status_and_code(),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::IssuanceFailed { cause, .. } if matches!(**cause, Self::Internal(_)) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::PartialFailure { .. } => tracing::error!(error = %self, "partial issuance failure"),
            Self::UpstreamUnavailable(_) | Self::LedgerRejected(_) | Self::IssuanceFailed { .. } => {
                tracing::warn!(error = %self, "upstream failure")
            }
            _ => {}
        }

        let details = match self {
            Self::PartialFailure { details, .. } | Self::IssuanceFailed { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FormatError> for AppError {
    fn from(err: FormatError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::InsufficientFunds(_)
            | LedgerError::TransactionReverted { .. }
            | LedgerError::ConfirmationTimeout { .. } => Self::LedgerRejected(err.to_string()),
            LedgerError::Network { .. }
            | LedgerError::Rpc { .. }
            | LedgerError::InvalidResponse { .. } => Self::UpstreamUnavailable(err.to_string()),
            LedgerError::Config(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Format(e) => e.into(),
            PipelineError::Io(e) => Self::BadRequest(format!("document could not be read: {e}")),
            PipelineError::Upload { stage, source } => Self::IssuanceFailed {
                cause: Box::new(Self::UpstreamUnavailable(source.to_string())),
                details: serde_json::json!({ "stage": stage.name() }),
            },
            PipelineError::Anchor { stage, locator, source } => {
                let cause = match Self::from(source) {
                    Self::LedgerRejected(msg) => Self::LedgerRejected(format!("{msg} (content stored at {locator})")),
                    other => other,
                };
                Self::IssuanceFailed {
                    cause: Box::new(cause),
                    details: serde_json::json!({ "stage": stage.name(), "locator": locator }),
                }
            }
            PipelineError::Unrecorded { stage, item } => Self::PartialFailure {
                message: format!(
                    "document anchored in {} but its metadata could not be recorded",
                    item.transaction_id
                ),
                details: serde_json::json!({
                    "stage": stage.name(),
                    "transaction_id": item.transaction_id,
                    "locator": item.storage_locator,
                    "content_hash": item.content_hash.to_base64(),
                    "owner_id": item.owner_id.as_str(),
                }),
            },
            PipelineError::Store(e) => e.into(),
        }
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docledger_client::BlobError;
    use docledger_client::LedgerReceipt;
    use docledger_core::{hash_bytes, DocumentType, OwnerId};
    use docledger_pipeline::{IssuanceStage, UnrecordedIssuance};
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn format_error_is_validation() {
        let err = AppError::from(PipelineError::from(FormatError::InvalidFileName {
            name: "certificate.pdf".into(),
            reason: "missing owner prefix",
        }));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn upload_failure_is_upstream_unavailable() {
        let err = AppError::from(PipelineError::Upload {
            stage: IssuanceStage::Hashed {
                content_hash: hash_bytes(b"x"),
            },
            source: BlobError::Upload {
                file_name: "DL1234_Transcript.pdf".into(),
                reason: "HTTP 401".into(),
            },
        });
        assert_eq!(err.status_and_code(), (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"));
    }

    #[test]
    fn ledger_rejections_map_to_ledger_rejected() {
        for source in [
            LedgerError::InsufficientFunds("balance 0".into()),
            LedgerError::TransactionReverted {
                transaction_id: Some("0xabc".into()),
                reason: "status 0x0".into(),
            },
            LedgerError::ConfirmationTimeout {
                transaction_id: "0xabc".into(),
                waited_secs: 120,
            },
        ] {
            let err = AppError::from(PipelineError::Anchor {
                stage: IssuanceStage::AnchorPending {
                    content_hash: hash_bytes(b"x"),
                    locator: "mem://sha256/x".into(),
                },
                locator: "mem://sha256/x".into(),
                source,
            });
            assert_eq!(err.status_and_code(), (StatusCode::BAD_GATEWAY, "LEDGER_REJECTED"));
        }
    }

    #[test]
    fn ledger_network_error_is_upstream_unavailable() {
        let err = AppError::from(LedgerError::Network {
            method: "eth_call".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(err.status_and_code().1, "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn directory_error_is_upstream_unavailable() {
        let err = AppError::from(DirectoryError("connection refused".into()));
        assert_eq!(err.status_and_code(), (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"));
    }

    #[test]
    fn store_error_is_internal() {
        let err = AppError::from(PipelineError::Store(StoreError::new("pool timed out")));
        assert_eq!(err.status_and_code().1, "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn partial_failure_carries_reconciliation_details() {
        let item = UnrecordedIssuance {
            owner_id: OwnerId::new("DL1234").unwrap(),
            document_type: DocumentType::new("Transcript").unwrap(),
            content_hash: hash_bytes(b"x"),
            storage_locator: "mem://sha256/x".into(),
            transaction_id: "0xfeed".into(),
            reason: "db down".into(),
            occurred_at: Utc::now(),
        };
        let stage = IssuanceStage::AnchorConfirmed {
            content_hash: item.content_hash,
            locator: item.storage_locator.clone(),
            receipt: LedgerReceipt {
                transaction_id: "0xfeed".into(),
                block_number: 3,
                gas_used: None,
            },
        };
        let (status, body) = response_parts(AppError::from(PipelineError::Unrecorded {
            stage,
            item: Box::new(item),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "PARTIAL_FAILURE");
        let details = body.error.details.unwrap();
        assert_eq!(details["stage"], "anchor_confirmed");
        assert_eq!(details["transaction_id"], "0xfeed");
        assert_eq!(details["locator"], "mem://sha256/x");
        assert!(!body.error.message.contains("db down"));
    }

    #[tokio::test]
    async fn anchor_failure_body_names_stage() {
        let err = AppError::from(PipelineError::Anchor {
            stage: IssuanceStage::AnchorPending {
                content_hash: hash_bytes(b"x"),
                locator: "mem://sha256/x".into(),
            },
            locator: "mem://sha256/x".into(),
            source: LedgerError::InsufficientFunds("balance 0".into()),
        });
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "LEDGER_REJECTED");
        assert!(body.error.message.contains("content stored at mem://sha256/x"));
        let details = body.error.details.unwrap();
        assert_eq!(details["stage"], "anchor_pending");
        assert_eq!(details["locator"], "mem://sha256/x");
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn into_response_service_unavailable() {
        let (status, body) =
            response_parts(AppError::ServiceUnavailable("ledger not configured".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.message.contains("ledger not configured"));
    }

    #[test]
    fn error_body_skips_absent_details() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "TEST".to_string(),
                message: "test message".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }
}
