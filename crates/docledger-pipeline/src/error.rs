//! Pipeline error taxonomy.
//!
//! | Variant | Meaning | Retry? |
//! |---------|---------|--------|
//! | `Format` | bad file name, owner id, or hash; no network call was made | no |
//! | `Upload` | blob store failed; nothing anchored | yes |
//! | `Anchor` | uploaded, ledger write failed or unconfirmed | only if `is_transient` |
//! | `Unrecorded` | uploaded and anchored, metadata write failed | reconcile, never re-anchor |
//! | `Store` | metadata lookup failed | yes |

use docledger_client::{BlobError, LedgerError};
use docledger_core::FormatError;
use thiserror::Error;

use crate::issuance::IssuanceStage;
use crate::reconcile::UnrecordedIssuance;

/// Metadata store failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("metadata store error: {message}")]
pub struct StoreError {
    /// Backend-specific description.
    pub message: String,
}

impl StoreError {
    /// Wrap a backend message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from issuance and verification.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Content could not be read in full.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob store upload failed. Nothing was anchored.
    #[error("{source} (issuance stopped at {})", .stage.name())]
    Upload {
        stage: IssuanceStage,
        #[source]
        source: BlobError,
    },

    /// Ledger write failed after the content was uploaded.
    #[error("{source} (issuance stopped at {}, content already stored at {locator})", .stage.name())]
    Anchor {
        stage: IssuanceStage,
        locator: String,
        #[source]
        source: LedgerError,
    },

    /// Content anchored and stored but the metadata write failed.
    #[error(
        "document anchored in {} and stored at {} but not recorded (issuance stopped at {}): {}",
        .item.transaction_id, .item.storage_locator, .stage.name(), .item.reason
    )]
    Unrecorded {
        stage: IssuanceStage,
        item: Box<UnrecordedIssuance>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// The furthest issuance stage reached before the failure, if the error
    /// came from issuance after hashing.
    pub fn last_stage(&self) -> Option<&IssuanceStage> {
        match self {
            Self::Upload { stage, .. } | Self::Anchor { stage, .. } | Self::Unrecorded { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Errors that abort a whole batch run.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The archive itself could not be opened or indexed.
    #[error("archive could not be opened: {0}")]
    Archive(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use docledger_core::hash_bytes;

    #[test]
    fn anchor_error_mentions_locator_and_stage() {
        let err = PipelineError::Anchor {
            stage: IssuanceStage::AnchorPending {
                content_hash: hash_bytes(b"ab"),
                locator: "mem://sha256/ab".into(),
            },
            locator: "mem://sha256/ab".into(),
            source: LedgerError::InsufficientFunds("wallet empty".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("insufficient funds"));
        assert!(msg.contains("mem://sha256/ab"));
        assert!(msg.contains("stopped at anchor_pending"));
        assert_eq!(err.last_stage().map(IssuanceStage::name), Some("anchor_pending"));
    }

    #[test]
    fn upload_error_names_hashed_stage() {
        let err = PipelineError::Upload {
            stage: IssuanceStage::Hashed {
                content_hash: hash_bytes(b"ab"),
            },
            source: BlobError::Upload {
                file_name: "DL1234_Transcript.pdf".into(),
                reason: "HTTP 401".into(),
            },
        };
        assert!(err.to_string().contains("stopped at hashed"));
        assert_eq!(err.last_stage().map(IssuanceStage::name), Some("hashed"));
    }

    #[test]
    fn format_error_is_transparent() {
        let err: PipelineError = FormatError::InvalidOwnerId("x".into()).into();
        assert_eq!(err.to_string(), FormatError::InvalidOwnerId("x".into()).to_string());
        assert!(err.last_stage().is_none());
    }

    #[test]
    fn store_error_display() {
        assert_eq!(
            StoreError::new("connection reset").to_string(),
            "metadata store error: connection reset"
        );
    }
}
