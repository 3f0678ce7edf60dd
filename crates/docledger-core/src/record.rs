//! # Document Records
//!
//! A [`DocumentRecord`] is the searchable metadata written once both the
//! blob upload and the ledger anchor have succeeded. Records are never
//! modified after creation. Several records may share an owner, and the same
//! content may be recorded more than once.
//!
//! A [`VerificationResult`] is computed per request and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::digest::ContentDigest;
use crate::identity::{DocumentType, OwnerId};

/// Persisted metadata for one issued document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DocumentRecord {
    /// Row identity assigned by the recorder.
    pub id: Uuid,
    /// Owner the document was issued to.
    #[schema(value_type = String, example = "DL1234")]
    pub owner_id: OwnerId,
    /// Base64 SHA-256 of the stored bytes.
    #[schema(value_type = String)]
    pub content_hash: ContentDigest,
    /// Blob store URI that resolves to the issued bytes.
    pub storage_locator: String,
    /// Type label from the filename or issue request.
    #[schema(value_type = String, example = "Degree-Certificate")]
    pub document_type: DocumentType,
    /// Assigned by the recorder at insertion.
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the issuance pipeline when recording a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Owner the document was issued to.
    pub owner_id: OwnerId,
    /// Digest that was anchored on the ledger.
    pub content_hash: ContentDigest,
    /// Locator returned by the blob store.
    pub storage_locator: String,
    /// Type label.
    pub document_type: DocumentType,
}

impl NewDocument {
    /// Materialise a record with a fresh id and the current time.
    pub fn into_record(self) -> DocumentRecord {
        DocumentRecord {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            content_hash: self.content_hash,
            storage_locator: self.storage_locator,
            document_type: self.document_type,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of checking one file against an owner's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerificationResult {
    /// Name of the file that was checked.
    pub file_name: String,
    /// Owner parsed from the filename.
    #[schema(value_type = String)]
    pub owner_id: OwnerId,
    /// Hash of the presented bytes.
    #[schema(value_type = String)]
    pub content_hash: ContentDigest,
    /// True when some candidate record carries exactly this hash.
    pub matched: bool,
    /// First matching record in insertion order.
    pub matched_record: Option<DocumentRecord>,
    /// Every record held for the owner, in insertion order.
    pub candidate_records: Vec<DocumentRecord>,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

impl VerificationResult {
    /// True when the owner has no records at all.
    pub fn owner_unknown(&self) -> bool {
        self.candidate_records.is_empty()
    }
}
