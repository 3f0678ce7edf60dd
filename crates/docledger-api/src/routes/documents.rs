//! # Document API
//!
//! Single-document issuance, verification, and owner lookup.
//!
//! Two verification routes answer different questions:
//!
//! - `/v1/documents/verify` asks the ledger whether the hash was ever
//!   anchored, regardless of owner.
//! - `/v1/documents/verify-owner` checks the file against the records of the
//!   owner named in its filename.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use docledger_core::{hash_bytes, DocumentRecord, DocumentType, FormatError, OwnerId, VerificationResult};
use docledger_pipeline::{IssuanceReceipt, IssueRequest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::read_form;
use crate::state::AppState;

/// Ledger verification result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// True when the hash is anchored on the ledger.
    pub is_valid: bool,
    /// Base64 SHA-256 of the uploaded bytes.
    pub content_hash: String,
    /// Blob store locator of the earliest matching record, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

/// Multipart form for `/v1/documents/issue`. Documentation only; the
/// handler reads the parts directly.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct IssueForm {
    #[schema(example = "DL1234")]
    owner_id: String,
    #[schema(example = "Transcript")]
    document_type: String,
    /// Base64 SHA-256 computed by the client; must match the upload.
    content_hash: Option<String>,
    #[schema(value_type = String, format = Binary)]
    document: Vec<u8>,
}

/// Multipart form for `/v1/documents/verify`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct VerifyForm {
    content_hash: Option<String>,
    #[schema(value_type = String, format = Binary)]
    document: Vec<u8>,
}

/// Multipart form for `/v1/documents/verify-owner`. The part's filename
/// must follow the naming convention.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct NamedDocumentForm {
    #[schema(value_type = String, format = Binary)]
    document: Vec<u8>,
}

/// Build the documents router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/documents/issue", post(issue_document))
        .route("/v1/documents/verify", post(verify_document))
        .route("/v1/documents/verify-owner", post(verify_owner))
        .route("/v1/documents/owner/:owner_id", get(list_owner_documents))
}

/// POST /v1/documents/issue: Upload, anchor, and record one document.
///
/// Form fields: `owner_id`, `document_type`, optional `content_hash`, and the
/// file part `document`.
#[utoipa::path(
    post,
    path = "/v1/documents/issue",
    request_body(content = IssueForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document issued", body = IssuanceReceipt),
        (status = 422, description = "Invalid owner id, document type, or content hash", body = crate::error::ErrorBody),
        (status = 500, description = "Anchored but not recorded", body = crate::error::ErrorBody),
        (status = 502, description = "Blob store or ledger failure", body = crate::error::ErrorBody),
        (status = 503, description = "Anchoring not configured", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
async fn issue_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<IssuanceReceipt>), AppError> {
    let mut form = read_form(multipart).await?;
    let owner_id = OwnerId::new(form.require_text("owner_id")?)?;
    let document_type = DocumentType::new(form.require_text("document_type")?)?;
    let claimed_hash = form.content_hash()?;
    let file = form.take_file("document")?;
    let pipeline = state.require_pipeline()?;

    let file_name = file
        .file_name
        .unwrap_or_else(|| format!("{owner_id}_{document_type}"));
    let receipt = pipeline
        .issue(IssueRequest {
            owner_id,
            document_type,
            file_name,
            bytes: file.bytes,
            claimed_hash,
        })
        .await?;

    tracing::info!(
        owner_id = %receipt.record.owner_id,
        transaction_id = %receipt.transaction_id,
        "document issued"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST /v1/documents/verify: Check whether a document's hash is anchored.
#[utoipa::path(
    post,
    path = "/v1/documents/verify",
    request_body(content = VerifyForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Ledger membership of the document hash", body = VerifyResponse),
        (status = 422, description = "Claimed hash does not match the upload", body = crate::error::ErrorBody),
        (status = 503, description = "Ledger not configured", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
async fn verify_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let mut form = read_form(multipart).await?;
    let claimed_hash = form.content_hash()?;
    let file = form.take_file("document")?;
    let ledger = state.require_ledger()?;

    let content_hash = hash_bytes(&file.bytes);
    if let Some(claimed) = claimed_hash {
        if claimed != content_hash {
            return Err(FormatError::HashMismatch {
                claimed: claimed.to_base64(),
                computed: content_hash.to_base64(),
            }
            .into());
        }
    }

    let is_valid = ledger.verify_document(&content_hash).await?;
    let locator = if is_valid {
        state
            .recorder
            .find_by_hash(&content_hash)
            .await?
            .map(|r| r.storage_locator)
    } else {
        None
    };

    tracing::info!(content_hash = %content_hash, is_valid, "ledger verification");
    Ok(Json(VerifyResponse {
        is_valid,
        content_hash: content_hash.to_base64(),
        locator,
    }))
}

/// POST /v1/documents/verify-owner: Verify a named file against its owner's records.
#[utoipa::path(
    post,
    path = "/v1/documents/verify-owner",
    request_body(content = NamedDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Verification result", body = VerificationResult),
        (status = 422, description = "Filename does not follow the naming convention", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
async fn verify_owner(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerificationResult>, AppError> {
    let mut form = read_form(multipart).await?;
    let file = form.take_file("document")?;
    let file_name = file
        .file_name
        .ok_or_else(|| AppError::BadRequest("document part has no filename".into()))?;

    let result = state
        .verification_engine()
        .verify(&file_name, &file.bytes)
        .await?;
    Ok(Json(result))
}

/// GET /v1/documents/owner/:owner_id: All records for an owner, oldest first.
#[utoipa::path(
    get,
    path = "/v1/documents/owner/{owner_id}",
    params(("owner_id" = String, Path, description = "Two uppercase letters and four digits")),
    responses(
        (status = 200, description = "Records in insertion order", body = Vec<DocumentRecord>),
        (status = 422, description = "Malformed owner id", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
async fn list_owner_documents(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<DocumentRecord>>, AppError> {
    let owner_id = OwnerId::new(owner_id)?;
    let records = state.recorder.records_for_owner(&owner_id).await?;
    Ok(Json(records))
}
