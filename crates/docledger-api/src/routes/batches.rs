//! # Batch API
//!
//! Issue or verify every file in an uploaded zip archive. Entries are
//! processed one at a time and each failure is reported per entry; only an
//! archive that cannot be opened fails the request.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use docledger_core::VerificationResult;
use docledger_pipeline::{BatchProcessor, BatchReport, IssuanceReceipt, Progress};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::read_form;
use crate::state::AppState;

/// Multipart form carrying the archive.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ArchiveForm {
    #[schema(value_type = String, format = Binary)]
    archive: Vec<u8>,
}

/// Build the batches router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/batches/issue", post(issue_batch))
        .route("/v1/batches/verify", post(verify_batch))
}

async fn read_archive(multipart: Result<Multipart, MultipartRejection>) -> Result<Vec<u8>, AppError> {
    let mut form = read_form(multipart).await?;
    Ok(form.take_file("archive")?.bytes)
}

fn log_progress(kind: &'static str) -> impl FnMut(Progress) + Send {
    move |p: Progress| {
        tracing::debug!(kind, processed = p.processed, total = p.total, "batch progress");
    }
}

/// POST /v1/batches/issue: Issue every document in a zip archive.
#[utoipa::path(
    post,
    path = "/v1/batches/issue",
    request_body(content = ArchiveForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch report: total, succeeded entries with issuance receipts, failed entries with reasons"),
        (status = 400, description = "Archive could not be opened", body = crate::error::ErrorBody),
        (status = 503, description = "Anchoring not configured", body = crate::error::ErrorBody),
    ),
    tag = "batches"
)]
async fn issue_batch(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchReport<IssuanceReceipt>>, AppError> {
    let archive = read_archive(multipart).await?;
    let pipeline = state.require_pipeline()?.clone();

    let report = BatchProcessor::new(pipeline)
        .run(archive, log_progress("issue"))
        .await?;
    Ok(Json(report))
}

/// POST /v1/batches/verify: Verify every document in a zip archive against its owner's records.
#[utoipa::path(
    post,
    path = "/v1/batches/verify",
    request_body(content = ArchiveForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch report: total, matched entries, and failed entries with their verification results"),
        (status = 400, description = "Archive could not be opened", body = crate::error::ErrorBody),
    ),
    tag = "batches"
)]
async fn verify_batch(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchReport<VerificationResult>>, AppError> {
    let archive = read_archive(multipart).await?;

    let report = BatchProcessor::new(state.verification_engine())
        .run(archive, log_progress("verify"))
        .await?;
    Ok(Json(report))
}
