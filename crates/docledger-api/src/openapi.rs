//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DocLedger API",
        version = "0.1.0",
        description = "Document issuance with ledger anchoring, owner-scoped and ledger verification, batch processing, and metadata lookup.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::documents::issue_document,
        crate::routes::documents::verify_document,
        crate::routes::documents::verify_owner,
        crate::routes::documents::list_owner_documents,
        crate::routes::batches::issue_batch,
        crate::routes::batches::verify_batch,
        crate::routes::reconciliation::list_pending,
        crate::routes::reconciliation::resolve_item,
        crate::routes::principals::resolve_principal,
    ),
    components(schemas(
        docledger_core::DocumentRecord,
        docledger_core::VerificationResult,
        docledger_core::Role,
        docledger_core::PrincipalKind,
        docledger_pipeline::IssuanceReceipt,
        docledger_pipeline::UnrecordedIssuance,
        crate::routes::documents::IssueForm,
        crate::routes::documents::VerifyForm,
        crate::routes::documents::NamedDocumentForm,
        crate::routes::documents::VerifyResponse,
        crate::routes::batches::ArchiveForm,
        crate::routes::reconciliation::PendingResponse,
        crate::routes::principals::PrincipalResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "documents", description = "Single-document issuance, verification, and lookup"),
        (name = "batches", description = "Zip archive issuance and verification"),
        (name = "reconciliation", description = "Anchored documents whose metadata write failed"),
        (name = "principals", description = "Principal kind and role resolution"),
    )
)]
pub struct ApiDoc;

/// Router serving the OpenAPI document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
