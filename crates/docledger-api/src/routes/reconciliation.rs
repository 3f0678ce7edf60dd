//! Operator view of issuances that were anchored but not recorded.
//!
//! An operator re-records the metadata out of band, then resolves the item
//! here to take it off the list.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use docledger_pipeline::UnrecordedIssuance;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingResponse {
    pub count: usize,
    pub items: Vec<UnrecordedIssuance>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/reconciliation/pending", get(list_pending))
        .route("/v1/reconciliation/:transaction_id/resolve", post(resolve_item))
}

/// GET /v1/reconciliation/pending: Unrecorded issuances, oldest first.
#[utoipa::path(
    get,
    path = "/v1/reconciliation/pending",
    responses(
        (status = 200, description = "Issuances awaiting metadata reconciliation", body = PendingResponse),
    ),
    tag = "reconciliation"
)]
async fn list_pending(State(state): State<AppState>) -> Json<PendingResponse> {
    let items = state.reconciliation.pending();
    Json(PendingResponse {
        count: items.len(),
        items,
    })
}

/// POST /v1/reconciliation/:transaction_id/resolve: Remove a reconciled item.
#[utoipa::path(
    post,
    path = "/v1/reconciliation/{transaction_id}/resolve",
    params(("transaction_id" = String, Path, description = "Ledger transaction of the unrecorded issuance")),
    responses(
        (status = 200, description = "Item removed from the queue", body = UnrecordedIssuance),
        (status = 404, description = "No pending item for this transaction", body = crate::error::ErrorBody),
    ),
    tag = "reconciliation"
)]
async fn resolve_item(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<UnrecordedIssuance>, AppError> {
    state
        .reconciliation
        .resolve(&transaction_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("pending reconciliation for {transaction_id}")))
}
