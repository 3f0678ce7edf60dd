//! Principal resolution.
//!
//! Accounts are managed by the external identity service. This route only
//! reports which kind of principal an id belongs to and its role.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use docledger_core::{Principal, PrincipalKind, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Kind and role of a resolved principal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    pub id: String,
    pub kind: PrincipalKind,
    pub role: Role,
    /// Owner id of an individual principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/principals/:id", get(resolve_principal))
}

/// GET /v1/principals/:id: Resolve an id to its principal kind and role.
#[utoipa::path(
    get,
    path = "/v1/principals/{id}",
    params(("id" = String, Path, description = "Principal id")),
    responses(
        (status = 200, description = "Resolved principal", body = PrincipalResponse),
        (status = 404, description = "No principal with this id", body = crate::error::ErrorBody),
        (status = 502, description = "Identity service unreachable", body = crate::error::ErrorBody),
        (status = 503, description = "Identity service not configured", body = crate::error::ErrorBody),
    ),
    tag = "principals"
)]
async fn resolve_principal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PrincipalResponse>, AppError> {
    let principal = state
        .require_directory()?
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("principal {id}")))?;

    let owner_id = match &principal {
        Principal::Individual { owner_id, .. } => Some(owner_id.to_string()),
        _ => None,
    };
    Ok(Json(PrincipalResponse {
        id: principal.id().to_string(),
        kind: principal.kind(),
        role: principal.role(),
        owner_id,
    }))
}
