//! # docledger-api: Axum HTTP Service for DocLedger
//!
//! ## API Surface
//!
//! | Prefix | Module | Purpose |
//! |--------|--------|---------|
//! | `/v1/documents/*` | [`routes::documents`] | issue, verify, verify-owner, owner lookup |
//! | `/v1/batches/*` | [`routes::batches`] | zip archive issuance and verification |
//! | `/v1/reconciliation/*` | [`routes::reconciliation`] | anchored but unrecorded issuances |
//! | `/v1/principals/*` | [`routes::principals`] | principal kind and role |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → BodyLimit → Handler
//! ```
//!
//! Authentication is performed by the gateway in front of this service.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::extractors::MAX_UPLOAD_BYTES;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    app_with_metrics(state, ApiMetrics::new())
}

/// Like [`app`], recording into the given metrics handle.
pub fn app_with_metrics(state: AppState, metrics: ApiMetrics) -> Router {
    let api = Router::new()
        .merge(routes::documents::router())
        .merge(routes::batches::router())
        .merge(routes::reconciliation::router())
        .merge(routes::principals::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
