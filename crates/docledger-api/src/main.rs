//! # docledger-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use std::sync::Arc;

use docledger_api::config::ServiceConfig;
use docledger_api::db::documents::PgRecorder;
use docledger_api::state::AppState;
use docledger_client::{EvmLedgerClient, HttpPrincipalDirectory, PinningBlobStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_json);

    let database_url = config.database_url.as_ref().map(|url| url.as_str());
    let db_pool = docledger_api::db::init_pool(database_url).await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;
    let state = match db_pool {
        Some(pool) => AppState::with_recorder(Arc::new(PgRecorder::new(pool))),
        None => AppState::new(),
    };

    let state = match (config.blob.clone(), config.ledger.clone()) {
        (Some(blob_config), Some(ledger_config)) => {
            let blob = PinningBlobStore::new(blob_config).map_err(|e| {
                tracing::error!("Failed to create blob store client: {e}");
                e
            })?;
            let ledger = EvmLedgerClient::new(ledger_config).map_err(|e| {
                tracing::error!("Failed to create ledger client: {e}");
                e
            })?;
            tracing::info!(chain = %ledger.config().chain_name, "ledger and blob store configured");
            state.with_services(Arc::new(blob), Arc::new(ledger))
        }
        _ if config.dev_services => {
            tracing::warn!(
                "DOCLEDGER_DEV_SERVICES set: using the in-process ledger and blob store. \
                 Nothing is anchored on a real chain."
            );
            state.with_dev_services()
        }
        (blob, ledger) => {
            tracing::warn!(
                blob_configured = blob.is_some(),
                ledger_configured = ledger.is_some(),
                "Anchoring services not configured. Issue and ledger verify endpoints will return 503."
            );
            state
        }
    };

    let state = match config.identity.clone() {
        Some(identity_config) => {
            let directory = HttpPrincipalDirectory::new(identity_config).map_err(|e| {
                tracing::error!("Failed to create identity service client: {e}");
                e
            })?;
            state.with_directory(Arc::new(directory))
        }
        None => {
            tracing::warn!("IDENTITY_API_URL not set. Principal lookups will return 503.");
            state
        }
    };

    let app = docledger_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("DocLedger API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
