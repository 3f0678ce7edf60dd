//! Service configuration, read once from the environment in `main`.

use docledger_client::{BlobStoreConfig, ConfigError, IdentityConfig, LedgerConfig};
use zeroize::Zeroizing;

/// Process-wide settings.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Port to bind the HTTP server on.
    pub port: u16,
    /// Postgres connection string. May embed a password.
    pub database_url: Option<Zeroizing<String>>,
    /// Ledger connection, when `LEDGER_RPC_URL` and friends are set.
    pub ledger: Option<LedgerConfig>,
    /// Pinning service connection, when `BLOB_JWT` and friends are set.
    pub blob: Option<BlobStoreConfig>,
    /// Identity service connection, when `IDENTITY_API_URL` is set.
    pub identity: Option<IdentityConfig>,
    /// Substitute in-process ledger and blob store for missing upstreams.
    pub dev_services: bool,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("ledger", &self.ledger)
            .field("blob", &self.blob)
            .field("identity", &self.identity)
            .field("dev_services", &self.dev_services)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            ledger: None,
            blob: None,
            identity: None,
            dev_services: false,
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Load from environment variables.
    ///
    /// A missing upstream section is not an error: the corresponding routes
    /// answer 503 instead. A section that is present but malformed (e.g. a
    /// bad URL) is.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL").ok().map(Zeroizing::new),
            ledger: optional(LedgerConfig::from_env())?,
            blob: optional(BlobStoreConfig::from_env())?,
            identity: optional(IdentityConfig::from_env())?,
            dev_services: flag("DOCLEDGER_DEV_SERVICES"),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

fn optional<T>(loaded: Result<T, ConfigError>) -> Result<Option<T>, ConfigError> {
    match loaded {
        Ok(cfg) => Ok(Some(cfg)),
        Err(ConfigError::Missing(var)) => {
            tracing::debug!("{var} not set");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn flag(var: &str) -> bool {
    matches!(
        std::env::var(var).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}
