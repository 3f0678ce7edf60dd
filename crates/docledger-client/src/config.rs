//! Ledger, blob store, and identity service client configuration.
//!
//! Each config is read from the environment once at process start and then
//! passed by value into the client constructors. Secrets are held in
//! [`Zeroizing`] buffers and redacted from `Debug` output.

use url::Url;
use zeroize::Zeroizing;

/// Connection settings for the EVM ledger.
#[derive(Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Address of the document registry contract (0x + 40 hex).
    pub contract_address: String,
    /// Sender whose transactions the RPC provider signs (0x + 40 hex).
    pub from_address: String,
    /// Human-readable chain name used in logs and receipts.
    pub chain_name: String,
    /// Optional bearer token for hosted RPC providers.
    pub rpc_token: Option<Zeroizing<String>>,
    /// Percentage added on top of the gas estimate when setting the gas limit.
    pub gas_headroom_percent: u64,
    /// Delay between receipt polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// How long to wait for a submitted transaction to be mined.
    pub confirmation_timeout_secs: u64,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("from_address", &self.from_address)
            .field("chain_name", &self.chain_name)
            .field("rpc_token", &self.rpc_token.as_ref().map(|_| "[REDACTED]"))
            .field("gas_headroom_percent", &self.gas_headroom_percent)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LedgerConfig {
    /// Build a config with default chain name, headroom, and timings.
    ///
    /// Defaults: chain `amoy`, 25% gas headroom, 2 s poll interval, 120 s
    /// confirmation timeout, 30 s request timeout.
    pub fn new(rpc_url: Url, contract_address: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            rpc_url,
            contract_address: contract_address.into(),
            from_address: from_address.into(),
            chain_name: "amoy".to_string(),
            rpc_token: None,
            gas_headroom_percent: 25,
            poll_interval_ms: 2_000,
            confirmation_timeout_secs: 120,
            timeout_secs: 30,
        }
    }

    /// Override receipt polling.
    pub fn with_polling(mut self, poll_interval_ms: u64, confirmation_timeout_secs: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self.confirmation_timeout_secs = confirmation_timeout_secs;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LEDGER_RPC_URL` (required)
    /// - `LEDGER_CONTRACT_ADDRESS` (required)
    /// - `LEDGER_FROM_ADDRESS` (required)
    /// - `LEDGER_RPC_TOKEN` (optional)
    /// - `LEDGER_CHAIN_NAME` (default: `amoy`)
    /// - `LEDGER_GAS_HEADROOM_PERCENT` (default: 25)
    /// - `LEDGER_POLL_INTERVAL_MS` (default: 2000)
    /// - `LEDGER_CONFIRMATION_TIMEOUT_SECS` (default: 120)
    /// - `LEDGER_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_url = required_url("LEDGER_RPC_URL")?;
        let contract_address = required("LEDGER_CONTRACT_ADDRESS")?;
        let from_address = required("LEDGER_FROM_ADDRESS")?;

        let mut cfg = Self::new(rpc_url, contract_address, from_address);
        if let Ok(name) = std::env::var("LEDGER_CHAIN_NAME") {
            cfg.chain_name = name;
        }
        cfg.rpc_token = std::env::var("LEDGER_RPC_TOKEN").ok().map(Zeroizing::new);
        cfg.gas_headroom_percent = env_u64("LEDGER_GAS_HEADROOM_PERCENT", cfg.gas_headroom_percent);
        cfg.poll_interval_ms = env_u64("LEDGER_POLL_INTERVAL_MS", cfg.poll_interval_ms);
        cfg.confirmation_timeout_secs =
            env_u64("LEDGER_CONFIRMATION_TIMEOUT_SECS", cfg.confirmation_timeout_secs);
        cfg.timeout_secs = env_u64("LEDGER_TIMEOUT_SECS", cfg.timeout_secs);
        Ok(cfg)
    }
}

/// Connection settings for the pinning service and its gateway.
#[derive(Clone)]
pub struct BlobStoreConfig {
    /// Pinning API base, e.g. `https://api.pinata.cloud`.
    pub api_url: Url,
    /// Gateway base used to build retrieval locators.
    pub gateway_url: Url,
    /// Bearer JWT for the pinning API.
    pub jwt: Zeroizing<String>,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for BlobStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreConfig")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .field("jwt", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BlobStoreConfig {
    /// Build a config with the default 60 s timeout.
    pub fn new(api_url: Url, gateway_url: Url, jwt: impl Into<String>) -> Self {
        Self {
            api_url,
            gateway_url,
            jwt: Zeroizing::new(jwt.into()),
            timeout_secs: 60,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BLOB_JWT` (required)
    /// - `BLOB_GATEWAY_URL` (required)
    /// - `BLOB_API_URL` (default: `https://api.pinata.cloud`)
    /// - `BLOB_TIMEOUT_SECS` (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt = required("BLOB_JWT")?;
        let gateway_url = required_url("BLOB_GATEWAY_URL")?;
        let api_url = env_url("BLOB_API_URL", "https://api.pinata.cloud")?;
        let mut cfg = Self::new(api_url, gateway_url, jwt);
        cfg.timeout_secs = env_u64("BLOB_TIMEOUT_SECS", cfg.timeout_secs);
        Ok(cfg)
    }
}

/// Connection settings for the external identity service.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Identity service base URL. Principals are fetched from
    /// `{api_url}/v1/principals/{id}`.
    pub api_url: Url,
    /// Optional bearer token for service-to-service calls.
    pub token: Option<Zeroizing<String>>,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl IdentityConfig {
    /// Build a config with no token and a 10 s timeout.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token: None,
            timeout_secs: 10,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `IDENTITY_API_URL` (required)
    /// - `IDENTITY_API_TOKEN` (optional)
    /// - `IDENTITY_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::new(required_url("IDENTITY_API_URL")?);
        cfg.token = std::env::var("IDENTITY_API_TOKEN").ok().map(Zeroizing::new);
        cfg.timeout_secs = env_u64("IDENTITY_TIMEOUT_SECS", cfg.timeout_secs);
        Ok(cfg)
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn required_url(var: &'static str) -> Result<Url, ConfigError> {
    let raw = required(var)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
