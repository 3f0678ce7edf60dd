//! # EVM Ledger Client
//!
//! Anchors `(owner_id, content_hash)` pairs in a document registry contract
//! over JSON-RPC and answers membership queries for a hash.
//!
//! ## Write Path
//!
//! 1. `eth_gasPrice` for the current fee rate.
//! 2. `eth_estimateGas` for the exact `storeDocument` call.
//! 3. `eth_sendTransaction` with `gasPrice` and a `gas` ceiling strictly above
//!    the estimate (estimate plus `gas_headroom_percent`).
//! 4. `eth_getTransactionReceipt` polled until mined or the confirmation
//!    timeout passes.
//!
//! Steps 1, 2, and 4 are idempotent and retry transport failures. Step 3 is
//! sent once. Once it has been accepted the client waits for the outcome and
//! never resubmits.
//!
//! ## Read Path
//!
//! `eth_call` of `verifyDocument(hash)` against the latest block. Side-effect
//! free and retried freely.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use docledger_core::{ContentDigest, OwnerId};
use serde::{Deserialize, Serialize};

use crate::abi;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::retry::retry_send;

/// Confirmed ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// Transaction hash (0x + 64 hex).
    pub transaction_id: String,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Gas consumed, when the receipt reports it.
    pub gas_used: Option<u64>,
}

/// An append-only ledger that can anchor and look up document hashes.
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    /// Write `(owner_id, content_hash)` and wait until it is mined.
    async fn store_document(
        &self,
        owner_id: &OwnerId,
        content_hash: &ContentDigest,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// Whether `content_hash` has been anchored under any owner.
    async fn verify_document(&self, content_hash: &ContentDigest) -> Result<bool, LedgerError>;

    /// Name of the chain, for logs and responses.
    fn chain_name(&self) -> &str;
}

/// Whether a JSON-RPC call may be repeated on transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Retry,
    Once,
}

/// JSON-RPC client for the document registry contract.
#[derive(Debug, Clone)]
pub struct EvmLedgerClient {
    http: reqwest::Client,
    config: LedgerConfig,
}

impl EvmLedgerClient {
    /// Build a client, validating both addresses.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        if !abi::is_valid_eth_address(&config.contract_address) {
            return Err(LedgerError::Config(format!(
                "invalid contract address: {}",
                config.contract_address
            )));
        }
        if !abi::is_valid_eth_address(&config.from_address) {
            return Err(LedgerError::Config(format!(
                "invalid from address: {}",
                config.from_address
            )));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.rpc_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|_| LedgerError::Config("RPC token is not a valid header value".into()))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| LedgerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Access the configuration this client was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
        delivery: Delivery,
    ) -> Result<serde_json::Value, LedgerError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let send = || self.http.post(self.config.rpc_url.clone()).json(&body).send();

        let network = |reason: String| LedgerError::Network {
            method: method.to_string(),
            reason,
        };

        let resp = match delivery {
            Delivery::Retry => retry_send(method, send).await,
            Delivery::Once => send().await,
        }
        .map_err(|e| {
            if e.is_timeout() {
                network("request timed out".into())
            } else {
                network(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            return Err(network(format!("HTTP {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| network(format!("invalid JSON response: {e}")))?;

        if let Some(error) = json.get("error") {
            let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(classify_rpc_error(method, code, message));
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| LedgerError::InvalidResponse {
                method: method.to_string(),
                reason: "JSON-RPC response missing 'result' field".into(),
            })
    }

    async fn quantity_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<u64, LedgerError> {
        let result = self.rpc_call(method, params, Delivery::Retry).await?;
        result
            .as_str()
            .and_then(abi::parse_quantity)
            .ok_or_else(|| LedgerError::InvalidResponse {
                method: method.to_string(),
                reason: format!("expected hex quantity, got {result}"),
            })
    }

    /// Current fee rate in wei.
    pub async fn gas_price(&self) -> Result<u64, LedgerError> {
        self.quantity_call("eth_gasPrice", serde_json::json!([])).await
    }

    /// Gas estimate for a contract call from the configured sender.
    pub async fn estimate_gas(&self, data: &str) -> Result<u64, LedgerError> {
        let call = serde_json::json!({
            "from": self.config.from_address,
            "to": self.config.contract_address,
            "data": data,
        });
        self.quantity_call("eth_estimateGas", serde_json::json!([call]))
            .await
    }

    async fn send_transaction(
        &self,
        data: &str,
        gas_price: u64,
        gas_limit: u64,
    ) -> Result<String, LedgerError> {
        let tx = serde_json::json!({
            "from": self.config.from_address,
            "to": self.config.contract_address,
            "data": data,
            "gas": abi::to_quantity(gas_limit),
            "gasPrice": abi::to_quantity(gas_price),
        });
        let result = self
            .rpc_call("eth_sendTransaction", serde_json::json!([tx]), Delivery::Once)
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::InvalidResponse {
                method: "eth_sendTransaction".into(),
                reason: "non-string transaction hash".into(),
            })
    }

    /// Poll for the receipt of a submitted transaction until mined.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<LedgerReceipt, LedgerError> {
        let timeout = Duration::from_secs(self.config.confirmation_timeout_secs);
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let started = Instant::now();

        loop {
            match self
                .rpc_call(
                    "eth_getTransactionReceipt",
                    serde_json::json!([tx_hash]),
                    Delivery::Retry,
                )
                .await
            {
                Ok(receipt) if !receipt.is_null() => return receipt_outcome(tx_hash, &receipt),
                Ok(_) => {
                    tracing::debug!(transaction_id = %tx_hash, "transaction pending");
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(transaction_id = %tx_hash, "receipt poll failed: {e}");
                }
                Err(e) => return Err(e),
            }

            if started.elapsed() >= timeout {
                return Err(LedgerError::ConfirmationTimeout {
                    transaction_id: tx_hash.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// Gas ceiling for a given estimate: estimate plus headroom, and never less
/// than `estimate + 1`.
pub fn gas_ceiling(estimate: u64, headroom_percent: u64) -> u64 {
    let padded = estimate.saturating_mul(100 + headroom_percent) / 100;
    padded.max(estimate.saturating_add(1))
}

fn classify_rpc_error(method: &str, code: i64, message: &str) -> LedgerError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient funds") {
        LedgerError::InsufficientFunds(message.to_string())
    } else if lower.contains("revert") {
        LedgerError::TransactionReverted {
            transaction_id: None,
            reason: message.to_string(),
        }
    } else {
        LedgerError::Rpc {
            method: method.to_string(),
            code,
            message: message.to_string(),
        }
    }
}

fn receipt_outcome(tx_hash: &str, receipt: &serde_json::Value) -> Result<LedgerReceipt, LedgerError> {
    let status = receipt.get("status").and_then(|s| s.as_str()).unwrap_or("0x0");
    if status == "0x0" {
        return Err(LedgerError::TransactionReverted {
            transaction_id: Some(tx_hash.to_string()),
            reason: "receipt status 0x0".into(),
        });
    }

    let block_number = receipt
        .get("blockNumber")
        .and_then(|b| b.as_str())
        .and_then(abi::parse_quantity)
        .ok_or_else(|| LedgerError::InvalidResponse {
            method: "eth_getTransactionReceipt".into(),
            reason: "receipt missing blockNumber".into(),
        })?;
    let gas_used = receipt
        .get("gasUsed")
        .and_then(|g| g.as_str())
        .and_then(abi::parse_quantity);

    Ok(LedgerReceipt {
        transaction_id: tx_hash.to_string(),
        block_number,
        gas_used,
    })
}

#[async_trait]
impl LedgerAnchor for EvmLedgerClient {
    async fn store_document(
        &self,
        owner_id: &OwnerId,
        content_hash: &ContentDigest,
    ) -> Result<LedgerReceipt, LedgerError> {
        let data = abi::encode_store_document(owner_id.as_str(), &content_hash.to_base64());

        let gas_price = self.gas_price().await?;
        let estimate = self.estimate_gas(&data).await?;
        let gas_limit = gas_ceiling(estimate, self.config.gas_headroom_percent);
        tracing::debug!(
            chain = %self.config.chain_name,
            gas_price,
            estimate,
            gas_limit,
            "submitting storeDocument"
        );

        let tx_hash = self.send_transaction(&data, gas_price, gas_limit).await?;
        tracing::info!(
            chain = %self.config.chain_name,
            transaction_id = %tx_hash,
            owner_id = %owner_id,
            "storeDocument submitted, awaiting confirmation"
        );

        let receipt = self.wait_for_receipt(&tx_hash).await?;
        tracing::info!(
            chain = %self.config.chain_name,
            transaction_id = %receipt.transaction_id,
            block = receipt.block_number,
            "storeDocument confirmed"
        );
        Ok(receipt)
    }

    async fn verify_document(&self, content_hash: &ContentDigest) -> Result<bool, LedgerError> {
        let call = serde_json::json!({
            "to": self.config.contract_address,
            "data": abi::encode_verify_document(&content_hash.to_base64()),
        });
        let result = self
            .rpc_call("eth_call", serde_json::json!([call, "latest"]), Delivery::Retry)
            .await?;
        result
            .as_str()
            .and_then(abi::decode_bool)
            .ok_or_else(|| LedgerError::InvalidResponse {
                method: "eth_call".into(),
                reason: format!("expected ABI bool, got {result}"),
            })
    }

    fn chain_name(&self) -> &str {
        &self.config.chain_name
    }
}
