//! Ledger and blob store error types.

/// Errors from the ledger client.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// RPC endpoint unreachable, timed out, or returned a non-JSON body.
    /// Transient; idempotent calls have already been retried.
    #[error("ledger {method} unreachable: {reason}")]
    Network { method: String, reason: String },

    /// The sending account cannot pay for the transaction.
    #[error("insufficient funds for ledger write: {0}")]
    InsufficientFunds(String),

    /// The contract rejected the call, either during estimation or once mined.
    /// Never resubmitted automatically.
    #[error("ledger transaction reverted{}: {reason}", tx_suffix(.transaction_id))]
    TransactionReverted {
        transaction_id: Option<String>,
        reason: String,
    },

    /// Submitted but not mined before the confirmation deadline. The
    /// transaction may still land; it is not resubmitted.
    #[error("ledger transaction {transaction_id} not mined after {waited_secs}s")]
    ConfirmationTimeout { transaction_id: String, waited_secs: u64 },

    /// Any other JSON-RPC error object.
    #[error("ledger {method} failed with RPC error {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The RPC answered but the payload did not have the expected shape.
    #[error("unexpected response from ledger {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    /// Client could not be constructed.
    #[error("ledger configuration error: {0}")]
    Config(String),
}

fn tx_suffix(transaction_id: &Option<String>) -> String {
    transaction_id
        .as_deref()
        .map(|t| format!(" ({t})"))
        .unwrap_or_default()
}

impl LedgerError {
    /// True for failures worth retrying later with the same input.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Errors from the blob store client.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Upload failed at the transport level or the store refused it.
    #[error("upload of {file_name} failed: {reason}")]
    Upload { file_name: String, reason: String },

    /// Content could not be fetched from a locator.
    #[error("retrieval from {locator} failed: {reason}")]
    Retrieve { locator: String, reason: String },

    /// Client could not be constructed.
    #[error("blob store configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverted_display_with_and_without_tx() {
        let with = LedgerError::TransactionReverted {
            transaction_id: Some("0xabc".into()),
            reason: "status 0x0".into(),
        };
        assert_eq!(with.to_string(), "ledger transaction reverted (0xabc): status 0x0");

        let without = LedgerError::TransactionReverted {
            transaction_id: None,
            reason: "execution reverted".into(),
        };
        assert_eq!(without.to_string(), "ledger transaction reverted: execution reverted");
    }

    #[test]
    fn only_network_errors_are_transient() {
        assert!(LedgerError::Network {
            method: "eth_gasPrice".into(),
            reason: "timeout".into()
        }
        .is_transient());
        assert!(!LedgerError::InsufficientFunds("x".into()).is_transient());
        assert!(!LedgerError::ConfirmationTimeout {
            transaction_id: "0x1".into(),
            waited_secs: 5
        }
        .is_transient());
    }
}
