//! In-process ledger for development and tests.
//!
//! Every write is "mined" immediately into a monotonically increasing block.
//! Transaction ids are derived from the anchored pair and block number, so
//! they look like real transaction hashes and are unique per write.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use docledger_core::{hash_bytes, ContentDigest, OwnerId};
use parking_lot::{Mutex, RwLock};

use crate::error::LedgerError;
use crate::ledger::{LedgerAnchor, LedgerReceipt};

/// Deterministic in-memory ledger.
#[derive(Debug, Default)]
pub struct MockLedger {
    entries: RwLock<Vec<(OwnerId, ContentDigest, String)>>,
    block: AtomicU64,
    writes: AtomicU64,
    reads: AtomicU64,
    next_write_failure: Mutex<Option<LedgerError>>,
}

impl MockLedger {
    /// Create an empty ledger at block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `store_document` call fail with `error` without
    /// recording anything.
    pub fn fail_next_write(&self, error: LedgerError) {
        *self.next_write_failure.lock() = Some(error);
    }

    /// Number of write attempts, including failed ones.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of membership reads.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Anchored `(owner, hash, transaction_id)` triples in write order.
    pub fn entries(&self) -> Vec<(OwnerId, ContentDigest, String)> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl LedgerAnchor for MockLedger {
    async fn store_document(
        &self,
        owner_id: &OwnerId,
        content_hash: &ContentDigest,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_write_failure.lock().take() {
            return Err(err);
        }

        let block_number = self.block.fetch_add(1, Ordering::SeqCst) + 1;
        let mut seed = Vec::with_capacity(64);
        seed.extend_from_slice(owner_id.as_str().as_bytes());
        seed.extend_from_slice(content_hash.as_bytes());
        seed.extend_from_slice(&block_number.to_be_bytes());
        let transaction_id = format!("0x{}", hash_bytes(&seed).to_hex());

        self.entries
            .write()
            .push((owner_id.clone(), *content_hash, transaction_id.clone()));

        Ok(LedgerReceipt {
            transaction_id,
            block_number,
            gas_used: Some(21_000),
        })
    }

    async fn verify_document(&self, content_hash: &ContentDigest) -> Result<bool, LedgerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .read()
            .iter()
            .any(|(_, h, _)| h == content_hash))
    }

    fn chain_name(&self) -> &str {
        "mock"
    }
}
