//! Reconciliation hand-off for partially completed issuances.
//!
//! When the metadata write fails after the document was uploaded and
//! anchored, the content is permanent on the ledger but invisible to lookup.
//! The pipeline does not repair this. It reports an [`UnrecordedIssuance`]
//! to a [`ReconciliationSink`] so an operator or an out-of-band job can
//! re-record the metadata without re-anchoring.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use docledger_core::{ContentDigest, DocumentType, OwnerId};
use parking_lot::RwLock;
use serde::Serialize;
use utoipa::ToSchema;

/// Everything needed to re-record a document without touching the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UnrecordedIssuance {
    #[schema(value_type = String)]
    pub owner_id: OwnerId,
    #[schema(value_type = String)]
    pub document_type: DocumentType,
    #[schema(value_type = String)]
    pub content_hash: ContentDigest,
    pub storage_locator: String,
    pub transaction_id: String,
    /// Why the metadata write failed.
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Receiver for unrecorded issuances.
pub trait ReconciliationSink: Send + Sync {
    /// Accept one partial failure. Must not fail.
    fn submit(&self, item: UnrecordedIssuance);
}

/// Sink that only logs. Used when no queue is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReconciliationSink;

impl ReconciliationSink for LogReconciliationSink {
    fn submit(&self, item: UnrecordedIssuance) {
        tracing::error!(
            owner_id = %item.owner_id,
            content_hash = %item.content_hash,
            transaction_id = %item.transaction_id,
            locator = %item.storage_locator,
            reason = %item.reason,
            "document anchored but not recorded; manual reconciliation required"
        );
    }
}

/// In-memory queue of unrecorded issuances, exposed to operators.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationQueue {
    items: Arc<RwLock<Vec<UnrecordedIssuance>>>,
}

impl ReconciliationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items awaiting reconciliation, oldest first.
    pub fn pending(&self) -> Vec<UnrecordedIssuance> {
        self.items.read().clone()
    }

    /// Remove the item for `transaction_id` once an operator has
    /// re-recorded it. Returns `None` if nothing is queued under that id.
    pub fn resolve(&self, transaction_id: &str) -> Option<UnrecordedIssuance> {
        let mut items = self.items.write();
        let index = items.iter().position(|i| i.transaction_id == transaction_id)?;
        let item = items.remove(index);
        tracing::info!(
            owner_id = %item.owner_id,
            transaction_id,
            "reconciliation item resolved"
        );
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl ReconciliationSink for ReconciliationQueue {
    fn submit(&self, item: UnrecordedIssuance) {
        LogReconciliationSink.submit(item.clone());
        self.items.write().push(item);
    }
}
