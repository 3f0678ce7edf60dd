//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! - **Recorder**: Postgres when `DATABASE_URL` is set, in-memory otherwise.
//! - **Issuance pipeline** and **ledger**: present only when both upstreams
//!   are configured (or substituted in dev mode). Routes that need them
//!   answer 503 otherwise.
//! - **Principal directory**: the identity service when configured. Principal
//!   lookups answer 503 otherwise.
//! - **Reconciliation queue**: always present.

use std::sync::Arc;

use docledger_client::{BlobStore, LedgerAnchor, MemoryBlobStore, MockLedger};
use docledger_core::PrincipalDirectory;
use docledger_pipeline::{
    InMemoryRecorder, IssuancePipeline, MetadataRecorder, ReconciliationQueue, VerificationEngine,
};

use crate::error::AppError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<dyn MetadataRecorder>,
    pub pipeline: Option<IssuancePipeline>,
    pub ledger: Option<Arc<dyn LedgerAnchor>>,
    pub directory: Option<Arc<dyn PrincipalDirectory>>,
    pub reconciliation: ReconciliationQueue,
}

impl AppState {
    /// In-memory recorder, no directory, no anchoring services.
    pub fn new() -> Self {
        Self::with_recorder(Arc::new(InMemoryRecorder::new()))
    }

    /// State around the given recorder, with no anchoring services.
    pub fn with_recorder(recorder: Arc<dyn MetadataRecorder>) -> Self {
        Self {
            recorder,
            pipeline: None,
            ledger: None,
            directory: None,
            reconciliation: ReconciliationQueue::new(),
        }
    }

    /// Wire the issuance pipeline over `blob` and `ledger`. Unrecorded
    /// issuances land in this state's reconciliation queue.
    pub fn with_services(mut self, blob: Arc<dyn BlobStore>, ledger: Arc<dyn LedgerAnchor>) -> Self {
        let pipeline = IssuancePipeline::new(blob, ledger.clone(), self.recorder.clone())
            .with_reconciliation(Arc::new(self.reconciliation.clone()));
        self.pipeline = Some(pipeline);
        self.ledger = Some(ledger);
        self
    }

    /// Substitute the in-process ledger and blob store.
    pub fn with_dev_services(self) -> Self {
        self.with_services(Arc::new(MemoryBlobStore::new()), Arc::new(MockLedger::new()))
    }

    pub fn with_directory(mut self, directory: Arc<dyn PrincipalDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Owner-scoped verification over the recorder.
    pub fn verification_engine(&self) -> VerificationEngine<dyn MetadataRecorder> {
        VerificationEngine::new(self.recorder.clone())
    }

    /// The issuance pipeline, or 503 when anchoring is not configured.
    pub fn require_pipeline(&self) -> Result<&IssuancePipeline, AppError> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("document anchoring is not configured".into()))
    }

    /// The principal directory, or 503 when it is not configured.
    pub fn require_directory(&self) -> Result<&Arc<dyn PrincipalDirectory>, AppError> {
        self.directory
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("principal directory is not configured".into()))
    }

    /// The ledger, or 503 when it is not configured.
    pub fn require_ledger(&self) -> Result<&Arc<dyn LedgerAnchor>, AppError> {
        self.ledger
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("ledger is not configured".into()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
