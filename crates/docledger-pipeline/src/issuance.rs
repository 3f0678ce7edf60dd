//! # Document Issuance
//!
//! Upload, anchor, and record one document, in that order. Each step runs
//! only after the previous one succeeded:
//!
//! - upload failure: nothing anchored, safe to retry the whole issuance;
//! - anchor failure: bytes are stored but unreferenced, harmless;
//! - record failure: anchored and stored but undiscoverable. Reported to the
//!   reconciliation sink and returned as [`PipelineError::Unrecorded`].
//!
//! Every failure after hashing carries the last [`IssuanceStage`] reached.
//!
//! Notification runs last, detached from the caller. Its failure is logged
//! and never affects the issuance result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use docledger_client::{BlobStore, LedgerAnchor, LedgerReceipt};
use docledger_core::{
    hash_bytes, parse_file_name, ContentDigest, DocumentRecord, DocumentType, FormatError,
    NewDocument, OwnerId,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::PipelineError;
use crate::reconcile::{LogReconciliationSink, ReconciliationSink, UnrecordedIssuance};
use crate::recorder::MetadataRecorder;

/// Inputs for one issuance.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub owner_id: OwnerId,
    pub document_type: DocumentType,
    /// Name given to the uploaded blob.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Hash computed by the caller. When present it must equal the hash of
    /// `bytes`.
    pub claimed_hash: Option<ContentDigest>,
}

/// How far an issuance has progressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceStage {
    Hashed {
        content_hash: ContentDigest,
    },
    Uploaded {
        content_hash: ContentDigest,
        locator: String,
    },
    AnchorPending {
        content_hash: ContentDigest,
        locator: String,
    },
    AnchorConfirmed {
        content_hash: ContentDigest,
        locator: String,
        receipt: LedgerReceipt,
    },
    Recorded {
        record: DocumentRecord,
        receipt: LedgerReceipt,
    },
}

impl IssuanceStage {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hashed { .. } => "hashed",
            Self::Uploaded { .. } => "uploaded",
            Self::AnchorPending { .. } => "anchor_pending",
            Self::AnchorConfirmed { .. } => "anchor_confirmed",
            Self::Recorded { .. } => "recorded",
        }
    }
}

/// Successful issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IssuanceReceipt {
    /// Ledger transaction that anchored the hash.
    pub transaction_id: String,
    pub block_number: u64,
    /// Chain the hash was anchored on.
    pub chain: String,
    /// Blob store locator.
    pub locator: String,
    pub record: DocumentRecord,
}

/// Downstream notification of a completed issuance (e.g. emailing the owner).
#[async_trait]
pub trait IssuanceNotifier: Send + Sync {
    async fn notify(&self, receipt: &IssuanceReceipt) -> Result<(), String>;
}

/// Issues documents against a blob store, a ledger, and a recorder.
#[derive(Clone)]
pub struct IssuancePipeline {
    blob: Arc<dyn BlobStore>,
    ledger: Arc<dyn LedgerAnchor>,
    recorder: Arc<dyn MetadataRecorder>,
    reconciliation: Arc<dyn ReconciliationSink>,
    notifier: Option<Arc<dyn IssuanceNotifier>>,
}

impl IssuancePipeline {
    /// Pipeline that logs unrecorded issuances and sends no notifications.
    pub fn new(
        blob: Arc<dyn BlobStore>,
        ledger: Arc<dyn LedgerAnchor>,
        recorder: Arc<dyn MetadataRecorder>,
    ) -> Self {
        Self {
            blob,
            ledger,
            recorder,
            reconciliation: Arc::new(LogReconciliationSink),
            notifier: None,
        }
    }

    pub fn with_reconciliation(mut self, sink: Arc<dyn ReconciliationSink>) -> Self {
        self.reconciliation = sink;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn IssuanceNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Issue a file whose owner and type come from its name.
    pub async fn issue_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<IssuanceReceipt, PipelineError> {
        let parsed = parse_file_name(file_name)?;
        self.issue(IssueRequest {
            owner_id: parsed.owner_id,
            document_type: parsed.document_type,
            file_name: file_name.to_string(),
            bytes,
            claimed_hash: None,
        })
        .await
    }

    /// Run one issuance to completion.
    pub async fn issue(&self, req: IssueRequest) -> Result<IssuanceReceipt, PipelineError> {
        let content_hash = hash_bytes(&req.bytes);
        if let Some(claimed) = req.claimed_hash {
            if claimed != content_hash {
                return Err(FormatError::HashMismatch {
                    claimed: claimed.to_base64(),
                    computed: content_hash.to_base64(),
                }
                .into());
            }
        }
        let mut stage = IssuanceStage::Hashed { content_hash };
        log_stage(&req.owner_id, &stage);

        let locator = match self.blob.upload(&req.file_name, &req.bytes).await {
            Ok(locator) => locator,
            Err(source) => {
                tracing::warn!(
                    owner_id = %req.owner_id,
                    content_hash = %content_hash,
                    stage = stage.name(),
                    "blob upload failed: {source}"
                );
                return Err(PipelineError::Upload { stage, source });
            }
        };
        stage = IssuanceStage::Uploaded {
            content_hash,
            locator: locator.clone(),
        };
        log_stage(&req.owner_id, &stage);

        stage = IssuanceStage::AnchorPending {
            content_hash,
            locator: locator.clone(),
        };
        log_stage(&req.owner_id, &stage);
        let receipt = match self.ledger.store_document(&req.owner_id, &content_hash).await {
            Ok(r) => r,
            Err(source) => {
                tracing::warn!(
                    owner_id = %req.owner_id,
                    content_hash = %content_hash,
                    stage = stage.name(),
                    "ledger anchor failed: {source}"
                );
                return Err(PipelineError::Anchor { stage, locator, source });
            }
        };
        stage = IssuanceStage::AnchorConfirmed {
            content_hash,
            locator: locator.clone(),
            receipt: receipt.clone(),
        };
        log_stage(&req.owner_id, &stage);

        let new_doc = NewDocument {
            owner_id: req.owner_id.clone(),
            content_hash,
            storage_locator: locator.clone(),
            document_type: req.document_type.clone(),
        };
        let record = match self.recorder.record(new_doc).await {
            Ok(r) => r,
            Err(e) => {
                let item = UnrecordedIssuance {
                    owner_id: req.owner_id,
                    document_type: req.document_type,
                    content_hash,
                    storage_locator: locator,
                    transaction_id: receipt.transaction_id,
                    reason: e.message,
                    occurred_at: Utc::now(),
                };
                self.reconciliation.submit(item.clone());
                return Err(PipelineError::Unrecorded {
                    stage,
                    item: Box::new(item),
                });
            }
        };
        stage = IssuanceStage::Recorded {
            record: record.clone(),
            receipt: receipt.clone(),
        };
        log_stage(&req.owner_id, &stage);

        let issued = IssuanceReceipt {
            transaction_id: receipt.transaction_id,
            block_number: receipt.block_number,
            chain: self.ledger.chain_name().to_string(),
            locator,
            record,
        };
        self.spawn_notification(&issued);
        Ok(issued)
    }

    fn spawn_notification(&self, receipt: &IssuanceReceipt) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let receipt = receipt.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&receipt).await {
                tracing::warn!(
                    owner_id = %receipt.record.owner_id,
                    transaction_id = %receipt.transaction_id,
                    "issuance notification failed: {e}"
                );
            }
        });
    }
}

fn log_stage(owner_id: &OwnerId, stage: &IssuanceStage) {
    let content_hash = match stage {
        IssuanceStage::Hashed { content_hash }
        | IssuanceStage::Uploaded { content_hash, .. }
        | IssuanceStage::AnchorPending { content_hash, .. }
        | IssuanceStage::AnchorConfirmed { content_hash, .. } => *content_hash,
        IssuanceStage::Recorded { record, .. } => record.content_hash,
    };
    tracing::info!(
        owner_id = %owner_id,
        content_hash = %content_hash,
        stage = stage.name(),
        "issuance stage reached"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{InMemoryRecorder, RecordSource};
    use docledger_client::{LedgerError, MemoryBlobStore, MockLedger};
    use tokio::sync::mpsc;

    struct Harness {
        blob: Arc<MemoryBlobStore>,
        ledger: Arc<MockLedger>,
        recorder: Arc<InMemoryRecorder>,
        pipeline: IssuancePipeline,
    }

    fn harness() -> Harness {
        let blob = Arc::new(MemoryBlobStore::new());
        let ledger = Arc::new(MockLedger::new());
        let recorder = Arc::new(InMemoryRecorder::new());
        let pipeline = IssuancePipeline::new(blob.clone(), ledger.clone(), recorder.clone());
        Harness {
            blob,
            ledger,
            recorder,
            pipeline,
        }
    }

    fn request(bytes: &[u8]) -> IssueRequest {
        IssueRequest {
            owner_id: OwnerId::new("DL1234").unwrap(),
            document_type: DocumentType::new("Transcript").unwrap(),
            file_name: "DL1234_Transcript.pdf".into(),
            bytes: bytes.to_vec(),
            claimed_hash: None,
        }
    }

    #[tokio::test]
    async fn issue_uploads_anchors_and_records() {
        let h = harness();
        let receipt = h.pipeline.issue(request(b"X")).await.unwrap();

        assert_eq!(receipt.record.owner_id.as_str(), "DL1234");
        assert_eq!(receipt.record.document_type.as_str(), "Transcript");
        assert_eq!(receipt.record.content_hash, hash_bytes(b"X"));
        assert_eq!(receipt.chain, "mock");
        assert_eq!(h.blob.retrieve(&receipt.locator).await.unwrap(), b"X");

        let entries = h.ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].2, receipt.transaction_id);
        assert_eq!(h.recorder.len(), 1);
    }

    #[tokio::test]
    async fn claimed_hash_mismatch_makes_no_calls() {
        let h = harness();
        let mut req = request(b"X");
        req.claimed_hash = Some(hash_bytes(b"Y"));

        let err = h.pipeline.issue(req).await.unwrap_err();
        assert!(matches!(err, PipelineError::Format(FormatError::HashMismatch { .. })));
        assert_eq!(h.blob.upload_count(), 0);
        assert_eq!(h.ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn matching_claimed_hash_is_accepted() {
        let h = harness();
        let mut req = request(b"X");
        req.claimed_hash = Some(hash_bytes(b"X"));
        assert!(h.pipeline.issue(req).await.is_ok());
    }

    #[tokio::test]
    async fn upload_failure_anchors_nothing() {
        let h = harness();
        h.blob.set_reject_uploads(true);
        let err = h.pipeline.issue(request(b"X")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Upload { stage: IssuanceStage::Hashed { .. }, .. }
        ));
        assert_eq!(h.ledger.write_count(), 0);
        assert!(h.recorder.is_empty());
    }

    #[tokio::test]
    async fn anchor_failure_records_nothing() {
        let h = harness();
        h.ledger.fail_next_write(LedgerError::TransactionReverted {
            transaction_id: Some("0xdead".into()),
            reason: "status 0x0".into(),
        });
        let err = h.pipeline.issue(request(b"X")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Anchor { source: LedgerError::TransactionReverted { .. }, .. }
        ));
        assert_eq!(err.last_stage().map(IssuanceStage::name), Some("anchor_pending"));
        assert_eq!(h.ledger.write_count(), 1);
        assert!(h.recorder.is_empty());
    }

    #[tokio::test]
    async fn record_failure_is_reported_for_reconciliation() {
        let blob = Arc::new(MemoryBlobStore::new());
        let ledger = Arc::new(MockLedger::new());
        let recorder = Arc::new(InMemoryRecorder::new());
        let queue = crate::reconcile::ReconciliationQueue::new();
        let pipeline = IssuancePipeline::new(blob, ledger.clone(), recorder.clone())
            .with_reconciliation(Arc::new(queue.clone()));
        recorder.set_reject_writes(true);

        let err = pipeline.issue(request(b"X")).await.unwrap_err();
        let PipelineError::Unrecorded { stage, item } = err else {
            panic!("expected Unrecorded");
        };
        let IssuanceStage::AnchorConfirmed { receipt, .. } = stage else {
            panic!("expected the anchor to be confirmed");
        };
        assert_eq!(receipt.transaction_id, item.transaction_id);
        assert_eq!(item.transaction_id, ledger.entries()[0].2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending()[0].content_hash, hash_bytes(b"X"));
    }

    #[tokio::test]
    async fn reissuing_same_content_creates_second_record() {
        let h = harness();
        h.pipeline.issue(request(b"X")).await.unwrap();
        h.pipeline.issue(request(b"X")).await.unwrap();
        let owner = OwnerId::new("DL1234").unwrap();
        assert_eq!(h.recorder.records_for_owner(&owner).await.unwrap().len(), 2);
        assert_eq!(h.ledger.write_count(), 2);
    }

    #[tokio::test]
    async fn issue_file_parses_owner_and_type() {
        let h = harness();
        let receipt = h
            .pipeline
            .issue_file("archive/AB0001_Degree-Certificate.pdf", b"deg".to_vec())
            .await
            .unwrap();
        assert_eq!(receipt.record.owner_id.as_str(), "AB0001");
        assert_eq!(receipt.record.document_type.as_str(), "Degree-Certificate");
    }

    #[tokio::test]
    async fn issue_file_rejects_bad_name_before_any_call() {
        let h = harness();
        let err = h.pipeline.issue_file("certificate.pdf", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Format(_)));
        assert_eq!(h.blob.upload_count(), 0);
        assert_eq!(h.ledger.write_count(), 0);
    }

    struct ChannelNotifier(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl IssuanceNotifier for ChannelNotifier {
        async fn notify(&self, receipt: &IssuanceReceipt) -> Result<(), String> {
            self.0
                .send(receipt.transaction_id.clone())
                .map_err(|e| e.to_string())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl IssuanceNotifier for FailingNotifier {
        async fn notify(&self, _: &IssuanceReceipt) -> Result<(), String> {
            Err("smtp unavailable".into())
        }
    }

    #[tokio::test]
    async fn notifier_receives_completed_issuance() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let h = harness();
        let pipeline = h.pipeline.with_notifier(Arc::new(ChannelNotifier(tx)));
        let receipt = pipeline.issue(request(b"X")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), receipt.transaction_id);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_issuance() {
        let h = harness();
        let pipeline = h.pipeline.with_notifier(Arc::new(FailingNotifier));
        assert!(pipeline.issue(request(b"X")).await.is_ok());
    }
}
