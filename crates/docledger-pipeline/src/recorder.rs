//! Metadata recording.
//!
//! [`RecordSource`] is the read side used by verification: all records for
//! an owner, in insertion order. [`MetadataRecorder`] adds the write side and
//! hash lookup. No deduplication is performed; recording the same content
//! twice under one owner yields two records.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use docledger_core::{ContentDigest, DocumentRecord, NewDocument, OwnerId};
use parking_lot::RwLock;

use crate::error::StoreError;

/// Read access to an owner's records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Every record for `owner_id`, oldest first.
    async fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<DocumentRecord>, StoreError>;
}

/// Durable store of document records.
#[async_trait]
pub trait MetadataRecorder: RecordSource {
    /// Persist a new record with a server-assigned id and timestamp.
    async fn record(&self, doc: NewDocument) -> Result<DocumentRecord, StoreError>;

    /// Earliest record carrying `content_hash`, under any owner.
    async fn find_by_hash(&self, content_hash: &ContentDigest) -> Result<Option<DocumentRecord>, StoreError>;
}

/// Process-local recorder. Records are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    records: RwLock<Vec<DocumentRecord>>,
    reject_writes: AtomicBool,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `record` call fail until switched back.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RecordSource for InMemoryRecorder {
    async fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| &r.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MetadataRecorder for InMemoryRecorder {
    async fn record(&self, doc: NewDocument) -> Result<DocumentRecord, StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::new("recorder is rejecting writes"));
        }
        let record = doc.into_record();
        self.records.write().push(record.clone());
        Ok(record)
    }

    async fn find_by_hash(&self, content_hash: &ContentDigest) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| &r.content_hash == content_hash)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docledger_core::{hash_bytes, DocumentType};

    fn doc(owner: &str, content: &[u8]) -> NewDocument {
        NewDocument {
            owner_id: OwnerId::new(owner).unwrap(),
            content_hash: hash_bytes(content),
            storage_locator: format!("mem://sha256/{}", hash_bytes(content).to_hex()),
            document_type: DocumentType::new("Transcript").unwrap(),
        }
    }

    #[tokio::test]
    async fn records_are_returned_in_insertion_order() {
        let rec = InMemoryRecorder::new();
        let a = rec.record(doc("DL1234", b"a")).await.unwrap();
        rec.record(doc("ZZ9999", b"other")).await.unwrap();
        let b = rec.record(doc("DL1234", b"b")).await.unwrap();

        let owner = OwnerId::new("DL1234").unwrap();
        let ids: Vec<_> = rec
            .records_for_owner(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn identical_content_is_not_deduplicated() {
        let rec = InMemoryRecorder::new();
        let first = rec.record(doc("DL1234", b"same")).await.unwrap();
        let second = rec.record(doc("DL1234", b"same")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(rec.len(), 2);

        let found = rec.find_by_hash(&hash_bytes(b"same")).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn unknown_owner_has_no_records() {
        let rec = InMemoryRecorder::new();
        let owner = OwnerId::new("QQ0000").unwrap();
        assert!(rec.records_for_owner(&owner).await.unwrap().is_empty());
        assert!(rec.find_by_hash(&hash_bytes(b"x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_write_leaves_store_unchanged() {
        let rec = InMemoryRecorder::new();
        rec.set_reject_writes(true);
        assert!(rec.record(doc("DL1234", b"a")).await.is_err());
        assert!(rec.is_empty());
    }
}
