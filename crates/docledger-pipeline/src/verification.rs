//! Owner-scoped verification.
//!
//! A file verifies when some record held for the owner named in its filename
//! carries exactly the SHA-256 of its bytes. There is no partial or fuzzy
//! matching. Duplicate issuances of the same content resolve to the earliest
//! record, and the full candidate list is always returned.

use std::io::Read;
use std::sync::Arc;

use chrono::Utc;
use docledger_core::{
    hash_bytes, hash_reader, parse_file_name, ContentDigest, DocumentRecord, OwnerId,
    VerificationResult,
};

use crate::error::PipelineError;
use crate::recorder::RecordSource;

/// Checks presented files against an owner's records.
pub struct VerificationEngine<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> Clone for VerificationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: RecordSource + ?Sized> VerificationEngine<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Verify in-memory bytes presented under `file_name`.
    ///
    /// The filename is parsed before anything else, so a non-conforming name
    /// fails with `Format` without touching the record source.
    pub async fn verify(&self, file_name: &str, bytes: &[u8]) -> Result<VerificationResult, PipelineError> {
        let parsed = parse_file_name(file_name)?;
        self.verify_digest(file_name, parsed.owner_id, hash_bytes(bytes))
            .await
    }

    /// Verify content read from a stream.
    pub async fn verify_reader<R: Read>(
        &self,
        file_name: &str,
        reader: R,
    ) -> Result<VerificationResult, PipelineError> {
        let parsed = parse_file_name(file_name)?;
        let digest = hash_reader(reader)?;
        self.verify_digest(file_name, parsed.owner_id, digest).await
    }

    /// Match an already computed digest against `owner_id`'s records.
    pub async fn verify_digest(
        &self,
        file_name: &str,
        owner_id: OwnerId,
        digest: ContentDigest,
    ) -> Result<VerificationResult, PipelineError> {
        let candidates = self.source.records_for_owner(&owner_id).await?;
        let result = match_candidates(file_name, owner_id, digest, candidates);

        if result.owner_unknown() {
            tracing::info!(
                file_name,
                owner_id = %result.owner_id,
                content_hash = %result.content_hash,
                "no records held for owner"
            );
        } else {
            tracing::info!(
                file_name,
                owner_id = %result.owner_id,
                content_hash = %result.content_hash,
                matched = result.matched,
                candidates = result.candidate_records.len(),
                "verification complete"
            );
        }
        Ok(result)
    }
}

/// Pure matching step: the first candidate whose hash equals `digest`.
pub fn match_candidates(
    file_name: &str,
    owner_id: OwnerId,
    digest: ContentDigest,
    candidates: Vec<DocumentRecord>,
) -> VerificationResult {
    let matched_record = candidates
        .iter()
        .find(|r| r.content_hash == digest)
        .cloned();
    VerificationResult {
        file_name: file_name.to_string(),
        owner_id,
        content_hash: digest,
        matched: matched_record.is_some(),
        matched_record,
        candidate_records: candidates,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{InMemoryRecorder, MetadataRecorder};
    use docledger_core::{DocumentType, FormatError, NewDocument};

    async fn seeded(entries: &[(&str, &[u8])]) -> Arc<InMemoryRecorder> {
        let rec = Arc::new(InMemoryRecorder::new());
        for (owner, content) in entries {
            rec.record(NewDocument {
                owner_id: OwnerId::new(*owner).unwrap(),
                content_hash: hash_bytes(content),
                storage_locator: "mem://x".into(),
                document_type: DocumentType::new("Transcript").unwrap(),
            })
            .await
            .unwrap();
        }
        rec
    }

    #[tokio::test]
    async fn identical_bytes_verify() {
        let engine = VerificationEngine::new(seeded(&[("DL1234", b"original")]).await);
        let result = engine.verify("DL1234_Transcript.pdf", b"original").await.unwrap();
        assert!(result.matched);
        assert_eq!(result.matched_record.unwrap().content_hash, hash_bytes(b"original"));
    }

    #[tokio::test]
    async fn tampered_bytes_fail_but_list_candidates() {
        let engine = VerificationEngine::new(seeded(&[("DL1234", b"original")]).await);
        let result = engine.verify("DL1234_Transcript.pdf", b"tampered").await.unwrap();
        assert!(!result.matched);
        assert!(result.matched_record.is_none());
        assert_eq!(result.candidate_records.len(), 1);
        assert_eq!(result.candidate_records[0].content_hash, hash_bytes(b"original"));
    }

    #[tokio::test]
    async fn content_anchored_under_other_owner_does_not_verify() {
        let engine = VerificationEngine::new(seeded(&[("ZZ9999", b"original")]).await);
        let result = engine.verify("DL1234_Transcript.pdf", b"original").await.unwrap();
        assert!(!result.matched);
        assert!(result.owner_unknown());
    }

    #[tokio::test]
    async fn duplicate_issuance_reports_first_match() {
        let rec = seeded(&[("DL1234", b"other"), ("DL1234", b"same"), ("DL1234", b"same")]).await;
        let engine = VerificationEngine::new(rec.clone());
        let all = rec.records_for_owner(&OwnerId::new("DL1234").unwrap()).await.unwrap();

        let result = engine.verify("DL1234_Transcript.pdf", b"same").await.unwrap();
        assert_eq!(result.matched_record.unwrap().id, all[1].id);
        assert_eq!(result.candidate_records.len(), 3);
    }

    #[tokio::test]
    async fn bad_name_is_rejected_before_lookup() {
        let engine = VerificationEngine::new(seeded(&[]).await);
        let err = engine.verify("certificate.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, PipelineError::Format(FormatError::InvalidFileName { .. })));
    }

    #[tokio::test]
    async fn reader_path_matches_slice_path() {
        let engine = VerificationEngine::new(seeded(&[("DL1234", b"streamed")]).await);
        let result = engine
            .verify_reader("DL1234_Transcript.pdf", std::io::Cursor::new(b"streamed".to_vec()))
            .await
            .unwrap();
        assert!(result.matched);
    }
}
