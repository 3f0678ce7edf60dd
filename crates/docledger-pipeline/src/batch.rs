//! # Batch Processing
//!
//! Runs one [`EntryHandler`] over every file entry in a zip archive.
//!
//! - Directory entries are skipped and do not count towards the total.
//! - Entries run sequentially in archive order. Progress is reported after
//!   every entry, whatever its outcome, so it only ever increases.
//! - An unreadable entry, a handler error, or a rejected verdict becomes a
//!   [`FailedEntry`]. The run continues with the next entry.
//! - Only an archive that cannot be opened fails the run with
//!   [`BatchError::Archive`].
//! - Sizes declared inside the archive are not trusted. Each entry is read
//!   through a cap of [`MAX_ENTRY_BYTES`] and fails if it decompresses past it.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use docledger_core::VerificationResult;
use serde::Serialize;

use crate::error::{BatchError, PipelineError};
use crate::issuance::{IssuancePipeline, IssuanceReceipt};
use crate::recorder::RecordSource;
use crate::verification::VerificationEngine;

/// Largest decompressed entry accepted by default. Matches the upload limit.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// `{processed, total}` after an entry finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// Whole-number completion percentage.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total) as u8
    }
}

/// Handler outcome for an entry that ran without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryVerdict<T> {
    Accepted(T),
    /// Processed, but the outcome counts as a failure (e.g. no hash match).
    Rejected { reason: String, output: T },
}

/// Work performed on each archive entry.
///
/// An `Err` marks the entry failed with the error's message; it never stops
/// the run.
#[async_trait]
pub trait EntryHandler: Send + Sync {
    type Output: Send;
    type Error: std::fmt::Display + Send;

    async fn handle(&self, file_name: &str, bytes: Vec<u8>) -> Result<EntryVerdict<Self::Output>, Self::Error>;
}

#[async_trait]
impl<H: EntryHandler + ?Sized> EntryHandler for Arc<H> {
    type Output = H::Output;
    type Error = H::Error;

    async fn handle(&self, file_name: &str, bytes: Vec<u8>) -> Result<EntryVerdict<Self::Output>, Self::Error> {
        (**self).handle(file_name, bytes).await
    }
}

#[async_trait]
impl EntryHandler for IssuancePipeline {
    type Output = IssuanceReceipt;
    type Error = PipelineError;

    async fn handle(&self, file_name: &str, bytes: Vec<u8>) -> Result<EntryVerdict<IssuanceReceipt>, PipelineError> {
        self.issue_file(file_name, bytes).await.map(EntryVerdict::Accepted)
    }
}

#[async_trait]
impl<S: RecordSource + ?Sized> EntryHandler for VerificationEngine<S> {
    type Output = VerificationResult;
    type Error = PipelineError;

    async fn handle(&self, file_name: &str, bytes: Vec<u8>) -> Result<EntryVerdict<VerificationResult>, PipelineError> {
        let result = self.verify(file_name, &bytes).await?;
        if result.matched {
            Ok(EntryVerdict::Accepted(result))
        } else if result.owner_unknown() {
            Ok(EntryVerdict::Rejected {
                reason: format!("no documents on record for {}", result.owner_id),
                output: result,
            })
        } else {
            Ok(EntryVerdict::Rejected {
                reason: "content does not match any document on record".into(),
                output: result,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SucceededEntry<T> {
    pub file_name: String,
    pub output: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry<T> {
    pub file_name: String,
    pub reason: String,
    /// Handler output when the entry was processed but rejected.
    pub output: Option<T>,
}

/// Aggregated outcome of one run. `succeeded` and `failed` are disjoint and
/// together hold `total` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport<T> {
    pub total: usize,
    pub succeeded: Vec<SucceededEntry<T>>,
    pub failed: Vec<FailedEntry<T>>,
}

impl<T> BatchReport<T> {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives an [`EntryHandler`] over a zip archive.
pub struct BatchProcessor<H> {
    handler: H,
    max_entry_bytes: u64,
}

impl<H: EntryHandler> BatchProcessor<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            max_entry_bytes: MAX_ENTRY_BYTES,
        }
    }

    /// Override the per-entry decompressed size cap.
    pub fn with_max_entry_bytes(mut self, limit: u64) -> Self {
        self.max_entry_bytes = limit;
        self
    }

    /// Process an archive held in memory.
    pub async fn run<F>(&self, archive: Vec<u8>, mut on_progress: F) -> Result<BatchReport<H::Output>, BatchError>
    where
        F: FnMut(Progress) + Send,
    {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(|e| BatchError::Archive(e.to_string()))?;

        let mut files = Vec::new();
        for index in 0..zip.len() {
            let entry = zip
                .by_index_raw(index)
                .map_err(|e| BatchError::Archive(e.to_string()))?;
            if !entry.is_dir() {
                files.push((index, entry.name().to_string()));
            }
        }

        let total = files.len();
        tracing::info!(total, "batch started");
        let mut report = BatchReport {
            total,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for (processed, (index, file_name)) in files.into_iter().enumerate() {
            match read_entry(&mut zip, index, self.max_entry_bytes) {
                Ok(bytes) => match self.handler.handle(&file_name, bytes).await {
                    Ok(EntryVerdict::Accepted(output)) => {
                        report.succeeded.push(SucceededEntry { file_name, output });
                    }
                    Ok(EntryVerdict::Rejected { reason, output }) => {
                        tracing::info!(file_name = %file_name, %reason, "batch entry rejected");
                        report.failed.push(FailedEntry {
                            file_name,
                            reason,
                            output: Some(output),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(file_name = %file_name, "batch entry failed: {e}");
                        report.failed.push(FailedEntry {
                            file_name,
                            reason: e.to_string(),
                            output: None,
                        });
                    }
                },
                Err(e) => {
                    tracing::warn!(file_name = %file_name, "batch entry unreadable: {e}");
                    report.failed.push(FailedEntry {
                        file_name,
                        reason: format!("entry could not be read: {e}"),
                        output: None,
                    });
                }
            }

            let progress = Progress {
                processed: processed + 1,
                total,
            };
            tracing::debug!(processed = progress.processed, total, "batch progress");
            on_progress(progress);
        }

        tracing::info!(
            total,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Process an archive on disk.
    pub async fn run_path<F>(&self, path: &Path, on_progress: F) -> Result<BatchReport<H::Output>, BatchError>
    where
        F: FnMut(Progress) + Send,
    {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BatchError::Archive(format!("{}: {e}", path.display())))?;
        self.run(bytes, on_progress).await
    }
}

fn read_entry(zip: &mut zip::ZipArchive<Cursor<Vec<u8>>>, index: usize, limit: u64) -> std::io::Result<Vec<u8>> {
    let entry = zip.by_index(index).map_err(std::io::Error::other)?;
    let mut bytes = Vec::new();
    entry.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(std::io::Error::other(format!(
            "decompressed size exceeds {limit} bytes"
        )));
    }
    Ok(bytes)
}
