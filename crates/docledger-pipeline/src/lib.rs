//! # docledger-pipeline: Issuance, Verification, and Batch Processing
//!
//! ## Issuance
//!
//! ```text
//! bytes ─▶ hash ─▶ blob upload ─▶ ledger anchor ─▶ metadata record ─▶ notify
//!          Hashed   Uploaded       AnchorPending     Recorded
//!                                  AnchorConfirmed
//! ```
//!
//! The three external writes are not atomic. [`IssuanceStage`] names every
//! intermediate state. A metadata failure after a confirmed anchor is the one
//! partial-failure case that leaves content anchored but undiscoverable. It
//! is logged at `error` level, handed to a [`ReconciliationSink`], and
//! surfaced as [`PipelineError::Unrecorded`].
//!
//! ## Verification
//!
//! ```text
//! file name ─▶ owner id ─┐
//! bytes ─────▶ hash ─────┴▶ owner's records ─▶ exact hash match
//! ```
//!
//! The metadata store is the source of truth for owner-scoped verification.
//!
//! ## Batches
//!
//! [`BatchProcessor`] runs an [`EntryHandler`] over every file in a zip
//! archive, one entry at a time. Per-entry failures are collected, never
//! propagated. Only an archive that cannot be opened fails the run.

pub mod batch;
pub mod error;
pub mod issuance;
pub mod reconcile;
pub mod recorder;
pub mod verification;

pub use batch::{BatchProcessor, BatchReport, EntryHandler, EntryVerdict, FailedEntry, Progress, SucceededEntry};
pub use error::{BatchError, PipelineError, StoreError};
pub use issuance::{
    IssuanceNotifier, IssuancePipeline, IssuanceReceipt, IssuanceStage, IssueRequest,
};
pub use reconcile::{LogReconciliationSink, ReconciliationQueue, ReconciliationSink, UnrecordedIssuance};
pub use recorder::{InMemoryRecorder, MetadataRecorder, RecordSource};
pub use verification::{match_candidates, VerificationEngine};
