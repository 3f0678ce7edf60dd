//! # docledger-client -- Clients for the ledger and the blob store
//!
//! Two external systems sit behind the issuance pipeline:
//!
//! - **Ledger**: an EVM contract exposing `storeDocument(string,string)` and
//!   `verifyDocument(string) returns (bool)`, reached over JSON-RPC. Signing
//!   is delegated to the RPC provider; this crate never holds private keys.
//! - **Blob store**: a pinning service in front of a content-addressed
//!   network. Uploads return a gateway locator that resolves to the same
//!   bytes later.
//!
//! Accounts belong to a third system, the identity service.
//! [`HttpPrincipalDirectory`] implements `PrincipalDirectory` over its HTTP
//! API.
//!
//! Each system is reached through a trait ([`LedgerAnchor`], [`BlobStore`]) so
//! the pipeline can run against the in-process [`MockLedger`] and
//! [`MemoryBlobStore`] in development and tests.
//!
//! ## Retries
//!
//! Idempotent calls (fee queries, gas estimates, receipt polls, membership
//! reads, blob uploads and fetches, principal lookups) retry transport
//! failures with exponential backoff. A ledger write is submitted exactly once: resubmitting could
//! anchor the same hash twice.
//!
//! ## Configuration
//!
//! [`LedgerConfig`], [`BlobStoreConfig`] and [`IdentityConfig`] are plain values. Construct them
//! once (usually via `from_env`) and hand them to the client constructors;
//! clients never read the environment themselves.

pub mod abi;
pub mod blob;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod mock;
pub(crate) mod retry;

pub use blob::{BlobStore, MemoryBlobStore, PinningBlobStore};
pub use config::{BlobStoreConfig, ConfigError, IdentityConfig, LedgerConfig};
pub use error::{BlobError, LedgerError};
pub use identity::HttpPrincipalDirectory;
pub use ledger::{EvmLedgerClient, LedgerAnchor, LedgerReceipt};
pub use mock::MockLedger;
