#![deny(missing_docs)]

//! # docledger-core: Foundational Types for DocLedger
//!
//! Every other crate in the workspace depends on this one. It performs no I/O
//! beyond reading a caller-supplied stream for hashing.
//!
//! ## Design Principles
//!
//! 1. **One digest type.** [`ContentDigest`] is the only representation of a
//!    document hash. Its wire form is standard padded Base64, the same string
//!    that is anchored on the ledger and stored in the metadata store.
//!
//! 2. **Strict naming convention.** [`parse_file_name`] is the sole
//!    correlation key between issuance and verification. A filename that
//!    deviates from `^[A-Z]{2}\d{4}_[A-Za-z\s-]+\.[A-Za-z0-9]+$` is rejected
//!    with [`FormatError`] before any network call.
//!
//! 3. **Newtypes for identifiers.** An [`OwnerId`] is validated at
//!    construction and cannot be confused with a [`DocumentType`].
//!
//! 4. **Closed principal kinds.** [`Principal`] is a tagged union resolved
//!    through one [`PrincipalDirectory::resolve`] entry point.

pub mod digest;
pub mod error;
pub mod identity;
pub mod naming;
pub mod principal;
pub mod record;

pub use digest::{hash_bytes, hash_reader, ContentDigest, DigestAccumulator};
pub use error::{DirectoryError, FormatError};
pub use identity::{DocumentType, OwnerId};
pub use naming::{parse_file_name, ParsedName};
pub use principal::{InMemoryDirectory, Principal, PrincipalDirectory, PrincipalKind, Role};
pub use record::{DocumentRecord, NewDocument, VerificationResult};
