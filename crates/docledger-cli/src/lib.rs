//! # docledger-cli: Command-Line Interface for DocLedger
//!
//! ## Subcommands
//!
//! - `docledger hash <file>`: SHA-256 of a file, Base64 (or `--hex`).
//! - `docledger check-name <name>`: check a filename against the naming convention.
//! - `docledger issue <file>`: issue a document through the service.
//! - `docledger verify <file>`: verify a file against its owner's records.
//! - `docledger lookup <owner_id>`: list an owner's records.
//! - `docledger batch issue|verify <archive.zip>`: process a zip archive.
//!
//! Every handler returns the process exit code: 0 on success, 1 when a check
//! or any batch entry failed. Errors (unreachable service, unreadable file)
//! propagate as `anyhow::Error` and also exit 1.

pub mod api;
pub mod batch;
pub mod document;

/// Default service address when neither `--api-url` nor `DOCLEDGER_API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
