//! # Single-Document Subcommands
//!
//! `hash` and `check-name` run entirely offline. `issue` and `lookup` call
//! the service. `verify` hashes locally and matches against the owner's
//! records fetched from the service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use docledger_core::{
    hash_reader, naming::base_name, parse_file_name, DocumentType, FormatError, OwnerId,
};
use docledger_pipeline::VerificationEngine;

use crate::api::ApiClient;

/// Arguments for `docledger hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print lowercase hex instead of Base64.
    #[arg(long)]
    pub hex: bool,
}

/// Arguments for `docledger issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Document to issue.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Owner id. Defaults to the one in the filename.
    #[arg(long)]
    pub owner: Option<String>,

    /// Document type. Defaults to the one in the filename.
    #[arg(long = "type", value_name = "TYPE")]
    pub document_type: Option<String>,
}

/// Compute and print a file's SHA-256.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let file = std::fs::File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let digest = hash_reader(file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    if args.hex {
        println!("{}", digest.to_hex());
    } else {
        println!("{digest}");
    }
    Ok(0)
}

/// Check a filename against the naming convention.
pub fn run_check_name(name: &str) -> Result<u8> {
    match parse_file_name(name) {
        Ok(parsed) => {
            println!(
                "OK: owner={} type={} extension={}",
                parsed.owner_id, parsed.document_type, parsed.extension
            );
            Ok(0)
        }
        Err(e) => {
            println!("INVALID: {e}");
            Ok(1)
        }
    }
}

/// Issue one document through the service.
pub async fn run_issue(api: &ApiClient, args: &IssueArgs) -> Result<u8> {
    let file_name = file_name_of(&args.file)?;
    let (owner_id, document_type) = issue_identity(&file_name, args)?;
    let bytes = read_file(&args.file)?;

    let issued = api.issue(&file_name, bytes, &owner_id, &document_type).await?;
    println!(
        "OK: issued owner={} type={} hash={}",
        issued.record.owner_id, issued.record.document_type, issued.record.content_hash
    );
    println!("  transaction: {} (block {}, {})", issued.transaction_id, issued.block_number, issued.chain);
    println!("  locator:     {}", issued.locator);
    Ok(0)
}

/// Explicit flags win; otherwise the filename must carry owner and type.
fn issue_identity(file_name: &str, args: &IssueArgs) -> Result<(OwnerId, DocumentType), FormatError> {
    match (&args.owner, &args.document_type) {
        (Some(owner), Some(doc_type)) => Ok((OwnerId::new(owner.as_str())?, DocumentType::new(doc_type.as_str())?)),
        (owner, doc_type) => {
            let parsed = parse_file_name(file_name)?;
            let owner_id = match owner {
                Some(o) => OwnerId::new(o.as_str())?,
                None => parsed.owner_id,
            };
            let document_type = match doc_type {
                Some(t) => DocumentType::new(t.as_str())?,
                None => parsed.document_type,
            };
            Ok((owner_id, document_type))
        }
    }
}

/// Verify one file against its owner's records.
pub async fn run_verify(api: &ApiClient, file: &Path) -> Result<u8> {
    let file_name = file_name_of(file)?;
    parse_file_name(&file_name)?;
    let bytes = read_file(file)?;

    let engine = VerificationEngine::new(Arc::new(api.clone()));
    let result = engine.verify(&file_name, &bytes).await?;

    if let Some(record) = &result.matched_record {
        println!(
            "VALID: {} matches record {} issued {}",
            result.file_name, record.id, record.created_at
        );
        println!("  locator: {}", record.storage_locator);
        Ok(0)
    } else if result.owner_unknown() {
        println!("INVALID: no documents on record for {}", result.owner_id);
        Ok(1)
    } else {
        println!(
            "INVALID: {} (hash {}) matches none of {} record(s) for {}",
            result.file_name,
            result.content_hash,
            result.candidate_records.len(),
            result.owner_id
        );
        Ok(1)
    }
}

/// Print an owner's records as JSON.
pub async fn run_lookup(api: &ApiClient, owner: &str) -> Result<u8> {
    let owner_id = OwnerId::new(owner)?;
    let records = api.lookup(&owner_id).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(0)
}

fn file_name_of(path: &Path) -> Result<String> {
    let raw = path.to_string_lossy();
    let name = base_name(&raw);
    anyhow::ensure!(!name.is_empty(), "not a file path: {}", path.display());
    Ok(name.to_string())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_args(owner: Option<&str>, doc_type: Option<&str>) -> IssueArgs {
        IssueArgs {
            file: PathBuf::from("unused"),
            owner: owner.map(String::from),
            document_type: doc_type.map(String::from),
        }
    }

    #[test]
    fn hash_of_known_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DL1234_Transcript.pdf");
        std::fs::write(&path, b"abc").unwrap();
        let code = run_hash(&HashArgs {
            file: path,
            hex: false,
        })
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn hash_of_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_hash(&HashArgs {
            file: dir.path().join("absent.pdf"),
            hex: true,
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("absent.pdf"));
    }

    #[test]
    fn check_name_exit_codes() {
        assert_eq!(run_check_name("DL1234_Degree-Certificate.pdf").unwrap(), 0);
        assert_eq!(run_check_name("certificate.pdf").unwrap(), 1);
        assert_eq!(run_check_name("DL1234_Bad_Name.pdf").unwrap(), 1);
    }

    #[test]
    fn identity_from_filename() {
        let (owner, doc_type) = issue_identity("DL1234_Transcript.pdf", &issue_args(None, None)).unwrap();
        assert_eq!(owner.as_str(), "DL1234");
        assert_eq!(doc_type.as_str(), "Transcript");
    }

    #[test]
    fn explicit_flags_bypass_filename() {
        let (owner, doc_type) =
            issue_identity("scan-0042.pdf", &issue_args(Some("AB0001"), Some("Birth Certificate"))).unwrap();
        assert_eq!(owner.as_str(), "AB0001");
        assert_eq!(doc_type.as_str(), "Birth Certificate");
    }

    #[test]
    fn partial_flags_still_need_conforming_name() {
        assert!(issue_identity("scan-0042.pdf", &issue_args(Some("AB0001"), None)).is_err());
        let (owner, _) = issue_identity("DL1234_Transcript.pdf", &issue_args(Some("AB0001"), None)).unwrap();
        assert_eq!(owner.as_str(), "AB0001");
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(
            file_name_of(Path::new("/tmp/batch/DL1234_Transcript.pdf")).unwrap(),
            "DL1234_Transcript.pdf"
        );
    }
}
