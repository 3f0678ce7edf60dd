//! # Batch Subcommand
//!
//! Issue or verify every file in a zip archive. Progress goes to stderr after
//! each entry; the summary and failed entries go to stdout. The exit code is
//! 1 when any entry failed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use docledger_pipeline::{BatchProcessor, BatchReport, EntryHandler, Progress, VerificationEngine};

use crate::api::ApiClient;

/// Arguments for `docledger batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub command: BatchCommand,
}

#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Issue every document in the archive through the service.
    Issue {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },

    /// Verify every document in the archive against its owner's records.
    Verify {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

/// Execute the batch subcommand.
pub async fn run_batch(api: &ApiClient, args: &BatchArgs) -> Result<u8> {
    match &args.command {
        BatchCommand::Issue { archive } => {
            let report = process(api.clone(), archive).await?;
            Ok(summarize(&report, |issued| {
                format!("{} {}", issued.transaction_id, issued.locator)
            }))
        }
        BatchCommand::Verify { archive } => {
            let engine = VerificationEngine::new(Arc::new(api.clone()));
            let report = process(engine, archive).await?;
            Ok(summarize(&report, |result| match &result.matched_record {
                Some(record) => format!("matches record {}", record.id),
                None => "no match".to_string(),
            }))
        }
    }
}

async fn process<H: EntryHandler>(handler: H, archive: &Path) -> Result<BatchReport<H::Output>> {
    let report = BatchProcessor::new(handler)
        .run_path(archive, print_progress)
        .await?;
    eprintln!();
    Ok(report)
}

fn print_progress(p: Progress) {
    eprint!("\r[{}/{}] {:>3}%", p.processed, p.total, p.percent());
    let _ = std::io::stderr().flush();
}

/// Print the report and return the exit code.
fn summarize<T>(report: &BatchReport<T>, describe: impl Fn(&T) -> String) -> u8 {
    for entry in &report.succeeded {
        println!("OK    {}  {}", entry.file_name, describe(&entry.output));
    }
    for entry in &report.failed {
        println!("FAIL  {}  {}", entry.file_name, entry.reason);
    }
    println!(
        "{} entries: {} succeeded, {} failed",
        report.total,
        report.succeeded.len(),
        report.failed.len()
    );
    u8::from(!report.all_succeeded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docledger_pipeline::{FailedEntry, SucceededEntry};

    #[test]
    fn exit_code_reflects_failures() {
        let mut report = BatchReport {
            total: 1,
            succeeded: vec![SucceededEntry {
                file_name: "DL1234_Transcript.pdf".to_string(),
                output: 7u32,
            }],
            failed: Vec::new(),
        };
        assert_eq!(summarize(&report, |n| n.to_string()), 0);

        report.total = 2;
        report.failed.push(FailedEntry {
            file_name: "certificate.pdf".into(),
            reason: "missing owner prefix".into(),
            output: None,
        });
        assert_eq!(summarize(&report, |n| n.to_string()), 1);
    }
}
