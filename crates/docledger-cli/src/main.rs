//! # docledger CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use docledger_cli::api::ApiClient;
use docledger_cli::batch::{run_batch, BatchArgs};
use docledger_cli::document::{
    run_check_name, run_hash, run_issue, run_lookup, run_verify, HashArgs, IssueArgs,
};
use docledger_cli::DEFAULT_API_URL;

/// DocLedger CLI
///
/// Hash documents, check filenames, issue documents through the service, and
/// verify single files or zip batches against their owners' records.
#[derive(Parser, Debug)]
#[command(name = "docledger", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the DocLedger service.
    #[arg(long, global = true, env = "DOCLEDGER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 of a file.
    Hash(HashArgs),

    /// Check a filename against the `<OWNER>_<Type>.<ext>` convention.
    CheckName {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Upload, anchor, and record a document.
    Issue(IssueArgs),

    /// Verify a file against the records of the owner named in its filename.
    Verify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List every record held for an owner.
    Lookup {
        #[arg(value_name = "OWNER_ID")]
        owner_id: String,
    },

    /// Issue or verify every document in a zip archive.
    Batch(BatchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(api_url = %cli.api_url, "docledger CLI starting");

    let result = match ApiClient::new(&cli.api_url) {
        Ok(api) => match cli.command {
            Commands::Hash(args) => run_hash(&args),
            Commands::CheckName { name } => run_check_name(&name),
            Commands::Issue(args) => run_issue(&api, &args).await,
            Commands::Verify { file } => run_verify(&api, &file).await,
            Commands::Lookup { owner_id } => run_lookup(&api, &owner_id).await,
            Commands::Batch(args) => run_batch(&api, &args).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
