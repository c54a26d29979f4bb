//! CLI for the rangefetch chunked downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_checksum, run_completions, run_fetch, FetchArgs};

/// Target used when no URL is given.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rangefetch")]
#[command(about = "Download a whole file from a server with unreliable Range support", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the whole file in chunks and print its SHA-256.
    Fetch {
        /// HTTP/HTTPS URL of the file.
        #[arg(default_value = DEFAULT_URL)]
        url: String,
        /// Write the downloaded bytes to this path.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Write to a file named after the URL path (download.bin for bare hosts).
        #[arg(long, conflicts_with = "output")]
        save: bool,
        /// Exit with an error unless the SHA-256 of the result matches.
        #[arg(long, value_name = "HEX")]
        expect_sha256: Option<String>,
        /// Window width in bytes (overrides config.toml).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,
        /// Global retry budget (overrides config.toml).
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,
        /// Write the bytes received so far even when the download is incomplete.
        #[arg(long)]
        keep_partial: bool,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                url,
                output,
                save,
                expect_sha256,
                chunk_size,
                max_retries,
                keep_partial,
            } => {
                run_fetch(FetchArgs {
                    url,
                    output,
                    save,
                    expect_sha256,
                    chunk_size,
                    max_retries,
                    keep_partial,
                })
                .await?
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}
