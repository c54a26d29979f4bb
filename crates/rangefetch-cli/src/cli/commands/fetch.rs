//! `rangefetch fetch [url]` – chunked download with digest and optional output file.

use anyhow::{Context, Result};
use rangefetch_core::checksum;
use rangefetch_core::config::{self, DownloadConfig};
use rangefetch_core::progress::{Progress, ProgressObserver};
use rangefetch_core::transport::CurlTransport;
use rangefetch_core::{DownloadOutcome, Downloader};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub save: bool,
    pub expect_sha256: Option<String>,
    pub chunk_size: Option<u64>,
    pub max_retries: Option<u32>,
    pub keep_partial: bool,
}

/// Prints the resolved size right after sizing, then a carriage-return progress line.
struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_start(&mut self, total_size: u64, chunk_size: u64) {
        println!("Total content size: {} bytes", total_size);
        println!("Starting download in chunks of {} bytes...", chunk_size);
    }

    fn on_progress(&mut self, p: &Progress) {
        let mut out = std::io::stdout().lock();
        let _ = write!(
            out,
            "\rProgress: {:.2}% ({}/{} bytes)",
            p.percent(),
            p.downloaded_bytes,
            p.total_size
        );
        let _ = out.flush();
    }
}

/// Applies CLI overrides on top of the loaded config.
fn effective_config(base: DownloadConfig, args: &FetchArgs) -> Result<DownloadConfig> {
    let mut cfg = base;
    if let Some(n) = args.chunk_size {
        cfg.chunk_size = n;
    }
    if let Some(n) = args.max_retries {
        cfg.max_retries = n;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn output_path(args: &FetchArgs, transport: &CurlTransport) -> Option<PathBuf> {
    match (&args.output, args.save) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(PathBuf::from(transport.file_name_hint())),
        (None, false) => None,
    }
}

fn report(outcome: &DownloadOutcome, cfg: &DownloadConfig) {
    if outcome.complete {
        println!("Download complete! {} bytes received.", outcome.bytes.len());
    } else if let Some(failure) = &outcome.failure {
        println!(
            "Warning: failed to download all chunks after {} retries ({})",
            cfg.max_retries, failure
        );
    }
    if outcome.summary.total() > 0 {
        println!(
            "Recovered failures: {} partial, {} throttled, {} other",
            outcome.summary.partial_events,
            outcome.summary.throttle_events,
            outcome.summary.error_events
        );
    }
    println!("SHA-256 hash of downloaded data: {}", outcome.digest());
}

pub async fn run_fetch(args: FetchArgs) -> Result<()> {
    let base = config::load_or_init().unwrap_or_else(|e| {
        tracing::warn!("config unavailable ({:#}); using built-in defaults", e);
        DownloadConfig::default()
    });
    let cfg = effective_config(base, &args)?;
    let transport = CurlTransport::new(&args.url)?;
    let output = output_path(&args, &transport);

    println!("Starting download from {} ...", transport.url());

    let outcome = tokio::task::spawn_blocking({
        let cfg = cfg.clone();
        move || {
            let downloader = Downloader::new(transport, cfg);
            downloader.download_total_file(&mut ConsoleProgress)
        }
    })
    .await
    .context("download task join")?;
    println!();

    if outcome.bytes.is_empty() {
        match &outcome.failure {
            Some(failure) => anyhow::bail!("download failed: {}", failure),
            None => anyhow::bail!("download failed"),
        }
    }
    report(&outcome, &cfg);

    if let Some(path) = output {
        if outcome.complete || args.keep_partial {
            std::fs::write(&path, &outcome.bytes)
                .with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {} bytes to {}", outcome.bytes.len(), path.display());
        } else {
            println!("Not writing incomplete result to {} (use --keep-partial)", path.display());
        }
    }

    if let Some(expected) = &args.expect_sha256 {
        let actual = outcome.digest();
        if !checksum::matches_hex(&actual, expected) {
            anyhow::bail!("SHA-256 mismatch: expected {}, got {}", expected.trim(), actual);
        }
        println!("SHA-256 matches expected value");
    }

    if let Some(failure) = outcome.failure {
        return Err(failure).context("download incomplete");
    }
    Ok(())
}
