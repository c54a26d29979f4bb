//! Download orchestrator.
//!
//! `SIZING -> FETCHING -> {DONE, FAILED}`: resolve the total size, then
//! request successive windows one at a time, appending only exact-length
//! bodies. A wrong byte count shrinks the window toward its start; any other
//! failure retries the same window. Both cost one unit of a retry budget
//! shared by the whole transfer. The loop ends when the cursor reaches the
//! total size or the budget runs out.

mod state;

pub use state::{Step, TransferState};

use std::time::Instant;
use thiserror::Error;

use crate::checksum;
use crate::config::DownloadConfig;
use crate::progress::ProgressObserver;
use crate::range::fetch_range;
use crate::retry::{classify, DownloadSummary};
use crate::size::resolve_total_size;
use crate::transport::Transport;

/// Upper bound on the result buffer reserved before any byte arrives (64 MiB).
pub const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Why a download produced no (or only a partial) result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("could not determine total size after {attempts} attempts")]
    SizeUnavailable { attempts: u32 },
    #[error("server declared a content length of 0")]
    EmptyResource,
    #[error("retry budget of {retries} exhausted after {downloaded} of {total} bytes")]
    RetryBudgetExhausted {
        downloaded: u64,
        total: u64,
        retries: u32,
    },
}

/// The only artifact handed back to the caller.
#[derive(Debug, Clone, Default)]
pub struct DownloadOutcome {
    /// Accepted bytes in order; a prefix of the resource when incomplete.
    pub bytes: Vec<u8>,
    /// `None` when sizing failed.
    pub total_size: Option<u64>,
    /// True iff every byte of the resource was accepted.
    pub complete: bool,
    pub retries_used: u32,
    pub summary: DownloadSummary,
    pub failure: Option<DownloadError>,
}

impl DownloadOutcome {
    fn failed(error: DownloadError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Lowercase hex SHA-256 of `bytes`.
    pub fn digest(&self) -> String {
        checksum::sha256_hex(&self.bytes)
    }
}

/// Sequential chunked downloader for one URL.
pub struct Downloader<T> {
    transport: T,
    config: DownloadConfig,
}

impl<T: Transport> Downloader<T> {
    pub fn new(transport: T, config: DownloadConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Runs the whole state machine. `Err` only when no size could be
    /// obtained; budget exhaustion is an incomplete `Ok` outcome.
    pub fn run<O>(&self, observer: &mut O) -> Result<DownloadOutcome, DownloadError>
    where
        O: ProgressObserver + ?Sized,
    {
        let total_size = resolve_total_size(&self.transport, self.config.max_size_retries)?;
        if total_size == 0 {
            return Err(DownloadError::EmptyResource);
        }
        let chunk_size = self.config.chunk_size.max(1);
        tracing::info!(total_size, chunk_size, "starting chunked download");

        let mut state = TransferState::new(total_size, chunk_size, self.config.max_retries);
        let mut accumulator: Vec<u8> = Vec::new();
        // The declared length is untrusted; reserve at most MAX_PREALLOC up front.
        let reserve = usize::try_from(total_size)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOC);
        if let Err(e) = accumulator.try_reserve_exact(reserve) {
            tracing::warn!(reserve, "could not preallocate result buffer: {}", e);
        }
        let mut summary = DownloadSummary::default();
        let started = Instant::now();
        observer.on_start(total_size, chunk_size);

        while state.should_continue() {
            let result = fetch_range(&self.transport, state.window);
            let step = state.apply(result, &mut accumulator);
            if let Some(error) = step.error() {
                summary.record(classify(error));
            }
            match &step {
                Step::Advanced { window, received } => {
                    tracing::debug!(range = %window, received, "range accepted");
                }
                Step::Shrunk { window, to, error } => {
                    tracing::warn!(
                        range = %window,
                        next = %to,
                        retries = state.retry.used(),
                        "{}",
                        error
                    );
                }
                Step::Retried { window, error } => {
                    tracing::warn!(range = %window, retries = state.retry.used(), "{}", error);
                }
            }
            observer.on_progress(&state.progress(started.elapsed()));
        }

        let complete = state.is_complete();
        let failure = if complete {
            tracing::info!(
                bytes = state.downloaded_bytes,
                retries = state.retry.used(),
                "download complete"
            );
            None
        } else {
            let err = DownloadError::RetryBudgetExhausted {
                downloaded: state.downloaded_bytes,
                total: total_size,
                retries: state.retry.used(),
            };
            tracing::warn!("{}", err);
            Some(err)
        };

        Ok(DownloadOutcome {
            bytes: accumulator,
            total_size: Some(total_size),
            complete,
            retries_used: state.retry.used(),
            summary,
            failure,
        })
    }

    /// Like [`run`](Self::run) but never fails: a sizing failure becomes an
    /// empty, incomplete outcome carrying the error.
    pub fn download_total_file<O>(&self, observer: &mut O) -> DownloadOutcome
    where
        O: ProgressObserver + ?Sized,
    {
        match self.run(observer) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("{}", e);
                DownloadOutcome::failed(e)
            }
        }
    }
}
