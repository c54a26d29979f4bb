//! Per-transfer state and the single-iteration transition.

use std::time::Duration;

use crate::progress::Progress;
use crate::range::FetchError;
use crate::retry::{AttemptError, RetryBudget};
use crate::window::ByteWindow;

/// What one loop iteration did.
#[derive(Debug)]
pub enum Step {
    /// Exact-length body accepted; the window moved past it.
    Advanced { window: ByteWindow, received: u64 },
    /// Wrong byte count; nothing accepted, window shrunk toward its start.
    Shrunk {
        window: ByteWindow,
        to: ByteWindow,
        error: AttemptError,
    },
    /// Fetch failed; same window next time.
    Retried {
        window: ByteWindow,
        error: AttemptError,
    },
}

impl Step {
    pub fn error(&self) -> Option<&AttemptError> {
        match self {
            Step::Advanced { .. } => None,
            Step::Shrunk { error, .. } | Step::Retried { error, .. } => Some(error),
        }
    }
}

/// Mutable state of one transfer, owned by the fetch loop.
///
/// Invariants: `window.start <= window.end < total_size`,
/// `downloaded_bytes == cursor <= total_size`, retry usage never decreases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferState {
    pub total_size: u64,
    pub chunk_size: u64,
    /// Next window to request. Left on the final window once `cursor == total_size`.
    pub window: ByteWindow,
    /// First byte not yet accepted.
    pub cursor: u64,
    pub retry: RetryBudget,
    pub downloaded_bytes: u64,
}

impl TransferState {
    /// `total_size` and `chunk_size` must be non-zero.
    pub fn new(total_size: u64, chunk_size: u64, max_retries: u32) -> Self {
        Self {
            total_size,
            chunk_size,
            window: ByteWindow::first(total_size, chunk_size),
            cursor: 0,
            retry: RetryBudget::new(max_retries),
            downloaded_bytes: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.total_size
    }

    /// Loop guard: more bytes wanted and budget left.
    pub fn should_continue(&self) -> bool {
        !self.is_finished() && !self.retry.exhausted()
    }

    pub fn is_complete(&self) -> bool {
        self.downloaded_bytes == self.total_size
    }

    /// Applies the result of fetching `self.window`. Bytes reach `accumulator`
    /// only on an exact-length match.
    pub fn apply(&mut self, result: Result<Vec<u8>, FetchError>, accumulator: &mut Vec<u8>) -> Step {
        let window = self.window;
        match result {
            Ok(bytes) if bytes.len() as u64 == window.len() => {
                accumulator.extend_from_slice(&bytes);
                self.downloaded_bytes += window.len();
                self.cursor = window.end + 1;
                if let Some(next) = window.next(self.total_size, self.chunk_size) {
                    self.window = next;
                }
                Step::Advanced {
                    window,
                    received: window.len(),
                }
            }
            Ok(bytes) => {
                self.retry.consume();
                self.window = window.halved();
                Step::Shrunk {
                    window,
                    to: self.window,
                    error: AttemptError::PartialRangeData {
                        expected: window.len(),
                        received: bytes.len() as u64,
                    },
                }
            }
            Err(e) => {
                self.retry.consume();
                Step::Retried {
                    window,
                    error: AttemptError::Fetch(e),
                }
            }
        }
    }

    pub fn progress(&self, elapsed: Duration) -> Progress {
        Progress {
            downloaded_bytes: self.downloaded_bytes,
            total_size: self.total_size,
            retries_used: self.retry.used(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}
