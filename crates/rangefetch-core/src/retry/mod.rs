//! Failure taxonomy and the global retry budget.
//!
//! Every recoverable failure in the fetch loop (bad status, transport fault,
//! wrong byte count) costs one unit of a single budget shared by the whole
//! transfer. Classification only feeds logging and the download summary; it
//! never changes how much a failure costs.

mod budget;
mod classify;
mod error;

pub use budget::RetryBudget;
pub use classify::{classify, classify_curl_error, classify_http_status, ErrorKind};
pub use error::AttemptError;

/// Failure counters for one download, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// 429 / 503 responses.
    pub throttle_events: u32,
    /// Wrong byte count for the requested window.
    pub partial_events: u32,
    /// Everything else (timeouts, resets, other statuses).
    pub error_events: u32,
}

impl DownloadSummary {
    pub fn record(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Throttled => self.throttle_events += 1,
            ErrorKind::Partial => self.partial_events += 1,
            _ => self.error_events += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.throttle_events + self.partial_events + self.error_events
    }
}
