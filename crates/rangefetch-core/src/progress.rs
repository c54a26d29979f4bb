//! Progress observation for a running download.
//!
//! The fetch loop announces the resolved size once, then reports a
//! [`Progress`] snapshot after every iteration, successful or not.
//! Observers are side channels only; nothing they do feeds back into the
//! transfer.

/// Snapshot of one download's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Bytes accepted into the result buffer.
    pub downloaded_bytes: u64,
    /// Declared size of the resource.
    pub total_size: u64,
    /// Retries spent from the global budget.
    pub retries_used: u32,
    /// Seconds since the range phase started.
    pub elapsed_secs: f64,
}

impl Progress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_size == 0 {
            return 1.0;
        }
        (self.downloaded_bytes as f64 / self.total_size as f64).min(1.0)
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.downloaded_bytes as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_size.saturating_sub(self.downloaded_bytes);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }
}

/// Receives one snapshot per fetch-loop iteration.
pub trait ProgressObserver {
    /// Called once, after sizing and before the first range request.
    fn on_start(&mut self, _total_size: u64, _chunk_size: u64) {}

    fn on_progress(&mut self, progress: &Progress);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&Progress),
{
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Observer that ignores every snapshot.
pub fn no_progress(_: &Progress) {}
