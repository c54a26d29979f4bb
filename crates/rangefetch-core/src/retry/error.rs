//! Outcome of one failed loop iteration.

use thiserror::Error;

use crate::range::FetchError;

#[derive(Debug, Error)]
pub enum AttemptError {
    /// Bad status or transport fault; the window is retried unchanged.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Server answered but with the wrong number of bytes; the window shrinks.
    #[error("partial data: got {received} bytes, expected {expected}")]
    PartialRangeData { expected: u64, received: u64 },
}
