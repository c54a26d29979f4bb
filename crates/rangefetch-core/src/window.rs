//! Byte window math for Range requests.
//!
//! A window is an inclusive `[start, end]` span of the resource. Windows
//! advance monotonically through `[0, total_size)` and shrink toward their
//! start when the server returns the wrong number of bytes.

use std::fmt;

/// Inclusive byte span `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteWindow {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "inverted window {}-{}", start, end);
        Self { start, end }
    }

    /// First window of a transfer: `[0, min(chunk_size, total_size) - 1]`.
    /// `total_size` and `chunk_size` must both be non-zero.
    pub fn first(total_size: u64, chunk_size: u64) -> Self {
        Self::starting_at(0, total_size, chunk_size)
    }

    fn starting_at(start: u64, total_size: u64, chunk_size: u64) -> Self {
        let end = start
            .saturating_add(chunk_size.max(1) - 1)
            .min(total_size.saturating_sub(1));
        Self { start, end }
    }

    /// Window following this one at full chunk width, or `None` once the
    /// resource is exhausted.
    pub fn next(&self, total_size: u64, chunk_size: u64) -> Option<Self> {
        let start = self.end + 1;
        if start >= total_size {
            return None;
        }
        Some(Self::starting_at(start, total_size, chunk_size))
    }

    /// Same start, upper bound moved halfway toward it. A one-byte window is
    /// returned unchanged, so the result is never inverted.
    pub fn halved(&self) -> Self {
        Self {
            start: self.start,
            end: self.start + (self.end - self.start) / 2,
        }
    }

    /// Number of bytes covered (always >= 1).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_single_byte(&self) -> bool {
        self.start == self.end
    }

    /// Value for the curl range option / `Range` header body: `start-end`.
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// Full HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }
}

impl fmt::Display for ByteWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
