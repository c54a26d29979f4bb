//! Size resolver: learn the total resource size from a non-ranged probe.

use thiserror::Error;

use crate::downloader::DownloadError;
use crate::transport::Transport;

/// Why a single sizing probe did not yield a length.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("size probe transport error: {0}")]
    Transport(#[from] curl::Error),
    #[error("size probe returned HTTP {0}")]
    Status(u32),
    #[error("size probe response has no usable Content-Length")]
    MissingLength,
}

/// Declared `Content-Length` from raw header lines. When several responses
/// are present (e.g. `100 Continue` first) only the last block counts.
pub(crate) fn content_length(lines: &[String]) -> Option<u64> {
    let last_block = lines
        .iter()
        .rposition(|l| l.starts_with("HTTP/"))
        .map(|i| &lines[i..])
        .unwrap_or(lines);

    let mut length = None;
    for line in last_block {
        if let Some((name, value)) = line.trim().split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                length = value.trim().parse::<u64>().ok();
            }
        }
    }
    length
}

/// One probe: status must be 200 and a numeric `Content-Length` must be present.
pub fn probe_total_size<T: Transport + ?Sized>(transport: &T) -> Result<u64, ProbeError> {
    let response = transport.probe()?;
    if response.status != 200 {
        return Err(ProbeError::Status(response.status));
    }
    content_length(&response.headers).ok_or(ProbeError::MissingLength)
}

/// Probes up to `max_attempts` times, stopping at the first declared length.
pub fn resolve_total_size<T: Transport + ?Sized>(
    transport: &T,
    max_attempts: u32,
) -> Result<u64, DownloadError> {
    for attempt in 1..=max_attempts {
        match probe_total_size(transport) {
            Ok(size) => {
                tracing::info!(size, attempt, "resolved total size");
                return Ok(size);
            }
            Err(e) => {
                tracing::warn!(attempt, max_attempts, "{}", e);
            }
        }
    }
    Err(DownloadError::SizeUnavailable {
        attempts: max_attempts,
    })
}
