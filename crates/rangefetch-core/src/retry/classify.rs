//! Classify HTTP status and curl errors into error kinds.

use super::error::AttemptError;
use crate::range::FetchError;

/// High-level classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Other 5xx.
    Http5xx(u16),
    /// Wrong byte count for the window.
    Partial,
    Other,
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

pub fn classify(e: &AttemptError) -> ErrorKind {
    match e {
        AttemptError::Fetch(FetchError::Transport(ce)) => classify_curl_error(ce),
        AttemptError::Fetch(FetchError::Http(code)) => classify_http_status(*code),
        AttemptError::PartialRangeData { .. } => ErrorKind::Partial,
    }
}
