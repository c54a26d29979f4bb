//! Range fetcher: one GET for one window, body fully materialized.

use thiserror::Error;

use crate::transport::Transport;
use crate::window::ByteWindow;

/// A range request that produced no usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Status other than 200 / 206.
    #[error("server returned error {0}")]
    Http(u32),
    /// Connect/read timeout, reset, refused, ...
    #[error("transport error: {0}")]
    Transport(#[from] curl::Error),
}

/// Requests `window` and returns exactly the bytes received. 200 (range
/// ignored) and 206 are both accepted; length checking is the caller's job.
pub fn fetch_range<T: Transport + ?Sized>(
    transport: &T,
    window: ByteWindow,
) -> Result<Vec<u8>, FetchError> {
    let response = transport.get_range(window)?;
    match response.status {
        200 | 206 => Ok(response.body),
        code => Err(FetchError::Http(code)),
    }
}
