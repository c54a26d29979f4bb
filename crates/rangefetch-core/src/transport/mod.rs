//! HTTP transport capability.
//!
//! The downloader only needs two things from HTTP: a sizing probe and a
//! single Range GET. Both go through [`Transport`] so the state machine can be
//! driven by a scripted fake in tests. [`CurlTransport`] is the libcurl
//! implementation: one `Easy` handle per call, no connection reuse.

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

use crate::config::{CONNECT_TIMEOUT, READ_TIMEOUT};
use crate::window::ByteWindow;

#[cfg(test)]
pub(crate) mod fake;

const DEFAULT_FILE_NAME: &str = "download.bin";

/// Status, header lines and body of one HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u32,
    /// Raw header lines including the status line(s), trailing CRLF stripped.
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

pub trait Transport {
    /// Non-ranged GET of the resource. Only the status and headers are read;
    /// the body is left unread and `RawResponse::body` is empty.
    fn probe(&self) -> Result<RawResponse, curl::Error>;

    /// GET with `Range: bytes=start-end`, reading the whole body.
    fn get_range(&self, window: ByteWindow) -> Result<RawResponse, curl::Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn probe(&self) -> Result<RawResponse, curl::Error> {
        (**self).probe()
    }

    fn get_range(&self, window: ByteWindow) -> Result<RawResponse, curl::Error> {
        (**self).get_range(window)
    }
}

/// libcurl-backed transport for a single fixed URL.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    url: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl CurlTransport {
    /// Accepts absolute `http://` and `https://` URLs only.
    pub fn new(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url).with_context(|| format!("invalid URL {:?}", url))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!("unsupported URL scheme {:?} (expected http or https)", other),
        }
        Ok(Self {
            url: parsed.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Local file name for the resource: last URL path segment, or
    /// `download.bin` when the path is empty or root.
    pub fn file_name_hint(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| {
                u.path()
                    .split('/')
                    .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                    .last()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
    }

    fn perform(&self, range: Option<ByteWindow>, read_body: bool) -> Result<RawResponse, curl::Error> {
        let mut headers: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        // Dropped on every return path, which closes the connection.
        let mut easy = curl::easy::Easy::new();
        easy.url(&self.url)?;
        easy.get(true)?;
        easy.follow_location(false)?;
        easy.forbid_reuse(true)?;
        easy.fresh_connect(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Read timeout: fail when the transfer stalls (< 1 B/s) for the whole window.
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.read_timeout)?;
        if let Some(window) = range {
            easy.range(&window.curl_range())?;
        }

        let mut list = curl::easy::List::new();
        list.append("Connection: close")?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                if !read_body {
                    // Short write stops the transfer once headers are in.
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            if let Err(e) = transfer.perform() {
                if read_body || !e.is_write_error() {
                    return Err(e);
                }
            }
        }

        let status = easy.response_code()?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for CurlTransport {
    fn probe(&self) -> Result<RawResponse, curl::Error> {
        tracing::debug!(url = %self.url, "size probe");
        self.perform(None, false)
    }

    fn get_range(&self, window: ByteWindow) -> Result<RawResponse, curl::Error> {
        tracing::debug!(url = %self.url, range = %window, "range request");
        self.perform(Some(window), true)
    }
}
