//! Scripted in-memory transport for driving the downloader in unit tests.

use std::cell::{Cell, RefCell};

use super::{RawResponse, Transport};
use crate::window::ByteWindow;

/// curl's "operation timed out" error (CURLE_OPERATION_TIMEDOUT). The literal
/// takes whatever integer type `CURLcode` has on this platform.
pub(crate) fn timed_out() -> curl::Error {
    curl::Error::new(28)
}

/// What the fake server does with one sizing probe.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ProbeReply {
    /// 200 with `Content-Length` equal to the body length.
    Ok,
    /// 200 with an arbitrary declared `Content-Length`.
    Length(u64),
    Status(u32),
    NoLength,
    Fault,
}

/// What the fake server does with one range request.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RangeReply {
    /// 206 with exactly the requested bytes.
    Exact,
    /// 206 with only the first `n` requested bytes.
    Truncated(u64),
    /// 200 with the whole body, range ignored.
    IgnoreRange,
    Status(u32),
    Fault,
}

type ProbeScript = Box<dyn Fn(usize) -> ProbeReply>;
type RangeScript = Box<dyn Fn(usize, ByteWindow) -> RangeReply>;

pub(crate) struct ScriptedTransport {
    body: Vec<u8>,
    probe_script: ProbeScript,
    range_script: RangeScript,
    probes: Cell<usize>,
    requests: RefCell<Vec<ByteWindow>>,
}

impl ScriptedTransport {
    /// Well-behaved server for `body`.
    pub(crate) fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            probe_script: Box::new(|_| ProbeReply::Ok),
            range_script: Box::new(|_, _| RangeReply::Exact),
            probes: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// `script(probe_index)`; indexes start at 0.
    pub(crate) fn with_probe(mut self, script: impl Fn(usize) -> ProbeReply + 'static) -> Self {
        self.probe_script = Box::new(script);
        self
    }

    /// `script(request_index, window)`; indexes start at 0.
    pub(crate) fn with_ranges(
        mut self,
        script: impl Fn(usize, ByteWindow) -> RangeReply + 'static,
    ) -> Self {
        self.range_script = Box::new(script);
        self
    }

    pub(crate) fn probe_count(&self) -> usize {
        self.probes.get()
    }

    /// Every window requested so far, in order.
    pub(crate) fn requests(&self) -> Vec<ByteWindow> {
        self.requests.borrow().clone()
    }

    fn slice(&self, start: u64, len: u64) -> Vec<u8> {
        let start = start as usize;
        let end = (start + len as usize).min(self.body.len());
        self.body.get(start..end).unwrap_or(&[]).to_vec()
    }
}

impl Transport for ScriptedTransport {
    fn probe(&self) -> Result<RawResponse, curl::Error> {
        let index = self.probes.get();
        self.probes.set(index + 1);
        let status_line = |code: u32| format!("HTTP/1.1 {} X", code);
        match (self.probe_script)(index) {
            ProbeReply::Ok => Ok(RawResponse {
                status: 200,
                headers: vec![
                    status_line(200),
                    format!("Content-Length: {}", self.body.len()),
                ],
                body: Vec::new(),
            }),
            ProbeReply::Length(len) => Ok(RawResponse {
                status: 200,
                headers: vec![status_line(200), format!("Content-Length: {}", len)],
                body: Vec::new(),
            }),
            ProbeReply::Status(code) => Ok(RawResponse {
                status: code,
                headers: vec![status_line(code), "Content-Length: 0".to_string()],
                body: Vec::new(),
            }),
            ProbeReply::NoLength => Ok(RawResponse {
                status: 200,
                headers: vec![status_line(200)],
                body: Vec::new(),
            }),
            ProbeReply::Fault => Err(timed_out()),
        }
    }

    fn get_range(&self, window: ByteWindow) -> Result<RawResponse, curl::Error> {
        let index = {
            let mut requests = self.requests.borrow_mut();
            requests.push(window);
            requests.len() - 1
        };
        let (status, body) = match (self.range_script)(index, window) {
            RangeReply::Exact => (206, self.slice(window.start, window.len())),
            RangeReply::Truncated(n) => (206, self.slice(window.start, n.min(window.len()))),
            RangeReply::IgnoreRange => (200, self.body.clone()),
            RangeReply::Status(code) => (code, Vec::new()),
            RangeReply::Fault => return Err(timed_out()),
        };
        Ok(RawResponse {
            status,
            headers: vec![format!("HTTP/1.1 {} X", status)],
            body,
        })
    }
}
