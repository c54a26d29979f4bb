//! Minimal HTTP/1.1 server that misbehaves on purpose, for integration tests.
//!
//! Serves a single static body. A GET without `Range` is a size probe and gets
//! 200 with `Content-Length`; a GET with `Range: bytes=X-Y` gets 206. Options
//! make the server cut wide ranges short, fail every n-th range request, or
//! refuse the first probes.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlitchyOptions {
    /// Range bodies are cut to at most this many bytes.
    pub max_range_bytes: Option<u64>,
    /// Every n-th range request (1-based) is answered with 500.
    pub fail_every: Option<usize>,
    /// The first n size probes are answered with 500.
    pub failing_probes: usize,
}

pub struct GlitchyServer {
    pub url: String,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    probes: AtomicUsize,
    ranges: AtomicUsize,
    /// Requests that arrived without `Connection: close`.
    keep_alive: AtomicUsize,
}

impl GlitchyServer {
    pub fn probe_count(&self) -> usize {
        self.counters.probes.load(Ordering::SeqCst)
    }

    pub fn range_count(&self) -> usize {
        self.counters.ranges.load(Ordering::SeqCst)
    }

    /// Requests (probe or range) that did not carry `Connection: close`.
    pub fn keep_alive_count(&self) -> usize {
        self.counters.keep_alive.load(Ordering::SeqCst)
    }
}

/// Well-behaved server for `body`.
pub fn start(body: Vec<u8>) -> GlitchyServer {
    start_with_options(body, GlitchyOptions::default())
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start_with_options(body: Vec<u8>, opts: GlitchyOptions) -> GlitchyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let counters = Arc::new(Counters::default());
    {
        let counters = Arc::clone(&counters);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let body = Arc::clone(&body);
                let counters = Arc::clone(&counters);
                thread::spawn(move || handle(stream, &body, opts, &counters));
            }
        });
    }
    GlitchyServer {
        url: format!("http://127.0.0.1:{}/", port),
        counters,
    }
}

/// A URL nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if data.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(data).ok()
}

fn respond(stream: &mut TcpStream, status: &str, extra_headers: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        body.len(),
        extra_headers
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: GlitchyOptions,
    counters: &Counters,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    let parsed = parse_request(&request);
    if !parsed.connection_close {
        counters.keep_alive.fetch_add(1, Ordering::SeqCst);
    }
    let (method, range) = (parsed.method, parsed.range);
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "", &[]);
        return;
    }
    let total = body.len() as u64;

    let (start, end_incl) = match range {
        None => {
            let n = counters.probes.fetch_add(1, Ordering::SeqCst);
            if n < opts.failing_probes {
                respond(&mut stream, "500 Internal Server Error", "", &[]);
            } else {
                respond(&mut stream, "200 OK", "", body);
            }
            return;
        }
        Some(r) => r,
    };

    let n = counters.ranges.fetch_add(1, Ordering::SeqCst) + 1;
    if opts.fail_every.map_or(false, |every| every > 0 && n % every == 0) {
        respond(&mut stream, "500 Internal Server Error", "", &[]);
        return;
    }
    let end_incl = end_incl.min(total.saturating_sub(1));
    if start > end_incl {
        let header = format!("Content-Range: bytes */{}\r\n", total);
        respond(&mut stream, "416 Range Not Satisfiable", &header, &[]);
        return;
    }
    let mut len = end_incl - start + 1;
    if let Some(max) = opts.max_range_bytes {
        len = len.min(max);
    }
    let slice = &body[start as usize..(start + len) as usize];
    let header = if slice.is_empty() {
        format!("Content-Range: bytes */{}\r\n", total)
    } else {
        format!(
            "Content-Range: bytes {}-{}/{}\r\n",
            start,
            start + len - 1,
            total
        )
    };
    respond(&mut stream, "206 Partial Content", &header, slice);
}

struct ParsedRequest<'a> {
    method: &'a str,
    /// (start, end_inclusive) from `Range: bytes=X-Y`.
    range: Option<(u64, u64)>,
    connection_close: bool,
}

fn parse_request(request: &str) -> ParsedRequest<'_> {
    let mut method = "";
    let mut range = None;
    let mut connection_close = false;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("connection") {
                connection_close = value.trim().eq_ignore_ascii_case("close");
            }
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(span) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = span.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end));
                    }
                }
            }
        }
    }
    ParsedRequest {
        method,
        range,
        connection_close,
    }
}
