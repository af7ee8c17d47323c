//! In-memory HTTP server used by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use splitfetch::{ByteRange, FetchResponse, Headers, HttpClient, ProbeResponse};

#[derive(Debug, thiserror::Error)]
#[error("mock transport failure: {0}")]
pub struct MockError(pub String);

/// Fault injected for requests starting at a given offset.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Answer with this HTTP status.
    Status(u16),
    /// Fail before any response.
    Refused,
    /// Deliver half the body, then a transport error.
    BrokenBody,
    /// Deliver the first piece, then never finish.
    Stall,
    /// Deliver half the body, then end cleanly.
    Truncated,
    /// Append bytes past the end of the served slice.
    Padded(usize),
    /// Serve the right length but announce a `Content-Range` shifted by this many bytes.
    ShiftedRange(u64),
}

/// Serves `data` from memory, honouring range requests when asked to.
pub struct MockServer {
    data: Bytes,
    accept_ranges: bool,
    honor_ranges: bool,
    piece: usize,
    delay: Duration,
    extra_headers: Vec<(String, String)>,
    faults: Mutex<HashMap<u64, (Fault, u32)>>,
    requests: Mutex<Vec<Option<ByteRange>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockServer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            accept_ranges: true,
            honor_ranges: true,
            piece: 7,
            delay: Duration::ZERO,
            extra_headers: Vec::new(),
            faults: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Server without `Accept-Ranges` that always answers 200 with the full body.
    pub fn without_ranges(mut self) -> Self {
        self.accept_ranges = false;
        self.honor_ranges = false;
        self
    }

    /// Advertise ranges but ignore the `Range` header.
    pub fn ignoring_ranges(mut self) -> Self {
        self.honor_ranges = false;
        self
    }

    pub fn piece_size(mut self, piece: usize) -> Self {
        self.piece = piece.max(1);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Apply `fault` to the next `times` requests starting at `start`.
    pub fn fail(self, start: u64, fault: Fault, times: u32) -> Self {
        self.faults
            .lock()
            .unwrap()
            .insert(start, (fault, times));
        self
    }

    pub fn fail_always(self, start: u64, fault: Fault) -> Self {
        self.fail(start, fault, u32::MAX)
    }

    pub fn requests(&self) -> Vec<Option<ByteRange>> {
        self.requests.lock().unwrap().clone()
    }

    /// Highest number of bodies open at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn take_fault(&self, start: u64) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        let entry = faults.get_mut(&start)?;
        if entry.1 == 0 {
            return None;
        }
        entry.1 = entry.1.saturating_sub(1);
        Some(entry.0)
    }
}

/// Tracks open bodies; released when the body stream is dropped.
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn enter(active: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self {
            active: Arc::clone(active),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

fn pieces(body: Bytes, piece: usize) -> Vec<Result<Bytes, MockError>> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < body.len() {
        let end = (offset + piece).min(body.len());
        out.push(Ok(body.slice(offset..end)));
        offset = end;
    }
    out
}

impl HttpClient for MockServer {
    type Error = MockError;

    fn probe(&self, _url: &str) -> impl Future<Output = Result<ProbeResponse, MockError>> + Send {
        let mut headers: Headers = self
            .extra_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        headers.append("content-length", self.data.len().to_string());
        if self.accept_ranges {
            headers.append("accept-ranges", "bytes");
        }
        async move { Ok(ProbeResponse { status: 200, headers }) }
    }

    fn fetch(
        &self,
        _url: &str,
        range: Option<ByteRange>,
    ) -> impl Future<Output = Result<FetchResponse<MockError>, MockError>> + Send {
        self.requests.lock().unwrap().push(range);
        let start = range.map_or(0, |r| r.start);
        let fault = self.take_fault(start);
        let guard = ActiveGuard::enter(&self.active, &self.peak);
        let delay = self.delay;
        let piece = self.piece;

        let total = self.data.len();
        let (status, mut headers, body) = match range {
            Some(r) if self.honor_ranges => {
                let end = (r.end as usize).min(total);
                let announced = match fault {
                    Some(Fault::ShiftedRange(by)) => ByteRange::new(r.start + by, end as u64 + by),
                    _ => ByteRange::new(r.start, end as u64),
                };
                let mut headers = Headers::new();
                headers.append("content-range", format!("{announced}/{total}"));
                (206, headers, self.data.slice(r.start as usize..end))
            }
            _ => (200, Headers::new(), self.data.clone()),
        };
        headers.append("content-length", body.len().to_string());

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let items = match fault {
                None | Some(Fault::ShiftedRange(_)) => pieces(body, piece),
                Some(Fault::Status(code)) => {
                    return Ok(FetchResponse {
                        status: code,
                        headers: Headers::new(),
                        body: Box::pin(stream::empty()),
                    });
                }
                Some(Fault::Truncated) => pieces(body.slice(..body.len() / 2), piece),
                Some(Fault::Padded(extra)) => {
                    let mut padded = body.to_vec();
                    padded.extend(std::iter::repeat_n(0xAA, extra));
                    pieces(Bytes::from(padded), piece)
                }
                Some(Fault::Refused) => return Err(MockError("connection refused".into())),
                Some(Fault::BrokenBody) => {
                    let mut items = pieces(body.slice(..body.len() / 2), piece);
                    items.push(Err(MockError("connection reset".into())));
                    items
                }
                Some(Fault::Stall) => {
                    let first = pieces(body, piece).into_iter().take(1).collect::<Vec<_>>();
                    let body = stream::iter(first).chain(stream::pending()).map(move |item| {
                        let _held = &guard;
                        item
                    });
                    return Ok(FetchResponse {
                        status,
                        headers,
                        body: Box::pin(body),
                    });
                }
            };

            let body = stream::iter(items).map(move |item| {
                let _held = &guard;
                item
            });
            Ok(FetchResponse {
                status,
                headers,
                body: Box::pin(body),
            })
        }
    }
}

pub fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
