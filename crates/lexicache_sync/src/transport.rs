//! Origin transport abstraction.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use bytes::Bytes;
use lexicache_store::DatasetSnapshot;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Talks to the origin data service.
///
/// This trait abstracts the network layer so adapters can run against HTTP
/// or an in-process mock.
#[async_trait]
pub trait OriginTransport: Send + Sync {
    /// Starts a `GET` of the dataset snapshot.
    ///
    /// Fails with [`SyncError::Network`] on transport failure or a
    /// non-success status.
    async fn fetch(&self) -> SyncResult<Box<dyn SnapshotBody>>;

    /// Sends a `HEAD` probe and returns the value of `version_header`, if
    /// the origin sent one.
    async fn probe(&self, version_header: &str) -> SyncResult<Option<String>>;
}

/// A snapshot body being received.
#[async_trait]
pub trait SnapshotBody: Send {
    /// Declared body length, when the origin sent one.
    fn content_length(&self) -> Option<u64>;

    /// Next chunk of the body, `None` once it is exhausted.
    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>>;
}

/// An in-process origin for testing.
///
/// Serves a fixed body in fixed-size chunks and a fixed version header, and
/// counts the requests it receives.
#[derive(Debug)]
pub struct MockOrigin {
    state: Mutex<MockState>,
    fetches: AtomicU64,
    probes: AtomicU64,
}

#[derive(Debug, Clone)]
struct MockState {
    body: Bytes,
    status: u16,
    chunk_size: usize,
    send_length: bool,
    declared_length: Option<u64>,
    version: Option<String>,
    unreachable: bool,
}

impl Default for MockOrigin {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                body: Bytes::new(),
                status: 200,
                chunk_size: 64 * 1024,
                send_length: true,
                declared_length: None,
                version: None,
                unreachable: false,
            }),
            fetches: AtomicU64::new(0),
            probes: AtomicU64::new(0),
        }
    }
}

impl MockOrigin {
    /// An origin serving an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// An origin serving `snapshot`, advertising its version.
    pub fn serving(snapshot: &DatasetSnapshot) -> Self {
        let origin = Self::new();
        origin.set_snapshot(snapshot);
        origin
    }

    /// Replaces the served snapshot and advertised version.
    pub fn set_snapshot(&self, snapshot: &DatasetSnapshot) {
        let body = serde_json::to_vec(snapshot).unwrap_or_default();
        let mut state = self.state.lock();
        state.body = Bytes::from(body);
        state.version = Some(snapshot.version.to_string());
    }

    /// Replaces the served body without touching the version header.
    pub fn set_body(&self, body: impl Into<Bytes>) {
        self.state.lock().body = body.into();
    }

    /// Sets the response status of both requests.
    pub fn set_status(&self, status: u16) {
        self.state.lock().status = status;
    }

    /// Sets the version header value; `None` omits the header.
    pub fn set_version_header(&self, value: Option<&str>) {
        self.state.lock().version = value.map(str::to_string);
    }

    /// Sets the size of body chunks.
    pub fn set_chunk_size(&self, size: usize) {
        self.state.lock().chunk_size = size.max(1);
    }

    /// Whether to declare the body length.
    pub fn set_send_length(&self, send: bool) {
        self.state.lock().send_length = send;
    }

    /// Declares `length` as the body length whatever the body's real size.
    pub fn set_declared_length(&self, length: u64) {
        self.state.lock().declared_length = Some(length);
    }

    /// Makes every request fail before reaching the origin.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Number of `GET` requests received.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `HEAD` requests received.
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::SeqCst)
    }

    fn answer(&self) -> SyncResult<MockState> {
        let state = self.state.lock().clone();
        if state.unreachable {
            return Err(SyncError::network("connection refused"));
        }
        if !(200..300).contains(&state.status) {
            return Err(SyncError::http_status(state.status, "from mock origin"));
        }
        Ok(state)
    }
}

#[async_trait]
impl OriginTransport for MockOrigin {
    async fn fetch(&self) -> SyncResult<Box<dyn SnapshotBody>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.answer()?;

        let length = state
            .send_length
            .then(|| state.declared_length.unwrap_or(state.body.len() as u64));
        let mut chunks = VecDeque::new();
        let mut rest = state.body;
        while !rest.is_empty() {
            let at = state.chunk_size.min(rest.len());
            chunks.push_back(rest.split_to(at));
        }
        Ok(Box::new(MockBody { chunks, length }))
    }

    async fn probe(&self, _version_header: &str) -> SyncResult<Option<String>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer()?.version)
    }
}

struct MockBody {
    chunks: VecDeque<Bytes>,
    length: Option<u64>,
}

#[async_trait]
impl SnapshotBody for MockBody {
    fn content_length(&self) -> Option<u64> {
        self.length
    }

    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(body: &mut dyn SnapshotBody) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while let Some(chunk) = body.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn body_is_served_in_chunks() {
        let origin = MockOrigin::new();
        origin.set_body(&b"0123456789"[..]);
        origin.set_chunk_size(4);

        let mut body = origin.fetch().await.unwrap();
        assert_eq!(body.content_length(), Some(10));
        let chunks = drain(body.as_mut()).await;
        assert_eq!(chunks, [&b"0123"[..], &b"4567"[..], &b"89"[..]]);
        assert_eq!(origin.fetch_count(), 1);
    }

    #[tokio::test]
    async fn length_can_be_withheld() {
        let origin = MockOrigin::new();
        origin.set_body(&b"abc"[..]);
        origin.set_send_length(false);
        assert_eq!(origin.fetch().await.unwrap().content_length(), None);
    }

    #[tokio::test]
    async fn failure_status_is_a_network_error() {
        let origin = MockOrigin::new();
        origin.set_status(503);

        let err = origin.fetch().await.err().unwrap();
        assert!(matches!(err, SyncError::Network { status: Some(503), .. }));
        assert!(origin.probe("X-Data-Version").await.unwrap_err().is_network());
        assert_eq!(origin.probe_count(), 1);
    }

    #[tokio::test]
    async fn probe_reports_header() {
        let origin = MockOrigin::new();
        assert_eq!(origin.probe("X-Data-Version").await.unwrap(), None);
        origin.set_version_header(Some("42"));
        assert_eq!(origin.probe("X-Data-Version").await.unwrap().as_deref(), Some("42"));

        origin.set_unreachable(true);
        assert!(origin.probe("X-Data-Version").await.is_err());
    }
}
