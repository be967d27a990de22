//! HTTP origin transport backed by `reqwest`.

use crate::error::{SyncError, SyncResult};
use crate::transport::{OriginTransport, SnapshotBody};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, Url};
use tracing::debug;

/// Fetches the snapshot over HTTP(S).
///
/// Uses the client's default timeouts. Compressed bodies are not negotiated;
/// the declared length, when present, is the length of the JSON itself.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Creates a transport for `endpoint`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Network`] if the endpoint is not an absolute URL or the
    /// client cannot be built.
    pub fn new(endpoint: &str) -> SyncResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SyncError::network(format!("invalid endpoint {endpoint:?}: {e}")))?;
        let client = Client::builder()
            .user_agent(concat!("lexicache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::network(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// The endpoint this transport talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn check_status(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::http_status(
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status"),
        ))
    }
}

#[async_trait]
impl OriginTransport for HttpTransport {
    async fn fetch(&self) -> SyncResult<Box<dyn SnapshotBody>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| SyncError::network(format!("GET {} failed: {e}", self.endpoint)))?;
        let response = check_status(response)?;
        debug!(endpoint = %self.endpoint, length = ?response.content_length(), "snapshot response");
        Ok(Box::new(HttpBody { response }))
    }

    async fn probe(&self, version_header: &str) -> SyncResult<Option<String>> {
        let response = self
            .client
            .head(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| SyncError::network(format!("HEAD {} failed: {e}", self.endpoint)))?;
        let response = check_status(response)?;
        Ok(response
            .headers()
            .get(version_header)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }
}

struct HttpBody {
    response: Response,
}

#[async_trait]
impl SnapshotBody for HttpBody {
    fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>> {
        self.response
            .chunk()
            .await
            .map_err(|e| SyncError::network(format!("reading snapshot body failed: {e}")))
    }
}
