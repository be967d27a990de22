//! Configuration for the sync adapters.

use lexicache_store::StoreConfig;

/// Response header carrying the origin's dataset version.
pub const DEFAULT_VERSION_HEADER: &str = "X-Data-Version";

/// Configuration for an [`OfflineAdapter`](crate::OfflineAdapter).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// URL serving the dataset snapshot (`GET`) and its version (`HEAD`).
    pub endpoint: String,
    /// Name of the version header answered to `HEAD`.
    pub version_header: String,
    /// Local store configuration. Its `batch_size` is also the number of
    /// entries written per store transaction during a download.
    pub store: StoreConfig,
}

impl SyncConfig {
    /// Creates a configuration for `endpoint` with an in-memory store.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            version_header: DEFAULT_VERSION_HEADER.to_string(),
            store: StoreConfig::default(),
        }
    }

    /// Sets the version header name.
    #[must_use]
    pub fn with_version_header(mut self, header: impl Into<String>) -> Self {
        self.version_header = header.into();
        self
    }

    /// Sets the local store configuration.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}
