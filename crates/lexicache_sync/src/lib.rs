//! # Lexicache Sync
//!
//! Keeps an offline copy of the reference dataset and serves reads from it.
//!
//! This crate provides:
//! - The [`SyncAdapter`] contract
//! - [`OfflineAdapter`]: streamed download with progress, batched
//!   replace-all writes into a [`LocalStore`](lexicache_store::LocalStore),
//!   version checks against the origin
//! - [`NoopAdapter`]: the same contract with nothing behind it, for
//!   environments without a durable store
//! - Origin transports: [`HttpTransport`] (feature `http`) and [`MockOrigin`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use lexicache_sync::{select_adapter, RuntimeEnvironment, SyncConfig, DownloadProgress};
//!
//! let adapter = select_adapter(RuntimeEnvironment::Client, SyncConfig::new(endpoint))?;
//! adapter.init().await?;
//! if adapter.check_for_update().await.has_update {
//!     adapter.download(&mut |p: DownloadProgress| println!("{:?} {}%", p.phase, p.percent)).await?;
//! }
//! let entry = adapter.get_entry("annyeong").await;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod error;
#[cfg(feature = "http")]
mod http;
mod noop;
mod offline;
mod progress;
mod status;
mod transport;

pub use adapter::SyncAdapter;
pub use config::{SyncConfig, DEFAULT_VERSION_HEADER};
pub use error::{SyncError, SyncResult};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use noop::NoopAdapter;
pub use offline::OfflineAdapter;
pub use progress::{fetch_percent, store_percent, DownloadPhase, DownloadProgress, NoProgress, ProgressSink};
pub use status::{CacheStatus, RefreshOutcome, SyncStats, UpdateCheck};
pub use transport::{MockOrigin, OriginTransport, SnapshotBody};

use std::sync::Arc;

/// Where the adapter is being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeEnvironment {
    /// An end-user device with durable local storage.
    Client,
    /// Server-side rendering or a build step: no durable store.
    Prerender,
}

impl RuntimeEnvironment {
    /// Whether a durable local store is available.
    pub fn has_durable_store(&self) -> bool {
        matches!(self, RuntimeEnvironment::Client)
    }
}

/// Picks the adapter for `env`, talking to the origin through `transport`.
pub fn select_adapter_with(
    env: RuntimeEnvironment,
    config: SyncConfig,
    transport: Arc<dyn OriginTransport>,
) -> Arc<dyn SyncAdapter> {
    if env.has_durable_store() {
        Arc::new(OfflineAdapter::new(config, transport))
    } else {
        Arc::new(NoopAdapter::new())
    }
}

/// Picks the adapter for `env`, talking to `config.endpoint` over HTTP.
///
/// # Errors
///
/// [`SyncError::Network`] if a client adapter is requested with an invalid
/// endpoint.
#[cfg(feature = "http")]
pub fn select_adapter(env: RuntimeEnvironment, config: SyncConfig) -> SyncResult<Arc<dyn SyncAdapter>> {
    if !env.has_durable_store() {
        return Ok(Arc::new(NoopAdapter::new()));
    }
    let transport = HttpTransport::new(&config.endpoint)?;
    Ok(select_adapter_with(env, config, Arc::new(transport)))
}
