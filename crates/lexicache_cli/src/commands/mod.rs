//! CLI command implementations.

pub mod cache;
pub mod inspect;
pub mod read;

use async_trait::async_trait;
use clap::ValueEnum;
use lexicache_sync::{
    HttpTransport, OfflineAdapter, OriginTransport, SnapshotBody, SyncConfig, SyncError,
    SyncResult,
};
use serde::Serialize;
use std::sync::Arc;

/// Result type of every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Settings shared by the commands.
#[derive(Debug)]
pub struct Context {
    config: SyncConfig,
    has_endpoint: bool,
    format: OutputFormat,
}

impl Context {
    /// Creates a context. `has_endpoint` records whether an endpoint was given.
    pub fn new(config: SyncConfig, has_endpoint: bool, format: OutputFormat) -> Self {
        Self {
            config,
            has_endpoint,
            format,
        }
    }

    /// The adapter configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Fails unless an endpoint was given.
    pub fn require_endpoint(&self) -> Result<&str, Box<dyn std::error::Error>> {
        if self.has_endpoint {
            Ok(&self.config.endpoint)
        } else {
            Err("no endpoint configured: pass --endpoint or set LEXICACHE_ENDPOINT".into())
        }
    }

    /// An adapter over the configured cache directory.
    ///
    /// Without an endpoint, reads and `clear` still work; anything that
    /// reaches the origin fails.
    pub fn adapter(&self) -> Result<OfflineAdapter, Box<dyn std::error::Error>> {
        let transport: Arc<dyn OriginTransport> = if self.has_endpoint {
            Arc::new(HttpTransport::new(&self.config.endpoint)?)
        } else {
            Arc::new(NoOrigin)
        };
        Ok(OfflineAdapter::new(self.config.clone(), transport))
    }
}

/// Transport used when no endpoint is configured.
struct NoOrigin;

#[async_trait]
impl OriginTransport for NoOrigin {
    async fn fetch(&self) -> SyncResult<Box<dyn SnapshotBody>> {
        Err(SyncError::network("no endpoint configured"))
    }

    async fn probe(&self, _version_header: &str) -> SyncResult<Option<String>> {
        Err(SyncError::network("no endpoint configured"))
    }
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexicache_sync::{CacheStatus, NoProgress, SyncAdapter};

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn endpoint_is_required_only_when_asked() {
        let ctx = Context::new(SyncConfig::default(), false, OutputFormat::Text);
        assert!(ctx.require_endpoint().is_err());
        assert!(ctx.adapter().is_ok());

        let ctx = Context::new(SyncConfig::new("not a url"), true, OutputFormat::Json);
        assert_eq!(ctx.require_endpoint().unwrap(), "not a url");
        assert!(ctx.adapter().is_err());
    }

    #[tokio::test]
    async fn download_without_endpoint_fails_cleanly() {
        let ctx = Context::new(SyncConfig::default(), false, OutputFormat::Text);
        let adapter = ctx.adapter().unwrap();
        let err = adapter.download(&mut NoProgress).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(adapter.status(), CacheStatus::Error);
    }
}
