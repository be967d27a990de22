//! Cache lifecycle commands: status, download, check, refresh, clear.

use super::{print_json, CommandResult, Context, OutputFormat};
use lexicache_store::CacheMeta;
use lexicache_sync::{
    CacheStatus, DownloadPhase, DownloadProgress, OfflineAdapter, RefreshOutcome, SyncAdapter,
    SyncStats,
};
use serde::Serialize;

/// Cache state as reported by `status`, `download` and `refresh`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Cache status.
    pub status: CacheStatus,
    /// Metadata of the cached dataset.
    pub meta: Option<CacheMeta>,
    /// Refresh result, for `refresh`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RefreshOutcome>,
    /// Adapter counters, for commands that download.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SyncStats>,
}

async fn report(adapter: &OfflineAdapter) -> StatusReport {
    StatusReport {
        status: adapter.status(),
        meta: adapter.meta().await,
        outcome: None,
        stats: None,
    }
}

fn print_report(ctx: &Context, report: &StatusReport) -> CommandResult {
    if ctx.format() == OutputFormat::Json {
        return print_json(report);
    }

    println!("Status: {}", report.status);
    if let Some(meta) = &report.meta {
        println!("Version:       {}", meta.version);
        println!("Downloaded at: {}", meta.downloaded_at.to_rfc3339());
        println!("Entries:       {}", meta.entries_count);
        println!("Categories:    {}", meta.categories_count);
        println!("Conversations: {}", meta.conversations_count);
    }
    if let Some(stats) = &report.stats {
        println!("Fetched:       {}", super::format_size(stats.bytes_fetched));
        println!("Written:       {} records", stats.records_written);
    }
    Ok(())
}

/// Prints progress lines on stderr in text mode.
fn progress_printer(format: OutputFormat) -> impl FnMut(DownloadProgress) + Send {
    let mut last: Option<(DownloadPhase, u8)> = None;
    move |p: DownloadProgress| {
        if format != OutputFormat::Text || last == Some((p.phase, p.percent)) {
            return;
        }
        last = Some((p.phase, p.percent));
        match (p.bytes_loaded, p.bytes_total) {
            (Some(loaded), Some(total)) => eprintln!(
                "{:>3}% {} ({} / {})",
                p.percent,
                p.phase,
                super::format_size(loaded),
                super::format_size(total)
            ),
            _ => eprintln!("{:>3}% {}", p.percent, p.phase),
        }
    }
}

/// Runs the status command.
pub async fn status(ctx: &Context) -> CommandResult {
    let adapter = ctx.adapter()?;
    adapter.init().await?;
    print_report(ctx, &report(&adapter).await)
}

/// Runs the download command.
pub async fn download(ctx: &Context) -> CommandResult {
    ctx.require_endpoint()?;
    let adapter = ctx.adapter()?;
    adapter.download(&mut progress_printer(ctx.format())).await?;

    let mut report = report(&adapter).await;
    report.stats = Some(adapter.stats());
    print_report(ctx, &report)
}

/// Runs the check command.
pub async fn check(ctx: &Context) -> CommandResult {
    ctx.require_endpoint()?;
    let adapter = ctx.adapter()?;
    let check = adapter.check_for_update().await;

    if ctx.format() == OutputFormat::Json {
        return print_json(&check);
    }
    let local = adapter.meta().await.map_or(0, |m| m.version);
    println!("Server version:   {}", check.server_version);
    println!("Local version:    {}", local);
    println!(
        "Update available: {}",
        if check.has_update { "yes" } else { "no" }
    );
    Ok(())
}

/// Runs the refresh command.
pub async fn refresh(ctx: &Context) -> CommandResult {
    ctx.require_endpoint()?;
    let adapter = ctx.adapter()?;
    let outcome = adapter.refresh(&mut progress_printer(ctx.format())).await?;

    if ctx.format() == OutputFormat::Text {
        match outcome {
            RefreshOutcome::UpToDate { version } => println!("Up to date at version {version}"),
            RefreshOutcome::Updated { from, to } => println!("Updated from {from} to {to}"),
        }
    }
    let mut report = report(&adapter).await;
    report.outcome = Some(outcome);
    report.stats = Some(adapter.stats());
    print_report(ctx, &report)
}

/// Runs the clear command.
pub async fn clear(ctx: &Context) -> CommandResult {
    let adapter = ctx.adapter()?;
    adapter.clear().await?;

    if ctx.format() == OutputFormat::Json {
        return print_json(&report(&adapter).await);
    }
    println!("Cache cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexicache_store::StoreConfig;
    use lexicache_sync::SyncConfig;

    #[tokio::test]
    async fn clear_works_without_an_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyncConfig::default().with_store(StoreConfig::at_path(dir.path().join("cache")));
        let ctx = Context::new(config, false, OutputFormat::Json);

        clear(&ctx).await.unwrap();
        status(&ctx).await.unwrap();
        assert!(download(&ctx).await.is_err());
    }

    #[test]
    fn report_omits_absent_sections() {
        let report = StatusReport {
            status: CacheStatus::NotDownloaded,
            meta: None,
            outcome: None,
            stats: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"status": "not-downloaded", "meta": null}));
    }
}
