//! Inspect command implementation.

use super::{format_size, print_json, CommandResult, OutputFormat};
use lexicache_store::{CacheMeta, Collection, JournalStats, LocalStore, StoreConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Cache inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Cache directory.
    pub path: String,
    /// Journal frame and byte statistics.
    pub journal: JournalStats,
    /// Live records per collection.
    pub records: BTreeMap<&'static str, usize>,
    /// Stored metadata, if any.
    pub meta: Option<CacheMeta>,
}

/// Opens the store at `path` without creating it and gathers statistics.
pub async fn collect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let store = LocalStore::new(StoreConfig::at_path(path).create_if_missing(false));
    store.open().await?;

    let mut records = BTreeMap::new();
    for collection in Collection::ALL {
        records.insert(collection.name(), store.count(collection)?);
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        journal: store.blocking(|store| store.journal_stats()).await?,
        records,
        meta: store.get_metadata()?,
    })
}

/// Runs the inspect command.
pub async fn run(path: &Path, format: OutputFormat) -> CommandResult {
    let result = collect(path).await?;
    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            print_text_output(&result);
            Ok(())
        }
    }
}

fn print_text_output(result: &InspectResult) {
    println!("Lexicache Cache Inspection");
    println!("==========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Journal:");
    println!("  Valid size: {}", format_size(result.journal.valid_bytes));
    if result.journal.torn_bytes > 0 {
        println!("  Torn tail:  {}", format_size(result.journal.torn_bytes));
    }
    println!("  Frames:     {}", result.journal.frames);
    for (kind, count) in &result.journal.frames_by_kind {
        println!("    {:<10} {}", kind, count);
    }
    println!();
    println!("Records:");
    for (collection, count) in &result.records {
        println!("  {:<14} {}", collection, count);
    }
    println!();
    match &result.meta {
        Some(meta) => {
            println!("Dataset:");
            println!("  Version:       {}", meta.version);
            println!("  Downloaded at: {}", meta.downloaded_at.to_rfc3339());
        }
        None => println!("Dataset: none"),
    }
}
