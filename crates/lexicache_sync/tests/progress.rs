//! Download progress and refresh behavior.

use lexicache_store::StoreConfig;
use lexicache_sync::{
    CacheStatus, DownloadPhase, DownloadProgress, MockOrigin, NoProgress, OfflineAdapter,
    RefreshOutcome, SyncAdapter, SyncConfig,
};
use lexicache_testkit::{sample_snapshot, sample_snapshot_json, SnapshotBuilder};
use std::sync::Arc;

fn adapter(origin: &Arc<MockOrigin>, batch_size: usize) -> OfflineAdapter {
    let config = SyncConfig::new("http://origin.test/api/offline-db")
        .with_store(StoreConfig::new().batch_size(batch_size));
    OfflineAdapter::new(config, origin.clone())
}

async fn collect_download(adapter: &OfflineAdapter) -> Vec<DownloadProgress> {
    let mut events = Vec::new();
    adapter
        .download(&mut |p: DownloadProgress| events.push(p))
        .await
        .unwrap();
    events
}

fn assert_monotonic(events: &[DownloadProgress]) {
    for pair in events.windows(2) {
        assert!(
            pair[0].percent <= pair[1].percent,
            "percent went backwards: {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
    assert!(events.iter().all(|e| e.percent <= 100));
    assert_eq!(
        events.last().copied(),
        Some(DownloadProgress::new(DownloadPhase::Complete, 100))
    );
}

#[tokio::test]
async fn progress_with_known_length() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    origin.set_chunk_size(97);
    let body_len = sample_snapshot_json(10).len() as u64;

    let events = collect_download(&adapter(&origin, 1000)).await;
    assert_monotonic(&events);
    assert_eq!(events[0], DownloadProgress::new(DownloadPhase::Fetching, 0));

    let fetching: Vec<_> = events[1..]
        .iter()
        .take_while(|e| e.phase == DownloadPhase::Fetching)
        .collect();
    assert_eq!(fetching.len() as u64, body_len.div_ceil(97));
    assert!(fetching.iter().all(|e| e.bytes_total == Some(body_len)));
    assert!(fetching.iter().all(|e| e.percent <= 50));
    let last_fetch = fetching.last().unwrap();
    assert_eq!(last_fetch.bytes_loaded, Some(body_len));
    assert_eq!(last_fetch.percent, 50);

    let phases: Vec<_> = events.iter().map(|e| e.phase).collect();
    let parsing = phases.iter().position(|p| *p == DownloadPhase::Parsing).unwrap();
    assert_eq!(events[parsing].percent, 50);
    assert_eq!(events[parsing + 1], DownloadProgress::new(DownloadPhase::Storing, 60));
}

#[tokio::test]
async fn progress_without_length_has_no_byte_counts() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    origin.set_chunk_size(64);
    origin.set_send_length(false);

    let events = collect_download(&adapter(&origin, 1000)).await;
    assert_monotonic(&events);
    assert!(events.iter().all(|e| e.bytes_loaded.is_none() && e.bytes_total.is_none()));
    let fetching = events
        .iter()
        .filter(|e| e.phase == DownloadPhase::Fetching)
        .count();
    assert_eq!(fetching, 1);
}

#[tokio::test]
async fn zero_content_length_is_treated_as_unknown() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    origin.set_chunk_size(64);
    origin.set_declared_length(0);

    let adapter = adapter(&origin, 1000);
    let events = collect_download(&adapter).await;
    assert_monotonic(&events);
    assert!(events.iter().all(|e| e.bytes_total.is_none()));
    let fetching = events
        .iter()
        .filter(|e| e.phase == DownloadPhase::Fetching)
        .count();
    assert_eq!(fetching, 1);
    assert_eq!(adapter.status(), CacheStatus::Ready);
}

#[tokio::test]
async fn storing_progress_advances_per_batch() {
    let snapshot = SnapshotBuilder::new(5).category("c", 1).entries("c", 5).build();
    let origin = Arc::new(MockOrigin::serving(&snapshot));

    let events = collect_download(&adapter(&origin, 2)).await;
    assert_monotonic(&events);
    let storing: Vec<_> = events
        .iter()
        .filter(|e| e.phase == DownloadPhase::Storing)
        .map(|e| e.percent)
        .collect();
    assert_eq!(storing, [60, 72, 84, 90]);
}

#[tokio::test]
async fn failed_download_stops_reporting() {
    let origin = Arc::new(MockOrigin::new());
    origin.set_body("[]");
    let adapter = adapter(&origin, 1000);

    let mut events = Vec::new();
    let result = adapter
        .download(&mut |p: DownloadProgress| events.push(p))
        .await;
    assert!(result.is_err());
    assert!(events.iter().all(|e| e.phase != DownloadPhase::Complete));
    assert!(events.iter().all(|e| e.phase != DownloadPhase::Storing));
    assert_eq!(adapter.status(), CacheStatus::Error);
}

#[tokio::test]
async fn download_reports_in_flight_status() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    let adapter = adapter(&origin, 1000);
    adapter.download(&mut NoProgress).await.unwrap();

    let mut seen = Vec::new();
    adapter
        .download(&mut |_: DownloadProgress| seen.push(adapter.status()))
        .await
        .unwrap();
    assert!(seen.iter().all(|s| *s == CacheStatus::Downloading));
    assert_eq!(adapter.status(), CacheStatus::Ready);
}

#[tokio::test]
async fn refresh_updates_only_when_newer() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    let adapter = adapter(&origin, 1000);

    let mut seen = Vec::new();
    let outcome = adapter
        .refresh(&mut |_: DownloadProgress| seen.push(adapter.status()))
        .await
        .unwrap();
    assert_eq!(outcome, RefreshOutcome::Updated { from: 0, to: 10 });
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|s| *s == CacheStatus::Downloading));

    let outcome = adapter.refresh(&mut NoProgress).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::UpToDate { version: 10 });
    assert_eq!(origin.fetch_count(), 1);

    origin.set_snapshot(&sample_snapshot(12));
    let mut seen = Vec::new();
    let outcome = adapter
        .refresh(&mut |_: DownloadProgress| seen.push(adapter.status()))
        .await
        .unwrap();
    assert_eq!(outcome, RefreshOutcome::Updated { from: 10, to: 12 });
    assert!(seen.iter().all(|s| *s == CacheStatus::Updating));
    assert_eq!(adapter.status(), CacheStatus::Ready);
    assert_eq!(adapter.meta().await.unwrap().version, 12);
}

#[tokio::test]
async fn refresh_with_unreachable_origin_is_up_to_date() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    let adapter = adapter(&origin, 1000);
    adapter.download(&mut NoProgress).await.unwrap();

    origin.set_unreachable(true);
    let outcome = adapter.refresh(&mut NoProgress).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::UpToDate { version: 10 });
    assert_eq!(adapter.status(), CacheStatus::Ready);
}

#[tokio::test]
async fn stats_count_bytes_and_records() {
    let origin = Arc::new(MockOrigin::serving(&sample_snapshot(10)));
    let adapter = adapter(&origin, 2);
    adapter.download(&mut NoProgress).await.unwrap();

    let stats = adapter.stats();
    assert_eq!(stats.downloads_completed, 1);
    assert_eq!(stats.bytes_fetched, sample_snapshot_json(10).len() as u64);
    assert_eq!(stats.records_written, 9);
    assert!(stats.last_download.is_some());
}
