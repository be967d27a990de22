//! Download progress reporting.
//!
//! A download moves through four phases. Percent ranges are fixed:
//!
//! | phase      | percent                          |
//! |------------|----------------------------------|
//! | `fetching` | 0, then `loaded / total * 50`    |
//! | `parsing`  | 50                               |
//! | `storing`  | 60, then `60 + done / total * 30` |
//! | `complete` | 100                              |
//!
//! Percents reported to a sink never decrease.

use serde::Serialize;
use std::fmt;

/// Phase of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadPhase {
    /// Receiving the snapshot body.
    Fetching,
    /// Decoding the snapshot.
    Parsing,
    /// Writing records into the local store.
    Storing,
    /// The cache is ready.
    Complete,
}

impl fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Storing => "storing",
            Self::Complete => "complete",
        })
    }
}

/// One progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    /// Current phase.
    pub phase: DownloadPhase,
    /// Overall completion, 0 to 100.
    pub percent: u8,
    /// Body bytes received so far, while fetching with a known length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_loaded: Option<u64>,
    /// Body length, while fetching with a known length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_total: Option<u64>,
}

impl DownloadProgress {
    /// An event without byte counts.
    pub const fn new(phase: DownloadPhase, percent: u8) -> Self {
        Self {
            phase,
            percent,
            bytes_loaded: None,
            bytes_total: None,
        }
    }
}

/// Receives progress events from a download.
///
/// Implemented for any `FnMut(DownloadProgress) + Send` closure, so a
/// download can be watched with `&mut |p: DownloadProgress| ...`.
pub trait ProgressSink: Send {
    /// Called synchronously from the download task for every event.
    fn report(&mut self, progress: DownloadProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(DownloadProgress) + Send,
{
    fn report(&mut self, progress: DownloadProgress) {
        self(progress);
    }
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: DownloadProgress) {}
}

fn scaled(part: u64, whole: u64, span: u8) -> u8 {
    if whole == 0 {
        return span;
    }
    let part = part.min(whole) as f64;
    ((part / whole as f64) * f64::from(span)).round() as u8
}

/// Fetch percent for `loaded` of `total` bytes, capped at 50.
pub fn fetch_percent(loaded: u64, total: u64) -> u8 {
    scaled(loaded, total, 50)
}

/// Storing percent after `done` of `total` entries: 60 to 90.
pub fn store_percent(done: u64, total: u64) -> u8 {
    60 + scaled(done, total, 30)
}

/// Emits events to a sink, keeping percents non-decreasing.
pub(crate) struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink, last: 0 }
    }

    fn emit(&mut self, mut progress: DownloadProgress) {
        progress.percent = progress.percent.clamp(self.last, 100);
        self.last = progress.percent;
        self.sink.report(progress);
    }

    pub(crate) fn started(&mut self) {
        self.emit(DownloadProgress::new(DownloadPhase::Fetching, 0));
    }

    pub(crate) fn fetched(&mut self, loaded: u64, total: u64) {
        self.emit(DownloadProgress {
            phase: DownloadPhase::Fetching,
            percent: fetch_percent(loaded, total),
            bytes_loaded: Some(loaded),
            bytes_total: Some(total),
        });
    }

    pub(crate) fn parsed(&mut self) {
        self.emit(DownloadProgress::new(DownloadPhase::Parsing, 50));
    }

    pub(crate) fn storing(&mut self) {
        self.emit(DownloadProgress::new(DownloadPhase::Storing, 60));
    }

    pub(crate) fn stored(&mut self, done: u64, total: u64) {
        self.emit(DownloadProgress::new(DownloadPhase::Storing, store_percent(done, total)));
    }

    pub(crate) fn complete(&mut self) {
        self.emit(DownloadProgress::new(DownloadPhase::Complete, 100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percent_formulas() {
        assert_eq!(fetch_percent(0, 200), 0);
        assert_eq!(fetch_percent(100, 200), 25);
        assert_eq!(fetch_percent(200, 200), 50);
        assert_eq!(fetch_percent(900, 200), 50);
        assert_eq!(store_percent(0, 3), 60);
        assert_eq!(store_percent(1, 3), 70);
        assert_eq!(store_percent(3, 3), 90);
        assert_eq!(store_percent(0, 0), 90);
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: DownloadProgress| seen.push(p.percent);
            let mut tracker = ProgressTracker::new(&mut sink);
            tracker.started();
            tracker.parsed();
            tracker.complete();
        }
        assert_eq!(seen, [0, 50, 100]);
    }

    #[test]
    fn tracker_never_goes_backwards() {
        let mut seen = Vec::new();
        let mut sink = |p: DownloadProgress| seen.push(p);
        let mut tracker = ProgressTracker::new(&mut sink);
        tracker.parsed();
        tracker.fetched(1, 100);
        drop(tracker);

        assert_eq!(seen[1].phase, DownloadPhase::Fetching);
        assert_eq!(seen[1].percent, 50);
        assert_eq!(seen[1].bytes_loaded, Some(1));
    }

    #[test]
    fn progress_serializes_without_empty_counts() {
        let json = serde_json::to_value(DownloadProgress::new(DownloadPhase::Storing, 60)).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "storing", "percent": 60}));
    }

    proptest! {
        #[test]
        fn tracked_percents_are_monotonic(
            chunks in prop::collection::vec(1u64..10_000, 0..32),
            entries in 0u64..5_000,
            batch in 1u64..1_500,
        ) {
            let mut seen = Vec::new();
            let mut sink = |p: DownloadProgress| seen.push(p.percent);
            let mut tracker = ProgressTracker::new(&mut sink);

            let total: u64 = chunks.iter().sum();
            tracker.started();
            let mut loaded = 0;
            for chunk in &chunks {
                loaded += chunk;
                tracker.fetched(loaded, total);
            }
            tracker.parsed();
            tracker.storing();
            let mut done = 0;
            while done < entries {
                done = (done + batch).min(entries);
                tracker.stored(done, entries);
            }
            tracker.complete();
            drop(tracker);

            prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(seen.last().copied(), Some(100));
            prop_assert!(seen.iter().all(|&p| p <= 100));
        }
    }
}
