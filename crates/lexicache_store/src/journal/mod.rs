//! Append-only journal backing the local store.
//!
//! Every mutation of the store is one frame:
//!
//! ```text
//! | magic "LXJ1" (4) | version u16 (2) | kind u8 (1) | length u32 (4) | header crc32 (4) | payload | crc32 (4) |
//! ```
//!
//! All integers are little-endian. The header checksum covers the eleven
//! bytes before it, so a damaged length is caught before it is trusted; the
//! trailing checksum covers header and payload.
//! Replaying the frames in order rebuilds the tables. The journal never holds
//! more than one generation: clearing checkpoints it back to (at most) a
//! single metadata frame.

mod frame;
mod reader;

pub use frame::{Frame, FrameKind, JournalRecord, RecordBatch, FRAME_MAGIC, FRAME_VERSION};

use crate::error::StoreResult;
use lexicache_storage::StorageBackend;
use parking_lot::Mutex;
use reader::FrameReader;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Frame and byte statistics of a journal, as shown by `lexicache inspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalStats {
    /// Complete frames.
    pub frames: u64,
    /// Frames per kind name.
    pub frames_by_kind: BTreeMap<&'static str, u64>,
    /// Records carried by insert frames, per collection name.
    pub records_by_collection: BTreeMap<&'static str, u64>,
    /// Bytes covered by complete frames.
    pub valid_bytes: u64,
    /// Trailing bytes of an incomplete frame.
    pub torn_bytes: u64,
}

/// Writes and replays journal frames on a storage backend.
pub struct Journal {
    backend: Mutex<Box<dyn StorageBackend>>,
    sync_on_commit: bool,
}

impl Journal {
    /// Wraps a backend. Nothing is read until [`replay`](Self::replay).
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend: Mutex::new(backend),
            sync_on_commit,
        }
    }

    /// Appends one frame and commits it.
    ///
    /// Returns the offset the frame was written at.
    pub fn append(&self, frame: &Frame) -> StoreResult<u64> {
        let bytes = frame.encode()?;
        let mut backend = self.backend.lock();
        let offset = backend.append(&bytes)?;
        self.commit(&mut **backend)?;
        Ok(offset)
    }

    fn commit(&self, backend: &mut dyn StorageBackend) -> StoreResult<()> {
        backend.flush()?;
        if self.sync_on_commit {
            backend.sync()?;
        }
        Ok(())
    }

    /// Replays every complete frame through `apply`.
    ///
    /// A torn final frame is cut off so the next append starts on a frame
    /// boundary. Returns the number of frames replayed.
    pub fn replay<F>(&self, mut apply: F) -> StoreResult<u64>
    where
        F: FnMut(JournalRecord),
    {
        let mut backend = self.backend.lock();
        let (frames, valid_len, size) = {
            let mut reader = FrameReader::new(&**backend)?;
            let mut frames = 0;
            while let Some((offset, frame)) = reader.next_frame()? {
                apply(frame.decode(offset)?);
                frames += 1;
            }
            (frames, reader.valid_len(), reader.size())
        };

        if valid_len < size {
            warn!(
                valid_len,
                discarded = size - valid_len,
                "truncating torn journal tail"
            );
            backend.truncate(valid_len)?;
            self.commit(&mut **backend)?;
        }
        debug!(frames, bytes = valid_len, "journal replayed");
        Ok(frames)
    }

    /// Discards the whole journal and starts over with `frames`.
    pub fn checkpoint(&self, frames: &[Frame]) -> StoreResult<()> {
        let encoded = frames
            .iter()
            .map(Frame::encode)
            .collect::<StoreResult<Vec<_>>>()?;

        let mut backend = self.backend.lock();
        let before = backend.size()?;
        backend.truncate(0)?;
        for bytes in &encoded {
            backend.append(bytes)?;
        }
        self.commit(&mut **backend)?;
        debug!(before, after = backend.size()?, "journal checkpointed");
        Ok(())
    }

    /// Current journal size in bytes.
    pub fn size(&self) -> StoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }

    /// Walks the journal without applying it.
    pub fn stats(&self) -> StoreResult<JournalStats> {
        let backend = self.backend.lock();
        let mut reader = FrameReader::new(&**backend)?;
        let mut stats = JournalStats::default();

        while let Some((offset, frame)) = reader.next_frame()? {
            stats.frames += 1;
            *stats.frames_by_kind.entry(frame.kind().name()).or_default() += 1;
            if let JournalRecord::Insert(batch) = frame.decode(offset)? {
                *stats
                    .records_by_collection
                    .entry(batch.collection().name())
                    .or_default() += batch.len() as u64;
            }
        }
        stats.valid_bytes = reader.valid_len();
        stats.torn_bytes = reader.size() - reader.valid_len();
        Ok(stats)
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("sync_on_commit", &self.sync_on_commit)
            .finish_non_exhaustive()
    }
}
