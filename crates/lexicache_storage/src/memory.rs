//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory volume.
///
/// Clones share the same bytes. A store opened on a clone sees everything
/// written through the original, which is how tests exercise the
/// "restart and replay the journal" path without touching the disk.
///
/// # Example
///
/// ```rust
/// use lexicache_storage::{InMemoryBackend, StorageBackend};
///
/// let volume = InMemoryBackend::new();
/// let mut writer = volume.clone();
/// writer.append(b"abc").unwrap();
/// assert_eq!(volume.size().unwrap(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates an empty volume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a volume preloaded with `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Returns a copy of the volume's bytes.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Overwrites the byte at `offset`, for corruption tests.
    ///
    /// Returns `false` when `offset` is out of range.
    pub fn corrupt_byte(&self, offset: usize, value: u8) -> bool {
        match self.data.write().get_mut(offset) {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);
        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        // end <= size, which fits in usize because the vector exists.
        Ok(data[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;
        if new_size > size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }
        data.truncate(new_size as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn offsets_follow_previous_size() {
        let mut backend = InMemoryBackend::new();
        assert_eq!(backend.append(b"head").unwrap(), 0);
        assert_eq!(backend.append(b"tail").unwrap(), 4);
        assert_eq!(backend.size().unwrap(), 8);
        assert_eq!(backend.read_at(4, 4).unwrap(), b"tail");
    }

    #[test]
    fn reads_outside_the_volume_fail() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"short").unwrap();

        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { size: 5, .. })
        ));
        assert!(matches!(
            backend.read_at(9, 1),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert!(backend.read_at(5, 0).unwrap().is_empty());
    }

    #[test]
    fn clones_share_bytes() {
        let volume = InMemoryBackend::new();
        let mut writer = volume.clone();
        writer.append(b"shared").unwrap();

        assert_eq!(volume.snapshot(), b"shared");
        assert_eq!(volume.read_all().unwrap(), b"shared");
    }

    #[test]
    fn truncate_discards_tail() {
        let mut backend = InMemoryBackend::with_data(b"generation".to_vec());
        backend.truncate(3).unwrap();
        assert_eq!(backend.snapshot(), b"gen");

        backend.truncate(0).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert_eq!(backend.append(b"next").unwrap(), 0);
    }

    #[test]
    fn truncate_cannot_grow() {
        let mut backend = InMemoryBackend::with_data(vec![1, 2, 3]);
        assert!(matches!(
            backend.truncate(4),
            Err(StorageError::TruncateBeyondEnd {
                requested: 4,
                size: 3
            })
        ));
    }

    #[test]
    fn corrupt_byte_flips_in_place() {
        let backend = InMemoryBackend::with_data(vec![0, 0, 0]);
        assert!(backend.corrupt_byte(1, 0xFF));
        assert!(!backend.corrupt_byte(3, 0xFF));
        assert_eq!(backend.snapshot(), vec![0, 0xFF, 0]);
    }

    proptest! {
        #[test]
        fn appended_chunks_read_back(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16)) {
            let mut backend = InMemoryBackend::new();
            let mut placed = Vec::new();
            for chunk in &chunks {
                placed.push((backend.append(chunk).unwrap(), chunk.len()));
            }
            for ((offset, len), chunk) in placed.into_iter().zip(&chunks) {
                prop_assert_eq!(&backend.read_at(offset, len).unwrap(), chunk);
            }
            prop_assert_eq!(backend.read_all().unwrap(), chunks.concat());
        }
    }
}
