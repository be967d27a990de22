//! Sequential frame reader.

use super::frame::{
    Frame, FrameKind, CRC_SIZE, FRAME_MAGIC, FRAME_VERSION, HEADER_FIELDS_SIZE, HEADER_SIZE,
};
use crate::error::{StoreError, StoreResult};
use lexicache_storage::StorageBackend;

/// Reads frames one at a time from the start of a backend.
///
/// A frame cut short by the end of the backend is a torn write and ends the
/// log: either fewer than [`HEADER_SIZE`] bytes remain, or the header is
/// intact (its own checksum matches) and only the body runs past the end.
/// Anything else that fails to parse is corruption.
pub(crate) struct FrameReader<'a> {
    backend: &'a dyn StorageBackend,
    size: u64,
    offset: u64,
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl<'a> FrameReader<'a> {
    pub(crate) fn new(backend: &'a dyn StorageBackend) -> StoreResult<Self> {
        Ok(Self {
            size: backend.size()?,
            backend,
            offset: 0,
        })
    }

    /// End of the last complete frame read so far.
    pub(crate) fn valid_len(&self) -> u64 {
        self.offset
    }

    /// Total backend size at the time the reader was created.
    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Next frame and its offset, or `None` at the end of the log.
    pub(crate) fn next_frame(&mut self) -> StoreResult<Option<(u64, Frame)>> {
        let offset = self.offset;
        let remaining = self.size - offset;
        if remaining < HEADER_SIZE as u64 {
            return Ok(None);
        }

        let header = self.backend.read_at(offset, HEADER_SIZE)?;
        if header[0..4] != FRAME_MAGIC {
            return Err(StoreError::corruption(offset, "bad frame magic"));
        }
        let expected = read_u32(&header[HEADER_FIELDS_SIZE..]);
        let actual = crc32fast::hash(&header[..HEADER_FIELDS_SIZE]);
        if expected != actual {
            return Err(StoreError::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != FRAME_VERSION {
            return Err(StoreError::corruption(
                offset,
                format!("unsupported frame version {version}"),
            ));
        }
        let kind_byte = header[6];
        let kind = FrameKind::from_byte(kind_byte)
            .ok_or_else(|| StoreError::corruption(offset, format!("unknown frame kind {kind_byte}")))?;
        let len = read_u32(&header[7..11]) as usize;

        // The header is trusted from here on, so a short body is a torn write.
        let body_len = len + CRC_SIZE;
        if remaining < (HEADER_SIZE + body_len) as u64 {
            return Ok(None);
        }
        let body = self.backend.read_at(offset + HEADER_SIZE as u64, body_len)?;
        let (payload, crc_bytes) = body.split_at(len);

        let expected = read_u32(crc_bytes);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&header);
        hasher.update(payload);
        let actual = hasher.finalize();
        if expected != actual {
            return Err(StoreError::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }

        self.offset = offset + (HEADER_SIZE + body_len) as u64;
        Ok(Some((
            offset,
            Frame {
                kind,
                payload: payload.to_vec(),
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Collection;
    use lexicache_storage::InMemoryBackend;

    fn backend_with(frames: &[Frame]) -> InMemoryBackend {
        let mut backend = InMemoryBackend::new();
        for frame in frames {
            backend.append(&frame.encode().unwrap()).unwrap();
        }
        backend
    }

    #[test]
    fn reads_frames_in_order() {
        let backend = backend_with(&[Frame::clear(Collection::Entries), Frame::clear(Collection::Conversations)]);
        let mut reader = FrameReader::new(&backend).unwrap();

        let (first_offset, first) = reader.next_frame().unwrap().unwrap();
        assert_eq!(first_offset, 0);
        assert_eq!(first.kind(), FrameKind::Clear);

        let (second_offset, second) = reader.next_frame().unwrap().unwrap();
        assert_eq!(second_offset, (HEADER_SIZE + 1 + CRC_SIZE) as u64);
        assert_eq!(second.kind(), FrameKind::Clear);

        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.valid_len(), reader.size());
    }

    #[test]
    fn torn_tail_ends_the_log() {
        let full = Frame::clear(Collection::Entries).encode().unwrap();
        let mut backend = backend_with(&[Frame::clear(Collection::Categories)]);
        backend.append(&full[..full.len() - 2]).unwrap();

        let mut reader = FrameReader::new(&backend).unwrap();
        assert!(reader.next_frame().unwrap().is_some());
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.valid_len(), full.len() as u64);
        assert!(reader.size() > reader.valid_len());
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let backend = backend_with(&[Frame::clear(Collection::Entries)]);
        assert!(backend.corrupt_byte(HEADER_SIZE, 0x03));

        let mut reader = FrameReader::new(&backend).unwrap();
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(err, StoreError::ChecksumMismatch { offset: 0, .. }));
    }

    #[test]
    fn bad_magic_is_corruption() {
        let backend = backend_with(&[Frame::clear(Collection::Entries)]);
        assert!(backend.corrupt_byte(0, b'X'));

        let mut reader = FrameReader::new(&backend).unwrap();
        assert!(reader.next_frame().unwrap_err().is_corruption());
    }

    #[test]
    fn unknown_kind_with_valid_checksums_is_corruption() {
        let mut bytes = Frame::clear(Collection::Entries).encode().unwrap();
        bytes[6] = 99;
        let header_crc = crc32fast::hash(&bytes[..HEADER_FIELDS_SIZE]);
        bytes[HEADER_FIELDS_SIZE..HEADER_SIZE].copy_from_slice(&header_crc.to_le_bytes());
        let crc = crc32fast::hash(&bytes[..HEADER_SIZE + 1]);
        bytes[HEADER_SIZE + 1..].copy_from_slice(&crc.to_le_bytes());
        let backend = InMemoryBackend::with_data(bytes);

        let mut reader = FrameReader::new(&backend).unwrap();
        let err = reader.next_frame().unwrap_err();
        assert!(err.to_string().contains("unknown frame kind 99"));
    }

    #[test]
    fn overlong_length_is_corruption_not_a_torn_tail() {
        let backend = backend_with(&[Frame::clear(Collection::Entries), Frame::clear(Collection::Categories)]);
        // High byte of the first frame's length.
        assert!(backend.corrupt_byte(10, 0x7F));

        let mut reader = FrameReader::new(&backend).unwrap();
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(err, StoreError::ChecksumMismatch { offset: 0, .. }));
        assert_eq!(reader.valid_len(), 0);
    }

    #[test]
    fn intact_header_with_short_body_is_torn() {
        let full = Frame::clear(Collection::Entries).encode().unwrap();
        let backend = InMemoryBackend::with_data(full[..HEADER_SIZE].to_vec());

        let mut reader = FrameReader::new(&backend).unwrap();
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.valid_len(), 0);
    }
}
