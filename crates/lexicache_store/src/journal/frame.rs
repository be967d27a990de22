//! Journal frame encoding.

use crate::error::{StoreError, StoreResult};
use crate::record::{CacheMeta, Category, Collection, Conversation, Entry, Record};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Magic bytes opening every frame.
pub const FRAME_MAGIC: [u8; 4] = *b"LXJ1";

/// Current frame format version.
pub const FRAME_VERSION: u16 = 1;

/// magic (4) + version (2) + kind (1) + length (4) + header crc (4)
pub const HEADER_SIZE: usize = 15;

/// Bytes of the header covered by the header CRC.
pub(crate) const HEADER_FIELDS_SIZE: usize = 11;

/// Trailing CRC32.
pub const CRC_SIZE: usize = 4;

/// Kind byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// A batch of records appended to one collection.
    Insert = 1,
    /// One collection emptied.
    Clear = 2,
    /// Metadata slot written.
    PutMeta = 3,
}

impl FrameKind {
    /// Converts a byte to a frame kind.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Insert),
            2 => Some(Self::Clear),
            3 => Some(Self::PutMeta),
            _ => None,
        }
    }

    /// Human-readable name, used by `lexicache inspect`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Clear => "clear",
            Self::PutMeta => "put-meta",
        }
    }
}

/// An encoded-but-unframed journal entry: kind plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub(crate) kind: FrameKind,
    pub(crate) payload: Vec<u8>,
}

/// A decoded journal entry.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalRecord {
    /// Records appended to a collection.
    Insert(RecordBatch),
    /// A collection was emptied.
    Clear(Collection),
    /// Metadata was written.
    PutMeta(CacheMeta),
}

/// A batch of records of one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    /// Entry rows.
    Entries(Vec<Entry>),
    /// Category rows.
    Categories(Vec<Category>),
    /// Conversation rows.
    Conversations(Vec<Conversation>),
}

impl RecordBatch {
    /// Collection the batch belongs to.
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Entries(_) => Collection::Entries,
            Self::Categories(_) => Collection::Categories,
            Self::Conversations(_) => Collection::Conversations,
        }
    }

    /// Number of records in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Entries(rows) => rows.len(),
            Self::Categories(rows) => rows.len(),
            Self::Conversations(rows) => rows.len(),
        }
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn to_cbor<T: Serialize + ?Sized>(value: &T, what: &'static str) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::encode(what, e))?;
    Ok(buf)
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8], offset: u64, what: &str) -> StoreResult<T> {
    ciborium::from_reader(bytes)
        .map_err(|e| StoreError::corruption(offset, format!("undecodable {what} payload: {e}")))
}

impl Frame {
    /// Insert frame: collection tag followed by the CBOR-encoded rows.
    pub fn insert<R: Record>(records: &[R]) -> StoreResult<Self> {
        let mut payload = vec![R::COLLECTION.as_byte()];
        payload.extend(to_cbor(records, "record batch")?);
        Ok(Self {
            kind: FrameKind::Insert,
            payload,
        })
    }

    /// Clear frame for one collection.
    pub fn clear(collection: Collection) -> Self {
        Self {
            kind: FrameKind::Clear,
            payload: vec![collection.as_byte()],
        }
    }

    /// Metadata frame.
    pub fn put_meta(meta: &CacheMeta) -> StoreResult<Self> {
        Ok(Self {
            kind: FrameKind::PutMeta,
            payload: to_cbor(meta, "cache metadata")?,
        })
    }

    /// Kind of this frame.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Serializes the frame with header and checksum.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let len = u32::try_from(self.payload.len())
            .map_err(|_| StoreError::encode("journal frame", "payload exceeds 4 GiB"))?;

        let mut data = Vec::with_capacity(HEADER_SIZE + self.payload.len() + CRC_SIZE);
        data.extend_from_slice(&FRAME_MAGIC);
        data.extend_from_slice(&FRAME_VERSION.to_le_bytes());
        data.push(self.kind as u8);
        data.extend_from_slice(&len.to_le_bytes());
        let header_crc = crc32fast::hash(&data);
        data.extend_from_slice(&header_crc.to_le_bytes());
        data.extend_from_slice(&self.payload);
        let crc = crc32fast::hash(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        Ok(data)
    }

    /// Decodes the payload. `offset` is only used for error reporting.
    pub fn decode(&self, offset: u64) -> StoreResult<JournalRecord> {
        match self.kind {
            FrameKind::Insert => {
                let (&tag, rows) = self
                    .payload
                    .split_first()
                    .ok_or_else(|| StoreError::corruption(offset, "empty insert payload"))?;
                let batch = match Collection::from_byte(tag) {
                    Some(Collection::Entries) => RecordBatch::Entries(from_cbor(rows, offset, "entries")?),
                    Some(Collection::Categories) => {
                        RecordBatch::Categories(from_cbor(rows, offset, "categories")?)
                    }
                    Some(Collection::Conversations) => {
                        RecordBatch::Conversations(from_cbor(rows, offset, "conversations")?)
                    }
                    None => return Err(StoreError::corruption(offset, format!("unknown collection tag {tag}"))),
                };
                Ok(JournalRecord::Insert(batch))
            }
            FrameKind::Clear => match self.payload.as_slice() {
                [tag] => Collection::from_byte(*tag)
                    .map(JournalRecord::Clear)
                    .ok_or_else(|| StoreError::corruption(offset, format!("unknown collection tag {tag}"))),
                _ => Err(StoreError::corruption(offset, "clear payload must be one byte")),
            },
            FrameKind::PutMeta => Ok(JournalRecord::PutMeta(from_cbor(&self.payload, offset, "metadata")?)),
        }
    }
}
