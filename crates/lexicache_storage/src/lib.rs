//! # Lexicache Storage
//!
//! Byte-store backends for the lexicache local store.
//!
//! The local store keeps its single generation of dictionary data in an
//! append-only journal. This crate provides the bytes underneath that
//! journal and nothing else: backends never look inside what they hold.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - ephemeral volume, cheaply cloneable so that a test
//!   can "reopen" the same bytes through a fresh store
//! - [`FileBackend`] - a single file on disk
//!
//! ## Example
//!
//! ```rust
//! use lexicache_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"frame").unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"frame");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
