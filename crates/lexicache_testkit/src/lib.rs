//! # Lexicache Testkit
//!
//! Test utilities for lexicache.
//!
//! This crate provides:
//! - Record builders and ready-made datasets
//! - Temporary directory-backed stores
//! - Property-based generators for records and snapshots

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod generators;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

pub use fixtures::*;
pub use generators::*;
