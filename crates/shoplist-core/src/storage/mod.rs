//! Storage layer
//!
//! Abstracts the platform key-value settings store the lists are
//! persisted in.
//!
//! ## Architecture
//!
//! - **KeyValueStore**: `get`/`set`/`remove` over byte blobs
//! - **FileKeyValueStore**: one file per key, atomic writes
//! - **MemoryKeyValueStore**: shared in-memory map for tests and embedding

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
