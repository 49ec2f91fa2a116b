//! Shoplist Core Library
//!
//! This crate provides the core functionality for Shoplist, a single-device
//! shopping list manager.
//!
//! # Architecture
//!
//! - **Store**: single authoritative collection of lists, soft-deleted
//!   ones included, persisted as one JSON blob in a key-value store
//!
//! All queries are recomputed from the in-memory collection on each call.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open_with_config(&Config::load()?)?;
//!
//! // Add a list and an item
//! let list = store.add_list("Groceries")?;
//! store.add_item(list.id, Item::new("Milk"))?;
//!
//! // Query lists
//! let active = store.active_lists();
//! ```
//!
//! # Modules
//!
//! - `store`: list and item lifecycle (main entry point)
//! - `models`: data structures for lists and items
//! - `storage`: key-value persistence backends
//! - `autocorrect`: cleanup of dictated item names
//! - `config`: application configuration

pub mod autocorrect;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use models::{Item, ListStatus, ShoppingList};
pub use storage::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult,
};
pub use store::{LoadStatus, Store, StoreEvent, SubscriptionId};
