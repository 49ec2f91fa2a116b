//! Store errors
//!
//! Missing lists or items and unreadable persisted data are reported
//! as values instead of being swallowed.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Errors returned by [`Store`](crate::Store) operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No list with this ID exists
    #[error("List not found: {0}")]
    ListNotFound(Uuid),

    /// The list exists but has no item with this ID
    #[error("Item {item_id} not found in list {list_id}")]
    ItemNotFound { list_id: Uuid, item_id: Uuid },

    /// An item with this ID is already on the list
    #[error("Item {item_id} already exists in list {list_id}")]
    ItemAlreadyExists { list_id: Uuid, item_id: Uuid },

    /// The persisted blob could not be decoded into lists
    #[error("Stored lists under '{key}' could not be decoded: {details}")]
    CorruptData { key: String, details: String },

    /// The collection could not be encoded
    #[error("Failed to serialize lists: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The settings store failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Whether this error refers to a missing list or item
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ListNotFound(_) | StoreError::ItemNotFound { .. }
        )
    }

    /// What the user can do about a failing settings store, if anything
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::Storage(e) => e.recovery_suggestion(),
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
