//! Data models for Shoplist
//!
//! Defines the core data structures: ShoppingList and Item.
//! Field names serialize in camelCase so the persisted JSON reads
//! `isCompleted`, `isDeleted`, `createdAt` and `updatedAt`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry on a shopping list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Whether the item has been purchased
    pub is_completed: bool,
    /// When this item was created
    pub created_at: DateTime<Utc>,
    /// When this item was last updated
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new, not yet purchased item
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Set the completion state
    pub fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
        self.touch();
    }

    /// Flip the completion state
    pub fn toggle(&mut self) {
        self.set_completed(!self.is_completed);
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Completion status of a list, derived from its items.
///
/// Exactly one status holds for every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListStatus {
    /// The list has no items
    #[serde(rename = "empty")]
    ZeroItem,
    /// At least one item is still to buy
    Active,
    /// Every item has been purchased
    Completed,
}

impl ListStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListStatus::ZeroItem => "empty",
            ListStatus::Active => "active",
            ListStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named shopping list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Items in insertion order
    pub items: Vec<Item>,
    /// Soft-delete flag; deleted lists live in the trash until purged
    pub is_deleted: bool,
    /// When this list was created
    pub created_at: DateTime<Utc>,
    /// When this list or any of its items was last updated
    pub updated_at: DateTime<Utc>,
}

impl ShoppingList {
    /// Create a new, empty list with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items: Vec::new(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Number of purchased items
    pub fn purchased_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_completed).count()
    }

    /// Number of items
    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    /// Fraction of items purchased, 0.0 for an empty list
    pub fn progress(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }
        self.purchased_count() as f64 / total as f64
    }

    pub fn status(&self) -> ListStatus {
        let total = self.total_count();
        if total == 0 {
            ListStatus::ZeroItem
        } else if self.purchased_count() == total {
            ListStatus::Completed
        } else {
            ListStatus::Active
        }
    }

    /// Get an item by ID
    pub fn get_item(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub(crate) fn get_item_mut(&mut self, id: Uuid) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Find an item by name, ignoring case and surrounding whitespace
    pub fn find_item_by_name(&self, name: &str) -> Option<&Item> {
        let needle = name.trim().to_lowercase();
        self.items
            .iter()
            .find(|i| i.name.trim().to_lowercase() == needle)
    }

    /// Items sorted alphabetically for display; stored order is untouched
    pub fn sorted_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|i| i.name.to_lowercase());
        items
    }
}
