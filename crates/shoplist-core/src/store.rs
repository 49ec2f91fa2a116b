//! List and item storage
//!
//! The `Store` owns every shopping list, soft-deleted ones included, in a
//! single collection. Each mutation:
//!
//! 1. Applies the change to a copy of the collection
//! 2. Writes the full copy as one JSON blob under a fixed key
//! 3. Swaps the copy in and notifies subscribers
//!
//! A failed lookup or a failed write therefore leaves both memory and disk
//! at the previous state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open_with_config(&config)?;
//!
//! let list = store.add_list("Groceries")?;
//! let milk = store.add_item(list.id, Item::new("Milk"))?;
//! store.toggle_item(list.id, milk.id)?;
//!
//! let active = store.active_lists();
//! ```

use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{Item, ListStatus, ShoppingList};
use crate::storage::{FileKeyValueStore, KeyValueStore};

/// What happened when the persisted lists were read at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing was stored under the key yet
    Missing,
    /// The stored lists were decoded
    Loaded { lists: usize },
    /// The stored blob could not be decoded; it was copied to `backup_key`
    /// and the store started empty
    Recovered { backup_key: String, details: String },
    /// The stored lists were decoded but `dropped` of them repeated an
    /// earlier list's ID; the original blob was copied to `backup_key`
    Deduplicated {
        lists: usize,
        dropped: usize,
        backup_key: String,
    },
}

/// Change notification delivered to subscribers after a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ListAdded(Uuid),
    ListUpdated(Uuid),
    ListSoftDeleted(Uuid),
    ListRestored(Uuid),
    ListDeleted(Uuid),
    TrashEmptied { removed: usize },
    ItemAdded { list_id: Uuid, item_id: Uuid },
    ItemUpdated { list_id: Uuid, item_id: Uuid },
    ItemDeleted { list_id: Uuid, item_id: Uuid },
}

/// Handle returned by [`Store::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StoreEvent, &[ShoppingList])>;

/// Authoritative holder of all shopping lists
pub struct Store {
    /// All lists, soft-deleted included, in creation order
    lists: Vec<ShoppingList>,
    /// Settings store the lists are persisted in
    backend: Box<dyn KeyValueStore>,
    /// Key the serialized lists live under
    key: String,
    load_status: LoadStatus,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("key", &self.key)
            .field("lists", &self.lists.len())
            .field("load_status", &self.load_status)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Store {
    /// Open the file-backed store described by `config`
    pub fn open_with_config(config: &Config) -> StoreResult<Self> {
        let backend = FileKeyValueStore::open(&config.data_dir)?;
        Self::open(backend, config.storage_key.clone())
    }

    /// Open a store over `backend`, reading the lists stored under `key`
    ///
    /// An undecodable blob does not fail the open: it is copied to
    /// `<key>.corrupt.backup`, the store starts empty and
    /// [`load_status`](Self::load_status) reports the recovery.
    pub fn open(backend: impl KeyValueStore + 'static, key: impl Into<String>) -> StoreResult<Self> {
        Self::open_inner(Box::new(backend), key.into(), false)
    }

    /// Like [`open`](Self::open), but an undecodable blob is returned as
    /// [`StoreError::CorruptData`] and nothing is written
    pub fn open_strict(
        backend: impl KeyValueStore + 'static,
        key: impl Into<String>,
    ) -> StoreResult<Self> {
        Self::open_inner(Box::new(backend), key.into(), true)
    }

    fn open_inner(
        mut backend: Box<dyn KeyValueStore>,
        key: String,
        strict: bool,
    ) -> StoreResult<Self> {
        let (lists, load_status) = match backend.get(&key)? {
            None => (Vec::new(), LoadStatus::Missing),
            Some(bytes) => match serde_json::from_slice::<Vec<ShoppingList>>(&bytes) {
                Ok(lists) => {
                    let stored = lists.len();
                    let lists = dedup_by_id(lists);
                    let count = lists.len();
                    let dropped = stored - count;
                    if dropped == 0 {
                        debug!("Loaded {} list(s) from '{}'", count, key);
                        (lists, LoadStatus::Loaded { lists: count })
                    } else if strict {
                        return Err(StoreError::CorruptData {
                            key,
                            details: format!("{} list(s) repeat an earlier list ID", dropped),
                        });
                    } else {
                        let backup_key = format!("{}.duplicates.backup", key);
                        backend.set(&backup_key, &bytes)?;
                        warn!(
                            "Dropped {} duplicate list(s) from '{}'; original backed up to '{}'",
                            dropped, key, backup_key
                        );
                        (
                            lists,
                            LoadStatus::Deduplicated {
                                lists: count,
                                dropped,
                                backup_key,
                            },
                        )
                    }
                }
                Err(e) if strict => {
                    return Err(StoreError::CorruptData {
                        key,
                        details: e.to_string(),
                    });
                }
                Err(e) => {
                    let backup_key = format!("{}.corrupt.backup", key);
                    backend.set(&backup_key, &bytes)?;
                    warn!(
                        "Stored lists under '{}' are unreadable ({}); backed up to '{}' and starting empty",
                        key, e, backup_key
                    );
                    (
                        Vec::new(),
                        LoadStatus::Recovered {
                            backup_key,
                            details: e.to_string(),
                        },
                    )
                }
            },
        };

        Ok(Self {
            lists,
            backend,
            key,
            load_status,
            subscribers: Vec::new(),
            next_subscription: 0,
        })
    }

    /// How the persisted lists were read at open time
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Key the lists are persisted under
    pub fn key(&self) -> &str {
        &self.key
    }

    // ==================== List Operations ====================

    /// Create a new empty list and append it to the collection
    pub fn add_list(&mut self, name: impl Into<String>) -> StoreResult<ShoppingList> {
        let mut list = ShoppingList::new(name);
        while self.get_list(list.id).is_some() {
            list.id = Uuid::new_v4();
        }

        let created = list.clone();
        self.apply(move |lists| {
            let id = list.id;
            lists.push(list);
            Ok(((), Some(StoreEvent::ListAdded(id))))
        })?;
        info!("Created list {} '{}'", created.id, created.name);
        Ok(created)
    }

    /// Replace the stored list with the same ID, refreshing `updated_at`
    pub fn update_list(&mut self, list: &ShoppingList) -> StoreResult<ShoppingList> {
        let mut updated = list.clone();
        updated.touch();
        self.apply(move |lists| {
            let slot = find_list_mut(lists, updated.id)?;
            *slot = updated.clone();
            Ok((updated, Some(StoreEvent::ListUpdated(slot.id))))
        })
    }

    /// Rename a list
    pub fn rename_list(&mut self, id: Uuid, name: impl Into<String>) -> StoreResult<ShoppingList> {
        let name = name.into();
        self.apply(move |lists| {
            let list = find_list_mut(lists, id)?;
            list.set_name(name);
            Ok((list.clone(), Some(StoreEvent::ListUpdated(id))))
        })
    }

    /// Move a list to the trash
    pub fn soft_delete_list(&mut self, id: Uuid) -> StoreResult<ShoppingList> {
        let list = self.set_deleted(id, true, StoreEvent::ListSoftDeleted(id))?;
        info!("Moved list {} to trash", id);
        Ok(list)
    }

    /// Bring a list back from the trash
    pub fn restore_list(&mut self, id: Uuid) -> StoreResult<ShoppingList> {
        let list = self.set_deleted(id, false, StoreEvent::ListRestored(id))?;
        info!("Restored list {}", id);
        Ok(list)
    }

    fn set_deleted(&mut self, id: Uuid, deleted: bool, event: StoreEvent) -> StoreResult<ShoppingList> {
        self.apply(move |lists| {
            let list = find_list_mut(lists, id)?;
            list.is_deleted = deleted;
            list.touch();
            Ok((list.clone(), Some(event)))
        })
    }

    /// Remove a list from the collection, whether or not it is in the trash
    ///
    /// Returns the removed list, or `None` if no list had this ID.
    pub fn permanent_delete(&mut self, id: Uuid) -> StoreResult<Option<ShoppingList>> {
        let removed = self.apply(move |lists| {
            let removed = lists
                .iter()
                .position(|l| l.id == id)
                .map(|pos| lists.remove(pos));
            let event = removed.as_ref().map(|_| StoreEvent::ListDeleted(id));
            Ok((removed, event))
        })?;
        if removed.is_some() {
            info!("Permanently deleted list {}", id);
        }
        Ok(removed)
    }

    /// Permanently delete every list in the trash, returning how many went
    ///
    /// An empty trash is left untouched: nothing is written and no event fires.
    pub fn empty_trash(&mut self) -> StoreResult<usize> {
        if self.deleted_lists_count() == 0 {
            return Ok(0);
        }
        let removed = self.apply(|lists| {
            let before = lists.len();
            lists.retain(|l| !l.is_deleted);
            let removed = before - lists.len();
            Ok((removed, Some(StoreEvent::TrashEmptied { removed })))
        })?;
        info!("Emptied trash ({} list(s))", removed);
        Ok(removed)
    }

    // ==================== Item Operations ====================

    /// Append an item to a list
    ///
    /// Names are not checked for duplicates; that is left to the caller.
    pub fn add_item(&mut self, list_id: Uuid, item: Item) -> StoreResult<Item> {
        self.apply(move |lists| {
            let list = find_list_mut(lists, list_id)?;
            if list.get_item(item.id).is_some() {
                return Err(StoreError::ItemAlreadyExists {
                    list_id,
                    item_id: item.id,
                });
            }
            let mut item = item;
            item.touch();
            list.items.push(item.clone());
            list.touch();
            let event = StoreEvent::ItemAdded {
                list_id,
                item_id: item.id,
            };
            Ok((item, Some(event)))
        })
    }

    /// Replace the stored item with the same ID
    pub fn update_item(&mut self, list_id: Uuid, item: &Item) -> StoreResult<Item> {
        let mut updated = item.clone();
        updated.touch();
        self.modify_item(list_id, item.id, move |slot| *slot = updated)
    }

    /// Rename an item
    pub fn rename_item(
        &mut self,
        list_id: Uuid,
        item_id: Uuid,
        name: impl Into<String>,
    ) -> StoreResult<Item> {
        let name = name.into();
        self.modify_item(list_id, item_id, move |item| item.set_name(name))
    }

    /// Flip an item's completion state
    pub fn toggle_item(&mut self, list_id: Uuid, item_id: Uuid) -> StoreResult<Item> {
        self.modify_item(list_id, item_id, Item::toggle)
    }

    /// Mark every item on a list as purchased (or not)
    pub fn set_all_items_completed(
        &mut self,
        list_id: Uuid,
        completed: bool,
    ) -> StoreResult<ShoppingList> {
        self.apply(move |lists| {
            let list = find_list_mut(lists, list_id)?;
            for item in list.items.iter_mut().filter(|i| i.is_completed != completed) {
                item.set_completed(completed);
            }
            list.touch();
            Ok((list.clone(), Some(StoreEvent::ListUpdated(list_id))))
        })
    }

    /// Remove an item from a list
    pub fn delete_item(&mut self, list_id: Uuid, item_id: Uuid) -> StoreResult<Item> {
        self.apply(move |lists| {
            let list = find_list_mut(lists, list_id)?;
            let pos = list
                .items
                .iter()
                .position(|i| i.id == item_id)
                .ok_or(StoreError::ItemNotFound { list_id, item_id })?;
            let removed = list.items.remove(pos);
            list.touch();
            Ok((removed, Some(StoreEvent::ItemDeleted { list_id, item_id })))
        })
    }

    fn modify_item(
        &mut self,
        list_id: Uuid,
        item_id: Uuid,
        f: impl FnOnce(&mut Item),
    ) -> StoreResult<Item> {
        self.apply(move |lists| {
            let list = find_list_mut(lists, list_id)?;
            let item = list
                .get_item_mut(item_id)
                .ok_or(StoreError::ItemNotFound { list_id, item_id })?;
            f(item);
            item.touch();
            let item = item.clone();
            list.touch();
            Ok((item, Some(StoreEvent::ItemUpdated { list_id, item_id })))
        })
    }

    // ==================== Queries ====================

    /// Every list, trash included, in creation order
    pub fn lists(&self) -> &[ShoppingList] {
        &self.lists
    }

    /// Get a list by ID
    pub fn get_list(&self, id: Uuid) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.id == id)
    }

    /// Lists not in the trash
    pub fn active_lists(&self) -> Vec<&ShoppingList> {
        self.lists.iter().filter(|l| !l.is_deleted).collect()
    }

    /// Lists in the trash
    pub fn deleted_lists(&self) -> Vec<&ShoppingList> {
        self.lists.iter().filter(|l| l.is_deleted).collect()
    }

    /// Lists not in the trash with the given completion status
    pub fn lists_with_status(&self, status: ListStatus) -> Vec<&ShoppingList> {
        self.lists
            .iter()
            .filter(|l| !l.is_deleted && l.status() == status)
            .collect()
    }

    /// Lists not in the trash that have no items
    pub fn zero_item_lists(&self) -> Vec<&ShoppingList> {
        self.lists_with_status(ListStatus::ZeroItem)
    }

    /// Lists not in the trash whose items are all purchased
    pub fn completed_lists(&self) -> Vec<&ShoppingList> {
        self.lists_with_status(ListStatus::Completed)
    }

    /// Lists not in the trash with items still to buy
    pub fn in_progress_lists(&self) -> Vec<&ShoppingList> {
        self.lists_with_status(ListStatus::Active)
    }

    pub fn active_lists_count(&self) -> usize {
        self.lists.iter().filter(|l| !l.is_deleted).count()
    }

    pub fn deleted_lists_count(&self) -> usize {
        self.lists.iter().filter(|l| l.is_deleted).count()
    }

    pub fn zero_item_lists_count(&self) -> usize {
        self.zero_item_lists().len()
    }

    pub fn completed_lists_count(&self) -> usize {
        self.completed_lists().len()
    }

    pub fn in_progress_lists_count(&self) -> usize {
        self.in_progress_lists().len()
    }

    // ==================== Persistence ====================

    /// Write the whole collection under the store's key
    pub fn save(&mut self) -> StoreResult<()> {
        write_snapshot(self.backend.as_mut(), &self.key, &self.lists)
    }

    /// Size in bytes of the serialized collection
    pub fn storage_size(&self) -> StoreResult<usize> {
        Ok(serde_json::to_vec(&self.lists)?.len())
    }

    // ==================== Subscriptions ====================

    /// Register a callback run after every successful mutation
    ///
    /// The callback receives the event and the full collection as it now is.
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&StoreEvent, &[ShoppingList]) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Run `f` against a copy of the lists, persist the copy, then commit it
    fn apply<T>(
        &mut self,
        f: impl FnOnce(&mut Vec<ShoppingList>) -> StoreResult<(T, Option<StoreEvent>)>,
    ) -> StoreResult<T> {
        let mut next = self.lists.clone();
        let (out, event) = f(&mut next)?;
        write_snapshot(self.backend.as_mut(), &self.key, &next)?;
        self.lists = next;

        if let Some(event) = event {
            for (_, callback) in self.subscribers.iter_mut() {
                callback(&event, &self.lists);
            }
        }
        Ok(out)
    }
}

fn write_snapshot(
    backend: &mut dyn KeyValueStore,
    key: &str,
    lists: &[ShoppingList],
) -> StoreResult<()> {
    let bytes = serde_json::to_vec(lists)?;
    backend.set(key, &bytes)?;
    debug!("Saved {} list(s) ({} bytes) to '{}'", lists.len(), bytes.len(), key);
    Ok(())
}

fn find_list_mut(lists: &mut [ShoppingList], id: Uuid) -> StoreResult<&mut ShoppingList> {
    lists
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or(StoreError::ListNotFound(id))
}

/// Keep the first list for each ID; later duplicates are dropped
fn dedup_by_id(lists: Vec<ShoppingList>) -> Vec<ShoppingList> {
    let mut seen = std::collections::HashSet::new();
    lists
        .into_iter()
        .filter(|l| {
            let first = seen.insert(l.id);
            if !first {
                warn!("Dropping duplicate list {} '{}' from stored data", l.id, l.name);
            }
            first
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryKeyValueStore, StorageError, StorageResult};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    const KEY: &str = "shopping_lists";

    fn memory_store() -> (Store, MemoryKeyValueStore) {
        let backend = MemoryKeyValueStore::new();
        let store = Store::open(backend.clone(), KEY).unwrap();
        (store, backend)
    }

    fn persisted(backend: &MemoryKeyValueStore) -> Vec<ShoppingList> {
        let bytes = backend.get(KEY).unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn names(lists: &[&ShoppingList]) -> Vec<String> {
        lists.iter().map(|l| l.name.clone()).collect()
    }

    /// Backend whose writes always fail
    struct FailingBackend;

    impl KeyValueStore for FailingBackend {
        fn get(&self, _key: &str) -> StorageResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &[u8]) -> StorageResult<()> {
            Err(StorageError::InvalidKey {
                key: key.to_string(),
            })
        }
    }

    #[test]
    fn test_open_empty_backend() {
        let (store, _) = memory_store();
        assert!(store.lists().is_empty());
        assert_eq!(store.load_status(), &LoadStatus::Missing);
        assert_eq!(store.key(), KEY);
    }

    #[test]
    fn test_add_list() {
        let (mut store, backend) = memory_store();

        let list = store.add_list("Groceries").unwrap();
        assert_eq!(list.name, "Groceries");
        assert!(!list.is_deleted);
        assert!(list.items.is_empty());
        assert_eq!(list.created_at, list.updated_at);

        assert_eq!(store.get_list(list.id), Some(&list));
        assert_eq!(persisted(&backend), vec![list]);
    }

    #[test]
    fn test_add_list_ids_are_unique() {
        let (mut store, _) = memory_store();

        for n in 0..20 {
            store.add_list(format!("List {}", n)).unwrap();
        }
        let mut ids: Vec<_> = store.lists().iter().map(|l| l.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_add_list_accepts_duplicate_names() {
        let (mut store, _) = memory_store();

        let a = store.add_list("Weekly").unwrap();
        let b = store.add_list("Weekly").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.active_lists_count(), 2);
    }

    #[test]
    fn test_update_list() {
        let (mut store, backend) = memory_store();
        let mut list = store.add_list("Groceries").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        list.name = "Hardware".to_string();
        let updated = store.update_list(&list).unwrap();

        assert_eq!(updated.name, "Hardware");
        assert!(updated.updated_at > list.updated_at);
        assert_eq!(store.get_list(list.id).unwrap().name, "Hardware");
        assert_eq!(persisted(&backend)[0].name, "Hardware");
    }

    #[test]
    fn test_update_missing_list_is_not_found() {
        let (mut store, backend) = memory_store();
        store.add_list("Groceries").unwrap();
        let before = persisted(&backend);

        let stray = ShoppingList::new("Stray");
        let err = store.update_list(&stray).unwrap_err();
        assert!(matches!(err, StoreError::ListNotFound(id) if id == stray.id));
        assert_eq!(store.lists().len(), 1);
        assert_eq!(persisted(&backend), before);
    }

    #[test]
    fn test_rename_list() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Grocereis").unwrap();

        let renamed = store.rename_list(list.id, "Groceries").unwrap();
        assert_eq!(renamed.name, "Groceries");
        assert_eq!(renamed.created_at, list.created_at);
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let (mut store, backend) = memory_store();
        let list = store.add_list("Groceries").unwrap();

        let deleted = store.soft_delete_list(list.id).unwrap();
        assert!(deleted.is_deleted);
        assert!(store.active_lists().is_empty());
        assert_eq!(names(&store.deleted_lists()), vec!["Groceries"]);
        assert!(persisted(&backend)[0].is_deleted);

        let restored = store.restore_list(list.id).unwrap();
        assert!(!restored.is_deleted);
        assert!(store.deleted_lists().is_empty());

        // Equal to the original apart from updated_at
        let mut expected = list.clone();
        expected.updated_at = restored.updated_at;
        assert_eq!(restored, expected);
    }

    #[test]
    fn test_soft_delete_missing_list() {
        let (mut store, _) = memory_store();
        let err = store.soft_delete_list(Uuid::new_v4()).unwrap_err();
        assert!(err.is_not_found());

        let err = store.restore_list(Uuid::new_v4()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_permanent_delete_from_trash() {
        let (mut store, backend) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        store.soft_delete_list(list.id).unwrap();

        let removed = store.permanent_delete(list.id).unwrap();
        assert_eq!(removed.map(|l| l.id), Some(list.id));
        assert!(store.active_lists().is_empty());
        assert!(store.deleted_lists().is_empty());
        assert!(persisted(&backend).is_empty());
    }

    #[test]
    fn test_permanent_delete_active_list() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();

        assert!(store.permanent_delete(list.id).unwrap().is_some());
        assert!(store.get_list(list.id).is_none());
    }

    #[test]
    fn test_permanent_delete_is_idempotent() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();

        assert!(store.permanent_delete(list.id).unwrap().is_some());
        assert!(store.permanent_delete(list.id).unwrap().is_none());
    }

    #[test]
    fn test_empty_trash() {
        let (mut store, backend) = memory_store();
        let keep = store.add_list("Keep").unwrap();
        let a = store.add_list("Old A").unwrap();
        let b = store.add_list("Old B").unwrap();
        store.add_item(keep.id, Item::new("Milk")).unwrap();
        store.soft_delete_list(a.id).unwrap();
        store.soft_delete_list(b.id).unwrap();

        let active_before: Vec<ShoppingList> =
            store.active_lists().into_iter().cloned().collect();

        assert_eq!(store.empty_trash().unwrap(), 2);
        assert!(store.deleted_lists().is_empty());
        let active_after: Vec<ShoppingList> =
            store.active_lists().into_iter().cloned().collect();
        assert_eq!(active_after, active_before);
        assert_eq!(persisted(&backend).len(), 1);

        // Nothing left to remove
        assert_eq!(store.empty_trash().unwrap(), 0);
    }

    #[test]
    fn test_empty_trash_with_nothing_deleted_is_silent() {
        let (mut store, backend) = memory_store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |event, _| sink.borrow_mut().push(*event));

        assert_eq!(store.empty_trash().unwrap(), 0);
        assert!(events.borrow().is_empty());
        assert!(!backend.contains(KEY));

        store.add_list("Groceries").unwrap();
        assert_eq!(store.empty_trash().unwrap(), 0);
        assert_eq!(*events.borrow(), vec![StoreEvent::ListAdded(store.lists()[0].id)]);
    }

    #[test]
    fn test_add_item_refreshes_list() {
        let (mut store, backend) = memory_store();
        let list = store.add_list("Groceries").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let item = store.add_item(list.id, Item::new("Milk")).unwrap();

        let stored = store.get_list(list.id).unwrap();
        assert_eq!(stored.items, vec![item.clone()]);
        assert!(stored.updated_at > list.updated_at);
        assert_eq!(persisted(&backend)[0].items[0].name, "Milk");
    }

    #[test]
    fn test_add_item_to_missing_list() {
        let (mut store, _) = memory_store();
        let err = store.add_item(Uuid::new_v4(), Item::new("Milk")).unwrap_err();
        assert!(matches!(err, StoreError::ListNotFound(_)));
    }

    #[test]
    fn test_add_item_accepts_duplicate_names() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();

        store.add_item(list.id, Item::new("Milk")).unwrap();
        store.add_item(list.id, Item::new("milk")).unwrap();
        store.add_item(list.id, Item::new("Milk")).unwrap();

        assert_eq!(store.get_list(list.id).unwrap().total_count(), 3);
    }

    #[test]
    fn test_add_item_rejects_same_id_twice() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        let item = Item::new("Milk");

        store.add_item(list.id, item.clone()).unwrap();
        let err = store.add_item(list.id, item).unwrap_err();
        assert!(matches!(err, StoreError::ItemAlreadyExists { .. }));
        assert_eq!(store.get_list(list.id).unwrap().total_count(), 1);
    }

    #[test]
    fn test_update_item() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        let mut item = store.add_item(list.id, Item::new("Milk")).unwrap();

        item.name = "Oat milk".to_string();
        item.is_completed = true;
        let updated = store.update_item(list.id, &item).unwrap();

        assert_eq!(updated.name, "Oat milk");
        let stored = store.get_list(list.id).unwrap();
        assert_eq!(stored.items[0].name, "Oat milk");
        assert!(stored.items[0].is_completed);
    }

    #[test]
    fn test_update_missing_item() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        store.add_item(list.id, Item::new("Milk")).unwrap();

        let stray = Item::new("Eggs");
        let err = store.update_item(list.id, &stray).unwrap_err();
        assert!(
            matches!(err, StoreError::ItemNotFound { list_id, item_id } if list_id == list.id && item_id == stray.id)
        );
        assert_eq!(store.get_list(list.id).unwrap().items[0].name, "Milk");
    }

    #[test]
    fn test_delete_item() {
        let (mut store, backend) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        let milk = store.add_item(list.id, Item::new("Milk")).unwrap();
        let eggs = store.add_item(list.id, Item::new("Eggs")).unwrap();

        let removed = store.delete_item(list.id, milk.id).unwrap();
        assert_eq!(removed.id, milk.id);
        assert_eq!(store.get_list(list.id).unwrap().items, vec![eggs]);
        assert_eq!(persisted(&backend)[0].items.len(), 1);

        let err = store.delete_item(list.id, milk.id).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_item_order_is_insertion_order() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        for name in ["Zucchini", "Apples", "Milk"] {
            store.add_item(list.id, Item::new(name)).unwrap();
        }

        let stored: Vec<_> = store
            .get_list(list.id)
            .unwrap()
            .items
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(stored, vec!["Zucchini", "Apples", "Milk"]);
    }

    #[test]
    fn test_rename_item() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        let item = store.add_item(list.id, Item::new("Bred")).unwrap();

        let renamed = store.rename_item(list.id, item.id, "Bread").unwrap();
        assert_eq!(renamed.name, "Bread");
        assert_eq!(renamed.id, item.id);
    }

    #[test]
    fn test_set_all_items_completed() {
        let (mut store, _) = memory_store();
        let list = store.add_list("Groceries").unwrap();
        store.add_item(list.id, Item::new("Milk")).unwrap();
        store.add_item(list.id, Item::new("Eggs")).unwrap();

        let done = store.set_all_items_completed(list.id, true).unwrap();
        assert_eq!(done.status(), ListStatus::Completed);

        let undone = store.set_all_items_completed(list.id, false).unwrap();
        assert_eq!(undone.purchased_count(), 0);
    }

    #[test]
    fn test_status_partitions() {
        let (mut store, _) = memory_store();
        let empty = store.add_list("Empty").unwrap();
        let active = store.add_list("Active").unwrap();
        let done = store.add_list("Done").unwrap();
        let trashed = store.add_list("Trashed").unwrap();

        store.add_item(active.id, Item::new("Milk")).unwrap();
        let bread = store.add_item(done.id, Item::new("Bread")).unwrap();
        store.toggle_item(done.id, bread.id).unwrap();
        store.soft_delete_list(trashed.id).unwrap();

        assert_eq!(names(&store.zero_item_lists()), vec!["Empty"]);
        assert_eq!(names(&store.in_progress_lists()), vec!["Active"]);
        assert_eq!(names(&store.completed_lists()), vec!["Done"]);
        assert_eq!(store.zero_item_lists_count(), 1);
        assert_eq!(store.in_progress_lists_count(), 1);
        assert_eq!(store.completed_lists_count(), 1);
        assert_eq!(store.active_lists_count(), 3);
        assert_eq!(store.deleted_lists_count(), 1);

        // Statuses cover every non-deleted list exactly once
        assert_eq!(
            store.zero_item_lists_count()
                + store.in_progress_lists_count()
                + store.completed_lists_count(),
            store.active_lists_count()
        );
        assert!(store.get_list(empty.id).is_some());
    }

    #[test]
    fn test_groceries_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let backend = crate::storage::FileKeyValueStore::open(temp_dir.path()).unwrap();
        let mut store = Store::open(backend.clone(), KEY).unwrap();

        let list = store.add_list("Groceries").unwrap();
        let milk = store.add_item(list.id, Item::new("Milk")).unwrap();
        let eggs = store.add_item(list.id, Item::new("Eggs")).unwrap();

        store.toggle_item(list.id, milk.id).unwrap();
        let current = store.get_list(list.id).unwrap();
        assert!((current.progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(current.status(), ListStatus::Active);

        store.toggle_item(list.id, eggs.id).unwrap();
        assert_eq!(store.get_list(list.id).unwrap().status(), ListStatus::Completed);
        let items_before = store.get_list(list.id).unwrap().items.clone();

        store.soft_delete_list(list.id).unwrap();
        assert!(store.active_lists().is_empty());
        let trashed = store.deleted_lists();
        assert_eq!(trashed.len(), 1);
        assert!(trashed[0].is_deleted);

        store.restore_list(list.id).unwrap();
        let restored = store.active_lists();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].items, items_before);

        store.soft_delete_list(list.id).unwrap();
        store.permanent_delete(list.id).unwrap();
        store.save().unwrap();
        assert!(store.active_lists().is_empty());
        assert!(store.deleted_lists().is_empty());

        let reopened = Store::open(backend, KEY).unwrap();
        assert!(reopened.get_list(list.id).is_none());
        assert_eq!(reopened.load_status(), &LoadStatus::Loaded { lists: 0 });
    }

    #[test]
    fn test_persist_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = crate::storage::FileKeyValueStore::open(temp_dir.path()).unwrap();

        let original = {
            let mut store = Store::open(backend.clone(), KEY).unwrap();
            store.add_list("Empty").unwrap();

            let one = store.add_list("One").unwrap();
            store.add_item(one.id, Item::new("Milk")).unwrap();

            let many = store.add_list("Many").unwrap();
            for name in ["Apples", "Bread", "Cheese"] {
                let item = store.add_item(many.id, Item::new(name)).unwrap();
                if name == "Bread" {
                    store.toggle_item(many.id, item.id).unwrap();
                }
            }
            store.soft_delete_list(one.id).unwrap();
            store.lists().to_vec()
        };

        let reopened = Store::open(backend, KEY).unwrap();
        assert_eq!(reopened.lists(), original.as_slice());
        assert_eq!(reopened.load_status(), &LoadStatus::Loaded { lists: 3 });
    }

    #[test]
    fn test_open_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().join("data"),
            storage_key: "lists".to_string(),
            ..Config::default()
        };

        {
            let mut store = Store::open_with_config(&config).unwrap();
            store.add_list("Groceries").unwrap();
        }
        assert!(temp_dir.path().join("data").join("lists.json").exists());

        let store = Store::open_with_config(&config).unwrap();
        assert_eq!(store.active_lists_count(), 1);
    }

    #[test]
    fn test_corrupt_data_is_recovered() {
        let mut backend = MemoryKeyValueStore::new();
        backend.set(KEY, b"{not json").unwrap();

        let store = Store::open(backend.clone(), KEY).unwrap();
        assert!(store.lists().is_empty());
        match store.load_status() {
            LoadStatus::Recovered { backup_key, details } => {
                assert_eq!(backup_key, "shopping_lists.corrupt.backup");
                assert!(!details.is_empty());
            }
            other => panic!("unexpected load status: {:?}", other),
        }

        // The unreadable blob is kept for manual recovery
        assert_eq!(
            backend.get("shopping_lists.corrupt.backup").unwrap().unwrap(),
            b"{not json"
        );
    }

    #[test]
    fn test_corrupt_data_strict_open_fails() {
        let mut backend = MemoryKeyValueStore::new();
        backend.set(KEY, br#"[{"id": 42}]"#).unwrap();

        let err = Store::open_strict(backend.clone(), KEY).unwrap_err();
        assert!(matches!(err, StoreError::CorruptData { ref key, .. } if key == KEY));
        assert!(!backend.contains("shopping_lists.corrupt.backup"));
    }

    fn backend_with_duplicate_ids() -> (MemoryKeyValueStore, ShoppingList, Vec<u8>) {
        let list = ShoppingList::new("Groceries");
        let mut twin = list.clone();
        twin.name = "Twin".to_string();

        let bytes = serde_json::to_vec(&vec![list.clone(), twin]).unwrap();
        let mut backend = MemoryKeyValueStore::new();
        backend.set(KEY, &bytes).unwrap();
        (backend, list, bytes)
    }

    #[test]
    fn test_duplicate_ids_in_stored_data_are_dropped() {
        let (backend, list, bytes) = backend_with_duplicate_ids();

        let store = Store::open(backend.clone(), KEY).unwrap();
        assert_eq!(store.lists(), &[list]);
        assert_eq!(
            store.load_status(),
            &LoadStatus::Deduplicated {
                lists: 1,
                dropped: 1,
                backup_key: "shopping_lists.duplicates.backup".to_string(),
            }
        );

        // The dropped lists survive in the backup
        assert_eq!(
            backend.get("shopping_lists.duplicates.backup").unwrap().unwrap(),
            bytes
        );
    }

    #[test]
    fn test_duplicate_ids_strict_open_fails() {
        let (backend, _, _) = backend_with_duplicate_ids();

        let err = Store::open_strict(backend.clone(), KEY).unwrap_err();
        assert!(matches!(err, StoreError::CorruptData { ref key, .. } if key == KEY));
        assert!(!backend.contains("shopping_lists.duplicates.backup"));
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut store = Store::open(FailingBackend, KEY).unwrap();

        let err = store.add_list("Groceries").unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(store.lists().is_empty());
    }

    #[test]
    fn test_storage_size_tracks_contents() {
        let (mut store, backend) = memory_store();
        assert_eq!(store.storage_size().unwrap(), 2); // "[]"

        let list = store.add_list("Groceries").unwrap();
        store.add_item(list.id, Item::new("Milk")).unwrap();
        let size = store.storage_size().unwrap();
        assert_eq!(size, backend.get(KEY).unwrap().unwrap().len());
    }

    #[test]
    fn test_subscribers_see_events_and_state() {
        let (mut store, _) = memory_store();
        let seen: Rc<RefCell<Vec<(StoreEvent, usize)>>> = Rc::default();

        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |event, lists| {
            sink.borrow_mut().push((*event, lists.len()));
        });

        let list = store.add_list("Groceries").unwrap();
        let item = store.add_item(list.id, Item::new("Milk")).unwrap();
        store.soft_delete_list(list.id).unwrap();
        store.empty_trash().unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                (StoreEvent::ListAdded(list.id), 1),
                (
                    StoreEvent::ItemAdded {
                        list_id: list.id,
                        item_id: item.id
                    },
                    1
                ),
                (StoreEvent::ListSoftDeleted(list.id), 1),
                (StoreEvent::TrashEmptied { removed: 1 }, 0),
            ]
        );

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.add_list("Hardware").unwrap();
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn test_failed_operations_do_not_notify() {
        let (mut store, _) = memory_store();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        store.subscribe(move |_, _| *sink.borrow_mut() += 1);

        assert!(store.soft_delete_list(Uuid::new_v4()).is_err());
        assert!(store.permanent_delete(Uuid::new_v4()).unwrap().is_none());
        assert_eq!(*count.borrow(), 0);
    }
}
