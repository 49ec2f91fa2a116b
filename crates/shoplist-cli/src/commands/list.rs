//! List command handlers

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;

use shoplist_core::{ListStatus, Store};

use super::parse_list_id;
use crate::output::{short_id, Output};
use crate::prompt::confirm;

/// Status filter accepted by `shoplist list ls --status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    /// Lists without items
    Empty,
    /// Lists with items still to buy
    Active,
    /// Lists whose items are all purchased
    Completed,
}

impl From<StatusFilter> for ListStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Empty => ListStatus::ZeroItem,
            StatusFilter::Active => ListStatus::Active,
            StatusFilter::Completed => ListStatus::Completed,
        }
    }
}

/// Create a new list
pub fn create(store: &mut Store, name: String, output: &Output) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("List name cannot be empty");
    }

    let list = store.add_list(name).context("Failed to create list")?;

    output.success(&format!("Created list: {}", short_id(&list.id)));
    output.print_list(&list);
    Ok(())
}

/// List lists outside the trash, optionally filtered by status
pub fn list(store: &Store, status: Option<StatusFilter>, output: &Output) -> Result<()> {
    let lists = match status {
        Some(filter) => store.lists_with_status(filter.into()),
        None => store.active_lists(),
    };

    output.print_lists(&lists, "No lists found.");
    Ok(())
}

/// Show a single list with its items
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let uuid = parse_list_id(&id, store)?;
    let list = store
        .get_list(uuid)
        .ok_or_else(|| anyhow!("List not found: {}", id))?;

    output.print_list(list);
    Ok(())
}

/// Rename a list
pub fn rename(store: &mut Store, id: String, name: String, output: &Output) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("List name cannot be empty");
    }

    let uuid = parse_list_id(&id, store)?;
    let list = store
        .rename_list(uuid, name)
        .context("Failed to rename list")?;

    output.success(&format!("Renamed list {} to '{}'", short_id(&list.id), list.name));
    Ok(())
}

/// Move a list to the trash
pub fn delete(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = parse_list_id(&id, store)?;
    let list = store
        .soft_delete_list(uuid)
        .context("Failed to delete list")?;

    output.success(&format!(
        "Moved '{}' to trash. Restore it with: shoplist list restore {}",
        list.name,
        short_id(&list.id)
    ));
    Ok(())
}

/// Restore a list from the trash
pub fn restore(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = parse_list_id(&id, store)?;
    let list = store
        .restore_list(uuid)
        .context("Failed to restore list")?;

    output.success(&format!("Restored list '{}'", list.name));
    Ok(())
}

/// Permanently delete a list
///
/// Only lists in the trash can be purged unless `force` is set.
pub fn purge(store: &mut Store, id: String, force: bool, output: &Output) -> Result<()> {
    let uuid = parse_list_id(&id, store)?;
    let list = store
        .get_list(uuid)
        .ok_or_else(|| anyhow!("List not found: {}", id))?;

    if !list.is_deleted && !force {
        bail!(
            "List '{}' is not in the trash. Delete it first, or pass --force.",
            list.name
        );
    }

    if output.should_prompt() {
        println!(
            "Permanently delete list: {} - {} ({} item(s))",
            short_id(&list.id),
            list.name,
            list.total_count()
        );
        if !confirm("This cannot be undone. Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    match store
        .permanent_delete(uuid)
        .context("Failed to delete list")?
    {
        Some(removed) => output.success(&format!("Permanently deleted '{}'", removed.name)),
        None => output.message("List was already gone."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use shoplist_core::MemoryKeyValueStore;

    fn setup() -> (Store, Output) {
        let store = Store::open(MemoryKeyValueStore::new(), "shopping_lists").unwrap();
        (store, Output::new(OutputFormat::Quiet))
    }

    #[test]
    fn test_create_trims_and_rejects_empty() {
        let (mut store, output) = setup();

        create(&mut store, "  Groceries ".to_string(), &output).unwrap();
        assert_eq!(store.lists()[0].name, "Groceries");

        assert!(create(&mut store, "   ".to_string(), &output).is_err());
        assert_eq!(store.lists().len(), 1);
    }

    #[test]
    fn test_delete_and_restore_by_name() {
        let (mut store, output) = setup();
        let list = store.add_list("Groceries").unwrap();

        delete(&mut store, "groceries".to_string(), &output).unwrap();
        assert!(store.get_list(list.id).unwrap().is_deleted);

        // Names only resolve outside the trash; the ID prefix still works
        assert!(restore(&mut store, "groceries".to_string(), &output).is_err());
        restore(&mut store, list.id.to_string()[..8].to_string(), &output).unwrap();
        assert!(!store.get_list(list.id).unwrap().is_deleted);
    }

    #[test]
    fn test_purge_requires_trash_or_force() {
        let (mut store, output) = setup();
        let list = store.add_list("Groceries").unwrap();

        assert!(purge(&mut store, list.id.to_string(), false, &output).is_err());
        assert!(store.get_list(list.id).is_some());

        purge(&mut store, list.id.to_string(), true, &output).unwrap();
        assert!(store.get_list(list.id).is_none());
    }

    #[test]
    fn test_purge_from_trash() {
        let (mut store, output) = setup();
        let list = store.add_list("Groceries").unwrap();
        store.soft_delete_list(list.id).unwrap();

        purge(&mut store, list.id.to_string(), false, &output).unwrap();
        assert!(store.lists().is_empty());
    }

    #[test]
    fn test_status_filter_mapping() {
        assert_eq!(ListStatus::from(StatusFilter::Empty), ListStatus::ZeroItem);
        assert_eq!(ListStatus::from(StatusFilter::Active), ListStatus::Active);
        assert_eq!(ListStatus::from(StatusFilter::Completed), ListStatus::Completed);
    }
}
