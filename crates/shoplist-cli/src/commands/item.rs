//! Item command handlers
//!
//! Items are children of lists. Name cleanup and duplicate checks happen
//! here; the store accepts whatever it is given.

use anyhow::{anyhow, bail, Context, Result};

use shoplist_core::autocorrect::{autocorrect, find_duplicate};
use shoplist_core::{Item, ShoppingList, Store};
use tracing::debug;
use uuid::Uuid;

use super::{parse_item_id, parse_list_id};
use crate::output::{short_id, Output};
use crate::prompt::confirm;

/// Turn the words typed (or dictated) into an item name
fn prepare_name(words: &[String], correct: bool) -> Result<String> {
    let raw = words.join(" ");
    let name = if correct {
        autocorrect(&raw)
    } else {
        raw.trim().to_string()
    };

    if name.is_empty() {
        bail!("Item name cannot be empty");
    }
    if name != raw.trim() {
        debug!("Corrected item name '{}' -> '{}'", raw, name);
    }
    Ok(name)
}

fn get_list<'a>(store: &'a Store, uuid: Uuid, reference: &str) -> Result<&'a ShoppingList> {
    store
        .get_list(uuid)
        .ok_or_else(|| anyhow!("List not found: {}", reference))
}

/// Add an item to a list
///
/// Names that match an existing item (ignoring case) are rejected.
pub fn add(
    store: &mut Store,
    list_id: String,
    words: Vec<String>,
    correct: bool,
    output: &Output,
) -> Result<()> {
    let list_uuid = parse_list_id(&list_id, store)?;
    let name = prepare_name(&words, correct)?;

    let list = get_list(store, list_uuid, &list_id)?;
    if let Some(existing) = find_duplicate(list, &name) {
        bail!("'{}' is already on '{}'", existing.name, list.name);
    }

    let item = store
        .add_item(list_uuid, Item::new(name))
        .context("Failed to add item")?;

    output.success(&format!(
        "Added '{}' to list {}",
        item.name,
        short_id(&list_uuid)
    ));
    output.print_item(&item);
    Ok(())
}

/// Flip an item between to-buy and purchased
pub fn toggle(store: &mut Store, list_id: String, item_id: String, output: &Output) -> Result<()> {
    let list_uuid = parse_list_id(&list_id, store)?;
    let item_uuid = parse_item_id(&item_id, get_list(store, list_uuid, &list_id)?)?;

    let item = store
        .toggle_item(list_uuid, item_uuid)
        .context("Failed to update item")?;

    output.success(&format!(
        "Marked '{}' as {}",
        item.name,
        if item.is_completed { "purchased" } else { "to buy" }
    ));

    if let Some(list) = store.get_list(list_uuid) {
        output.message(&format!(
            "{}: {}/{} purchased ({})",
            list.name,
            list.purchased_count(),
            list.total_count(),
            list.status()
        ));
    }
    Ok(())
}

/// Rename an item
pub fn rename(
    store: &mut Store,
    list_id: String,
    item_id: String,
    words: Vec<String>,
    correct: bool,
    output: &Output,
) -> Result<()> {
    let list_uuid = parse_list_id(&list_id, store)?;
    let list = get_list(store, list_uuid, &list_id)?;
    let item_uuid = parse_item_id(&item_id, list)?;
    let name = prepare_name(&words, correct)?;

    if let Some(existing) = find_duplicate(list, &name).filter(|i| i.id != item_uuid) {
        bail!("'{}' is already on '{}'", existing.name, list.name);
    }

    let item = store
        .rename_item(list_uuid, item_uuid, name)
        .context("Failed to rename item")?;

    output.success(&format!("Renamed item to '{}'", item.name));
    Ok(())
}

/// Remove an item from a list
pub fn delete(store: &mut Store, list_id: String, item_id: String, output: &Output) -> Result<()> {
    let list_uuid = parse_list_id(&list_id, store)?;
    let list = get_list(store, list_uuid, &list_id)?;
    let item_uuid = parse_item_id(&item_id, list)?;

    if output.should_prompt() {
        let name = list
            .get_item(item_uuid)
            .map(|i| i.name.as_str())
            .unwrap_or("(unknown)");
        println!("Remove item: {} - {}", short_id(&item_uuid), name);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store
        .delete_item(list_uuid, item_uuid)
        .context("Failed to remove item")?;

    output.success(&format!("Removed '{}'", removed.name));
    Ok(())
}

/// Mark every item on a list as purchased, or as to-buy with `undo`
pub fn check_all(store: &mut Store, list_id: String, undo: bool, output: &Output) -> Result<()> {
    let list_uuid = parse_list_id(&list_id, store)?;
    let list = store
        .set_all_items_completed(list_uuid, !undo)
        .context("Failed to update items")?;

    output.success(&format!(
        "{}: {}/{} purchased",
        list.name,
        list.purchased_count(),
        list.total_count()
    ));
    Ok(())
}
