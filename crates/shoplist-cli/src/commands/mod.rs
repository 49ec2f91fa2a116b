//! Command handlers

pub mod config;
pub mod item;
pub mod list;
pub mod status;
pub mod trash;

use anyhow::{bail, Result};
use uuid::Uuid;

use shoplist_core::{ShoppingList, Store};

use crate::output::short_id;

/// Resolve a list reference to its ID
///
/// Accepts a full UUID, a list name (ignoring case) or a unique ID prefix,
/// tried in that order. Names only match lists outside the trash; IDs match
/// any list. A blank reference matches nothing.
pub fn parse_list_id(reference: &str, store: &Store) -> Result<Uuid> {
    let reference = non_blank(reference, "list")?;
    if let Ok(uuid) = Uuid::parse_str(reference) {
        return Ok(uuid);
    }

    let wanted = reference.to_lowercase();
    let by_name: Vec<&ShoppingList> = store
        .active_lists()
        .into_iter()
        .filter(|l| l.name.trim().to_lowercase() == wanted)
        .collect();
    if !by_name.is_empty() {
        return pick_one("list", reference, by_name, |l| (l.id, l.name.clone()));
    }

    let by_prefix: Vec<&ShoppingList> = store
        .lists()
        .iter()
        .filter(|l| l.id.to_string().starts_with(reference))
        .collect();
    pick_one("list", reference, by_prefix, |l| (l.id, l.name.clone()))
}

/// Resolve an item reference within a list
///
/// Accepts a full UUID, an item name (ignoring case) or a unique ID prefix.
pub fn parse_item_id(reference: &str, list: &ShoppingList) -> Result<Uuid> {
    let reference = non_blank(reference, "item")?;
    if let Ok(uuid) = Uuid::parse_str(reference) {
        return Ok(uuid);
    }

    let wanted = reference.to_lowercase();
    let by_name: Vec<_> = list
        .items
        .iter()
        .filter(|i| i.name.trim().to_lowercase() == wanted)
        .collect();
    if !by_name.is_empty() {
        return pick_one("item", reference, by_name, |i| (i.id, i.name.clone()));
    }

    let by_prefix: Vec<_> = list
        .items
        .iter()
        .filter(|i| i.id.to_string().starts_with(reference))
        .collect();
    pick_one("item", reference, by_prefix, |i| (i.id, i.name.clone()))
}

/// Every ID starts with the empty string, so blank references are refused
fn non_blank<'a>(reference: &'a str, kind: &str) -> Result<&'a str> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        bail!("Empty {} reference. Give a name, ID or ID prefix.", kind);
    }
    Ok(trimmed)
}

fn pick_one<T>(
    kind: &str,
    reference: &str,
    matches: Vec<T>,
    describe: impl Fn(&T) -> (Uuid, String),
) -> Result<Uuid> {
    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, reference),
        1 => Ok(describe(&matches[0]).0),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, reference);
            for m in &matches {
                let (id, name) = describe(m);
                eprintln!("  {} - {}", short_id(&id), name);
            }
            bail!("Ambiguous reference. Use more characters of the ID.");
        }
    }
}
