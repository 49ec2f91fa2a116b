//! Trash command handlers

use anyhow::{Context, Result};

use shoplist_core::Store;

use crate::output::Output;
use crate::prompt::confirm;

/// Show lists in the trash
pub fn list(store: &Store, output: &Output) -> Result<()> {
    output.print_lists(&store.deleted_lists(), "Trash is empty.");
    Ok(())
}

/// Permanently delete everything in the trash
pub fn empty(store: &mut Store, output: &Output) -> Result<()> {
    let count = store.deleted_lists_count();
    if count == 0 {
        output.message("Trash is already empty.");
        return Ok(());
    }

    if output.should_prompt() {
        println!("Permanently delete {} list(s) from the trash.", count);
        if !confirm("This cannot be undone. Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.empty_trash().context("Failed to empty trash")?;
    output.success(&format!("Permanently deleted {} list(s)", removed));
    Ok(())
}
