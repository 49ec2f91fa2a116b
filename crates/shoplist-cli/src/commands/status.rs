//! Status command handler

use anyhow::Result;

use shoplist_core::{Config, LoadStatus, Store};

use crate::output::{Output, OutputFormat};

/// Show storage location, size and list counts
pub fn show(store: &Store, config: &Config, output: &Output) -> Result<()> {
    let size = store.storage_size()?;
    let load = match store.load_status() {
        LoadStatus::Missing => "new".to_string(),
        LoadStatus::Loaded { .. } => "ok".to_string(),
        LoadStatus::Recovered { backup_key, .. } => format!("recovered (backup: {})", backup_key),
        LoadStatus::Deduplicated {
            dropped,
            backup_key,
            ..
        } => format!("{} duplicate(s) dropped (backup: {})", dropped, backup_key),
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "storage": {
                        "data_dir": config.data_dir,
                        "key": store.key(),
                        "size": size,
                        "load": load
                    },
                    "counts": {
                        "active": store.active_lists_count(),
                        "empty": store.zero_item_lists_count(),
                        "in_progress": store.in_progress_lists_count(),
                        "completed": store.completed_lists_count(),
                        "trash": store.deleted_lists_count()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.active_lists_count());
        }
        OutputFormat::Human => {
            println!("Shoplist Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Key:      {}", store.key());
            println!("  Size:     {}", human_size(size));
            println!("  Load:     {}", load);
            println!();
            println!("Lists:");
            println!("  Active:      {}", store.active_lists_count());
            println!("    Empty:       {}", store.zero_item_lists_count());
            println!("    In progress: {}", store.in_progress_lists_count());
            println!("    Completed:   {}", store.completed_lists_count());
            println!("  In trash:    {}", store.deleted_lists_count());
        }
    }

    Ok(())
}

fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}
