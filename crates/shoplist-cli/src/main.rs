//! Shoplist CLI
//!
//! Command-line interface for Shoplist - shopping lists with a trash.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shoplist_core::{Config, LoadStatus, Store, StoreError};

mod commands;
mod output;
mod prompt;

use commands::list::StatusFilter;
use output::{Output, OutputFormat};

/// Environment variable holding a full tracing filter directive
const LOG_ENV: &str = "SHOPLIST_LOG";

#[derive(Parser)]
#[command(name = "shoplist")]
#[command(about = "Shoplist - shopping lists with a trash")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage shopping lists
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Manage items on a list
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Show or empty the trash
    Trash {
        #[command(subcommand)]
        command: Option<TrashCommands>,
    },
    /// Show storage and list counts
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Create a new list
    #[command(alias = "add")]
    Create {
        /// List name
        name: String,
    },
    /// Show lists outside the trash
    #[command(alias = "ls")]
    List {
        /// Only lists with this status
        #[arg(short, long, value_enum)]
        status: Option<StatusFilter>,
    },
    /// Show a list and its items
    Show {
        /// List name, ID or ID prefix
        id: String,
    },
    /// Rename a list
    Rename {
        /// List name, ID or ID prefix
        id: String,
        /// New name
        name: String,
    },
    /// Move a list to the trash
    #[command(alias = "rm")]
    Delete {
        /// List name, ID or ID prefix
        id: String,
    },
    /// Restore a list from the trash
    Restore {
        /// List ID or ID prefix
        id: String,
    },
    /// Permanently delete a list
    Purge {
        /// List ID or ID prefix
        id: String,
        /// Allow purging a list that is not in the trash
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Add an item to a list
    Add {
        /// List name, ID or ID prefix
        list: String,
        /// Item name (several words are joined)
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Keep the name exactly as typed
        #[arg(long)]
        raw: bool,
    },
    /// Toggle an item between to-buy and purchased
    #[command(alias = "check")]
    Toggle {
        /// List name, ID or ID prefix
        list: String,
        /// Item name, ID or ID prefix
        item: String,
    },
    /// Rename an item
    Rename {
        /// List name, ID or ID prefix
        list: String,
        /// Item name, ID or ID prefix
        item: String,
        /// New name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Keep the name exactly as typed
        #[arg(long)]
        raw: bool,
    },
    /// Remove an item from a list
    #[command(alias = "rm")]
    Delete {
        /// List name, ID or ID prefix
        list: String,
        /// Item name, ID or ID prefix
        item: String,
    },
    /// Mark every item on a list as purchased
    CheckAll {
        /// List name, ID or ID prefix
        list: String,
        /// Mark every item as to-buy instead
        #[arg(long)]
        undo: bool,
    },
}

#[derive(Subcommand, Clone)]
enum TrashCommands {
    /// Show lists in the trash
    #[command(alias = "ls")]
    List,
    /// Permanently delete everything in the trash
    Empty,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, storage_key, log_level, autocorrect)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let result = run(cli, &output);
    if let Some(hint) = result.as_ref().err().and_then(error_hint) {
        output.warning(hint);
    }
    result
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config.log_level);

    let mut store = Store::open_with_config(&config).context("Failed to open list storage")?;
    match store.load_status() {
        LoadStatus::Recovered {
            backup_key,
            details,
        } => output.warning(&format!(
            "Saved lists could not be read ({}). Starting empty; the old data was kept under '{}'.",
            details, backup_key
        )),
        LoadStatus::Deduplicated {
            dropped,
            backup_key,
            ..
        } => output.warning(&format!(
            "Dropped {} list(s) that repeated another list's ID; the original data was kept under '{}'.",
            dropped, backup_key
        )),
        LoadStatus::Missing | LoadStatus::Loaded { .. } => {}
    }
    debug!("Opened store at {:?}", config.data_dir);

    match cli.command {
        None => commands::list::list(&store, None, output),
        Some(Commands::List { command }) => handle_list_command(command, &mut store, output),
        Some(Commands::Item { command }) => {
            handle_item_command(command, &mut store, &config, output)
        }
        Some(Commands::Trash { command }) => match command {
            Some(TrashCommands::List) | None => commands::trash::list(&store, output),
            Some(TrashCommands::Empty) => commands::trash::empty(&mut store, output),
        },
        Some(Commands::Status) => commands::status::show(&store, &config, output),
        Some(Commands::Config { .. }) => unreachable!(), // Handled above
    }
}

fn handle_list_command(command: ListCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        ListCommands::Create { name } => commands::list::create(store, name, output),
        ListCommands::List { status } => commands::list::list(store, status, output),
        ListCommands::Show { id } => commands::list::show(store, id, output),
        ListCommands::Rename { id, name } => commands::list::rename(store, id, name, output),
        ListCommands::Delete { id } => commands::list::delete(store, id, output),
        ListCommands::Restore { id } => commands::list::restore(store, id, output),
        ListCommands::Purge { id, force } => commands::list::purge(store, id, force, output),
    }
}

fn handle_item_command(
    command: ItemCommands,
    store: &mut Store,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        ItemCommands::Add { list, name, raw } => {
            commands::item::add(store, list, name, config.autocorrect && !raw, output)
        }
        ItemCommands::Toggle { list, item } => commands::item::toggle(store, list, item, output),
        ItemCommands::Rename {
            list,
            item,
            name,
            raw,
        } => commands::item::rename(store, list, item, name, config.autocorrect && !raw, output),
        ItemCommands::Delete { list, item } => commands::item::delete(store, list, item, output),
        ItemCommands::CheckAll { list, undo } => {
            commands::item::check_all(store, list, undo, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Follow-up advice for a failed command, when the store can offer some
fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let store_err = err.chain().find_map(|e| e.downcast_ref::<StoreError>())?;
    if store_err.is_not_found() {
        Some("Run `shoplist list ls` or `shoplist trash` to see what exists.")
    } else {
        store_err.recovery_suggestion()
    }
}

/// Initialize logging to stderr
///
/// `SHOPLIST_LOG` takes a full filter directive; otherwise `level` applies
/// to both shoplist crates.
fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(format!("shoplist_core={},shoplist_cli={}", level, level))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
