//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use shoplist_core::{Item, ListStatus, ShoppingList};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A list plus its derived values, for JSON output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListView<'a> {
    #[serde(flatten)]
    list: &'a ShoppingList,
    status: ListStatus,
    purchased_count: usize,
    total_count: usize,
    progress: f64,
}

impl<'a> From<&'a ShoppingList> for ListView<'a> {
    fn from(list: &'a ShoppingList) -> Self {
        Self {
            list,
            status: list.status(),
            purchased_count: list.purchased_count(),
            total_count: list.total_count(),
            progress: list.progress(),
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single list with its items
    pub fn print_list(&self, list: &ShoppingList) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", list.id);
                println!("Name:     {}", list.name);
                println!(
                    "Status:   {}{}",
                    list.status(),
                    if list.is_deleted { " (in trash)" } else { "" }
                );
                println!(
                    "Progress: {}/{} {}",
                    list.purchased_count(),
                    list.total_count(),
                    progress_bar(list.progress(), 20)
                );
                println!("Created:  {}", list.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:  {}", list.updated_at.format("%Y-%m-%d %H:%M"));

                if !list.items.is_empty() {
                    println!();
                    println!("── Items ({}) ──", list.items.len());
                    for item in list.sorted_items() {
                        println!("{}", item_line(item));
                    }
                }
            }
            OutputFormat::Json => print_json(&ListView::from(list)),
            OutputFormat::Quiet => {
                println!("{}", list.id);
            }
        }
    }

    /// Print a table of lists
    pub fn print_lists(&self, lists: &[&ShoppingList], empty_message: &str) {
        match self.format {
            OutputFormat::Human => {
                if lists.is_empty() {
                    println!("{}", empty_message);
                    return;
                }
                for list in lists {
                    println!(
                        "{} | {} | {:>3}/{:<3} | {}",
                        short_id(&list.id),
                        pad(&truncate(&list.name, 30), 30),
                        list.purchased_count(),
                        list.total_count(),
                        list.status()
                    );
                }
                println!("\n{} list(s)", lists.len());
            }
            OutputFormat::Json => {
                let views: Vec<ListView> = lists.iter().map(|l| ListView::from(*l)).collect();
                print_json(&views);
            }
            OutputFormat::Quiet => {
                for list in lists {
                    println!("{}", list.id);
                }
            }
        }
    }

    /// Print a single item
    pub fn print_item(&self, item: &Item) {
        match self.format {
            OutputFormat::Human => println!("{}", item_line(item)),
            OutputFormat::Json => print_json(item),
            OutputFormat::Quiet => println!("{}", item.id),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output as JSON: {}", e),
    }
}

/// First eight characters of an ID, as accepted by prefix lookups
pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn item_line(item: &Item) -> String {
    format!(
        "[{}] {}  {}",
        if item.is_completed { "x" } else { " " },
        short_id(&item.id),
        item.name
    )
}

/// Render progress as a fixed-width bar with a percentage
fn progress_bar(progress: f64, width: usize) -> String {
    let progress = progress.clamp(0.0, 1.0);
    let filled = (progress * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress * 100.0
    )
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}
