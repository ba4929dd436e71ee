// crates/wstar-cli/src/output.rs
//
// Output formatting utilities for the wstar CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use wstar_chain::Chain;
use wstar_core::LogEntry;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    /// `--json` wins; otherwise the configured name.
    pub fn select(json_flag: bool, configured: &str) -> Self {
        if json_flag || configured.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// A row in an event listing.
#[derive(Debug, Tabled)]
pub struct EventRow {
    #[tabled(rename = "Block")]
    pub block: u64,
    #[tabled(rename = "Emitter")]
    pub emitter: String,
    #[tabled(rename = "Event")]
    pub event: String,
}

impl EventRow {
    pub fn from_entry(chain: &Chain, entry: &LogEntry) -> Self {
        Self {
            block: entry.block,
            emitter: chain.name_of(entry.emitter),
            event: entry.event.to_string(),
        }
    }
}

/// A two-column key/value row.
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Print the events of a transaction in the selected format.
pub fn print_events(chain: &Chain, entries: &[LogEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", format_json(&entries)),
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("(no events)");
            } else {
                let rows: Vec<EventRow> = entries
                    .iter()
                    .map(|e| EventRow::from_entry(chain, e))
                    .collect();
                println!("{}", format_table(&rows));
            }
        }
    }
}

/// Print key/value pairs in the selected format.
pub fn print_fields(fields: Vec<FieldRow>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = fields
                .into_iter()
                .map(|f| (f.field, serde_json::Value::String(f.value)))
                .collect();
            println!("{}", format_json(&map));
        }
        OutputFormat::Table => println!("{}", format_table(&fields)),
    }
}
