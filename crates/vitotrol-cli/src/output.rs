//! Output formatting for vitotrol-cli (table or JSON)

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Context for output rendering
pub struct OutputContext {
    pub json: bool,
    pub verbose: bool,
}

impl OutputContext {
    pub fn new(json: bool, verbose: bool) -> Self {
        Self { json, verbose }
    }

    /// Print a success message (only in verbose mode)
    pub fn success(&self, msg: &str) {
        if self.verbose {
            println!("{}", msg.green());
        }
    }

    /// Print an info message
    pub fn info(&self, msg: &str) {
        println!("{}", msg);
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows as a table, or as JSON when requested
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
            );
        } else if data.is_empty() {
            println!("No data");
        } else {
            println!("{}", Table::new(data));
        }
    }

    /// Print an arbitrary serializable value as JSON
    pub fn print_json<T: Serialize>(&self, data: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Device display for the devices command
#[derive(Debug, Tabled, Serialize)]
pub struct DeviceRow {
    #[tabled(rename = "Index")]
    pub index: usize,
    #[tabled(rename = "Location (ID)")]
    pub location: String,
    #[tabled(rename = "Device (ID)")]
    pub device: String,
    #[tabled(rename = "Error")]
    pub has_error: bool,
    #[tabled(rename = "Connected")]
    pub is_connected: bool,
}

/// Attribute value display for the get command
#[derive(Debug, Tabled, Serialize)]
pub struct AttributeRow {
    #[tabled(rename = "Attribute")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Description")]
    pub doc: String,
}

/// Error history display for the errors command
#[derive(Debug, Tabled, Serialize)]
pub struct ErrorRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Message")]
    pub message: String,
    #[tabled(rename = "Active")]
    pub active: bool,
}

/// Attribute descriptor display for the remote-attrs command
#[derive(Debug, Tabled, Serialize)]
pub struct RemoteAttrRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub attr_type: String,
    #[tabled(rename = "Access")]
    pub access: String,
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Circuit")]
    pub circuit: u32,
    #[tabled(rename = "Enum values")]
    pub enum_values: String,
}
