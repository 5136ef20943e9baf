pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use clap::ValueEnum;
use serde_json::Value;

/// How a calculation result is rendered on stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Full envelope as pretty JSON
    #[default]
    Json,
    /// Field/value tables, one per section or row collection
    Table,
    /// Row collections as CSV, otherwise field,value pairs
    Csv,
    /// The headline number only
    Minimal,
}

impl OutputFormat {
    pub fn render(self, value: &Value) {
        match self {
            OutputFormat::Json => json::print_json(value),
            OutputFormat::Table => table::print_table(value),
            OutputFormat::Csv => csv_out::print_csv(value),
            OutputFormat::Minimal => minimal::print_minimal(value),
        }
    }
}
