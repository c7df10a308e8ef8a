//! Structured error types for cbqa.
//!
//! Every fallible operation in the crate returns [`Result`]. Layout errors
//! (unregistered rows, column overflow) are fail-fast: they carry the
//! offending name or period so the caller can see which input broke.

use crate::layout::RowKind;

/// All errors that can occur while loading inputs, laying out sheets,
/// writing or reading workbooks.
#[derive(Debug, thiserror::Error)]
pub enum CbqaError {
    /// A table lacks a column the run needs.
    #[error("Missing column `{column}` in {table}")]
    MissingColumn { table: String, column: String },

    /// Two columns of a table share a name.
    #[error("Duplicate column `{column}` in {table}")]
    DuplicateColumn { table: String, column: String },

    /// A table lacks a period of the configured range.
    #[error("Missing period {period} in {table}")]
    MissingPeriod { table: String, period: i64 },

    /// A table has no row with this index label.
    #[error("Missing row `{label}` in {table}")]
    MissingRow { table: String, label: String },

    /// A table's row count does not match the configured period count.
    #[error("{table} has {found} rows, expected one per period ({expected})")]
    RowCount {
        table: String,
        expected: usize,
        found: usize,
    },

    /// A formula needed the row of a name that was never written.
    #[error("No {kind} row registered for `{name}`")]
    UnregisteredVariable { kind: RowKind, name: String },

    /// More periods than the column letter table can address.
    #[error("Period offset {period} exceeds the column letter table (max {max})")]
    ColumnOverflow { period: u32, max: u32 },

    /// `time_end` before `time_init`.
    #[error("Invalid period range: time_init {time_init} > time_end {time_end}")]
    InvalidPeriodRange { time_init: i64, time_end: i64 },

    /// The first block row leaves no room for the period header.
    #[error("First block row must be at least 2, got {0}")]
    InvalidFirstRow(u32),

    /// A sheet with this name already exists in the workbook.
    #[error("Sheet `{0}` already exists")]
    DuplicateSheet(String),

    /// The name breaks Excel's sheet naming rules.
    #[error("Invalid sheet name `{name}`: {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// A workbook needs at least one sheet to be written.
    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    /// Formula evaluation failure.
    #[error("Formula error in {cell}: {message}")]
    Formula { cell: String, message: String },

    /// CSV reading error.
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Run configuration error.
    #[error("Config: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input value or workbook content.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CbqaError>;

impl CbqaError {
    pub(crate) fn unregistered(kind: RowKind, name: &str) -> Self {
        Self::UnregisteredVariable {
            kind,
            name: name.to_string(),
        }
    }
}
