//! cbqa - cost-benefit QA workbooks
//!
//! Lays out one formula worksheet per strategy from baseline and pathway
//! series, a cost-factor table and aggregation mappings:
//! - Baseline, pathway and cost-factor data blocks
//! - Per-period cost-variable formulas referencing those blocks
//! - Aggregated, cumulative and marginal-effect formulas on top
//! - A flat `QA_python` summary sheet
//!
//! The workbook is written as XLSX and can be read back and cross-checked
//! by evaluating its cumulative formulas.
//!
//! # Usage
//!
//! ```no_run
//! use cbqa::{CategoryMapping, CostFactorTable, DriverMapping, LayoutConfig};
//! use cbqa::{QaWorkbookBuilder, StrategyInputs, Table};
//!
//! # fn main() -> cbqa::Result<()> {
//! let config = LayoutConfig::new(1, 3)?;
//! let drivers = DriverMapping::new().with("cb:x", ["x"]);
//! let factors = CostFactorTable::new().with("cb:x", 2.0, "usd", 1.5);
//! let mut builder = QaWorkbookBuilder::new(config, drivers, factors)?;
//!
//! let baseline = Table::for_periods("baseline", 1..=3).with_column("x", [10.0, 10.0, 10.0])?;
//! let pathway = Table::for_periods("pathway", 1..=3).with_column("x", [10.0, 12.0, 15.0])?;
//! let categories = CategoryMapping::new().with("fuel_cost", ["cb:x"]);
//! let reference = Table::new("reference", ["S1"]).with_column("fuel_cost", [0.0])?;
//! builder.compute_strategy_sheet(&StrategyInputs {
//!     strategy: "S1",
//!     baseline: &baseline,
//!     pathway: &pathway,
//!     categories: &categories,
//!     cumulative_reference: &reference,
//!     emission_diff: -2.0,
//! })?;
//! builder.save(std::path::Path::new("QA_QC.xlsx"))?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cell_ref;
pub mod config;
pub mod cost_factors;
pub mod error;
pub mod export;
pub mod formula;
pub mod layout;
pub mod mapping;
pub mod parser;
pub mod run;
pub mod summary;
pub mod table;
pub mod types;
pub mod verify;

pub use builder::{QaWorkbookBuilder, StrategyInputs};
pub use config::{LayoutConfig, RunConfig};
pub use cost_factors::{CostFactor, CostFactorTable};
pub use error::{CbqaError, Result};
pub use mapping::{CategoryMapping, DriverMapping, NamedMapping};
pub use summary::{StrategyTotals, SummaryTable};
pub use table::Table;
pub use types::*;

/// Read XLSX bytes and return the workbook as a JSON string.
///
/// # Errors
/// See [`parser::read_xlsx`].
pub fn workbook_json(data: &[u8]) -> Result<String> {
    let workbook = parser::read_xlsx(data)?;
    Ok(serde_json::to_string(&workbook)?)
}

/// Get the version of the library
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
