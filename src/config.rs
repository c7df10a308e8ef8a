//! Engine and run configuration.
//!
//! [`LayoutConfig`] is the immutable, workbook-wide part of the layout
//! engine. [`RunConfig`] describes a whole CLI run and is read from TOML:
//!
//! ```toml
//! time_init = 7
//! time_end = 35
//! output = "QA_QC_mexico.xlsx"
//!
//! [inputs]
//! baseline = "baseline.csv"
//! cost_factors = "cost_factors.csv"
//! category_totals = "category_totals.csv"
//!
//! [[drivers]]
//! name = "cb:trns:fuel_cost:road:electricity"
//! members = ["energy_consumption_trns_road_electricity"]
//!
//! [[categories]]
//! name = "fuel_cost"
//! members = ["cb:trns:fuel_cost:road:electricity"]
//!
//! [[strategy]]
//! code = "PFLO:M8_EC"
//! pathway = "pathway_m8_ec.csv"
//! excluded_variables = []
//! ```

use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::cell_ref::MAX_PERIODS;
use crate::error::{CbqaError, Result};
use crate::mapping::{CategoryMapping, DriverMapping};

/// Default row of the first block title; the period header sits above it.
pub const DEFAULT_FIRST_BLOCK_ROW: u32 = 2;

/// Period range and placement of the first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    time_init: i64,
    time_end: i64,
    first_block_row: u32,
}

impl LayoutConfig {
    /// Validated config with the default first block row.
    ///
    /// # Errors
    /// [`CbqaError::InvalidPeriodRange`] or [`CbqaError::ColumnOverflow`].
    pub fn new(time_init: i64, time_end: i64) -> Result<Self> {
        Self::with_first_block_row(time_init, time_end, DEFAULT_FIRST_BLOCK_ROW)
    }

    /// Validated config.
    ///
    /// # Errors
    /// [`CbqaError::InvalidPeriodRange`], [`CbqaError::ColumnOverflow`] or
    /// [`CbqaError::InvalidFirstRow`].
    pub fn with_first_block_row(time_init: i64, time_end: i64, first_block_row: u32) -> Result<Self> {
        if time_end < time_init {
            return Err(CbqaError::InvalidPeriodRange {
                time_init,
                time_end,
            });
        }
        if first_block_row < 2 {
            return Err(CbqaError::InvalidFirstRow(first_block_row));
        }
        let periods = time_end.abs_diff(time_init).saturating_add(1);
        if periods > u64::from(MAX_PERIODS) {
            return Err(CbqaError::ColumnOverflow {
                period: u32::try_from(periods).unwrap_or(u32::MAX),
                max: MAX_PERIODS,
            });
        }
        Ok(Self {
            time_init,
            time_end,
            first_block_row,
        })
    }

    #[must_use]
    pub fn time_init(&self) -> i64 {
        self.time_init
    }

    #[must_use]
    pub fn time_end(&self) -> i64 {
        self.time_end
    }

    #[must_use]
    pub fn first_block_row(&self) -> u32 {
        self.first_block_row
    }

    /// `time_init..=time_end`
    #[must_use]
    pub fn periods(&self) -> RangeInclusive<i64> {
        self.time_init..=self.time_end
    }

    /// Number of periods, at most [`MAX_PERIODS`].
    #[must_use]
    pub fn num_periods(&self) -> u32 {
        u32::try_from(self.time_end.abs_diff(self.time_init).saturating_add(1)).unwrap_or(MAX_PERIODS)
    }

    /// Period offsets `1..=num_periods`.
    #[must_use]
    pub fn offsets(&self) -> RangeInclusive<u32> {
        1..=self.num_periods()
    }
}

/// A whole run: inputs, mappings and strategies.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub time_init: i64,
    pub time_end: i64,
    #[serde(default = "default_first_block_row")]
    pub first_block_row: u32,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    pub inputs: InputPaths,
    #[serde(default)]
    pub drivers: DriverMapping,
    #[serde(default)]
    pub categories: CategoryMapping,
    #[serde(default, rename = "strategy")]
    pub strategies: Vec<StrategyConfig>,
}

/// CSV inputs shared by every strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputPaths {
    /// Baseline series, one row per period.
    pub baseline: PathBuf,
    /// `variable,multiplier,multiplier_unit,annual_change`
    pub cost_factors: PathBuf,
    /// One row per strategy: category totals and the emission difference.
    pub category_totals: PathBuf,
    #[serde(default = "default_period_column")]
    pub period_column: String,
    #[serde(default = "default_strategy_column")]
    pub strategy_column: String,
    #[serde(default = "default_emission_column")]
    pub emission_column: String,
}

/// One strategy sheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    /// Strategy code, e.g. `PFLO:M8_EC`.
    pub code: String,
    /// Pathway series, same layout as the baseline CSV.
    pub pathway: PathBuf,
    /// Cost variables dropped from every category for this strategy.
    #[serde(default)]
    pub excluded_variables: Vec<String>,
    /// Overrides the sheet name derived from `code`.
    #[serde(default)]
    pub sheet_name: Option<String>,
}

impl StrategyConfig {
    /// Sheet name: the override, or the last `:` segment of the code.
    #[must_use]
    pub fn sheet_name(&self) -> &str {
        self.sheet_name
            .as_deref()
            .unwrap_or_else(|| crate::types::sheet_name_for_strategy(&self.code))
    }
}

fn default_first_block_row() -> u32 {
    DEFAULT_FIRST_BLOCK_ROW
}

fn default_output() -> PathBuf {
    PathBuf::from("QA_QC.xlsx")
}

fn default_period_column() -> String {
    "time_period".to_string()
}

fn default_strategy_column() -> String {
    "strategy".to_string()
}

fn default_emission_column() -> String {
    "emission_co2e_total_diff".to_string()
}

impl RunConfig {
    /// Read a TOML file. Relative paths inside resolve against its directory.
    ///
    /// # Errors
    /// I/O and TOML errors.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Parse TOML text without touching paths.
    ///
    /// # Errors
    /// TOML errors.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Engine configuration for this run.
    ///
    /// # Errors
    /// See [`LayoutConfig::with_first_block_row`].
    pub fn layout(&self) -> Result<LayoutConfig> {
        LayoutConfig::with_first_block_row(self.time_init, self.time_end, self.first_block_row)
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        resolve(&mut self.output);
        resolve(&mut self.inputs.baseline);
        resolve(&mut self.inputs.cost_factors);
        resolve(&mut self.inputs.category_totals);
        for strategy in &mut self.strategies {
            resolve(&mut strategy.pathway);
        }
    }
}
