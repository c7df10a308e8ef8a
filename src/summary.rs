//! Flat QA summary written to the `QA_python` sheet.
//!
//! One row per strategy: category totals, the same totals per thousand
//! units of emission difference, and a few derived aggregates.

use log::warn;

use crate::error::{CbqaError, Result};
use crate::table::Table;
use crate::types::CellValue;

/// Name of the summary sheet.
pub const SUMMARY_SHEET_NAME: &str = "QA_python";

/// Category left out of `additional_benefits`.
pub const TECHNICAL_COST: &str = "technical_cost";

/// Categories summed into `total_transformation_costs`. Missing ones count as 0.
pub const TRANSFORMATION_COST_CATEGORIES: [&str; 3] =
    [TECHNICAL_COST, "technical_savings", "fuel_cost"];

const DIV_ZERO: &str = "#DIV/0!";

/// Category totals of one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyTotals {
    pub strategy: String,
    pub emission_diff: f64,
    /// `(category, cumulative total)` in category order.
    pub categories: Vec<(String, f64)>,
}

impl StrategyTotals {
    /// Read the row labelled `label` of a totals table.
    ///
    /// # Errors
    /// [`CbqaError::MissingRow`] or [`CbqaError::MissingColumn`].
    pub fn from_table<'a>(
        table: &Table,
        label: &str,
        emission_column: &str,
        categories: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let row = table.row(label)?;
        let value = |column: &str| {
            row.column(column)
                .and_then(|v| v.first().copied())
                .ok_or_else(|| CbqaError::MissingColumn {
                    table: table.name().to_string(),
                    column: column.to_string(),
                })
        };
        let emission_diff = value(emission_column)?;
        let categories = categories
            .into_iter()
            .map(|c| Ok((c.to_string(), value(c)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            strategy: label.to_string(),
            emission_diff,
            categories,
        })
    }

    fn total(&self, category: &str) -> f64 {
        self.categories
            .iter()
            .filter(|(c, _)| c == category)
            .map(|(_, v)| v)
            .sum()
    }

    /// `value / |emission_diff| * 1000`
    fn per_emission(&self, value: f64) -> f64 {
        value / self.emission_diff.abs() * 1000.0
    }
}

/// Header and rows of the summary sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl SummaryTable {
    #[must_use]
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Build the summary from per-strategy totals.
    ///
    /// Columns: `strategy`, `emission_co2e_total_diff`, one per category,
    /// `<category>_mi_CO2e` per category, `net_benefit`,
    /// `net_benefit_mi_CO2e`, `additional_benefits`,
    /// `total_transformation_costs`, `total_transformation_costs_mi_CO2e`.
    #[must_use]
    pub fn compute(totals: &[StrategyTotals], categories: &[&str]) -> Self {
        let mut columns = vec![
            "strategy".to_string(),
            "emission_co2e_total_diff".to_string(),
        ];
        columns.extend(categories.iter().map(ToString::to_string));
        columns.extend(categories.iter().map(|c| format!("{c}_mi_CO2e")));
        columns.extend(
            [
                "net_benefit",
                "net_benefit_mi_CO2e",
                "additional_benefits",
                "total_transformation_costs",
                "total_transformation_costs_mi_CO2e",
            ]
            .map(String::from),
        );

        let rows = totals
            .iter()
            .map(|t| {
                let values: Vec<f64> = categories.iter().map(|c| t.total(c)).collect();
                let net_benefit: f64 = values.iter().sum();
                let additional: f64 = categories
                    .iter()
                    .zip(&values)
                    .filter(|(c, _)| **c != TECHNICAL_COST)
                    .map(|(_, v)| v)
                    .sum();
                let transformation: f64 = TRANSFORMATION_COST_CATEGORIES
                    .iter()
                    .map(|c| t.total(c))
                    .sum();

                let mut row = vec![CellValue::from(t.strategy.as_str())];
                row.push(number(&t.strategy, "emission_co2e_total_diff", t.emission_diff));
                for (c, &v) in categories.iter().zip(&values) {
                    row.push(number(&t.strategy, c, v));
                }
                for (c, &v) in categories.iter().zip(&values) {
                    row.push(number(&t.strategy, &format!("{c}_mi_CO2e"), t.per_emission(v)));
                }
                row.push(number(&t.strategy, "net_benefit", net_benefit));
                row.push(number(
                    &t.strategy,
                    "net_benefit_mi_CO2e",
                    t.per_emission(net_benefit),
                ));
                row.push(number(&t.strategy, "additional_benefits", additional));
                row.push(number(&t.strategy, "total_transformation_costs", transformation));
                row.push(number(
                    &t.strategy,
                    "total_transformation_costs_mi_CO2e",
                    t.per_emission(transformation),
                ));
                row
            })
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Cell of `strategy` in `column`.
    #[must_use]
    pub fn value(&self, strategy: &str, column: &str) -> Option<&CellValue> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.first().and_then(CellValue::as_text) == Some(strategy))?
            .get(col)
    }
}

/// Finite values as numbers; anything else as an Excel error cell.
fn number(strategy: &str, column: &str, value: f64) -> CellValue {
    if value.is_finite() {
        CellValue::Number(value)
    } else {
        warn!("{strategy}: `{column}` is {value}, written as {DIV_ZERO}");
        CellValue::Error(DIV_ZERO.to_string())
    }
}
