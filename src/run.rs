//! A whole run: load every input, lay out every strategy sheet, add the
//! summary sheet.
//!
//! All inputs are loaded and checked before the first sheet is laid out,
//! so incomplete data stops the run without a partial workbook.

use log::{debug, info};
use std::path::PathBuf;

use crate::builder::{QaWorkbookBuilder, StrategyInputs};
use crate::config::{RunConfig, StrategyConfig};
use crate::cost_factors::CostFactorTable;
use crate::error::{CbqaError, Result};
use crate::mapping::CategoryMapping;
use crate::summary::{StrategyTotals, SummaryTable};
use crate::table::Table;
use crate::types::sheet_name_for_strategy;

/// Inputs of one strategy, loaded and checked.
#[derive(Debug)]
struct PreparedStrategy {
    sheet_name: String,
    pathway: Table,
    categories: CategoryMapping,
    reference: Table,
    totals: StrategyTotals,
}

/// Load all inputs and build the workbook in memory.
///
/// # Errors
/// Any input, configuration or layout error; nothing is built when an
/// input is incomplete.
pub fn build_workbook(config: &RunConfig) -> Result<QaWorkbookBuilder> {
    let layout = config.layout()?;
    let inputs = &config.inputs;

    let cost_factors = CostFactorTable::from_csv_path(&inputs.cost_factors)?;
    let baseline = Table::from_csv_path(&inputs.baseline, &inputs.period_column)?
        .select_periods(layout.time_init(), layout.time_end())?;
    let totals = Table::from_csv_path(&inputs.category_totals, &inputs.strategy_column)?;
    info!(
        "Loaded baseline ({} series), {} cost factors, totals for {} strategies",
        baseline.width(),
        cost_factors.len(),
        totals.len()
    );

    let prepared = config
        .strategies
        .iter()
        .map(|s| prepare_strategy(config, s, &totals))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = QaWorkbookBuilder::new(layout, config.drivers.clone(), cost_factors)?;
    for strategy in &prepared {
        builder.compute_strategy_sheet(&StrategyInputs {
            strategy: &strategy.sheet_name,
            baseline: &baseline,
            pathway: &strategy.pathway,
            categories: &strategy.categories,
            cumulative_reference: &strategy.reference,
            emission_diff: strategy.totals.emission_diff,
        })?;
    }

    let categories: Vec<&str> = config.categories.names().collect();
    let totals: Vec<StrategyTotals> = prepared.into_iter().map(|p| p.totals).collect();
    builder.write_summary_sheet(&SummaryTable::compute(&totals, &categories))?;
    Ok(builder)
}

/// Build the workbook and save it to the configured output path.
///
/// # Errors
/// See [`build_workbook`], plus write errors.
pub fn run(config: &RunConfig) -> Result<PathBuf> {
    let builder = build_workbook(config)?;
    builder.save(&config.output)?;
    Ok(config.output.clone())
}

fn prepare_strategy(
    config: &RunConfig,
    strategy: &StrategyConfig,
    totals: &Table,
) -> Result<PreparedStrategy> {
    let inputs = &config.inputs;
    let pathway = Table::from_csv_path(&strategy.pathway, &inputs.period_column)?
        .select_periods(config.time_init, config.time_end)?;
    let categories = config
        .categories
        .without_variables(&strategy.excluded_variables);

    let label = totals_label(totals, &strategy.code)?;
    let names: Vec<&str> = config.categories.names().collect();
    let reference = totals.row(label)?.select_columns(&names)?;
    let totals = StrategyTotals::from_table(totals, label, &inputs.emission_column, names)?;
    debug!(
        "Prepared `{}`: totals row `{label}`, {} excluded variables",
        strategy.code,
        strategy.excluded_variables.len()
    );

    Ok(PreparedStrategy {
        sheet_name: strategy.sheet_name().to_string(),
        pathway,
        categories,
        reference,
        totals,
    })
}

/// Row of the totals table for a strategy: its full code, else its short name.
fn totals_label<'t>(totals: &'t Table, code: &str) -> Result<&'t str> {
    let short = sheet_name_for_strategy(code);
    totals
        .index()
        .iter()
        .find(|l| l.as_str() == code)
        .or_else(|| totals.index().iter().find(|l| l.as_str() == short))
        .map(String::as_str)
        .ok_or_else(|| CbqaError::MissingRow {
            table: totals.name().to_string(),
            label: code.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_label_prefers_full_code() {
        let totals = Table::new("totals", ["M8_EC", "PFLO:M8_EC", "M9"]);
        assert_eq!(totals_label(&totals, "PFLO:M8_EC").unwrap(), "PFLO:M8_EC");
        assert_eq!(totals_label(&totals, "PFLO:M9").unwrap(), "M9");
        assert!(matches!(
            totals_label(&totals, "PFLO:M10"),
            Err(CbqaError::MissingRow { .. })
        ));
    }
}
