//! The sheet layout engine.
//!
//! [`QaWorkbookBuilder`] holds the workbook-wide configuration and the
//! workbook being built. Each call to
//! [`compute_strategy_sheet`](QaWorkbookBuilder::compute_strategy_sheet)
//! lays out one strategy sheet:
//!
//! ```text
//!         B     C     D      <- period header (time_init..=time_end)
//! Baseline
//! x       10    10    10     <- registered as a baseline series
//!
//! Pathway
//! x       10    12    15     <- same column order, fixed offset from baseline
//!
//! Cost Factors
//! cb:x    2     unit  1.5
//!
//! Cost Variables
//! cb:x    =(((B6-B3)*$B$9*$D$9^0))/1e9 ...
//! ...
//! ```
//!
//! The blocks after "Cost Variables" reference earlier rows through the
//! position indices, so they are always written in a fixed order.

use log::{debug, info};
use std::path::Path;

use crate::cell_ref::{ColumnTable, ANNUAL_CHANGE_COL, MULTIPLIER_COL};
use crate::config::LayoutConfig;
use crate::cost_factors::CostFactorTable;
use crate::error::{CbqaError, Result};
use crate::layout::{
    cost_value_formula, formula_ref, marginal_effect_formula, sum_formula, DriverTerm, RowHandle,
    RowKind, SheetLayout, BLOCK_GAP, ZERO_COST_FORMULA, ZERO_SUM_FORMULA,
};
use crate::mapping::{CategoryMapping, DriverMapping};
use crate::summary::{SummaryTable, SUMMARY_SHEET_NAME};
use crate::table::Table;
use crate::types::{CellValue, Sheet, Workbook};

pub const BASELINE_TITLE: &str = "Baseline";
pub const PATHWAY_TITLE: &str = "Pathway";
pub const COST_FACTORS_TITLE: &str = "Cost Factors";
pub const COST_VARIABLES_TITLE: &str = "Cost Variables";
pub const AGGREGATED_TITLE: &str = "Cost-Benefit Aggregated";
pub const CUMULATIVE_TITLE: &str = "Cost-Benefit Cumulative";
pub const CUMULATIVE_TEST_TITLE: &str = "Cost-Benefit Cumulative Test";
pub const MARGINAL_TITLE: &str = "Cost-Benefit Marginal Effects";
/// Label of the emission difference row in the marginal effects block.
pub const EMISSION_DIFF_LABEL: &str = "Emission CO2E Total Diff";

/// Position index key of the emission difference scalar.
const EMISSION_DIFF_KEY: &str = "emission_co2e_total_diff";

const MIN_LABEL_WIDTH: f64 = 12.0;
const MAX_LABEL_WIDTH: f64 = 60.0;

/// Per-strategy inputs of one sheet.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInputs<'a> {
    /// Sheet name.
    pub strategy: &'a str,
    /// One row per period, one column per series.
    pub baseline: &'a Table,
    /// Same shape as `baseline`; extra columns are ignored.
    pub pathway: &'a Table,
    /// Category mapping for this strategy, exclusions already applied.
    pub categories: &'a CategoryMapping,
    /// Externally computed cumulative category totals, echoed for cross-checking.
    pub cumulative_reference: &'a Table,
    /// Total CO2e emission difference of the strategy.
    pub emission_diff: f64,
}

/// Builds a QA workbook one strategy sheet at a time.
#[derive(Debug)]
pub struct QaWorkbookBuilder {
    config: LayoutConfig,
    columns: ColumnTable,
    drivers: DriverMapping,
    cost_factors: CostFactorTable,
    workbook: Workbook,
    layout: SheetLayout,
}

impl QaWorkbookBuilder {
    /// New builder with an empty workbook.
    ///
    /// # Errors
    /// [`CbqaError::ColumnOverflow`] when the period range has more periods
    /// than the column table can address, [`CbqaError::MissingRow`] when a
    /// cost variable with drivers has no cost factor.
    pub fn new(
        config: LayoutConfig,
        drivers: DriverMapping,
        cost_factors: CostFactorTable,
    ) -> Result<Self> {
        let columns = ColumnTable::new();
        // fail at construction rather than halfway through the first sheet
        columns.letter(config.num_periods())?;
        if let Some((missing, _)) = drivers
            .iter()
            .find(|(name, d)| !d.is_empty() && cost_factors.get(name).is_none())
        {
            return Err(CbqaError::MissingRow {
                table: "cost factors".to_string(),
                label: missing.to_string(),
            });
        }
        Ok(Self {
            layout: SheetLayout::new(config.first_block_row()),
            config,
            columns,
            drivers,
            cost_factors,
            workbook: Workbook::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn drivers(&self) -> &DriverMapping {
        &self.drivers
    }

    #[must_use]
    pub fn cost_factors(&self) -> &CostFactorTable {
        &self.cost_factors
    }

    /// Per-sheet state. Always reset between calls to
    /// [`compute_strategy_sheet`](Self::compute_strategy_sheet).
    #[must_use]
    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    #[must_use]
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    #[must_use]
    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    /// Lay out the sheet of one strategy and add it to the workbook.
    ///
    /// The sheet is only added when every block was written; on error the
    /// workbook is unchanged. Either way the per-sheet state is reset.
    ///
    /// # Errors
    /// [`CbqaError::DuplicateSheet`], [`CbqaError::InvalidSheetName`],
    /// [`CbqaError::RowCount`], [`CbqaError::MissingColumn`],
    /// [`CbqaError::UnregisteredVariable`], [`CbqaError::ColumnOverflow`].
    pub fn compute_strategy_sheet(&mut self, inputs: &StrategyInputs<'_>) -> Result<()> {
        let built = self.build_strategy_sheet(inputs);
        self.finalize_sheet();
        let sheet = built?;
        let rows = sheet.max_row();
        self.workbook.add_sheet(sheet)?;
        info!("Wrote strategy sheet `{}` ({rows} rows)", inputs.strategy);
        Ok(())
    }

    fn build_strategy_sheet(&mut self, inputs: &StrategyInputs<'_>) -> Result<Sheet> {
        self.check_inputs(inputs)?;
        let mut sheet = self.begin_sheet(inputs.strategy)?;
        self.write_period_header(&mut sheet);
        self.write_data_block(&mut sheet, BASELINE_TITLE, inputs.baseline, true);
        let pathway = inputs
            .pathway
            .select_columns(&inputs.baseline.column_names().collect::<Vec<_>>())?;
        self.write_data_block(&mut sheet, PATHWAY_TITLE, &pathway, false);
        self.write_cost_factor_block(&mut sheet);
        self.compute_cost_values(&mut sheet, inputs.baseline.width())?;
        self.compute_aggregated_categories(&mut sheet, inputs.categories)?;
        self.compute_aggregated_cumulative_categories(&mut sheet, inputs.categories)?;
        self.add_test_cumulative_categories(&mut sheet, inputs.cumulative_reference);
        self.compute_marginal_effects(&mut sheet, inputs.categories, inputs.emission_diff)?;
        fit_label_column(&mut sheet);
        Ok(sheet)
    }

    /// Preconditions checked before anything is written.
    fn check_inputs(&self, inputs: &StrategyInputs<'_>) -> Result<()> {
        let expected = usize::try_from(self.config.num_periods()).unwrap_or(usize::MAX);
        for table in [inputs.baseline, inputs.pathway] {
            if table.len() != expected {
                return Err(CbqaError::RowCount {
                    table: table.name().to_string(),
                    expected,
                    found: table.len(),
                });
            }
        }
        inputs.baseline.require_columns(&self.drivers.all_members())?;
        inputs.pathway.require_columns(&self.drivers.all_members())
    }

    /// A fresh sheet named `strategy`, not yet part of the workbook.
    pub(crate) fn begin_sheet(&self, strategy: &str) -> Result<Sheet> {
        self.workbook.check_new_sheet_name(strategy)?;
        let mut sheet = Sheet::new(strategy);
        sheet.frozen_rows = self.layout.initial_row().saturating_sub(1);
        sheet.frozen_cols = 1;
        debug!("Begin sheet `{strategy}` at row {}", self.layout.cursor());
        Ok(sheet)
    }

    /// Period numbers `time_init..=time_end` from column B.
    pub(crate) fn write_period_header(&self, sheet: &mut Sheet) {
        self.layout
            .write_header(sheet, self.config.periods().map(CellValue::from));
    }

    /// Transposed table: one row per column. With `register`, each row is
    /// recorded as a baseline series.
    pub(crate) fn write_data_block(
        &mut self,
        sheet: &mut Sheet,
        title: &str,
        table: &Table,
        register: bool,
    ) {
        self.layout.open_block(sheet, title);
        for column in table.columns() {
            let handle = self.layout.write_row(
                sheet,
                &column.name,
                column.values.iter().map(|&v| CellValue::Number(v)),
            );
            if register {
                self.layout
                    .positions_mut()
                    .register(RowKind::Series, column.name.as_str(), handle);
            }
        }
        self.layout.close_block();
        debug!("{title}: {} rows", table.width());
    }

    /// `[variable, multiplier, multiplier_unit, annual_change]` per cost factor.
    pub(crate) fn write_cost_factor_block(&mut self, sheet: &mut Sheet) {
        self.layout.open_block(sheet, COST_FACTORS_TITLE);
        for factor in self.cost_factors.iter() {
            let handle = self.layout.write_row(
                sheet,
                &factor.variable,
                [
                    CellValue::Number(factor.multiplier),
                    CellValue::from(factor.multiplier_unit.as_str()),
                    CellValue::Number(factor.annual_change),
                ],
            );
            self.layout
                .positions_mut()
                .register(RowKind::CostFactor, factor.variable.as_str(), handle);
        }
        self.layout.close_block();
        debug!("{COST_FACTORS_TITLE}: {} rows", self.cost_factors.len());
    }

    /// One formula row per cost variable of the driver mapping.
    ///
    /// The pathway row of a driver is its baseline row shifted by
    /// `baseline_width + BLOCK_GAP`, the height of the baseline block.
    pub(crate) fn compute_cost_values(
        &mut self,
        sheet: &mut Sheet,
        baseline_width: usize,
    ) -> Result<()> {
        let shift = u32::try_from(baseline_width)
            .unwrap_or(u32::MAX)
            .saturating_add(BLOCK_GAP);
        self.layout.open_block(sheet, COST_VARIABLES_TITLE);
        for (variable, drivers) in self.drivers.iter() {
            let formulas = self.cost_value_row(variable, drivers, shift)?;
            let handle = self.layout.write_row(sheet, variable, formulas);
            self.layout
                .positions_mut()
                .register(RowKind::CostValue, variable, handle);
        }
        self.layout.close_block();
        debug!("{COST_VARIABLES_TITLE}: {} rows", self.drivers.len());
        Ok(())
    }

    fn cost_value_row(
        &self,
        variable: &str,
        drivers: &[String],
        shift: u32,
    ) -> Result<Vec<CellValue>> {
        if drivers.is_empty() {
            return Ok(self
                .config
                .offsets()
                .map(|_| CellValue::formula(ZERO_COST_FORMULA))
                .collect());
        }
        let positions = self.layout.positions();
        let factor = positions.require(RowKind::CostFactor, variable)?;
        let multiplier = self.columns.absolute_cell(MULTIPLIER_COL, factor.row())?;
        let annual_change = self.columns.absolute_cell(ANNUAL_CHANGE_COL, factor.row())?;
        let baselines = drivers
            .iter()
            .map(|d| positions.require(RowKind::Series, d))
            .collect::<Result<Vec<RowHandle>>>()?;

        self.config
            .offsets()
            .map(|period| {
                let terms = baselines
                    .iter()
                    .map(|&baseline| {
                        let pathway = RowHandle::new(baseline.row().saturating_add(shift));
                        Ok(DriverTerm {
                            pathway: formula_ref(&self.columns, pathway, period)?,
                            baseline: formula_ref(&self.columns, baseline, period)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CellValue::formula(cost_value_formula(
                    &terms,
                    &multiplier,
                    &annual_change,
                    period,
                )))
            })
            .collect()
    }

    /// One row per category summing its members' cost-value rows per period.
    ///
    /// Members without a cost-value row are left out of the sum. An empty
    /// member list gives a single `=0` cell.
    pub(crate) fn compute_aggregated_categories(
        &mut self,
        sheet: &mut Sheet,
        categories: &CategoryMapping,
    ) -> Result<()> {
        self.layout.open_block(sheet, AGGREGATED_TITLE);
        for (category, members) in categories.iter() {
            let values = if members.is_empty() {
                vec![CellValue::formula(ZERO_SUM_FORMULA)]
            } else {
                self.aggregated_row(category, members)?
            };
            let handle = self.layout.write_row(sheet, category, values);
            self.layout
                .positions_mut()
                .register(RowKind::Category, category, handle);
        }
        self.layout.close_block();
        debug!("{AGGREGATED_TITLE}: {} rows", categories.len());
        Ok(())
    }

    fn aggregated_row(&self, category: &str, members: &[String]) -> Result<Vec<CellValue>> {
        let positions = self.layout.positions();
        let rows: Vec<RowHandle> = members
            .iter()
            .filter_map(|m| {
                let row = positions.get(RowKind::CostValue, m);
                if row.is_none() {
                    debug!("{category}: `{m}` has no cost value row, left out of the sum");
                }
                row
            })
            .collect();
        self.config
            .offsets()
            .map(|period| {
                let cells = rows
                    .iter()
                    .map(|&row| formula_ref(&self.columns, row, period))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CellValue::formula(sum_formula(&cells)))
            })
            .collect()
    }

    /// One row per category: column B sums the category row across all periods.
    pub(crate) fn compute_aggregated_cumulative_categories(
        &mut self,
        sheet: &mut Sheet,
        categories: &CategoryMapping,
    ) -> Result<()> {
        self.layout.open_block(sheet, CUMULATIVE_TITLE);
        for category in categories.names() {
            let row = self.layout.positions().require(RowKind::Category, category)?;
            let cells = self
                .config
                .offsets()
                .map(|period| formula_ref(&self.columns, row, period))
                .collect::<Result<Vec<_>>>()?;
            let handle = self.layout.write_row(
                sheet,
                category,
                [CellValue::formula(sum_formula(&cells))],
            );
            self.layout
                .cumulative_mut()
                .register(RowKind::Cumulative, category, handle);
        }
        self.layout.close_block();
        debug!("{CUMULATIVE_TITLE}: {} rows", categories.len());
        Ok(())
    }

    /// Echo the externally computed cumulative totals next to the formulas.
    pub(crate) fn add_test_cumulative_categories(&mut self, sheet: &mut Sheet, reference: &Table) {
        self.write_data_block(sheet, CUMULATIVE_TEST_TITLE, reference, false);
    }

    /// Emission difference scalar, then cumulative / |diff| * 1000 per category.
    pub(crate) fn compute_marginal_effects(
        &mut self,
        sheet: &mut Sheet,
        categories: &CategoryMapping,
        emission_diff: f64,
    ) -> Result<()> {
        self.layout.open_block(sheet, MARGINAL_TITLE);
        let handle = self.layout.write_row(
            sheet,
            EMISSION_DIFF_LABEL,
            [CellValue::Number(emission_diff)],
        );
        self.layout
            .positions_mut()
            .register(RowKind::EmissionDiff, EMISSION_DIFF_KEY, handle);

        let emission = self
            .layout
            .positions()
            .require(RowKind::EmissionDiff, EMISSION_DIFF_KEY)?;
        let emission = formula_ref(&self.columns, emission, 1)?;
        for category in categories.names() {
            let cumulative = self
                .layout
                .cumulative()
                .require(RowKind::Cumulative, category)?;
            let cumulative = formula_ref(&self.columns, cumulative, 1)?;
            self.layout.write_row(
                sheet,
                category,
                [CellValue::formula(marginal_effect_formula(
                    &cumulative,
                    &emission,
                ))],
            );
        }
        self.layout.close_block();
        debug!("{MARGINAL_TITLE}: {} rows", categories.len().saturating_add(1));
        Ok(())
    }

    /// Reset the cursor and both indices. Written sheets are untouched.
    pub(crate) fn finalize_sheet(&mut self) {
        self.layout.reset();
    }

    /// Write the flat summary sheet as the first sheet of the workbook.
    ///
    /// # Errors
    /// [`CbqaError::DuplicateSheet`] when it was already written.
    pub fn write_summary_sheet(&mut self, summary: &SummaryTable) -> Result<()> {
        let mut sheet = Sheet::new(SUMMARY_SHEET_NAME);
        sheet.append_row(summary.columns().iter().map(|c| CellValue::from(c.as_str())));
        for row in summary.rows() {
            sheet.append_row(row.iter().cloned());
        }
        sheet.frozen_rows = 1;
        let rows = summary.rows().len();
        self.workbook.insert_sheet(0, sheet)?;
        info!("Wrote `{SUMMARY_SHEET_NAME}` ({rows} strategies)");
        Ok(())
    }

    /// The workbook as XLSX bytes.
    ///
    /// # Errors
    /// See [`crate::export::write_xlsx`].
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        crate::export::write_xlsx(&self.workbook)
    }

    /// Write the workbook to `path`.
    ///
    /// # Errors
    /// See [`crate::export::save_xlsx`].
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::export::save_xlsx(&self.workbook, path)?;
        info!(
            "Saved {} sheets to {}",
            self.workbook.sheets().len(),
            path.display()
        );
        Ok(())
    }
}

/// Widen column A to its longest label.
#[allow(clippy::cast_precision_loss)]
fn fit_label_column(sheet: &mut Sheet) {
    let longest = sheet
        .cells()
        .filter(|&(_, col, _)| col == 0)
        .filter_map(|(_, _, v)| v.as_text())
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0);
    // tenths, so the width survives the 4-decimal `<col width>`
    let width = (longest.saturating_mul(11) as f64 / 10.0).clamp(MIN_LABEL_WIDTH, MAX_LABEL_WIDTH);
    sheet.col_widths.insert(0, width);
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder() -> QaWorkbookBuilder {
        let config = LayoutConfig::new(1, 3).unwrap();
        let drivers = DriverMapping::new().with("cb:x", ["x"]).with("cb:none", Vec::<String>::new());
        let factors = CostFactorTable::new().with("cb:x", 2.0, "usd", 1.5);
        QaWorkbookBuilder::new(config, drivers, factors).unwrap()
    }

    fn formula<'a>(sheet: &'a Sheet, at: &str) -> &'a str {
        sheet.cell_at(at).and_then(CellValue::as_formula).unwrap()
    }

    #[test]
    fn test_blocks_are_stacked_in_order() {
        let mut b = builder();
        let mut sheet = b.begin_sheet("S").unwrap();
        b.write_period_header(&mut sheet);
        let baseline = Table::for_periods("baseline", 1..=3)
            .with_column("x", [10.0, 10.0, 10.0])
            .unwrap();
        b.write_data_block(&mut sheet, BASELINE_TITLE, &baseline, true);
        assert_eq!(b.layout().cursor(), 2 + 1 + BLOCK_GAP);
        b.write_data_block(&mut sheet, PATHWAY_TITLE, &baseline, false);
        b.write_cost_factor_block(&mut sheet);

        assert_eq!(sheet.cell_at("B1"), Some(&CellValue::Number(1.0)));
        assert_eq!(sheet.cell_at("D1"), Some(&CellValue::Number(3.0)));
        assert_eq!(sheet.cell_at("A2").and_then(CellValue::as_text), Some("Baseline"));
        assert_eq!(sheet.cell_at("A3").and_then(CellValue::as_text), Some("x"));
        assert_eq!(sheet.cell_at("A5").and_then(CellValue::as_text), Some("Pathway"));
        assert_eq!(sheet.cell_at("A8").and_then(CellValue::as_text), Some("Cost Factors"));
        assert_eq!(sheet.cell_at("A9").and_then(CellValue::as_text), Some("cb:x"));
        assert_eq!(sheet.cell_at("B9"), Some(&CellValue::Number(2.0)));
        assert_eq!(sheet.cell_at("C9").and_then(CellValue::as_text), Some("usd"));
        assert_eq!(sheet.cell_at("D9"), Some(&CellValue::Number(1.5)));

        assert_eq!(b.layout().positions().get(RowKind::Series, "x").unwrap().row(), 3);
        assert_eq!(b.layout().positions().get(RowKind::CostFactor, "cb:x").unwrap().row(), 9);
    }

    #[test]
    fn test_cost_values_reference_pathway_offset() {
        let mut b = builder();
        let mut sheet = b.begin_sheet("S").unwrap();
        let baseline = Table::for_periods("baseline", 1..=3)
            .with_column("x", [10.0, 10.0, 10.0])
            .unwrap();
        b.write_data_block(&mut sheet, BASELINE_TITLE, &baseline, true);
        b.write_data_block(&mut sheet, PATHWAY_TITLE, &baseline, false);
        b.write_cost_factor_block(&mut sheet);
        b.compute_cost_values(&mut sheet, baseline.width()).unwrap();

        // baseline x on row 3, pathway x on row 6, factor on row 9, values from row 12
        assert_eq!(formula(&sheet, "B12"), "=(((B6-B3)*$B$9*$D$9^0))/1e9");
        assert_eq!(formula(&sheet, "D12"), "=(((D6-D3)*$B$9*$D$9^1))/1e9");
        for at in ["B13", "C13", "D13"] {
            assert_eq!(formula(&sheet, at), "=0.0");
        }
    }

    #[test]
    fn test_cost_values_fail_on_unregistered_driver() {
        let mut b = builder();
        let mut sheet = b.begin_sheet("S").unwrap();
        b.write_cost_factor_block(&mut sheet);
        let err = b.compute_cost_values(&mut sheet, 1).unwrap_err();
        assert!(matches!(
            err,
            CbqaError::UnregisteredVariable { kind: RowKind::Series, ref name } if name == "x"
        ));
    }

    #[test]
    fn test_missing_cost_factor_rejected_at_construction() {
        let config = LayoutConfig::new(1, 3).unwrap();
        let drivers = DriverMapping::new().with("cb:y", ["y"]);
        let err = QaWorkbookBuilder::new(config, drivers, CostFactorTable::new()).unwrap_err();
        assert!(matches!(err, CbqaError::MissingRow { ref label, .. } if label == "cb:y"));
    }

    #[test]
    fn test_aggregation_filters_unregistered_members() {
        let mut b = builder();
        let mut sheet = b.begin_sheet("S").unwrap();
        b.layout.open_block(&mut sheet, "Cost Variables");
        let v1 = b.layout.write_row(&mut sheet, "v1", std::iter::empty());
        let v2 = b.layout.write_row(&mut sheet, "v2", std::iter::empty());
        b.layout.positions_mut().register(RowKind::CostValue, "v1", v1);
        b.layout.positions_mut().register(RowKind::CostValue, "v2", v2);
        b.layout.close_block();

        let categories = CategoryMapping::new()
            .with("both", ["v1", "v2"])
            .with("filtered", ["v1", "gone"])
            .with("all_gone", ["gone"])
            .with("empty", Vec::<String>::new());
        b.compute_aggregated_categories(&mut sheet, &categories).unwrap();

        // title on row 6, categories on rows 7..=10
        assert_eq!(formula(&sheet, "C7"), "=C3+C4");
        assert_eq!(formula(&sheet, "C8"), "=C3");
        assert_eq!(formula(&sheet, "D9"), "=0");
        assert_eq!(formula(&sheet, "B10"), "=0");
        assert_eq!(sheet.cell_at("C10"), None);
    }

    #[test]
    fn test_failed_sheet_leaves_workbook_unchanged() {
        let mut b = builder();
        let baseline = Table::for_periods("baseline", 1..=3)
            .with_column("x", [10.0, 10.0, 10.0])
            .unwrap();
        let pathway = Table::for_periods("pathway", 1..=2)
            .with_column("x", [10.0, 12.0])
            .unwrap();
        let reference = Table::new("reference", ["S"]);
        let categories = CategoryMapping::new();
        let inputs = StrategyInputs {
            strategy: "S",
            baseline: &baseline,
            pathway: &pathway,
            categories: &categories,
            cumulative_reference: &reference,
            emission_diff: 1.0,
        };
        let err = b.compute_strategy_sheet(&inputs).unwrap_err();
        assert!(matches!(err, CbqaError::RowCount { expected: 3, found: 2, .. }));
        assert!(b.workbook().sheets().is_empty());
        assert!(b.layout().is_reset());
    }

    #[test]
    fn test_summary_sheet_goes_first() {
        let mut b = builder();
        b.workbook.add_sheet(Sheet::new("M8_EC")).unwrap();
        let summary = SummaryTable::from_parts(
            vec!["strategy".to_string(), "net_benefit".to_string()],
            vec![vec![CellValue::from("PFLO:M8_EC"), CellValue::Number(4.0)]],
        );
        b.write_summary_sheet(&summary).unwrap();
        let first = &b.workbook().sheets()[0];
        assert_eq!(first.name, SUMMARY_SHEET_NAME);
        assert_eq!(first.cell_at("A1").and_then(CellValue::as_text), Some("strategy"));
        assert_eq!(first.cell_at("B2"), Some(&CellValue::Number(4.0)));
        assert!(b.write_summary_sheet(&summary).is_err());
    }
}
