//! Shared fixtures for the integration tests.
//!
//! The standard scenario has three periods and one cost variable `cb:x`
//! driven by series `x`, with multiplier 2 and annual change 1.5.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use cbqa::formula::Evaluator;
use cbqa::{
    CategoryMapping, CellValue, CostFactorTable, DriverMapping, LayoutConfig, QaWorkbookBuilder,
    Sheet, StrategyInputs, Table,
};

pub const TIME_INIT: i64 = 1;
pub const TIME_END: i64 = 3;

pub fn baseline() -> Table {
    Table::for_periods("baseline", TIME_INIT..=TIME_END)
        .with_column("x", [10.0, 10.0, 10.0])
        .unwrap()
}

pub fn pathway(values: [f64; 3]) -> Table {
    Table::for_periods("pathway", TIME_INIT..=TIME_END)
        .with_column("x", values)
        .unwrap()
}

pub fn drivers() -> DriverMapping {
    DriverMapping::new().with("cb:x", ["x"])
}

pub fn cost_factors() -> CostFactorTable {
    CostFactorTable::new().with("cb:x", 2.0, "usd", 1.5)
}

pub fn categories() -> CategoryMapping {
    CategoryMapping::new().with("fuel_cost", ["cb:x"])
}

/// One-row table of cumulative reference values, labelled by strategy.
pub fn reference(strategy: &str, values: &[(&str, f64)]) -> Table {
    let mut table = Table::new("reference", [strategy]);
    for &(name, value) in values {
        table.push_column(name, [value]).unwrap();
    }
    table
}

pub fn builder() -> QaWorkbookBuilder {
    QaWorkbookBuilder::new(
        LayoutConfig::new(TIME_INIT, TIME_END).unwrap(),
        drivers(),
        cost_factors(),
    )
    .unwrap()
}

/// Lay out one strategy sheet of the standard scenario.
pub fn add_strategy(
    builder: &mut QaWorkbookBuilder,
    strategy: &str,
    pathway_values: [f64; 3],
    emission_diff: f64,
) {
    let baseline = baseline();
    let pathway = pathway(pathway_values);
    let categories = categories();
    let reference = reference(strategy, &[("fuel_cost", 19e-9)]);
    builder
        .compute_strategy_sheet(&StrategyInputs {
            strategy,
            baseline: &baseline,
            pathway: &pathway,
            categories: &categories,
            cumulative_reference: &reference,
            emission_diff,
        })
        .unwrap();
}

/// 0-indexed row of `label` in column A, searching below the block `title`.
pub fn row_in_block(sheet: &Sheet, title: &str, label: &str) -> u32 {
    let start = sheet
        .find_text_in_column(0, title)
        .unwrap_or_else(|| panic!("no block `{title}`"));
    (start + 1..)
        .take_while(|&r| sheet.cell(r, 0).is_some())
        .find(|&r| sheet.cell(r, 0).and_then(CellValue::as_text) == Some(label))
        .unwrap_or_else(|| panic!("no `{label}` under `{title}`"))
}

/// Formula text at a 0-indexed position.
pub fn formula_at(sheet: &Sheet, row: u32, col: u32) -> &str {
    sheet
        .cell(row, col)
        .and_then(CellValue::as_formula)
        .unwrap_or_else(|| panic!("no formula at ({row}, {col})"))
}

pub fn evaluate(sheet: &Sheet, row: u32, col: u32) -> f64 {
    Evaluator::new(sheet).evaluate_cell(row, col).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    let scale = actual.abs().max(expected.abs()).max(1e-30);
    assert!(
        (actual - expected).abs() <= scale * 1e-9,
        "expected {expected}, got {actual}"
    );
}
