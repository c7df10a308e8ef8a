//! Layout engine tests: block placement, formula text and evaluated values.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use cbqa::builder::{
    AGGREGATED_TITLE, BASELINE_TITLE, COST_VARIABLES_TITLE, CUMULATIVE_TEST_TITLE, CUMULATIVE_TITLE,
    EMISSION_DIFF_LABEL, MARGINAL_TITLE,
};
use cbqa::cell_ref::col_to_letter;
use cbqa::formula::Evaluator;
use cbqa::layout::{ZERO_COST_FORMULA, ZERO_SUM_FORMULA};
use cbqa::{
    CategoryMapping, CbqaError, CellValue, CostFactorTable, DriverMapping, LayoutConfig,
    QaWorkbookBuilder, StrategyInputs, Table,
};
use common::*;
use pretty_assertions::assert_eq;

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_two_strategies_cost_values() {
    let mut b = builder();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    add_strategy(&mut b, "S2", [10.0, 12.0, 15.0], 2.0);

    assert_eq!(b.workbook().sheets().len(), 2);
    for name in ["S1", "S2"] {
        let sheet = b.workbook().sheet(name).unwrap();
        let row = row_in_block(sheet, COST_VARIABLES_TITLE, "cb:x");
        let mut eval = Evaluator::new(sheet);
        assert_eq!(eval.evaluate_cell(row, 1).unwrap(), 0.0);
        assert_close(eval.evaluate_cell(row, 2).unwrap(), (12.0 - 10.0) * 2.0 / 1e9);
        assert_close(eval.evaluate_cell(row, 3).unwrap(), (15.0 - 10.0) * 2.0 * 1.5 / 1e9);
    }
}

#[test]
fn test_cost_value_formula_text() {
    let mut b = builder();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    let sheet = b.workbook().sheet("S1").unwrap();

    // header row 1, baseline x on row 3, pathway x on row 6, cost factor on row 9
    let row = row_in_block(sheet, COST_VARIABLES_TITLE, "cb:x");
    assert_eq!(formula_at(sheet, row, 1), "=(((B6-B3)*$B$9*$D$9^0))/1e9");
    assert_eq!(formula_at(sheet, row, 2), "=(((C6-C3)*$B$9*$D$9^0))/1e9");
    assert_eq!(formula_at(sheet, row, 3), "=(((D6-D3)*$B$9*$D$9^1))/1e9");
}

#[test]
fn test_cumulative_matches_reference_block() {
    let mut b = builder();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    let sheet = b.workbook().sheet("S1").unwrap();

    let cumulative = row_in_block(sheet, CUMULATIVE_TITLE, "fuel_cost");
    let reference = row_in_block(sheet, CUMULATIVE_TEST_TITLE, "fuel_cost");
    assert_close(evaluate(sheet, cumulative, 1), 19e-9);
    assert_eq!(sheet.cell(reference, 1), Some(&CellValue::Number(19e-9)));

    let checks = cbqa::verify::verify_strategy_sheet(sheet, 1e-9).unwrap();
    assert!(checks.iter().all(|c| c.matches));
}

// ============================================================================
// Column alignment
// ============================================================================

#[test]
fn test_period_columns_align_across_blocks() {
    let mut b = builder();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    let sheet = b.workbook().sheet("S1").unwrap();

    assert_eq!(sheet.cell(0, 0), None);
    for (p, period) in (1..=3).zip(TIME_INIT..=TIME_END) {
        assert_eq!(sheet.cell(0, p), Some(&CellValue::from(period)));
    }
    assert_eq!(sheet.cell(0, 4), None);

    let cost = row_in_block(sheet, COST_VARIABLES_TITLE, "cb:x");
    let aggregated = row_in_block(sheet, AGGREGATED_TITLE, "fuel_cost");
    for p in 1..=3u32 {
        let letter = col_to_letter(p);
        let expected = format!("={letter}{}", cost + 1);
        assert_eq!(formula_at(sheet, aggregated, p), expected);
        assert!(formula_at(sheet, cost, p).contains(&format!("({letter}6-{letter}3)")));
    }
    for row in [cost, aggregated] {
        assert_eq!(sheet.cell(row, 4), None);
    }
}

#[test]
fn test_header_sits_right_above_first_block() {
    let config = LayoutConfig::with_first_block_row(TIME_INIT, TIME_END, 4).unwrap();
    let mut b = QaWorkbookBuilder::new(config, drivers(), cost_factors()).unwrap();
    let (baseline, pathway, categories) = (baseline(), pathway([10.0, 12.0, 15.0]), categories());
    let reference = reference("S1", &[("fuel_cost", 19e-9)]);
    b.compute_strategy_sheet(&StrategyInputs {
        strategy: "S1",
        baseline: &baseline,
        pathway: &pathway,
        categories: &categories,
        cumulative_reference: &reference,
        emission_diff: -2.0,
    })
    .unwrap();
    let sheet = b.workbook().sheet("S1").unwrap();

    // header on row 3, rows 1 and 2 stay empty
    assert_eq!(sheet.cell(0, 1), None);
    assert_eq!(sheet.cell(2, 1), Some(&CellValue::from(TIME_INIT)));
    assert_eq!(sheet.find_text_in_column(0, BASELINE_TITLE), Some(3));
    let row = row_in_block(sheet, COST_VARIABLES_TITLE, "cb:x");
    assert_eq!(formula_at(sheet, row, 1), "=(((B8-B5)*$B$11*$D$11^0))/1e9");
}

#[test]
fn test_too_many_periods_rejected() {
    assert!(matches!(
        LayoutConfig::new(1, 78),
        Err(CbqaError::ColumnOverflow { .. })
    ));
    assert!(LayoutConfig::new(1, 77).is_ok());
}

// ============================================================================
// Degenerate cases
// ============================================================================

#[test]
fn test_empty_driver_list_is_zero_every_period() {
    let drivers = drivers().with("cb:none", std::iter::empty::<&str>());
    let mut b = QaWorkbookBuilder::new(
        LayoutConfig::new(TIME_INIT, TIME_END).unwrap(),
        drivers,
        cost_factors(),
    )
    .unwrap();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    let sheet = b.workbook().sheet("S1").unwrap();

    let row = row_in_block(sheet, COST_VARIABLES_TITLE, "cb:none");
    for p in 1..=3 {
        assert_eq!(formula_at(sheet, row, p), ZERO_COST_FORMULA);
        assert_eq!(evaluate(sheet, row, p), 0.0);
    }
}

#[test]
fn test_empty_category_is_single_zero() {
    let mut b = builder();
    let categories = categories().with("other_cost", std::iter::empty::<&str>());
    let (baseline, pathway) = (baseline(), pathway([10.0, 12.0, 15.0]));
    let reference = reference("S1", &[("fuel_cost", 19e-9), ("other_cost", 0.0)]);
    b.compute_strategy_sheet(&StrategyInputs {
        strategy: "S1",
        baseline: &baseline,
        pathway: &pathway,
        categories: &categories,
        cumulative_reference: &reference,
        emission_diff: -2.0,
    })
    .unwrap();
    let sheet = b.workbook().sheet("S1").unwrap();

    let row = row_in_block(sheet, AGGREGATED_TITLE, "other_cost");
    assert_eq!(formula_at(sheet, row, 1), ZERO_SUM_FORMULA);
    assert_eq!(sheet.cell(row, 2), None);
    let cumulative = row_in_block(sheet, CUMULATIVE_TITLE, "other_cost");
    assert_eq!(evaluate(sheet, cumulative, 1), 0.0);
}

// ============================================================================
// Aggregation
// ============================================================================

fn two_variable_builder() -> QaWorkbookBuilder {
    let drivers = DriverMapping::new()
        .with("cb:x", ["x"])
        .with("cb:y", ["y"]);
    let factors = CostFactorTable::new()
        .with("cb:x", 2.0, "usd", 1.5)
        .with("cb:y", 1.0, "usd", 1.0);
    QaWorkbookBuilder::new(LayoutConfig::new(TIME_INIT, TIME_END).unwrap(), drivers, factors)
        .unwrap()
}

fn two_variable_sheet(categories: &CategoryMapping) -> cbqa::Sheet {
    let mut b = two_variable_builder();
    let baseline = baseline().with_column("y", [1.0, 1.0, 1.0]).unwrap();
    let pathway = pathway([10.0, 12.0, 15.0])
        .with_column("y", [2.0, 3.0, 4.0])
        .unwrap();
    let reference = Table::new("reference", ["S1"]);
    b.compute_strategy_sheet(&StrategyInputs {
        strategy: "S1",
        baseline: &baseline,
        pathway: &pathway,
        categories,
        cumulative_reference: &reference,
        emission_diff: 1.0,
    })
    .unwrap();
    b.into_workbook().sheet("S1").unwrap().clone()
}

#[test]
fn test_aggregated_sums_member_rows() {
    let sheet = two_variable_sheet(&CategoryMapping::new().with("technical_cost", ["cb:x", "cb:y"]));
    let x = row_in_block(&sheet, COST_VARIABLES_TITLE, "cb:x") + 1;
    let y = row_in_block(&sheet, COST_VARIABLES_TITLE, "cb:y") + 1;
    let row = row_in_block(&sheet, AGGREGATED_TITLE, "technical_cost");

    for p in 1..=3u32 {
        let letter = col_to_letter(p);
        assert_eq!(formula_at(&sheet, row, p), format!("={letter}{x}+{letter}{y}"));
        let sum = evaluate(&sheet, x - 1, p) + evaluate(&sheet, y - 1, p);
        assert_close(evaluate(&sheet, row, p), sum);
    }
}

#[test]
fn test_aggregated_skips_filtered_member() {
    // cb:dropped was filtered out upstream and has no cost value row
    let sheet = two_variable_sheet(
        &CategoryMapping::new()
            .with("technical_cost", ["cb:x", "cb:dropped", "cb:y"])
            .with("gone_cost", ["cb:dropped"]),
    );
    let x = row_in_block(&sheet, COST_VARIABLES_TITLE, "cb:x") + 1;
    let y = row_in_block(&sheet, COST_VARIABLES_TITLE, "cb:y") + 1;
    let row = row_in_block(&sheet, AGGREGATED_TITLE, "technical_cost");
    assert_eq!(formula_at(&sheet, row, 1), format!("=B{x}+B{y}"));

    let gone = row_in_block(&sheet, AGGREGATED_TITLE, "gone_cost");
    for p in 1..=3 {
        assert_eq!(formula_at(&sheet, gone, p), ZERO_SUM_FORMULA);
    }
}

#[test]
fn test_cumulative_is_horizontal_sum() {
    let mut b = builder();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    let mut sheet = b.workbook().sheet("S1").unwrap().clone();

    let aggregated = row_in_block(&sheet, AGGREGATED_TITLE, "fuel_cost");
    for (p, v) in (1..=3).zip([1.0, 2.0, 3.0]) {
        sheet.set_cell(aggregated, p, CellValue::Number(v));
    }
    let cumulative = row_in_block(&sheet, CUMULATIVE_TITLE, "fuel_cost");
    let a = aggregated + 1;
    assert_eq!(formula_at(&sheet, cumulative, 1), format!("=B{a}+C{a}+D{a}"));
    assert_eq!(evaluate(&sheet, cumulative, 1), 6.0);
}

// ============================================================================
// Marginal effects
// ============================================================================

#[test]
fn test_marginal_effect_sign_independent() {
    let value = |emission_diff: f64| {
        let mut b = builder();
        add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], emission_diff);
        let sheet = b.workbook().sheet("S1").unwrap();
        let emission = row_in_block(sheet, MARGINAL_TITLE, EMISSION_DIFF_LABEL);
        assert_eq!(sheet.cell(emission, 1), Some(&CellValue::Number(emission_diff)));
        let row = row_in_block(sheet, MARGINAL_TITLE, "fuel_cost");
        let cumulative = row_in_block(sheet, CUMULATIVE_TITLE, "fuel_cost") + 1;
        assert_eq!(
            formula_at(sheet, row, 1),
            format!("=(B{cumulative}/ABS(B{}))*1000", emission + 1)
        );
        evaluate(sheet, row, 1)
    };

    let negative = value(-2.0);
    assert_close(negative, 19e-9 / 2.0 * 1000.0);
    assert_eq!(negative, value(2.0));
}

// ============================================================================
// Per-sheet state
// ============================================================================

#[test]
fn test_state_reset_after_every_sheet() {
    let mut b = builder();
    let start = b.layout().cursor();
    for name in ["S1", "S2", "S3"] {
        add_strategy(&mut b, name, [10.0, 12.0, 15.0], -2.0);
        assert_eq!(b.layout().cursor(), start);
        assert!(b.layout().positions().is_empty());
        assert!(b.layout().cumulative().is_empty());
        assert!(b.layout().is_reset());
    }
    // identical inputs give identical sheets
    let sheets = b.workbook().sheets();
    assert_eq!(sheets[0].max_row(), sheets[2].max_row());
    assert_eq!(sheets[0].cell_data(), sheets[1].cell_data());
}

#[test]
fn test_failed_sheet_resets_and_adds_nothing() {
    let mut b = builder();
    let short = Table::for_periods("pathway", 1..=2)
        .with_column("x", [10.0, 12.0])
        .unwrap();
    let (baseline, categories) = (baseline(), categories());
    let reference = reference("S1", &[]);
    let err = b
        .compute_strategy_sheet(&StrategyInputs {
            strategy: "S1",
            baseline: &baseline,
            pathway: &short,
            categories: &categories,
            cumulative_reference: &reference,
            emission_diff: -2.0,
        })
        .unwrap_err();
    assert!(matches!(err, CbqaError::RowCount { expected: 3, found: 2, .. }));
    assert!(b.workbook().sheets().is_empty());
    assert!(b.layout().is_reset());

    // the builder is still usable
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    assert_eq!(b.workbook().sheets().len(), 1);
}

#[test]
fn test_missing_driver_column_is_hard_stop() {
    let mut b = builder();
    let baseline = Table::for_periods("baseline", 1..=3)
        .with_column("other", [1.0, 1.0, 1.0])
        .unwrap();
    let pathway = pathway([10.0, 12.0, 15.0]);
    let (categories, reference) = (categories(), reference("S1", &[]));
    let err = b
        .compute_strategy_sheet(&StrategyInputs {
            strategy: "S1",
            baseline: &baseline,
            pathway: &pathway,
            categories: &categories,
            cumulative_reference: &reference,
            emission_diff: -2.0,
        })
        .unwrap_err();
    assert!(matches!(err, CbqaError::MissingColumn { .. }));
    assert!(b.workbook().sheets().is_empty());
}

#[test]
fn test_duplicate_strategy_rejected() {
    let mut b = builder();
    add_strategy(&mut b, "S1", [10.0, 12.0, 15.0], -2.0);
    let (baseline, pathway, categories) = (baseline(), pathway([10.0; 3]), categories());
    let reference = reference("s1", &[]);
    let err = b
        .compute_strategy_sheet(&StrategyInputs {
            strategy: "s1",
            baseline: &baseline,
            pathway: &pathway,
            categories: &categories,
            cumulative_reference: &reference,
            emission_diff: -2.0,
        })
        .unwrap_err();
    assert!(matches!(err, CbqaError::DuplicateSheet(_)));
    assert_eq!(b.workbook().sheets().len(), 1);
}
