//! Cross-check of the formula-derived cumulative block.
//!
//! A strategy sheet carries two cumulative blocks: "Cost-Benefit
//! Cumulative" (formulas over the aggregated rows) and "Cost-Benefit
//! Cumulative Test" (the externally computed totals). Evaluating the first
//! and comparing it with the second, label by label, checks the whole
//! formula chain from the baseline and pathway data down.

use serde::Serialize;

use crate::builder::{CUMULATIVE_TEST_TITLE, CUMULATIVE_TITLE};
use crate::error::{CbqaError, Result};
use crate::formula::Evaluator;
use crate::types::{CellValue, Sheet, Workbook};

/// Default relative tolerance of the cross-check.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// One category of the cross-check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeCheck {
    pub category: String,
    pub formula_value: f64,
    /// `None` when the reference block has no row for the category.
    pub reference_value: Option<f64>,
    pub matches: bool,
}

/// Cross-check results of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub sheet: String,
    pub checks: Vec<CumulativeCheck>,
}

impl SheetReport {
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.checks.iter().all(|c| c.matches)
    }
}

/// Whether `sheet` was laid out as a strategy sheet.
#[must_use]
pub fn is_strategy_sheet(sheet: &Sheet) -> bool {
    sheet.find_text_in_column(0, CUMULATIVE_TITLE).is_some()
}

/// Evaluate every cumulative formula and compare it with its reference value.
///
/// Values match when `|a - b| <= tolerance * max(|a|, |b|)`. Cost values
/// are in billions, so there is no absolute floor.
///
/// # Errors
/// [`CbqaError::MissingRow`] when a block title is missing,
/// [`CbqaError::Formula`] when a formula cannot be evaluated.
pub fn verify_strategy_sheet(sheet: &Sheet, tolerance: f64) -> Result<Vec<CumulativeCheck>> {
    let cumulative = block_rows(sheet, CUMULATIVE_TITLE)?;
    let reference = block_rows(sheet, CUMULATIVE_TEST_TITLE)?;
    let mut eval = Evaluator::new(sheet);

    cumulative
        .into_iter()
        .map(|(category, row)| {
            let formula_value = eval.evaluate_cell(row, 1)?;
            let reference_value = reference
                .iter()
                .find(|(label, _)| *label == category)
                .and_then(|&(_, r)| sheet.cell(r, 1).and_then(CellValue::as_number));
            let matches = reference_value.is_some_and(|r| close(formula_value, r, tolerance));
            Ok(CumulativeCheck {
                category: category.to_string(),
                formula_value,
                reference_value,
                matches,
            })
        })
        .collect()
}

/// Cross-check every strategy sheet of a workbook.
///
/// # Errors
/// See [`verify_strategy_sheet`].
pub fn verify_workbook(workbook: &Workbook, tolerance: f64) -> Result<Vec<SheetReport>> {
    workbook
        .sheets()
        .iter()
        .filter(|s| is_strategy_sheet(s))
        .map(|s| {
            Ok(SheetReport {
                sheet: s.name.clone(),
                checks: verify_strategy_sheet(s, tolerance)?,
            })
        })
        .collect()
}

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}

/// `(label, 0-indexed row)` of the rows under a block title, up to the
/// first row without a label.
fn block_rows<'s>(sheet: &'s Sheet, title: &str) -> Result<Vec<(&'s str, u32)>> {
    let start = sheet
        .find_text_in_column(0, title)
        .ok_or_else(|| CbqaError::MissingRow {
            table: sheet.name.clone(),
            label: title.to_string(),
        })?;
    Ok((start.saturating_add(1)..)
        .map_while(|row| {
            sheet
                .cell(row, 0)
                .and_then(CellValue::as_text)
                .map(|label| (label, row))
        })
        .collect())
}
