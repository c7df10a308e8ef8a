use serde::ser::Serializer;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{CellData, CellValue};
use crate::error::{CbqaError, Result};

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A complete workbook: an ordered list of uniquely named sheets.
#[derive(Debug, Default, Serialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| same_sheet_name(&s.name, name))
    }

    #[must_use]
    pub fn contains_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    /// Append a sheet at the end.
    ///
    /// # Errors
    /// [`CbqaError::InvalidSheetName`] or [`CbqaError::DuplicateSheet`].
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        let at = self.sheets.len();
        self.insert_sheet(at, sheet)
    }

    /// Insert a sheet at `index` (clamped to the end).
    ///
    /// # Errors
    /// [`CbqaError::InvalidSheetName`] or [`CbqaError::DuplicateSheet`].
    pub fn insert_sheet(&mut self, index: usize, sheet: Sheet) -> Result<()> {
        self.check_new_sheet_name(&sheet.name)?;
        let at = index.min(self.sheets.len());
        self.sheets.insert(at, sheet);
        Ok(())
    }

    /// Fails if `name` is invalid or already taken.
    ///
    /// # Errors
    /// [`CbqaError::InvalidSheetName`] or [`CbqaError::DuplicateSheet`].
    pub fn check_new_sheet_name(&self, name: &str) -> Result<()> {
        validate_sheet_name(name)?;
        if self.contains_sheet(name) {
            return Err(CbqaError::DuplicateSheet(name.to_string()));
        }
        Ok(())
    }
}

/// Check a sheet name against Excel's rules.
///
/// # Errors
/// Returns [`CbqaError::InvalidSheetName`] with the broken rule.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.chars().count() > MAX_SHEET_NAME_LEN {
        Some("name is longer than 31 characters")
    } else if name.contains(FORBIDDEN_SHEET_CHARS) {
        Some("name contains one of [ ] : * ? / \\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("name starts or ends with an apostrophe")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(CbqaError::InvalidSheetName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Sheet names compare case-insensitively, Unicode letters included.
#[must_use]
pub fn same_sheet_name(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Sheet name for a strategy code: the part after the last `:`.
///
/// `"PFLO:M8_EC"` becomes `"M8_EC"`; codes without a prefix are returned as-is.
#[must_use]
pub fn sheet_name_for_strategy(code: &str) -> &str {
    code.rsplit(':').next().unwrap_or(code)
}

/// A single worksheet.
///
/// Cells are stored sparsely, keyed by 0-indexed `(row, col)`, so iteration
/// is row-major, which is the order the package writer needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    /// Number of frozen rows (0 = none)
    pub frozen_rows: u32,
    /// Number of frozen columns (0 = none)
    pub frozen_cols: u32,
    /// Custom column widths in Excel character units, keyed by 0-indexed column.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub col_widths: BTreeMap<u32, f64>,
    #[serde(serialize_with = "serialize_cells")]
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Write a cell at 0-indexed `(row, col)`, replacing any previous content.
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    /// Write `values` starting at column A on the row after the last used row.
    ///
    /// Returns the 0-indexed row that was written.
    pub fn append_row(&mut self, values: impl IntoIterator<Item = CellValue>) -> u32 {
        let row = self.max_row();
        for (col, value) in (0u32..).zip(values) {
            self.set_cell(row, col, value);
        }
        row
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Look up a cell by A1-style reference.
    #[must_use]
    pub fn cell_at(&self, reference: &str) -> Option<&CellValue> {
        let (col, row) = crate::cell_ref::parse_cell_ref(reference)?;
        self.cell(row, col)
    }

    /// Cells of one row, in column order.
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u32, &CellValue)> {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, c), v)| (c, v))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    /// Owned snapshot of all cells.
    #[must_use]
    pub fn cell_data(&self) -> Vec<CellData> {
        self.cells()
            .map(|(r, c, value)| CellData {
                r,
                c,
                value: value.clone(),
            })
            .collect()
    }

    /// Number of used rows (last used 0-indexed row + 1), 0 when empty.
    #[must_use]
    pub fn max_row(&self) -> u32 {
        self.cells
            .keys()
            .next_back()
            .map_or(0, |&(r, _)| r.saturating_add(1))
    }

    /// Number of used columns (last used 0-indexed column + 1), 0 when empty.
    #[must_use]
    pub fn max_col(&self) -> u32 {
        self.cells
            .keys()
            .map(|&(_, c)| c.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First 0-indexed row whose cell in `col` is the text `label`.
    #[must_use]
    pub fn find_text_in_column(&self, col: u32, label: &str) -> Option<u32> {
        self.cells
            .iter()
            .find(|(&(_, c), v)| c == col && v.as_text() == Some(label))
            .map(|(&(r, _), _)| r)
    }
}

fn serialize_cells<S: Serializer>(
    cells: &BTreeMap<(u32, u32), CellValue>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(cells.iter().map(|(&(r, c), value)| CellData {
        r,
        c,
        value: value.clone(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_append_row_after_last_used_row() {
        let mut sheet = Sheet::new("S");
        assert_eq!(sheet.append_row([CellValue::from("a")]), 0);
        sheet.set_cell(4, 0, "title".into());
        assert_eq!(sheet.append_row([CellValue::from("b"), 2.0.into()]), 5);
        assert_eq!(sheet.max_row(), 6);
        assert_eq!(sheet.max_col(), 2);
        assert_eq!(sheet.cell_at("B6"), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn test_row_iteration() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(1, 3, 3.0.into());
        sheet.set_cell(1, 0, "x".into());
        sheet.set_cell(2, 0, "y".into());
        let cols: Vec<u32> = sheet.row(1).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![0, 3]);
        assert_eq!(sheet.find_text_in_column(0, "y"), Some(2));
        assert_eq!(sheet.find_text_in_column(1, "y"), None);
    }

    #[test]
    fn test_duplicate_sheet_rejected_case_insensitively() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("M8_EC")).unwrap();
        let err = wb.add_sheet(Sheet::new("m8_ec")).unwrap_err();
        assert!(matches!(err, CbqaError::DuplicateSheet(name) if name == "m8_ec"));
        assert_eq!(wb.sheets().len(), 1);
    }

    #[test]
    fn test_duplicate_sheet_rejected_beyond_ascii() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("Ä1")).unwrap();
        let err = wb.add_sheet(Sheet::new("ä1")).unwrap_err();
        assert!(matches!(err, CbqaError::DuplicateSheet(name) if name == "ä1"));
        assert!(wb.contains_sheet("ä1"));
        assert!(!wb.contains_sheet("A1"));
    }

    #[test]
    fn test_insert_sheet_first() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("A")).unwrap();
        wb.insert_sheet(0, Sheet::new("QA_python")).unwrap();
        let names: Vec<&str> = wb.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["QA_python", "A"]);
    }

    #[test_case("" ; "empty")]
    #[test_case("PFLO:M8_EC" ; "colon")]
    #[test_case("a/b" ; "slash")]
    #[test_case("'quoted'" ; "apostrophe")]
    #[test_case("abcdefghijklmnopqrstuvwxyz0123456" ; "too long")]
    fn test_invalid_sheet_names(name: &str) {
        assert!(matches!(
            validate_sheet_name(name),
            Err(CbqaError::InvalidSheetName { .. })
        ));
    }

    #[test]
    fn test_sheet_name_for_strategy() {
        assert_eq!(sheet_name_for_strategy("PFLO:M8_EC"), "M8_EC");
        assert_eq!(sheet_name_for_strategy("TX:AGRC:DEC_CH4"), "DEC_CH4");
        assert_eq!(sheet_name_for_strategy("BASE"), "BASE");
    }
}
