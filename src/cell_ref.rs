//! Column letters and cell references.
//!
//! The layout engine addresses periods through a fixed [`ColumnTable`]
//! (`A..Z`, `AA..AZ`, `BA..BZ`). Column `A` holds row labels, so period
//! offset `p` lands in the column at table position `p`. Asking for an
//! offset past the end of the table is a [`CbqaError::ColumnOverflow`],
//! never a wrap-around.

use std::fmt;

use crate::error::{CbqaError, Result};

/// Highest period offset the column table can address.
pub const MAX_PERIODS: u32 = 77;

/// Column holding the multiplier in the cost-factor block.
pub(crate) const MULTIPLIER_COL: u32 = 1;
/// Column holding the annual change in the cost-factor block.
pub(crate) const ANNUAL_CHANGE_COL: u32 = 3;

/// Ordered mapping from period offset to column letters.
#[derive(Debug, Clone)]
pub struct ColumnTable {
    letters: Vec<String>,
}

impl Default for ColumnTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTable {
    /// Build the table: single letters, then `A`- and `B`-prefixed pairs.
    #[must_use]
    pub fn new() -> Self {
        let singles: Vec<char> = ('A'..='Z').collect();
        let mut letters: Vec<String> = singles.iter().map(char::to_string).collect();
        for prefix in ['A', 'B'] {
            letters.extend(singles.iter().map(|c| format!("{prefix}{c}")));
        }
        Self { letters }
    }

    /// Number of period offsets the table can address (offset 0 is the label column).
    #[must_use]
    pub fn max_periods(&self) -> u32 {
        u32::try_from(self.letters.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Column letters for a period offset. Offset 0 is the label column `A`.
    ///
    /// # Errors
    /// Returns [`CbqaError::ColumnOverflow`] when the offset is past the table.
    pub fn letter(&self, offset: u32) -> Result<&str> {
        usize::try_from(offset)
            .ok()
            .and_then(|idx| self.letters.get(idx))
            .map(String::as_str)
            .ok_or(CbqaError::ColumnOverflow {
                period: offset,
                max: self.max_periods(),
            })
    }

    /// Relative reference (`C12`) to `row` at a period offset.
    ///
    /// # Errors
    /// Returns [`CbqaError::ColumnOverflow`] when the offset is past the table.
    pub fn cell(&self, offset: u32, row: u32) -> Result<CellRef> {
        Ok(CellRef {
            column: self.letter(offset)?.to_string(),
            row,
            absolute: false,
        })
    }

    /// Absolute reference (`$B$20`) to `row` at a column offset.
    ///
    /// # Errors
    /// Returns [`CbqaError::ColumnOverflow`] when the offset is past the table.
    pub fn absolute_cell(&self, offset: u32, row: u32) -> Result<CellRef> {
        Ok(CellRef {
            absolute: true,
            ..self.cell(offset, row)?
        })
    }
}

/// A single-cell reference as it appears in a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    column: String,
    row: u32,
    absolute: bool,
}

impl CellRef {
    /// Column letters.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// 1-based row number.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "${}${}", self.column, self.row)
        } else {
            write!(f, "{}{}", self.column, self.row)
        }
    }
}

/// Convert a 0-based column index to Excel column letters (A, B, ..., Z, AA, AB, ...).
///
/// Unlike [`ColumnTable`] this has no ceiling; the package writer uses it for
/// `r` attributes of arbitrary sheets.
#[must_use]
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        n -= 1;
        let c = u32::try_from(n % 26)
            .ok()
            .and_then(|d| char::from_u32(u32::from(b'A') + d))
            .unwrap_or('A');
        result.insert(0, c);
        n /= 26;
    }
    result
}

/// Parse a cell reference like "A1" or "$B$10" into (col, row) where both are 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into (col, row), 0-indexed.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for raw XML attribute values.
/// Letters must precede digits; anything else is rejected.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col - 1, row - 1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "A" ; "label column")]
    #[test_case(1, "B" ; "first period")]
    #[test_case(25, "Z" ; "last single letter")]
    #[test_case(26, "AA" ; "first pair")]
    #[test_case(52, "BA" ; "b prefix")]
    #[test_case(77, "BZ" ; "last period")]
    fn test_letter(offset: u32, expected: &str) {
        let table = ColumnTable::new();
        assert_eq!(table.letter(offset).unwrap(), expected);
    }

    #[test]
    fn test_letter_overflow() {
        let table = ColumnTable::new();
        assert_eq!(table.max_periods(), MAX_PERIODS);
        let err = table.letter(78).unwrap_err();
        assert!(matches!(
            err,
            CbqaError::ColumnOverflow {
                period: 78,
                max: 77
            }
        ));
    }

    #[test]
    fn test_table_agrees_with_col_to_letter() {
        let table = ColumnTable::new();
        for offset in 0..=MAX_PERIODS {
            assert_eq!(table.letter(offset).unwrap(), col_to_letter(offset));
        }
    }

    #[test]
    fn test_cell_display() {
        let table = ColumnTable::new();
        assert_eq!(table.cell(2, 12).unwrap().to_string(), "C12");
        assert_eq!(table.absolute_cell(1, 20).unwrap().to_string(), "$B$20");
    }

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(27), "AB");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("$B$10"), Some((1, 9)));
        assert_eq!(parse_cell_ref("bz3"), Some((77, 2)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("1A"), None);
        assert_eq!(parse_cell_ref("ABS"), None);
    }
}
