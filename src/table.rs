//! Period-indexed numeric tables.
//!
//! A [`Table`] is what upstream collaborators hand the layout engine: an
//! index of row labels (periods, or strategy names for summary data) and
//! named columns of `f64`. Column order is caller order and is preserved
//! everywhere, since it decides row order in the written blocks.

use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::{CbqaError, Result};

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Row-labelled table of numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    index: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Empty table with the given row labels.
    pub fn new<I, S>(name: impl Into<String>, index: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            name: name.into(),
            index: index.into_iter().map(|s| s.to_string()).collect(),
            columns: Vec::new(),
        }
    }

    /// Empty table indexed by a period range.
    pub fn for_periods(name: impl Into<String>, periods: RangeInclusive<i64>) -> Self {
        Self::new(name, periods)
    }

    /// Builder-style [`push_column`](Self::push_column).
    ///
    /// # Errors
    /// See [`push_column`](Self::push_column).
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<Self> {
        self.push_column(name, values)?;
        Ok(self)
    }

    /// Append a column, or replace an existing one of the same name in place.
    ///
    /// # Errors
    /// [`CbqaError::Parse`] when the value count differs from the row count.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<()> {
        let name = name.into();
        let values: Vec<f64> = values.into_iter().collect();
        if values.len() != self.index.len() {
            return Err(CbqaError::Parse(format!(
                "{}: column `{name}` has {} values for {} rows",
                self.name,
                values.len(),
                self.index.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Read a CSV file. `index_column` holds the row labels; every other
    /// column must be numeric.
    ///
    /// # Errors
    /// I/O and CSV errors, [`CbqaError::MissingColumn`] when `index_column`
    /// is absent, [`CbqaError::DuplicateColumn`] when two value columns share
    /// a header, [`CbqaError::Parse`] for non-numeric fields.
    pub fn from_csv_path(path: &Path, index_column: &str) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(path.display().to_string(), file, index_column)
    }

    /// Read CSV data from any reader. See [`from_csv_path`](Self::from_csv_path).
    ///
    /// # Errors
    /// See [`from_csv_path`](Self::from_csv_path).
    pub fn from_csv_reader<R: Read>(
        name: impl Into<String>,
        reader: R,
        index_column: &str,
    ) -> Result<Self> {
        let name = name.into();
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let index_pos = headers
            .iter()
            .position(|h| h == index_column)
            .ok_or_else(|| CbqaError::MissingColumn {
                table: name.clone(),
                column: index_column.to_string(),
            })?;
        let value_columns: Vec<(usize, &str)> = headers
            .iter()
            .enumerate()
            .filter(|&(pos, _)| pos != index_pos)
            .collect();
        // row positions are registered by name, so names must be unique
        for (i, &(_, column)) in value_columns.iter().enumerate() {
            if value_columns.iter().take(i).any(|&(_, seen)| seen == column) {
                return Err(CbqaError::DuplicateColumn {
                    table: name,
                    column: column.to_string(),
                });
            }
        }

        let mut index = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); value_columns.len()];

        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            index.push(record.get(index_pos).unwrap_or_default().to_string());
            for (slot, &(pos, column)) in values.iter_mut().zip(&value_columns) {
                let raw = record.get(pos).unwrap_or_default();
                let value = raw.parse::<f64>().map_err(|_| {
                    // +2: header line, 1-based line numbers
                    CbqaError::Parse(format!(
                        "{name}: line {} column `{column}`: `{raw}` is not a number",
                        line + 2
                    ))
                })?;
                slot.push(value);
            }
        }

        let columns = value_columns
            .iter()
            .zip(values)
            .map(|(&(_, column), values)| Column {
                name: column.to_string(),
                values,
            })
            .collect();

        Ok(Self {
            name,
            index,
            columns,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row labels.
    #[must_use]
    pub fn index(&self) -> &[String] {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Number of columns; a written block has one row per column.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Value at a row label and column.
    #[must_use]
    pub fn value(&self, label: &str, column: &str) -> Option<f64> {
        let row = self.index.iter().position(|l| l == label)?;
        self.column(column)?.get(row).copied()
    }

    /// Fail on the first name in `names` that is not a column.
    ///
    /// # Errors
    /// [`CbqaError::MissingColumn`].
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        match names.iter().find(|n| self.column(n.as_ref()).is_none()) {
            Some(missing) => Err(self.missing_column(missing.as_ref())),
            None => Ok(()),
        }
    }

    /// Table with exactly `names`, in that order.
    ///
    /// # Errors
    /// [`CbqaError::MissingColumn`].
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|n| {
                let name = n.as_ref();
                self.columns
                    .iter()
                    .find(|c| c.name == name)
                    .cloned()
                    .ok_or_else(|| self.missing_column(name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: self.name.clone(),
            index: self.index.clone(),
            columns,
        })
    }

    /// Table with one row per period of `time_init..=time_end`, in period order.
    ///
    /// Index labels are read as integers (`7` or `7.0`); rows outside the
    /// range are dropped.
    ///
    /// # Errors
    /// [`CbqaError::MissingPeriod`] for the first period with no row.
    pub fn select_periods(&self, time_init: i64, time_end: i64) -> Result<Self> {
        let labelled: Vec<Option<i64>> = self.index.iter().map(|l| parse_period(l)).collect();
        let rows = (time_init..=time_end)
            .map(|period| {
                labelled
                    .iter()
                    .position(|&p| p == Some(period))
                    .ok_or_else(|| CbqaError::MissingPeriod {
                        table: self.name.clone(),
                        period,
                    })
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(self.take_rows(&rows))
    }

    /// Single-row table for the row labelled `label`.
    ///
    /// # Errors
    /// [`CbqaError::MissingRow`].
    pub fn row(&self, label: &str) -> Result<Self> {
        let row = self
            .index
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| CbqaError::MissingRow {
                table: self.name.clone(),
                label: label.to_string(),
            })?;
        Ok(self.take_rows(&[row]))
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            index: rows
                .iter()
                .filter_map(|&r| self.index.get(r).cloned())
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: rows.iter().filter_map(|&r| c.values.get(r).copied()).collect(),
                })
                .collect(),
        }
    }

    fn missing_column(&self, column: &str) -> CbqaError {
        CbqaError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }
}

fn parse_period(label: &str) -> Option<i64> {
    let label = label.trim();
    label.strip_suffix(".0").unwrap_or(label).parse().ok()
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

    const CSV: &str = "time_period,x,y\n2,20,200\n0,0,0\n1.0,10,100\n";

    fn table() -> Table {
        Table::from_csv_reader("baseline.csv", CSV.as_bytes(), "time_period").unwrap()
    }

    #[test]
    fn test_from_csv() {
        let t = table();
        assert_eq!(t.width(), 2);
        assert_eq!(t.len(), 3);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(t.column("y").unwrap(), &[200.0, 0.0, 100.0]);
        assert_eq!(t.value("1.0", "x"), Some(10.0));
    }

    #[test]
    fn test_missing_index_column() {
        let err = Table::from_csv_reader("t.csv", CSV.as_bytes(), "year").unwrap_err();
        assert!(matches!(err, CbqaError::MissingColumn { column, .. } if column == "year"));
    }

    #[test]
    fn test_non_numeric_field_names_line() {
        let data = "time_period,x\n0,1\n1,n/a\n";
        let err = Table::from_csv_reader("t.csv", data.as_bytes(), "time_period").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("`x`"), "{msg}");
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let data = "time_period,x,x\n1,10,100\n";
        let err = Table::from_csv_reader("baseline.csv", data.as_bytes(), "time_period").unwrap_err();
        assert!(matches!(err, CbqaError::DuplicateColumn { column, .. } if column == "x"));
    }

    #[test]
    fn test_push_column_replaces_same_name() {
        let mut t = Table::for_periods("t", 1..=2).with_column("x", [1.0, 2.0]).unwrap();
        t.push_column("x", [3.0, 4.0]).unwrap();
        assert_eq!(t.width(), 1);
        assert_eq!(t.column("x").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_select_periods_reorders() {
        let t = table().select_periods(0, 2).unwrap();
        assert_eq!(t.index(), &["0", "1.0", "2"]);
        assert_eq!(t.column("x").unwrap(), &[0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_select_periods_missing_year() {
        let err = table().select_periods(1, 3).unwrap_err();
        assert!(matches!(err, CbqaError::MissingPeriod { period: 3, .. }));
    }

    #[test]
    fn test_select_columns_and_require() {
        let t = table();
        let picked = t.select_columns(&["y", "x"]).unwrap();
        assert_eq!(picked.column_names().collect::<Vec<_>>(), vec!["y", "x"]);
        assert!(t.require_columns(&["x"]).is_ok());
        let err = t.require_columns(&["x", "z"]).unwrap_err();
        assert!(matches!(err, CbqaError::MissingColumn { column, .. } if column == "z"));
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let err = Table::for_periods("t", 1..=3)
            .with_column("x", [1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, CbqaError::Parse(_)));
    }

    #[test]
    fn test_row() {
        let t = Table::new("totals", ["M8_EC", "LNDU"])
            .with_column("fuel_cost", [1.5, 2.5])
            .unwrap();
        let r = t.row("LNDU").unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.column("fuel_cost").unwrap(), &[2.5]);
        assert!(matches!(t.row("X"), Err(CbqaError::MissingRow { .. })));
    }
}
