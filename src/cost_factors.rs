//! Cost factors: one multiplier and annual change per cost variable.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Scaling applied to a cost variable's driver differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostFactor {
    /// Cost variable name (`cb:sector:type:item_1:item_2`).
    pub variable: String,
    pub multiplier: f64,
    pub multiplier_unit: String,
    /// Compounding factor applied per period after the ramp.
    pub annual_change: f64,
}

/// Ordered cost factors, one per cost variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostFactorTable {
    factors: Vec<CostFactor>,
}

impl CostFactorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the factor for `factor.variable`.
    pub fn insert(&mut self, factor: CostFactor) {
        match self
            .factors
            .iter_mut()
            .find(|f| f.variable == factor.variable)
        {
            Some(existing) => *existing = factor,
            None => self.factors.push(factor),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(
        mut self,
        variable: impl Into<String>,
        multiplier: f64,
        multiplier_unit: impl Into<String>,
        annual_change: f64,
    ) -> Self {
        self.insert(CostFactor {
            variable: variable.into(),
            multiplier,
            multiplier_unit: multiplier_unit.into(),
            annual_change,
        });
        self
    }

    /// Read `variable,multiplier,multiplier_unit,annual_change` rows.
    ///
    /// # Errors
    /// I/O and CSV (including deserialization) errors.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Self::from_csv_reader(File::open(path)?)
    }

    /// See [`from_csv_path`](Self::from_csv_path).
    ///
    /// # Errors
    /// CSV (including deserialization) errors.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::new();
        for factor in rdr.deserialize::<CostFactor>() {
            table.insert(factor?);
        }
        Ok(table)
    }

    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&CostFactor> {
        self.factors.iter().find(|f| f.variable == variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CostFactor> {
        self.factors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv() {
        let data = "variable,multiplier,multiplier_unit,annual_change\n\
                    cb:trns:fuel_cost:x:y, 2.5 ,USD/PJ,1.01\n\
                    cb:agrc:crop_value:a:b,-3,USD/t,1\n";
        let table = CostFactorTable::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let f = table.get("cb:trns:fuel_cost:x:y").unwrap();
        assert_eq!(f.multiplier, 2.5);
        assert_eq!(f.multiplier_unit, "USD/PJ");
        assert_eq!(f.annual_change, 1.01);
        assert_eq!(
            table.iter().map(|f| f.variable.as_str()).collect::<Vec<_>>(),
            vec!["cb:trns:fuel_cost:x:y", "cb:agrc:crop_value:a:b"]
        );
    }

    #[test]
    fn test_bad_number_is_csv_error() {
        let data = "variable,multiplier,multiplier_unit,annual_change\ncb:x,abc,u,1\n";
        let err = CostFactorTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, crate::error::CbqaError::Csv(_)));
    }

    #[test]
    fn test_insert_replaces() {
        let table = CostFactorTable::new()
            .with("cb:x", 1.0, "u", 1.0)
            .with("cb:x", 4.0, "u", 1.5);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("cb:x").unwrap().multiplier, 4.0);
    }
}
