use std::collections::HashMap;
use std::fmt;

use super::RowHandle;
use crate::error::{CbqaError, Result};

/// What a registered row holds.
///
/// A cost variable owns both a cost-factor row and a cost-value row under the
/// same name, so every lookup says which one it wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKind {
    /// Baseline series (driver variables and other baseline columns).
    Series,
    CostFactor,
    CostValue,
    /// Aggregated category, per-period row.
    Category,
    /// Aggregated category, cumulative row.
    Cumulative,
    EmissionDiff,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Series => "baseline series",
            Self::CostFactor => "cost factor",
            Self::CostValue => "cost value",
            Self::Category => "aggregated category",
            Self::Cumulative => "cumulative category",
            Self::EmissionDiff => "emission difference",
        };
        f.write_str(s)
    }
}

/// Name → row mapping for the sheet being built.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    rows: HashMap<RowKind, HashMap<String, RowHandle>>,
}

impl PositionIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. A later registration of the same name and kind wins.
    pub fn register(&mut self, kind: RowKind, name: impl Into<String>, handle: RowHandle) {
        self.rows
            .entry(kind)
            .or_default()
            .insert(name.into(), handle);
    }

    #[must_use]
    pub fn get(&self, kind: RowKind, name: &str) -> Option<RowHandle> {
        self.rows.get(&kind)?.get(name).copied()
    }

    /// Row of `name`, or the error naming it.
    ///
    /// # Errors
    /// [`CbqaError::UnregisteredVariable`].
    pub fn require(&self, kind: RowKind, name: &str) -> Result<RowHandle> {
        self.get(kind, name)
            .ok_or_else(|| CbqaError::unregistered(kind, name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
