//! Layout bookkeeping for formula worksheets.
//!
//! This module handles:
//! - The row cursor that places stacked blocks with a blank separator row
//! - Position indices mapping variable names to the rows holding them
//! - Row handles and period-addressed cell references built from them
//! - The formula text for cost values, sums and marginal effects

mod formulas;
mod index;
mod sheet_layout;

pub use formulas::{
    cost_value_formula, marginal_effect_formula, ramp_exponent, sum_formula, DriverTerm,
    ZERO_COST_FORMULA, ZERO_SUM_FORMULA,
};
pub use index::{PositionIndex, RowKind};
pub use sheet_layout::{formula_ref, RowHandle, SheetLayout, BLOCK_GAP};
