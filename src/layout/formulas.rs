use crate::cell_ref::CellRef;

/// Cost value of a cost variable without drivers.
pub const ZERO_COST_FORMULA: &str = "=0.0";

/// Sum over an empty member list.
pub const ZERO_SUM_FORMULA: &str = "=0";

/// Cost values are reported in billions.
const COST_SCALE: &str = "1e9";

/// Pathway and baseline cells of one driver at one period.
#[derive(Debug, Clone)]
pub struct DriverTerm {
    pub pathway: CellRef,
    pub baseline: CellRef,
}

/// Exponent of the annual change at period offset `period` (1-based).
///
/// The first two periods are a ramp with no compounding.
#[must_use]
pub fn ramp_exponent(period: u32) -> u32 {
    period.saturating_sub(2)
}

/// Per-period cost value:
/// `=(((pw-bl)*$B$cf*$D$cf^e)+...)/1e9`, or [`ZERO_COST_FORMULA`] without drivers.
#[must_use]
pub fn cost_value_formula(
    terms: &[DriverTerm],
    multiplier: &CellRef,
    annual_change: &CellRef,
    period: u32,
) -> String {
    if terms.is_empty() {
        return ZERO_COST_FORMULA.to_string();
    }
    let exponent = ramp_exponent(period);
    let summed = terms
        .iter()
        .map(|t| {
            format!(
                "(({}-{})*{multiplier}*{annual_change}^{exponent})",
                t.pathway, t.baseline
            )
        })
        .collect::<Vec<_>>()
        .join("+");
    format!("=({summed})/{COST_SCALE}")
}

/// `=A1+B2+...`, or [`ZERO_SUM_FORMULA`] when there is nothing to add.
#[must_use]
pub fn sum_formula(cells: &[CellRef]) -> String {
    if cells.is_empty() {
        return ZERO_SUM_FORMULA.to_string();
    }
    let joined = cells
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("+");
    format!("={joined}")
}

/// Cumulative value per thousand units of emission difference, sign-independent.
#[must_use]
pub fn marginal_effect_formula(cumulative: &CellRef, emission_diff: &CellRef) -> String {
    format!("=({cumulative}/ABS({emission_diff}))*1000")
}
