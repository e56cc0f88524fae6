use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived affordability figures for one [`CalculatorInput`](super::CalculatorInput).
///
/// Never stored; always recomputed from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalculatorResult {
    /// Recommended rent, `monthly_income * rent_percentage / 100` rounded to whole dollars.
    pub max_rent: Decimal,

    /// Rent plus other expenses plus debt payments.
    pub total_committed: Decimal,

    /// Income left after everything committed. Negative when over budget.
    pub disposable_income: Decimal,

    /// Rent percentage the result was computed with, or 0 for an empty form.
    pub rent_to_income_ratio: u8,
}

impl CalculatorResult {
    /// True for the all-zero result produced by an empty form.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_over_committed(&self) -> bool {
        self.disposable_income < Decimal::ZERO
    }
}
