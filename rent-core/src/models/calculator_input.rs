use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Share of monthly income the user is willing to put toward rent.
///
/// Always within `[RentPercentage::MIN, RentPercentage::MAX]`; out-of-range
/// values are clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct RentPercentage(u8);

impl RentPercentage {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 60;
    pub const DEFAULT: u8 = 30;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl Default for RentPercentage {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<i64> for RentPercentage {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<RentPercentage> for u8 {
    fn from(value: RentPercentage) -> Self {
        value.0
    }
}

impl std::fmt::Display for RentPercentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Numeric inputs to the affordability calculation.
///
/// Money values are whole dollars parsed from sanitised form text, so they
/// are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalculatorInput {
    pub monthly_income: Decimal,
    pub non_rent_expenses: Decimal,
    pub monthly_debt: Decimal,
    pub rent_percentage: RentPercentage,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rent_percentage_defaults_to_thirty() {
        assert_eq!(RentPercentage::default().value(), 30);
    }

    #[test]
    fn rent_percentage_clamps_into_slider_range() {
        assert_eq!(RentPercentage::new(5).value(), 10);
        assert_eq!(RentPercentage::new(75).value(), 60);
        assert_eq!(RentPercentage::new(-3).value(), 10);
        assert_eq!(RentPercentage::new(45).value(), 45);
    }

    #[test]
    fn rent_percentage_deserialization_clamps() {
        let pct: RentPercentage = serde_json::from_str("90").unwrap();

        assert_eq!(pct.value(), 60);
    }

    #[test]
    fn rent_percentage_displays_with_percent_sign() {
        assert_eq!(RentPercentage::new(35).to_string(), "35%");
    }
}
