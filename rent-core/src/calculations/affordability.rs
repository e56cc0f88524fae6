//! Rent affordability calculation.
//!
//! Maps the four form inputs to the recommended rent and the budget left
//! over once rent, other expenses and debt payments are covered.
//!
//! | Field               | Formula                                              |
//! |---------------------|------------------------------------------------------|
//! | `max_rent`          | round(income × rent % ÷ 100), half away from zero    |
//! | `total_committed`   | `max_rent` + non-rent expenses + monthly debt        |
//! | `disposable_income` | income − `total_committed` (may be negative)         |
//! | `rent_to_income`    | the chosen rent percentage                           |
//!
//! An empty form (zero or negative income) produces an all-zero result
//! rather than an error.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rent_core::calculations::affordability::calculate;
//! use rent_core::{CalculatorInput, RentPercentage};
//!
//! let result = calculate(&CalculatorInput {
//!     monthly_income: dec!(5000),
//!     non_rent_expenses: dec!(1500),
//!     monthly_debt: dec!(0),
//!     rent_percentage: RentPercentage::new(30),
//! });
//!
//! assert_eq!(result.max_rent, dec!(1500));
//! assert_eq!(result.total_committed, dec!(3000));
//! assert_eq!(result.disposable_income, dec!(2000));
//! assert_eq!(result.rent_to_income_ratio, 30);
//! ```

use rust_decimal::Decimal;

use crate::calculations::common::round_whole_dollars;
use crate::models::{CalculatorInput, CalculatorResult, RentPercentage};

/// Computes the affordability figures for `input`.
///
/// Figures too large for `Decimal` are logged and yield the empty result.
pub fn calculate(input: &CalculatorInput) -> CalculatorResult {
    if input.monthly_income <= Decimal::ZERO {
        return CalculatorResult::default();
    }

    checked_figures(input).unwrap_or_else(|| {
        tracing::warn!(income = %input.monthly_income, "affordability figures overflowed");
        CalculatorResult::default()
    })
}

fn checked_figures(input: &CalculatorInput) -> Option<CalculatorResult> {
    let max_rent = max_rent(input.monthly_income, input.rent_percentage)?;
    let total_committed = max_rent
        .checked_add(input.non_rent_expenses)?
        .checked_add(input.monthly_debt)?;

    Some(CalculatorResult {
        max_rent,
        total_committed,
        disposable_income: input.monthly_income.checked_sub(total_committed)?,
        rent_to_income_ratio: input.rent_percentage.value(),
    })
}

/// Rent budget for `income` at `percentage`, in whole dollars. `None` on
/// overflow.
pub fn max_rent(income: Decimal, percentage: RentPercentage) -> Option<Decimal> {
    let share = income.checked_mul(percentage.as_decimal())?;
    Some(round_whole_dollars(share.checked_div(Decimal::ONE_HUNDRED)?))
}

/// Income left once expenses and debt are paid, before rent.
///
/// Shown next to the inputs as the ceiling any rent has to fit under.
pub fn income_before_rent(input: &CalculatorInput) -> Decimal {
    input
        .monthly_income
        .saturating_sub(input.non_rent_expenses)
        .saturating_sub(input.monthly_debt)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn input(income: Decimal, expenses: Decimal, debt: Decimal, pct: i64) -> CalculatorInput {
        CalculatorInput {
            monthly_income: income,
            non_rent_expenses: expenses,
            monthly_debt: debt,
            rent_percentage: RentPercentage::new(pct),
        }
    }

    fn assert_invariants(input: &CalculatorInput, result: &CalculatorResult) {
        assert_eq!(
            result.max_rent + input.non_rent_expenses + input.monthly_debt,
            result.total_committed
        );
        assert_eq!(
            input.monthly_income - result.total_committed,
            result.disposable_income
        );
    }

    #[test]
    fn comfortable_budget_at_thirty_percent() {
        let result = calculate(&input(dec!(5000), dec!(1500), dec!(0), 30));

        assert_eq!(
            result,
            CalculatorResult {
                max_rent: dec!(1500),
                total_committed: dec!(3000),
                disposable_income: dec!(2000),
                rent_to_income_ratio: 30,
            }
        );
    }

    #[test]
    fn over_committed_budget_goes_negative() {
        let result = calculate(&input(dec!(3000), dec!(1200), dec!(500), 45));

        assert_eq!(result.max_rent, dec!(1350));
        assert_eq!(result.total_committed, dec!(3050));
        assert_eq!(result.disposable_income, dec!(-50));
        assert!(result.is_over_committed());
    }

    #[test]
    fn zero_income_yields_all_zero_result() {
        let result = calculate(&input(dec!(0), dec!(1500), dec!(300), 45));

        assert_eq!(result, CalculatorResult::default());
        assert!(result.is_empty());
    }

    #[test]
    fn negative_income_yields_all_zero_result() {
        let result = calculate(&input(dec!(-2500), dec!(500), dec!(0), 30));

        assert_eq!(result, CalculatorResult::default());
    }

    #[test]
    fn oversized_income_yields_empty_result() {
        let income: Decimal = "9".repeat(28).parse().unwrap();

        assert_eq!(max_rent(income, RentPercentage::new(60)), None);
        assert_eq!(
            calculate(&input(income, dec!(0), dec!(0), 60)),
            CalculatorResult::default()
        );
    }

    #[test]
    fn oversized_expenses_yield_empty_result() {
        let expenses = Decimal::MAX;

        assert_eq!(
            calculate(&input(dec!(5000), expenses, dec!(1), 30)),
            CalculatorResult::default()
        );
    }

    #[test]
    fn max_rent_rounds_half_away_from_zero() {
        // 1001 * 50% = 500.5
        assert_eq!(max_rent(dec!(1001), RentPercentage::new(50)), Some(dec!(501)));
        // 999 * 15% = 149.85
        assert_eq!(max_rent(dec!(999), RentPercentage::new(15)), Some(dec!(150)));
        // 1003 * 10% = 100.3
        assert_eq!(max_rent(dec!(1003), RentPercentage::new(10)), Some(dec!(100)));
    }

    #[test]
    fn debt_counts_toward_committed_spending() {
        let without_debt = calculate(&input(dec!(4000), dec!(1000), dec!(0), 30));
        let with_debt = calculate(&input(dec!(4000), dec!(1000), dec!(400), 30));

        assert_eq!(
            without_debt.disposable_income - with_debt.disposable_income,
            dec!(400)
        );
    }

    #[test]
    fn invariants_hold_across_input_grid() {
        for income in [1, 999, 1001, 2500, 5000, 12345, 250000] {
            for expenses in [0, 1, 750, 4999] {
                for debt in [0, 333, 2000] {
                    for pct in [10, 25, 30, 31, 45, 60] {
                        let input = input(
                            Decimal::from(income),
                            Decimal::from(expenses),
                            Decimal::from(debt),
                            pct,
                        );
                        let result = calculate(&input);

                        assert_invariants(&input, &result);
                        assert_eq!(result.max_rent, result.max_rent.trunc());
                    }
                }
            }
        }
    }

    #[test]
    fn calculation_is_idempotent() {
        let input = input(dec!(6789), dec!(1234), dec!(321), 37);

        assert_eq!(calculate(&input), calculate(&input));
    }

    #[test]
    fn income_before_rent_subtracts_expenses_and_debt() {
        assert_eq!(
            income_before_rent(&input(dec!(5000), dec!(1500), dec!(500), 30)),
            dec!(3000)
        );
    }
}
