//! Shared helpers for the affordability calculations.
//!
//! Rounding, input sanitising and currency formatting live here so every
//! calculation treats money the same way.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a value to whole dollars, with midpoints rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rent_core::calculations::common::round_whole_dollars;
///
/// assert_eq!(round_whole_dollars(dec!(1349.49)), dec!(1349));
/// assert_eq!(round_whole_dollars(dec!(1349.5)), dec!(1350));
/// assert_eq!(round_whole_dollars(dec!(-2.5)), dec!(-3));
/// ```
pub fn round_whole_dollars(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Strips everything but ASCII digits from typed input.
///
/// `"$5,000"` becomes `"5000"`; `"-12.50"` becomes `"1250"`, matching the
/// digits-only behaviour of the form fields.
pub fn sanitize_amount(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Most significant digits a monthly amount may have. Anything longer would
/// overflow once multiplied through the budget figures.
pub const MAX_AMOUNT_DIGITS: usize = 15;

/// Parses form text into a whole-dollar amount.
///
/// Non-digits are stripped first. Empty input is zero. Input longer than
/// [`MAX_AMOUNT_DIGITS`] significant digits is logged and treated as zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let digits = sanitize_amount(raw);
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Decimal::ZERO;
    }
    if significant.len() > MAX_AMOUNT_DIGITS {
        tracing::warn!(input = %raw, "amount exceeds {} digits; treating as zero", MAX_AMOUNT_DIGITS);
        return Decimal::ZERO;
    }
    significant.parse().unwrap_or_else(|e| {
        tracing::warn!(input = %raw, "unrepresentable amount: {}", e);
        Decimal::ZERO
    })
}

/// Formats a whole-dollar amount with US thousands separators, e.g. `12,345`.
///
/// Negative values keep their sign (`-1,050`); callers that show a deficit
/// as a positive figure pass `value.abs()`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_whole_dollars(value);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Share of `total` taken by `part`, as a percentage with one decimal place.
/// Zero when `total` is not positive.
pub fn percent_of(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part * Decimal::ONE_HUNDRED / total)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
