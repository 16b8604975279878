//! Common helpers shared by the pricing engine and display code.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 round away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use quote_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    round_dp(value, 2)
}

/// Half-up rounding to an arbitrary number of decimal places.
pub fn round_dp(
    value: Decimal,
    dp: u32,
) -> Decimal {
    value.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Parses a form field into a number.
///
/// Whitespace is trimmed and commas (thousands separators) are removed.
/// Empty or non-numeric input is zero; this never fails, matching how a
/// half-typed number field behaves while the user is still editing.
pub fn parse_amount(s: &str) -> Decimal {
    let normalized = s.trim().replace(',', "");
    if normalized.is_empty() {
        return Decimal::ZERO;
    }
    normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .unwrap_or(Decimal::ZERO)
}

/// Formats a money value as pounds with two decimals, e.g. `£1234.50`.
pub fn format_money(value: Decimal) -> String {
    format!("£{:.2}", round_half_up(value))
}

/// Formats a value with a fixed number of decimals.
pub fn format_fixed(
    value: Decimal,
    dp: u32,
) -> String {
    format!("{:.*}", dp as usize, round_dp(value, dp))
}
