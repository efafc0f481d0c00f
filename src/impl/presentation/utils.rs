use iso_currency::Currency;
use num_format::{Locale, ToFormattedString as _};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::domain::logic::utils::round_half_up;

/// Standard number decimal places for the given currency
/// (ex. JPY = 0, USD = 2).
pub(crate) fn decimal_places(currency: Currency) -> usize {
    currency.exponent().unwrap_or(0) as usize
}

/// Format cash amount with currency symbol, correct number of decimal places
/// and thousands separators.
///
/// For consistency, uses en locale ('.' as decimal mark, i.e. 1,000.00)
/// regardless of user's locale or currency.
pub(crate) fn format_amount(amount: Decimal, currency: Currency) -> String {
    format!(
        "{} {}",
        format_number(amount, decimal_places(currency)),
        currency.symbol()
    )
}

/// Rounds half-up to `decimal_places` and formats with thousands separators.
pub(crate) fn format_number(value: Decimal, decimal_places: usize) -> String {
    let rounded = round_half_up(value, decimal_places as u32);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = rounded.abs();
    let integer_part = abs
        .trunc()
        .to_u128()
        .unwrap_or_default()
        .to_formatted_string(&Locale::en);
    if decimal_places == 0 {
        return format!("{sign}{integer_part}");
    }
    let fractional_part = (abs.fract() * Decimal::from(10u64.pow(decimal_places as u32)))
        .trunc()
        .to_u128()
        .unwrap_or_default();
    format!("{sign}{integer_part}.{fractional_part:0decimal_places$}")
}
