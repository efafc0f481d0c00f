use fractic_server_error::ServerError;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::GenericCalculationFailure;

/// Guarded `numerator * multiplier / divisor`, rounded half-up to
/// `precision` decimal places.
///
/// - absent numerator: `ONE`
/// - zero or absent divisor: the division step is skipped
/// - absent multiplier: the multiplication step is skipped
///
/// Multiplication happens before division to keep exact results exact
/// (ex. 700 * 1000 / 3500 = 200).
pub fn scaled_ratio(
    numerator: Option<Decimal>,
    divisor: Option<Decimal>,
    multiplier: Option<Decimal>,
    precision: u32,
    context: &str,
) -> Result<Decimal, ServerError> {
    let Some(numerator) = numerator else {
        return Ok(Decimal::ONE);
    };
    let scaled = match multiplier {
        Some(m) => numerator
            .checked_mul(m)
            .ok_or_else(|| GenericCalculationFailure::new(context, "multiplication overflow"))?,
        None => numerator,
    };
    let divided = match divisor {
        Some(d) if !d.is_zero() => scaled
            .checked_div(d)
            .ok_or_else(|| GenericCalculationFailure::new(context, "division overflow"))?,
        _ => scaled,
    };
    Ok(round_half_up(divided, precision))
}

pub fn round_half_up(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn checked_sum<I>(values: I, context: &str) -> Result<Decimal, ServerError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| GenericCalculationFailure::new(context, "addition overflow"))
    })
}

pub(crate) fn checked_sub(lhs: Decimal, rhs: Decimal, context: &str) -> Result<Decimal, ServerError> {
    lhs.checked_sub(rhs)
        .ok_or_else(|| GenericCalculationFailure::new(context, "subtraction overflow"))
}
