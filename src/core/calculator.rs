//! Gold price derivation
//!
//! The metal API quotes how many troy ounces one USD buys. The price of a
//! gram in the target currency is therefore
//! `(1 / units_per_base) * exchange_rate / 31.1035`, quantized to `0.0001`.

use super::error::DivisionError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Grams in one troy ounce (31.1035).
pub const TROY_OUNCE_GRAMS: Decimal = Decimal::from_parts(311_035, 0, 0, false, 4);

/// Fractional digits kept on a derived gold price.
pub const PRICE_SCALE: u32 = 4;

/// Converts a base to target exchange rate and a metal-per-base rate into the
/// price of one gram of metal in the target currency.
///
/// Intermediate values keep the full 28 digit precision of [`Decimal`]; only
/// the final value is rounded, half away from zero, to [`PRICE_SCALE`] digits.
pub fn compute_price_per_gram(
    exchange_rate: Decimal,
    metal_units_per_base: Decimal,
) -> Result<Decimal, DivisionError> {
    if metal_units_per_base <= Decimal::ZERO {
        return Err(DivisionError::NonPositiveMetalRate(metal_units_per_base));
    }

    let ounce_in_base = Decimal::ONE
        .checked_div(metal_units_per_base)
        .ok_or(DivisionError::Overflow)?;
    let ounce_in_target = ounce_in_base
        .checked_mul(exchange_rate)
        .ok_or(DivisionError::Overflow)?;
    let gram_in_target = ounce_in_target
        .checked_div(TROY_OUNCE_GRAMS)
        .ok_or(DivisionError::Overflow)?;

    let mut price =
        gram_in_target.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // pad e.g. `1` to `1.0000` so the stored value always carries 4 digits
    price.rescale(PRICE_SCALE);
    Ok(price)
}
