// TVL Calculator
//
// Token X is valued at the live USD price, token Y is a stable pinned at $1.00.
// This holds only for the stable-paired vaults currently supported; other
// pairs need a second price source.

use log::warn;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::normalization::{normalize_amount, round_usd};
use crate::types::{BalancePair, PricePoint};

/// USD value of the pinned stable token.
pub const STABLE_USD: Decimal = Decimal::ONE;

/// USD total value of a vault's balances, rounded to cents.
///
/// Returns 0 when balances or price are unavailable, and when the price is 0
/// or cannot be represented.
pub fn calculate(
    balances: Option<&BalancePair>,
    decimals_x: u8,
    decimals_y: u8,
    price: Option<&PricePoint>,
) -> f64 {
    let (Some(balances), Some(price)) = (balances, price) else {
        return 0.0;
    };
    if !(price.value_usd > 0.0) {
        return 0.0;
    }
    let Some(price_usd) = Decimal::from_f64(price.value_usd) else {
        warn!("Price {} is not representable as a decimal", price.value_usd);
        return 0.0;
    };

    let (Some(amount_x), Some(amount_y)) = (
        normalize_amount(balances.amount_x, decimals_x),
        normalize_amount(balances.amount_y, decimals_y),
    ) else {
        warn!(
            "Balances ({}, {}) out of decimal range for decimals ({}, {})",
            balances.amount_x, balances.amount_y, decimals_x, decimals_y
        );
        return 0.0;
    };

    let total = amount_x
        .checked_mul(price_usd)
        .and_then(|x| x.checked_add(amount_y * STABLE_USD));
    match total {
        Some(total) => round_usd(total).to_f64().unwrap_or(0.0),
        None => {
            warn!("TVL overflowed decimal range");
            0.0
        }
    }
}
