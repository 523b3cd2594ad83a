// src/normalization.rs
//
// Decimal normalization for raw token amounts and width normalization for
// range positions coming from different protocol families.

use ethers::types::{I256, U256};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::conversions::{i256_to_i128, u256_to_decimal, ConversionError};

/// Helper: 10^n as u128, returns None beyond what `Decimal` can represent (n > 27)
#[inline]
pub fn pow10_u128(n: u8) -> Option<u128> {
    if n > 27 {
        return None;
    }
    10u128.checked_pow(n as u32)
}

/// Normalize a base-unit amount (U256) into a human-scale Decimal using token decimals.
/// Returns None when the amount or scale does not fit a Decimal.
pub fn normalize_amount(amount: U256, decimals: u8) -> Option<Decimal> {
    u256_to_decimal(amount, decimals).ok()
}

/// Round a USD value to cents, midpoint away from zero.
pub fn round_usd(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A range position as one protocol family encodes it.
///
/// Liquidity Book reports unsigned 24-bit bin ids, concentrated-liquidity pools
/// report signed 24-bit ticks, and some ABIs widen either to 256 bits. Everything
/// is compared as `i128` once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionValue {
    Unsigned24(u32),
    Signed24(i32),
    Signed256(I256),
}

impl PositionValue {
    pub fn to_i128(self) -> Result<i128, ConversionError> {
        match self {
            PositionValue::Unsigned24(v) => Ok(v as i128),
            PositionValue::Signed24(v) => Ok(v as i128),
            PositionValue::Signed256(v) => i256_to_i128(v),
        }
    }
}

impl From<u32> for PositionValue {
    fn from(v: u32) -> Self {
        PositionValue::Unsigned24(v)
    }
}

impl From<i32> for PositionValue {
    fn from(v: i32) -> Self {
        PositionValue::Signed24(v)
    }
}

impl From<I256> for PositionValue {
    fn from(v: I256) -> Self {
        PositionValue::Signed256(v)
    }
}
