use ethers::types::{Address, I256, U256};
use rust_decimal::Decimal;
use std::str::FromStr;

// Raw on-chain amount -> human-scale Decimal.
// Integer and fractional parts are split before conversion, so only the
// whole-token amount has to fit a Decimal, not the raw base-unit count.
pub fn u256_to_decimal(value: U256, decimals: u8) -> Result<Decimal, ConversionError> {
    let divisor = crate::normalization::pow10_u128(decimals).ok_or(ConversionError::Overflow)?;
    let (whole, fraction) = value.div_mod(U256::from(divisor));

    let whole = u256_to_i128(whole)?;
    let fraction = u256_to_i128(fraction)?;
    let whole = Decimal::try_from_i128_with_scale(whole, 0)
        .map_err(|e| ConversionError::InvalidDecimal(e.to_string()))?;
    let fraction = Decimal::try_from_i128_with_scale(fraction, decimals as u32)
        .map_err(|e| ConversionError::InvalidDecimal(e.to_string()))?;
    whole.checked_add(fraction).ok_or(ConversionError::Overflow)
}

fn u256_to_i128(value: U256) -> Result<i128, ConversionError> {
    if value > U256::from(i128::MAX as u128) {
        return Err(ConversionError::Overflow);
    }
    Ok(value.as_u128() as i128)
}

// int24 ticks come back from the ABI decoder as I256
pub fn i256_to_i128(value: I256) -> Result<i128, ConversionError> {
    i128::try_from(value).map_err(|_| ConversionError::Overflow)
}

// uint24 ids / bounds come back as U256
pub fn u256_to_u32(value: U256) -> Result<u32, ConversionError> {
    if value > U256::from(u32::MAX) {
        return Err(ConversionError::Overflow);
    }
    Ok(value.as_u32())
}

/// Lowercased `0x`-prefixed hex, the form used in cache keys.
pub fn address_to_string(addr: Address) -> String {
    format!("{:?}", addr).to_lowercase()
}

pub fn string_to_address(s: &str) -> Result<Address, ConversionError> {
    Address::from_str(s.trim()).map_err(|e| ConversionError::InvalidAddress(e.to_string()))
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConversionError {
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
    #[error("Overflow in conversion")]
    Overflow,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_strings_are_lowercase() {
        let addr = string_to_address("0xAf88d065e77c8cC2239327C5EDb3A432268e5831").unwrap();
        assert_eq!(
            address_to_string(addr),
            "0xaf88d065e77c8cc2239327c5edb3a432268e5831"
        );
    }

    #[test]
    fn rejects_garbage_address() {
        assert!(matches!(
            string_to_address("not-an-address"),
            Err(ConversionError::InvalidAddress(_))
        ));
    }

    #[test]
    fn negative_ticks_survive_conversion() {
        assert_eq!(i256_to_i128(I256::from(-887_272i64)).unwrap(), -887_272);
    }

    #[test]
    fn u32_overflow_is_reported() {
        assert_eq!(u256_to_u32(U256::from(8_388_608u64)).unwrap(), 8_388_608);
        assert_eq!(
            u256_to_u32(U256::from(u64::MAX)),
            Err(ConversionError::Overflow)
        );
    }

    #[test]
    fn large_raw_amounts_convert_by_whole_tokens() {
        // 1e29 base units at 18 decimals is 1e11 tokens
        let raw = U256::exp10(29);
        assert_eq!(u256_to_decimal(raw, 18).unwrap(), Decimal::from(100_000_000_000u64));

        let with_fraction = U256::exp10(29) + U256::from(5u64) * U256::exp10(17);
        assert_eq!(
            u256_to_decimal(with_fraction, 18).unwrap(),
            Decimal::from_str("100000000000.5").unwrap()
        );
    }

    #[test]
    fn amounts_beyond_decimal_range_overflow() {
        assert!(u256_to_decimal(U256::MAX, 0).is_err());
        assert_eq!(u256_to_decimal(U256::one(), 28), Err(ConversionError::Overflow));
    }
}
