// Concentrated-liquidity strategy: deployed tick range.

use ethers::abi::ParamType;
use ethers::types::Address;

use super::{decode_static, token_to_int, ViewCall};
use crate::chain_reader::ReadError;
use crate::types::conversions::{i256_to_i128, ConversionError};

pub const GET_RANGE: &str = "getRange()";

pub fn get_range(strategy: Address) -> ViewCall {
    ViewCall::new(strategy, GET_RANGE)
}

/// `getRange() -> (int24 tickLower, int24 tickUpper)`
pub fn decode_tick_range(data: &[u8]) -> Result<(i32, i32), ReadError> {
    let tokens = decode_static(GET_RANGE, &[ParamType::Int(24), ParamType::Int(24)], data)?;
    let lower = to_i32(i256_to_i128(token_to_int(GET_RANGE, &tokens[0])?)?)?;
    let upper = to_i32(i256_to_i128(token_to_int(GET_RANGE, &tokens[1])?)?)?;
    Ok((lower, upper))
}

fn to_i32(v: i128) -> Result<i32, ConversionError> {
    i32::try_from(v).map_err(|_| ConversionError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::{encode, Token};
    use ethers::types::I256;

    #[test]
    fn negative_tick_range_decodes() {
        let data = encode(&[
            Token::Int(I256::from(-600i64).into_raw()),
            Token::Int(I256::from(-60i64).into_raw()),
        ]);
        assert_eq!(decode_tick_range(&data).unwrap(), (-600, -60));
    }
}
