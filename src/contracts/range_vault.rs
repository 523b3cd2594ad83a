// Vault-side views: balances (both families) and the LB bin range.

use ethers::abi::ParamType;
use ethers::types::{Address, U256};

use super::{decode_static, token_to_uint, ViewCall};
use crate::chain_reader::ReadError;
use crate::types::conversions::u256_to_u32;

pub const GET_BALANCES: &str = "getBalances()";
pub const GET_RANGE: &str = "getRange()";

pub fn get_balances(vault: Address) -> ViewCall {
    ViewCall::new(vault, GET_BALANCES)
}

pub fn get_range(vault: Address) -> ViewCall {
    ViewCall::new(vault, GET_RANGE)
}

/// `getBalances() -> (uint256 amountX, uint256 amountY)`
pub fn decode_balances(data: &[u8]) -> Result<(U256, U256), ReadError> {
    let tokens = decode_static(
        GET_BALANCES,
        &[ParamType::Uint(256), ParamType::Uint(256)],
        data,
    )?;
    Ok((
        token_to_uint(GET_BALANCES, &tokens[0])?,
        token_to_uint(GET_BALANCES, &tokens[1])?,
    ))
}

/// `getRange() -> (uint24 low, uint24 upper)` on Liquidity Book vaults
pub fn decode_bin_range(data: &[u8]) -> Result<(u32, u32), ReadError> {
    let tokens = decode_static(GET_RANGE, &[ParamType::Uint(24), ParamType::Uint(24)], data)?;
    let lower = u256_to_u32(token_to_uint(GET_RANGE, &tokens[0])?)?;
    let upper = u256_to_u32(token_to_uint(GET_RANGE, &tokens[1])?)?;
    Ok((lower, upper))
}
