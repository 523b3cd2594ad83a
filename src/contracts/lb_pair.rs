// Liquidity Book pair: current active bin id.

use ethers::abi::ParamType;
use ethers::types::Address;

use super::{decode_static, token_to_uint, ViewCall};
use crate::chain_reader::ReadError;
use crate::types::conversions::u256_to_u32;

pub const GET_ACTIVE_ID: &str = "getActiveId()";

pub fn get_active_id(book: Address) -> ViewCall {
    ViewCall::new(book, GET_ACTIVE_ID)
}

/// `getActiveId() -> uint24`
pub fn decode_active_id(data: &[u8]) -> Result<u32, ReadError> {
    let tokens = decode_static(GET_ACTIVE_ID, &[ParamType::Uint(24)], data)?;
    Ok(u256_to_u32(token_to_uint(GET_ACTIVE_ID, &tokens[0])?)?)
}
