// Contracts Module - read-only view functions used by the range adapters
//
// Calls are encoded by hand (selector + no arguments) and decoded against an
// explicit output layout, so every decoder can check the returned shape
// before indexing into it.

pub mod cl_pool;
pub mod cl_strategy;
pub mod lb_pair;
pub mod range_vault;

use ethers::abi::{ParamType, Token};
use ethers::types::{Address, Bytes, I256, U256};

use crate::chain_reader::ReadError;

pub use cl_pool::{decode_slot0_v1, Slot0, SLOT0_LAYOUT_VERSION};

/// A single view call against a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewCall {
    /// Target contract address
    pub target: Address,
    /// Function signature, e.g. `getActiveId()`
    pub signature: &'static str,
    /// Encoded function call data
    pub call_data: Bytes,
}

impl ViewCall {
    /// Builds a call to an argument-less view function.
    pub fn new(target: Address, signature: &'static str) -> Self {
        let selector = ethers::utils::id(signature);
        Self {
            target,
            signature,
            call_data: Bytes::from(selector.to_vec()),
        }
    }
}

/// Decode `data` against a flat layout of static types.
///
/// Static ABI types each occupy one 32-byte word, so a well-formed response is
/// exactly `32 * layout.len()` bytes. Anything else is a shape mismatch.
pub(crate) fn decode_static(
    signature: &'static str,
    layout: &[ParamType],
    data: &[u8],
) -> Result<Vec<Token>, ReadError> {
    let expected = 32 * layout.len();
    if data.len() != expected {
        return Err(ReadError::ShapeMismatch {
            method: signature,
            expected_bytes: expected,
            actual_bytes: data.len(),
        });
    }
    let tokens = ethers::abi::decode(layout, data).map_err(|e| ReadError::Decode {
        method: signature,
        reason: e.to_string(),
    })?;
    if tokens.len() != layout.len() {
        return Err(ReadError::Decode {
            method: signature,
            reason: format!("expected {} values, decoded {}", layout.len(), tokens.len()),
        });
    }
    Ok(tokens)
}

pub(crate) fn token_to_uint(signature: &'static str, token: &Token) -> Result<U256, ReadError> {
    token.clone().into_uint().ok_or_else(|| ReadError::Decode {
        method: signature,
        reason: format!("expected uint, got {:?}", token),
    })
}

/// Signed ABI ints arrive as two's-complement raw `U256`.
pub(crate) fn token_to_int(signature: &'static str, token: &Token) -> Result<I256, ReadError> {
    token
        .clone()
        .into_int()
        .map(I256::from_raw)
        .ok_or_else(|| ReadError::Decode {
            method: signature,
            reason: format!("expected int, got {:?}", token),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_call_uses_four_byte_selector() {
        let call = ViewCall::new(Address::zero(), "slot0()");
        assert_eq!(call.call_data.as_ref(), &[0x38, 0x50, 0xc7, 0xbd]);
    }

    #[test]
    fn decode_static_rejects_short_payload() {
        let err = decode_static("getActiveId()", &[ParamType::Uint(24)], &[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            ReadError::ShapeMismatch { expected_bytes: 32, actual_bytes: 31, .. }
        ));
    }
}
