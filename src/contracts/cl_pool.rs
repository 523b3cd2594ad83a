// Concentrated-liquidity pool: slot0 decoding.
//
// slot0() layout v1:
//   (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex,
//    uint16 observationCardinality, uint16 observationCardinalityNext,
//    uint8 feeProtocol, bool unlocked)
//
// The active tick is the value at index 1. A pool that returns any other shape
// is rejected rather than read positionally.

use ethers::abi::{ParamType, Token};
use ethers::types::{Address, U256};

use super::{decode_static, token_to_int, token_to_uint, ViewCall};
use crate::chain_reader::ReadError;
use crate::types::conversions::{i256_to_i128, ConversionError};

pub const SLOT0: &str = "slot0()";
pub const SLOT0_LAYOUT_VERSION: u8 = 1;

/// Position of the active tick inside the v1 slot0 tuple.
const TICK_INDEX: usize = 1;

pub fn slot0(pool: Address) -> ViewCall {
    ViewCall::new(pool, SLOT0)
}

fn slot0_v1_layout() -> Vec<ParamType> {
    vec![
        ParamType::Uint(160),
        ParamType::Int(24),
        ParamType::Uint(16),
        ParamType::Uint(16),
        ParamType::Uint(16),
        ParamType::Uint(8),
        ParamType::Bool,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub observation_index: u16,
    pub observation_cardinality: u16,
    pub observation_cardinality_next: u16,
    pub fee_protocol: u8,
    pub unlocked: bool,
}

/// Decode a `slot0()` response against layout v1.
pub fn decode_slot0_v1(data: &[u8]) -> Result<Slot0, ReadError> {
    let tokens = decode_static(SLOT0, &slot0_v1_layout(), data)?;

    let tick = i256_to_i128(token_to_int(SLOT0, &tokens[TICK_INDEX])?)?;
    let tick = i32::try_from(tick).map_err(|_| ConversionError::Overflow)?;

    let small = |i: usize| -> Result<u16, ReadError> {
        let v = token_to_uint(SLOT0, &tokens[i])?;
        u16::try_from(v.low_u64()).map_err(|_| ReadError::from(ConversionError::Overflow))
    };
    let fee_protocol = u8::try_from(token_to_uint(SLOT0, &tokens[5])?.low_u64())
        .map_err(|_| ConversionError::Overflow)?;
    let unlocked = match &tokens[6] {
        Token::Bool(b) => *b,
        other => {
            return Err(ReadError::Decode {
                method: SLOT0,
                reason: format!("expected bool, got {:?}", other),
            })
        }
    };

    Ok(Slot0 {
        sqrt_price_x96: token_to_uint(SLOT0, &tokens[0])?,
        tick,
        observation_index: small(2)?,
        observation_cardinality: small(3)?,
        observation_cardinality_next: small(4)?,
        fee_protocol,
        unlocked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::encode;
    use ethers::types::I256;

    fn slot0_tokens(tick: i64) -> Vec<Token> {
        vec![
            Token::Uint(U256::from(79_228_162_514_264_337_593_543_950_336u128)),
            Token::Int(I256::from(tick).into_raw()),
            Token::Uint(U256::from(3u64)),
            Token::Uint(U256::from(100u64)),
            Token::Uint(U256::from(100u64)),
            Token::Uint(U256::zero()),
            Token::Bool(true),
        ]
    }

    #[test]
    fn extracts_tick_from_index_one() {
        let slot = decode_slot0_v1(&encode(&slot0_tokens(-276_325))).unwrap();
        assert_eq!(slot.tick, -276_325);
        assert_eq!(slot.observation_cardinality, 100);
        assert!(slot.unlocked);
    }

    #[test]
    fn rejects_six_word_layout() {
        let mut tokens = slot0_tokens(10);
        tokens.pop();
        let err = decode_slot0_v1(&encode(&tokens)).unwrap_err();
        assert!(matches!(err, ReadError::ShapeMismatch { method: SLOT0, .. }));
    }

    #[test]
    fn rejects_extended_layout() {
        let mut tokens = slot0_tokens(10);
        tokens.push(Token::Uint(U256::one()));
        assert!(decode_slot0_v1(&encode(&tokens)).is_err());
    }
}
