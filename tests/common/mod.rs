//! Shared doubles for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, I256, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use vault_metrics_sdk::chain_reader::{ContractReader, ReadError};
use vault_metrics_sdk::contracts::ViewCall;
use vault_metrics_sdk::types::{RangeProtocol, TokenMeta, VaultIdentity};

/// In-memory chain keyed by `(target, signature)`. Unknown calls revert.
#[derive(Default)]
pub struct MockChain {
    responses: Mutex<HashMap<(Address, &'static str), Bytes>>,
    calls: AtomicUsize,
}

impl MockChain {
    pub fn respond(&self, target: Address, signature: &'static str, tokens: &[Token]) {
        self.responses
            .lock()
            .unwrap()
            .insert((target, signature), Bytes::from(encode(tokens)));
    }

    pub fn respond_raw(&self, target: Address, signature: &'static str, data: Vec<u8>) {
        self.responses.lock().unwrap().insert((target, signature), Bytes::from(data));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractReader for MockChain {
    async fn call(&self, call: &ViewCall) -> Result<Bytes, ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(&(call.target, call.signature))
            .cloned()
            .ok_or_else(|| ReadError::Call {
                method: call.signature,
                reason: "execution reverted".into(),
            })
    }
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn int(v: i64) -> Token {
    Token::Int(I256::from(v).into_raw())
}

pub fn uint(v: u64) -> Token {
    Token::Uint(U256::from(v))
}

/// Seven-word slot0 response with the given tick.
pub fn slot0_tokens(tick: i64) -> Vec<Token> {
    vec![
        Token::Uint(U256::from(2u64).pow(U256::from(96u64))),
        int(tick),
        uint(0),
        uint(1),
        uint(1),
        uint(0),
        Token::Bool(true),
    ]
}

pub fn liquidity_book_vault() -> VaultIdentity {
    VaultIdentity {
        name: "Metro S/USDC".into(),
        vault_address: addr(0x10),
        strategy_address: addr(0x11),
        pool_address: None,
        book_address: Some(addr(0x12)),
        protocol: RangeProtocol::LiquidityBook,
        token_x: TokenMeta { symbol: "S".into(), decimals: 18 },
        token_y: TokenMeta { symbol: "USDC".into(), decimals: 6 },
    }
}

pub fn concentrated_liquidity_vault() -> VaultIdentity {
    VaultIdentity {
        name: "Shadow S/USDC".into(),
        vault_address: addr(0x20),
        strategy_address: addr(0x21),
        pool_address: Some(addr(0x22)),
        book_address: None,
        protocol: RangeProtocol::ConcentratedLiquidity,
        token_x: TokenMeta { symbol: "S".into(), decimals: 18 },
        token_y: TokenMeta { symbol: "USDC".into(), decimals: 6 },
    }
}
