use chrono::{DateTime, Duration, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Marker that legacy vault display names carry for Liquidity Book (active-bin) vaults.
pub const LIQUIDITY_BOOK_MARKER: &str = "Metro";
/// Marker that legacy vault display names carry for concentrated-liquidity (tick) vaults.
pub const CONCENTRATED_LIQUIDITY_MARKER: &str = "Shadow";

/// Which range protocol family a vault deploys into.
///
/// Resolved once when the vault table is loaded and carried on [`VaultIdentity`];
/// nothing downstream inspects the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeProtocol {
    /// Active-bin protocol: `getActiveId()` on the book, `getRange()` on the vault.
    LiquidityBook,
    /// Tick protocol: `slot0()` on the pool, `getRange()` on the strategy.
    ConcentratedLiquidity,
    /// No range reads; balances and TVL only.
    Unsupported,
}

impl RangeProtocol {
    /// Fallback resolution for vault entries that do not declare their protocol.
    pub fn from_display_name(name: &str) -> Self {
        if name.contains(LIQUIDITY_BOOK_MARKER) {
            RangeProtocol::LiquidityBook
        } else if name.contains(CONCENTRATED_LIQUIDITY_MARKER) {
            RangeProtocol::ConcentratedLiquidity
        } else {
            RangeProtocol::Unsupported
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeProtocol::LiquidityBook => "liquidity_book",
            RangeProtocol::ConcentratedLiquidity => "concentrated_liquidity",
            RangeProtocol::Unsupported => "unsupported",
        }
    }
}

/// Token metadata. Decimals are declared by configuration, never read on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub symbol: String,
    pub decimals: u8,
}

/// Static identity of a vault and the contracts its metrics are read from.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultIdentity {
    pub name: String,
    pub vault_address: Address,
    pub strategy_address: Address,
    /// Concentrated-liquidity pool (`slot0()` source)
    pub pool_address: Option<Address>,
    /// Liquidity Book pair (`getActiveId()` source)
    pub book_address: Option<Address>,
    pub protocol: RangeProtocol,
    /// Live-priced token
    pub token_x: TokenMeta,
    /// Stable token, valued at $1
    pub token_y: TokenMeta,
}

/// Raw vault balances as returned by `getBalances()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancePair {
    pub amount_x: U256,
    pub amount_y: U256,
}

/// A USD price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub value_usd: f64,
    pub fetched_at: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(value_usd: f64) -> Self {
        Self {
            value_usd,
            fetched_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.fetched_at)
    }

    pub fn is_stale(&self, window: std::time::Duration) -> bool {
        match Duration::from_std(window) {
            Ok(window) => self.age() >= window,
            Err(_) => false,
        }
    }
}

/// Normalized range reading. `None` means "not loaded yet", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeState {
    pub active_position: Option<i128>,
    pub lower_bound: Option<i128>,
    pub upper_bound: Option<i128>,
}

impl RangeState {
    pub fn is_loaded(&self) -> bool {
        self.active_position.is_some() && self.lower_bound.is_some() && self.upper_bound.is_some()
    }
}
