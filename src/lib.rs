//! # Vault Metrics SDK
//!
//! Read-path data layer for automated concentrated-liquidity vaults: it tells
//! whether a vault's position is in range, what its holdings are worth in USD,
//! and keeps a small local cache of expensive historical scans.
//!
//! ## Overview
//!
//! - **Range tracking**: protocol-specific reads of the active price position
//!   and the vault's bounds, for Liquidity Book bins and concentrated-liquidity
//!   ticks
//! - **Valuation**: vault balances plus a cached USD price give the TVL
//! - **Local cache**: rewards scans, first-deposit timestamps and prefix
//!   invalidation over a persisted key-value store
//!
//! ## Architecture
//!
//! ### Chain Layer
//! [`chain_reader::ContractReader`] is the only way to the chain. The
//! `contracts` module encodes view calls and checks the shape of every response.
//!
//! ### Range Layer
//! [`protocol_adapter::ProtocolAdapter`] picks a [`range_adapter::RangeAdapter`]
//! from the vault's configured protocol and publishes incremental
//! [`types::RangeState`] updates; [`range_evaluator`] derives in/out of range.
//!
//! ### Valuation Layer
//! [`balance_reader::BalanceReader`], [`price_feeds::PriceFeed`] and [`tvl`]
//! combine in [`vault_monitor::VaultMonitor`].
//!
//! ### Cache Layer
//! [`cache::CacheManager`] over a [`cache::KeyValueStore`], with
//! [`rewards::RewardsCache`] and [`admin::AdminCommand`] on top.

// Core Types
/// Common types and ABI conversions
pub mod types;
/// Fixed-point normalization of raw token amounts
pub mod normalization;
/// Configuration loading
pub mod settings;
/// Vault identity table
pub mod vault_registry;

// Chain Layer
/// Contract read seam
pub mod chain_reader;
/// View call encoding and response decoding
pub mod contracts;

// Range Layer
/// Trait for range protocol adapters
pub mod range_adapter;
/// Protocol-specific range adapters
pub mod adapters;
/// Protocol dispatch and range state tracking
pub mod protocol_adapter;
/// In-range evaluation
pub mod range_evaluator;

// Valuation Layer
/// Vault balance reads and polling
pub mod balance_reader;
/// Cached USD price feed
pub mod price_feeds;
/// CoinGecko price source
pub mod coingecko_price_source;
/// TVL calculation
pub mod tvl;
/// Per-vault metrics aggregation
pub mod vault_monitor;

// Cache Layer
/// Persisted key-value cache and its manager
pub mod cache;
/// Rewards scan cache
pub mod rewards;
/// Administrative cache commands
pub mod admin;

// Infrastructure
/// Cancellable background tasks
pub mod polling;

pub use admin::{AdminCommand, AdminOutcome};
pub use cache::{CacheManager, CacheStats, FileStore, KeyValueStore, MemoryStore};
pub use chain_reader::{ContractReader, ProviderReader, ReadError};
pub use polling::PollHandle;
pub use price_feeds::{PriceFeed, PriceSource};
pub use protocol_adapter::ProtocolAdapter;
pub use types::{BalancePair, PricePoint, RangeProtocol, RangeState, VaultIdentity};
pub use vault_monitor::{VaultMetrics, VaultMonitor};
