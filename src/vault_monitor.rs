//! # Vault Monitor
//!
//! Per-vault read-path aggregation: range tracking, balances, the live price
//! and the resulting TVL, combined into one [`VaultMetrics`] snapshot.

use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::balance_reader::BalanceReader;
use crate::chain_reader::ContractReader;
use crate::polling::PollHandle;
use crate::price_feeds::PriceFeed;
use crate::protocol_adapter::ProtocolAdapter;
use crate::range_evaluator;
use crate::tvl;
use crate::types::RangeState;
use crate::vault_registry::VaultRegistry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultMetrics {
    pub vault: String,
    pub in_range: Option<bool>,
    pub active_position: Option<i128>,
    pub lower_bound: Option<i128>,
    pub upper_bound: Option<i128>,
    pub tvl_usd: f64,
    pub price_usd: Option<f64>,
}

pub struct VaultMonitor {
    registry: Arc<VaultRegistry>,
    ranges: HashMap<String, Arc<ProtocolAdapter>>,
    balances: BalanceReader,
    prices: PriceFeed,
    asset_id: String,
}

impl VaultMonitor {
    pub fn new(
        registry: Arc<VaultRegistry>,
        reader: Arc<dyn ContractReader>,
        prices: PriceFeed,
        asset_id: impl Into<String>,
    ) -> Self {
        let ranges = registry
            .iter()
            .map(|v| (v.name.clone(), Arc::new(ProtocolAdapter::for_vault(v, reader.clone()))))
            .collect();
        let balances = BalanceReader::new(registry.clone(), reader);
        Self {
            registry,
            ranges,
            balances,
            prices,
            asset_id: asset_id.into(),
        }
    }

    pub fn registry(&self) -> &Arc<VaultRegistry> {
        &self.registry
    }

    pub fn balances(&self) -> &BalanceReader {
        &self.balances
    }

    pub fn prices(&self) -> &PriceFeed {
        &self.prices
    }

    pub fn range_tracker(&self, vault_name: &str) -> Option<&Arc<ProtocolAdapter>> {
        self.ranges.get(vault_name)
    }

    /// Refreshes range and balances, then prices the vault.
    ///
    /// `None` only when the vault is unknown; every other unavailable input
    /// shows up as `None` fields or a zero TVL.
    pub async fn snapshot(&self, vault_name: &str) -> Option<VaultMetrics> {
        let vault = self.registry.resolve(vault_name)?;
        let tracker = self.ranges.get(vault_name)?;

        let (range, balances, price) = futures::join!(
            tracker.refresh(),
            self.balances.get_balances(vault_name),
            self.prices.get_price(&self.asset_id),
        );

        let tvl_usd = tvl::calculate(
            balances.as_ref(),
            vault.token_x.decimals,
            vault.token_y.decimals,
            price.as_ref(),
        );
        Some(metrics(vault_name, &range, tvl_usd, price.map(|p| p.value_usd)))
    }

    /// Snapshot from last known values only, no chain or HTTP traffic.
    pub fn cached_snapshot(&self, vault_name: &str) -> Option<VaultMetrics> {
        let vault = self.registry.resolve(vault_name)?;
        let range = self.ranges.get(vault_name)?.state();
        let balances = self.balances.latest(vault_name);
        let price = self.prices.cached(&self.asset_id);
        let tvl_usd = tvl::calculate(
            balances.as_ref(),
            vault.token_x.decimals,
            vault.token_y.decimals,
            price.as_ref(),
        );
        Some(metrics(vault_name, &range, tvl_usd, price.map(|p| p.value_usd)))
    }

    /// Refreshes every vault's range state each `every`.
    pub fn spawn_range_polling(&self, every: Duration) -> PollHandle {
        let trackers: Vec<Arc<ProtocolAdapter>> = self
            .ranges
            .values()
            .filter(|t| t.enabled_reads().any())
            .cloned()
            .collect();
        let task = tokio::spawn(async move {
            info!("Starting range polling for {} vaults every {:?}", trackers.len(), every);
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let refreshes = trackers.iter().map(|t| t.refresh());
                let states = futures::future::join_all(refreshes).await;
                debug!("Range poll complete: {} vaults", states.len());
            }
        });
        PollHandle::new("range_poller", task)
    }
}

fn metrics(vault_name: &str, range: &RangeState, tvl_usd: f64, price_usd: Option<f64>) -> VaultMetrics {
    VaultMetrics {
        vault: vault_name.to_string(),
        in_range: range_evaluator::evaluate(range),
        active_position: range.active_position,
        lower_bound: range.lower_bound,
        upper_bound: range.upper_bound,
        tvl_usd,
        price_usd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_reader::ReadError;
    use crate::contracts::ViewCall;
    use crate::price_feeds::PriceSource;
    use crate::types::{RangeProtocol, TokenMeta, VaultIdentity};
    use async_trait::async_trait;
    use ethers::abi::{encode, Token};
    use ethers::types::{Address, Bytes, U256};

    struct LiquidityBookChain;

    #[async_trait]
    impl ContractReader for LiquidityBookChain {
        async fn call(&self, call: &ViewCall) -> Result<Bytes, ReadError> {
            let tokens = match call.signature {
                "getBalances()" => vec![Token::Uint(U256::exp10(18)), Token::Uint(U256::exp10(6))],
                "getActiveId()" => vec![Token::Uint(U256::from(8_388_608u64))],
                "getRange()" => vec![Token::Uint(U256::from(8_388_600u64)), Token::Uint(U256::from(8_388_610u64))],
                other => return Err(ReadError::Call { method: other, reason: "unexpected".into() }),
            };
            Ok(Bytes::from(encode(&tokens)))
        }
    }

    struct FixedPrice;

    #[async_trait]
    impl PriceSource for FixedPrice {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn fetch_usd_price(&self, _asset_id: &str) -> anyhow::Result<f64> {
            Ok(2.0)
        }
    }

    fn monitor() -> VaultMonitor {
        let registry = Arc::new(VaultRegistry::new(vec![VaultIdentity {
            name: "Metro S/USDC".into(),
            vault_address: Address::from_low_u64_be(1),
            strategy_address: Address::from_low_u64_be(2),
            pool_address: None,
            book_address: Some(Address::from_low_u64_be(3)),
            protocol: RangeProtocol::LiquidityBook,
            token_x: TokenMeta { symbol: "S".into(), decimals: 18 },
            token_y: TokenMeta { symbol: "USDC".into(), decimals: 6 },
        }]));
        let prices = PriceFeed::new(Arc::new(FixedPrice), Duration::from_secs(15));
        VaultMonitor::new(registry, Arc::new(LiquidityBookChain), prices, "sonic-3")
    }

    #[tokio::test]
    async fn snapshot_combines_range_balances_and_price() {
        let monitor = monitor();
        let metrics = monitor.snapshot("Metro S/USDC").await.unwrap();
        assert_eq!(metrics.in_range, Some(true));
        assert_eq!(metrics.active_position, Some(8_388_608));
        assert_eq!(metrics.tvl_usd, 3.0);
        assert_eq!(metrics.price_usd, Some(2.0));
        assert_eq!(monitor.cached_snapshot("Metro S/USDC"), Some(metrics));
    }

    #[tokio::test]
    async fn unknown_vault_has_no_snapshot() {
        let monitor = monitor();
        assert!(monitor.snapshot("Shadow S/USDC").await.is_none());
        assert!(monitor.cached_snapshot("Shadow S/USDC").is_none());
    }

    #[tokio::test]
    async fn cached_snapshot_before_any_read_is_empty() {
        let metrics = monitor().cached_snapshot("Metro S/USDC").unwrap();
        assert_eq!(metrics.in_range, None);
        assert_eq!(metrics.tvl_usd, 0.0);
        assert_eq!(metrics.price_usd, None);
    }
}
