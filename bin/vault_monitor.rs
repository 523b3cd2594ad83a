//! # Vault Monitor Service
//!
//! Runs the balance, range and price pollers for every configured vault and
//! logs a metrics snapshot per vault on each price refresh interval.
//!
//! ## Usage
//!
//! ```bash
//! VAULT_CONFIG=Config.toml cargo run --bin vault_monitor
//! ```
//!
//! Press Ctrl+C to stop gracefully.

use anyhow::Result;
use ethers::prelude::{Http, Provider};
use log::{info, warn};
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use vault_metrics_sdk::{
    cache::{CacheManager, FileStore, FirstDepositClock},
    chain_reader::ProviderReader,
    coingecko_price_source::CoinGeckoPriceSource,
    price_feeds::PriceFeed,
    settings::Settings,
    vault_monitor::VaultMonitor,
    vault_registry::VaultRegistry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    env_logger::init();

    // 1. Load settings
    let settings = Settings::new()?;
    let vaults = settings.vault_identities();
    if vaults.is_empty() {
        warn!("No vaults configured, nothing to monitor");
    }
    let registry = Arc::new(VaultRegistry::new(vaults));
    info!("Settings loaded: {} vaults", registry.len());

    // 2. Chain access
    let provider = Arc::new(Provider::<Http>::try_from(settings.rpc.url.as_str())?);
    let reader = Arc::new(ProviderReader::new(provider, settings.rpc.timeout()));

    // 3. Price feed
    let source = CoinGeckoPriceSource::new(
        settings.price_feed.base_url.clone(),
        settings.price_feed.request_timeout(),
    )?;
    let prices = PriceFeed::new(Arc::new(source), settings.price_feed.fresh_window());

    // 4. Local cache
    let store = Arc::new(FileStore::open(&settings.cache.path)?);
    let cache = CacheManager::new(store);
    if let Some(stats) = cache.get_stats() {
        info!("Cache at {} holds {} entries", settings.cache.path, stats.total);
    }

    // 5. Pollers
    let monitor = VaultMonitor::new(registry.clone(), reader, prices.clone(), settings.price_feed.asset_id.clone());
    let mut handles = vec![
        monitor.balances().spawn_polling(settings.polling.balances_interval()),
        monitor.spawn_range_polling(settings.polling.range_interval()),
        prices.spawn_refresh_loop(
            vec![settings.price_feed.asset_id.clone()],
            settings.price_feed.refresh_interval(),
        ),
    ];

    // First deposits are keyed by depositor, not by vault
    let mut first_deposit = None;
    if let Some(account) = settings.account_address() {
        match cache.get_or_init_first_deposit_timestamp(account, false) {
            Some(first) => {
                let (handle, label) = FirstDepositClock::spawn(first, settings.polling.clock_tick());
                handles.push(handle);
                first_deposit = Some((account, label));
            }
            None => info!("No first deposit recorded for {:?}", account),
        }
    }

    // 6. Periodic snapshot logging
    let snapshot_every = settings.price_feed.refresh_interval();
    let logger = tokio::spawn(async move {
        let mut ticker = interval(snapshot_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            for vault in monitor.registry().iter() {
                match monitor.snapshot(&vault.name).await {
                    Some(m) => info!(
                        "[{}] in_range={:?} active={:?} range=({:?}, {:?}) tvl=${:.2} price={:?}",
                        m.vault, m.in_range, m.active_position, m.lower_bound, m.upper_bound, m.tvl_usd, m.price_usd
                    ),
                    None => warn!("[{}] snapshot unavailable", vault.name),
                }
            }
            if let Some((account, label)) = &first_deposit {
                info!("{:?} first deposit {}", account, label.borrow().as_str());
            }
        }
    });

    info!("Vault monitor running, press Ctrl+C to stop");
    signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping tasks...");

    logger.abort();
    for handle in handles {
        handle.stop();
    }
    info!("Vault monitor stopped");
    Ok(())
}
