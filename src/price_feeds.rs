// src/price_feeds.rs

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};

use crate::polling::PollHandle;
use crate::types::PricePoint;

/// External USD price source for a single asset id.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches the current USD price. Any transport or status failure is an error.
    async fn fetch_usd_price(&self, asset_id: &str) -> anyhow::Result<f64>;
}

type SharedFetch = Shared<BoxFuture<'static, Option<PricePoint>>>;

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    point: PricePoint,
    /// Completion order of the fetch that produced `point`
    seq: u64,
}

/// USD price feed with a freshness window and per-asset request coalescing.
///
/// ## Behaviour
///
/// - **Fresh hit**: a cached point younger than the fresh window is returned as is.
/// - **Stale hit**: the stale point is returned immediately and a background
///   refresh is started.
/// - **Miss**: the caller awaits a fetch.
/// - **Failure**: the last cached point if any, otherwise `None`. Never an error.
///
/// At most one fetch per asset is in flight; concurrent callers share it.
#[derive(Clone)]
pub struct PriceFeed {
    source: Arc<dyn PriceSource>,
    fresh_window: Duration,
    prices: Arc<DashMap<String, CachedPrice>>,
    in_flight: Arc<DashMap<String, SharedFetch>>,
    completion_seq: Arc<AtomicU64>,
    fetch_count: Arc<AtomicU64>,
    focus: Arc<Notify>,
}

impl PriceFeed {
    pub fn new(source: Arc<dyn PriceSource>, fresh_window: Duration) -> Self {
        Self {
            source,
            fresh_window,
            prices: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            completion_seq: Arc::new(AtomicU64::new(0)),
            fetch_count: Arc::new(AtomicU64::new(0)),
            focus: Arc::new(Notify::new()),
        }
    }

    /// Last stored point for `asset`, fresh or not.
    pub fn cached(&self, asset: &str) -> Option<PricePoint> {
        self.prices.get(asset).map(|c| c.point)
    }

    /// Number of requests actually sent to the source.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    pub async fn get_price(&self, asset: &str) -> Option<PricePoint> {
        if let Some(point) = self.cached(asset) {
            if !point.is_stale(self.fresh_window) {
                return Some(point);
            }
            debug!("Price for {} is stale ({}s old), refreshing in background", asset, point.age().num_seconds());
            self.spawn_background_refresh(asset);
            return Some(point);
        }
        self.refresh(asset).await
    }

    /// Fetches now, joining an in-flight request for the same asset if there is one.
    pub async fn refresh(&self, asset: &str) -> Option<PricePoint> {
        let fetch = match self.in_flight.entry(asset.to_string()) {
            Entry::Occupied(e) => {
                debug!("Joining in-flight price fetch for {}", asset);
                e.get().clone()
            }
            Entry::Vacant(e) => {
                let fetch = self.fetch(asset.to_string()).boxed().shared();
                e.insert(fetch.clone());
                fetch
            }
        };
        fetch.await
    }

    /// Wakes the refresh loop immediately (window focus regained).
    pub fn notify_focus_regained(&self) {
        self.focus.notify_one();
    }

    /// Refreshes `assets` every `every`, and on each focus-regain notification.
    pub fn spawn_refresh_loop(&self, assets: Vec<String>, every: Duration) -> PollHandle {
        let feed = self.clone();
        let task = tokio::spawn(async move {
            info!("Starting price refresh loop for {:?} every {:?}", assets, every);
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = feed.focus.notified() => {
                        debug!("Focus regained, refreshing prices");
                    }
                }
                for asset in &assets {
                    feed.refresh(asset).await;
                }
            }
        });
        PollHandle::new("price_feed", task)
    }

    fn spawn_background_refresh(&self, asset: &str) {
        let feed = self.clone();
        let asset = asset.to_string();
        tokio::spawn(async move {
            feed.refresh(&asset).await;
        });
    }

    fn fetch(&self, asset: String) -> impl std::future::Future<Output = Option<PricePoint>> + Send + 'static {
        let source = Arc::clone(&self.source);
        let prices = Arc::clone(&self.prices);
        let in_flight = Arc::clone(&self.in_flight);
        let completion_seq = Arc::clone(&self.completion_seq);
        let fetch_count = Arc::clone(&self.fetch_count);

        async move {
            fetch_count.fetch_add(1, Ordering::Relaxed);
            let result = source.fetch_usd_price(&asset).await;

            let out = match result {
                Ok(price) if price.is_finite() && price >= 0.0 => {
                    let point = PricePoint::new(price);
                    let seq = completion_seq.fetch_add(1, Ordering::SeqCst) + 1;
                    store_latest(&prices, &asset, CachedPrice { point, seq });
                    debug!("{} price for {}: ${:.6}", source.name(), asset, price);
                    Some(point)
                }
                Ok(price) => {
                    warn!("{} returned invalid price for {}: {}", source.name(), asset, price);
                    prices.get(&asset).map(|c| c.point)
                }
                Err(e) => {
                    let fallback = prices.get(&asset).map(|c| c.point);
                    warn!(
                        "{} price fetch for {} failed ({}), serving {}",
                        source.name(),
                        asset,
                        e,
                        if fallback.is_some() { "last known price" } else { "unavailable" }
                    );
                    fallback
                }
            };

            in_flight.remove(&asset);
            out
        }
    }
}

/// Last-write-wins by completion order: an older completion never replaces a newer one.
fn store_latest(prices: &DashMap<String, CachedPrice>, asset: &str, incoming: CachedPrice) {
    match prices.entry(asset.to_string()) {
        Entry::Occupied(mut e) => {
            if incoming.seq > e.get().seq {
                e.insert(incoming);
            } else {
                debug!("Discarding superseded price for {} (seq {} <= {})", asset, incoming.seq, e.get().seq);
            }
        }
        Entry::Vacant(e) => {
            e.insert(incoming);
        }
    }
}
