// Rewards scan cache
//
// The rewards aggregator itself is external: it scans historical claim and
// transfer events and produces `{symbol, amount_raw, value_usd}` entries. What
// lives here is the persistence of its intermediate results, so a later scan
// resumes from the last scanned block instead of replaying history.

use async_trait::async_trait;
use chrono::Utc;
use ethers::prelude::{Address, U256};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::manager::{METRO_TRANSFERS_PREFIX, SHADOW_CLAIMS_PREFIX};
use crate::cache::KeyValueStore;
use crate::types::conversions::address_to_string;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub symbol: String,
    #[serde(with = "decimal_u256")]
    pub amount_raw: U256,
    pub value_usd: f64,
}

/// Which historical scan a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardScanKind {
    /// Concentrated-liquidity gauge claims
    ShadowClaims,
    /// Liquidity Book reward transfers
    MetroTransfers,
}

impl RewardScanKind {
    pub fn key(&self, user: Address) -> String {
        let prefix = match self {
            RewardScanKind::ShadowClaims => SHADOW_CLAIMS_PREFIX,
            RewardScanKind::MetroTransfers => METRO_TRANSFERS_PREFIX,
        };
        format!("{}{}", prefix, address_to_string(user))
    }
}

/// Output of one scan over `(from_block, last_block]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardScan {
    pub last_block: u64,
    pub rewards: Vec<RewardEntry>,
}

/// The external rewards aggregator.
#[async_trait]
pub trait RewardsSource: Send + Sync {
    /// Scans events after `from_block` (all history when `None`).
    async fn scan(&self, kind: RewardScanKind, user: Address, from_block: Option<u64>) -> anyhow::Result<RewardScan>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub fetched_at_ms: i64,
    pub last_block: u64,
    pub data: Vec<RewardEntry>,
}

#[derive(Clone)]
pub struct RewardsCache {
    store: Arc<dyn KeyValueStore>,
}

impl RewardsCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cached scan result, or `None` when missing or unreadable.
    pub fn load(&self, kind: RewardScanKind, user: Address) -> Option<CacheEnvelope> {
        let key = kind.key(user);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub fn save(&self, kind: RewardScanKind, user: Address, envelope: &CacheEnvelope) -> bool {
        let key = kind.key(user);
        let raw = match serde_json::to_string(envelope) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize {}: {}", key, e);
                return false;
            }
        };
        match self.store.set(&key, &raw) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write {}: {}", key, e);
                false
            }
        }
    }

    /// Runs an incremental scan on top of the cached result and persists the
    /// merged list. On scan failure the cached list (or nothing) is returned.
    pub async fn refresh(&self, source: &dyn RewardsSource, kind: RewardScanKind, user: Address) -> Vec<RewardEntry> {
        let cached = self.load(kind, user);
        let from_block = cached.as_ref().map(|c| c.last_block);

        let scan = match source.scan(kind, user, from_block).await {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Rewards scan {:?} for {:?} failed: {}", kind, user, e);
                return cached.map(|c| c.data).unwrap_or_default();
            }
        };

        let mut data = cached.map(|c| c.data).unwrap_or_default();
        debug!(
            "Rewards scan {:?} for {:?}: {} new entries up to block {}",
            kind,
            user,
            scan.rewards.len(),
            scan.last_block
        );
        data.extend(scan.rewards);

        let envelope = CacheEnvelope {
            fetched_at_ms: Utc::now().timestamp_millis(),
            last_block: scan.last_block,
            data,
        };
        self.save(kind, user, &envelope);
        envelope.data
    }
}

pub fn total_value_usd(rewards: &[RewardEntry]) -> f64 {
    rewards.iter().map(|r| r.value_usd).sum()
}

mod decimal_u256 {
    use ethers::prelude::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use std::sync::Mutex;

    struct RecordingSource {
        from_blocks: Mutex<Vec<Option<u64>>>,
        fail: bool,
    }

    #[async_trait]
    impl RewardsSource for RecordingSource {
        async fn scan(&self, _kind: RewardScanKind, _user: Address, from_block: Option<u64>) -> anyhow::Result<RewardScan> {
            self.from_blocks.lock().unwrap().push(from_block);
            if self.fail {
                return Err(anyhow::anyhow!("rpc down"));
            }
            let last_block = from_block.unwrap_or(0) + 100;
            Ok(RewardScan {
                last_block,
                rewards: vec![RewardEntry {
                    symbol: "SHADOW".into(),
                    amount_raw: U256::exp10(18),
                    value_usd: 1.25,
                }],
            })
        }
    }

    fn user() -> Address {
        Address::from_low_u64_be(0xBEEF)
    }

    #[tokio::test]
    async fn second_scan_resumes_from_cached_block() {
        let store = Arc::new(MemoryStore::new());
        let cache = RewardsCache::new(store.clone());
        let source = RecordingSource { from_blocks: Mutex::new(vec![]), fail: false };

        let first = cache.refresh(&source, RewardScanKind::ShadowClaims, user()).await;
        let second = cache.refresh(&source, RewardScanKind::ShadowClaims, user()).await;

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(*source.from_blocks.lock().unwrap(), vec![None, Some(100)]);
        assert_eq!(total_value_usd(&second), 2.5);
        assert!(store
            .get("shadow_claims_0x000000000000000000000000000000000000beef")
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn failed_scan_serves_cached_entries() {
        let cache = RewardsCache::new(Arc::new(MemoryStore::new()));
        let ok = RecordingSource { from_blocks: Mutex::new(vec![]), fail: false };
        let broken = RecordingSource { from_blocks: Mutex::new(vec![]), fail: true };

        cache.refresh(&ok, RewardScanKind::MetroTransfers, user()).await;
        let served = cache.refresh(&broken, RewardScanKind::MetroTransfers, user()).await;
        assert_eq!(served.len(), 1);
        assert_eq!(cache.load(RewardScanKind::MetroTransfers, user()).unwrap().last_block, 100);
    }

    #[test]
    fn corrupt_entry_reads_as_missing() {
        let store = Arc::new(MemoryStore::new());
        store.set(&RewardScanKind::ShadowClaims.key(user()), "{oops").unwrap();
        let cache = RewardsCache::new(store);
        assert!(cache.load(RewardScanKind::ShadowClaims, user()).is_none());
    }

    #[test]
    fn amounts_persist_as_decimal_strings() {
        let entry = RewardEntry {
            symbol: "xSHADOW".into(),
            amount_raw: U256::from(1234u64),
            value_usd: 0.5,
        };
        let raw = serde_json::to_string(&entry).unwrap();
        assert!(raw.contains("\"amount_raw\":\"1234\""));
        assert_eq!(serde_json::from_str::<RewardEntry>(&raw).unwrap(), entry);
    }
}
