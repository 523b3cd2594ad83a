use chrono::Utc;
use ethers::prelude::Address;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use super::store::KeyValueStore;
use crate::types::conversions::address_to_string;

pub const SHADOW_CLAIMS_PREFIX: &str = "shadow_claims_";
pub const METRO_TRANSFERS_PREFIX: &str = "metro_transfers_";
pub const DEFI_LLAMA_APY_PREFIX: &str = "defi_llama_apy_cache";
pub const FIRST_DEPOSIT_PREFIX: &str = "first_deposit_";

/// Prefixes cleared by [`CacheManager::clear_shadow_caches`].
pub const SHADOW_PREFIXES: &[&str] = &[SHADOW_CLAIMS_PREFIX];
/// Prefixes cleared by [`CacheManager::clear_metro_caches`].
pub const METRO_PREFIXES: &[&str] = &[METRO_TRANSFERS_PREFIX];

/// Key counts per reserved prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub shadow_claims: usize,
    pub metro_transfers: usize,
    pub defi_llama_apy: usize,
    pub first_deposit: usize,
    pub other: usize,
    pub total: usize,
}

/// Invalidation, statistics and first-deposit tracking over the persisted store.
///
/// Every operation degrades instead of failing: storage errors are logged and
/// reported as a zero count or `None`.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Removes every key starting with `prefix` and returns how many went.
    pub fn clear_by_prefix(&self, prefix: &str) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list cache keys for prefix '{}': {}", prefix, e);
                return 0;
            }
        };
        let matching: Vec<String> = keys.into_iter().filter(|k| k.starts_with(prefix)).collect();
        if matching.is_empty() {
            return 0;
        }
        match self.store.remove_many(&matching) {
            Ok(removed) => {
                info!("Cleared {} cache entries with prefix '{}'", removed, prefix);
                removed
            }
            Err(e) => {
                warn!("Failed to clear cache prefix '{}': {}", prefix, e);
                0
            }
        }
    }

    pub fn clear_shadow_caches(&self) -> usize {
        SHADOW_PREFIXES.iter().map(|p| self.clear_by_prefix(p)).sum()
    }

    pub fn clear_metro_caches(&self) -> usize {
        METRO_PREFIXES.iter().map(|p| self.clear_by_prefix(p)).sum()
    }

    pub fn clear_all_caches(&self) -> usize {
        let shadow = self.clear_shadow_caches();
        let metro = self.clear_metro_caches();
        info!("Cleared all scan caches: {} shadow + {} metro", shadow, metro);
        shadow + metro
    }

    pub fn get_stats(&self) -> Option<CacheStats> {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to read cache stats: {}", e);
                return None;
            }
        };

        let mut stats = CacheStats::default();
        for key in &keys {
            if key.starts_with(SHADOW_CLAIMS_PREFIX) {
                stats.shadow_claims += 1;
            } else if key.starts_with(METRO_TRANSFERS_PREFIX) {
                stats.metro_transfers += 1;
            } else if key.starts_with(DEFI_LLAMA_APY_PREFIX) {
                stats.defi_llama_apy += 1;
            } else if key.starts_with(FIRST_DEPOSIT_PREFIX) {
                stats.first_deposit += 1;
            } else {
                stats.other += 1;
            }
        }
        stats.total = keys.len();
        Some(stats)
    }

    /// First-deposit timestamp (ms since epoch) for `address`, write-once.
    ///
    /// A stored value is returned unchanged. With nothing stored, "now" is
    /// recorded only when `has_deposits` is true; otherwise `None` and no write.
    pub fn get_or_init_first_deposit_timestamp(&self, address: Address, has_deposits: bool) -> Option<i64> {
        self.get_or_init_first_deposit_timestamp_at(address, has_deposits, Utc::now().timestamp_millis())
    }

    pub fn get_or_init_first_deposit_timestamp_at(
        &self,
        address: Address,
        has_deposits: bool,
        now_ms: i64,
    ) -> Option<i64> {
        let key = first_deposit_key(address);
        match self.store.get(&key) {
            Ok(Some(stored)) => return parse_timestamp(&key, &stored),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return None;
            }
        }
        if !has_deposits {
            return None;
        }

        // Compare-and-set: a concurrent initializer that won the race keeps its value.
        match self.store.set_if_absent(&key, &now_ms.to_string()) {
            Ok(stored) => {
                debug!("First deposit for {} recorded as {}", key, stored);
                parse_timestamp(&key, &stored)
            }
            Err(e) => {
                warn!("Failed to record {}: {}", key, e);
                None
            }
        }
    }
}

pub fn first_deposit_key(address: Address) -> String {
    format!("{}{}", FIRST_DEPOSIT_PREFIX, address_to_string(address))
}

fn parse_timestamp(key: &str, raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(ts) => Some(ts),
        Err(_) => {
            warn!("Ignoring malformed timestamp '{}' under {}", raw, key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{MemoryStore, StorageError};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Poisoned)
        }
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
        fn remove(&self, _key: &str) -> Result<bool, StorageError> {
            Err(StorageError::Poisoned)
        }
        fn set_if_absent(&self, _key: &str, _value: &str) -> Result<String, StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    fn seeded() -> CacheManager {
        let store = MemoryStore::new();
        for (k, v) in [
            ("shadow_claims_0xaaa", "[]"),
            ("shadow_claims_0xbbb", "[]"),
            ("metro_transfers_0xaaa", "[]"),
            ("defi_llama_apy_cache", "{}"),
            ("defi_llama_apy_cache_sonic", "{}"),
            ("first_deposit_0xaaa", "1700000000000"),
            ("theme", "dark"),
        ] {
            store.set(k, v).unwrap();
        }
        CacheManager::new(Arc::new(store))
    }

    #[test]
    fn clear_all_is_idempotent() {
        let cache = seeded();
        assert_eq!(cache.clear_all_caches(), 3);
        assert_eq!(cache.clear_all_caches(), 0);

        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.total, 4, "apy, first-deposit and unrelated keys survive");
    }

    #[test]
    fn clear_by_prefix_only_touches_matches() {
        let cache = seeded();
        assert_eq!(cache.clear_by_prefix("shadow_claims_0xa"), 1);
        assert_eq!(cache.clear_shadow_caches(), 1);
        assert_eq!(cache.clear_metro_caches(), 1);
        assert_eq!(cache.clear_by_prefix("nothing_"), 0);
    }

    #[test]
    fn stats_bucket_every_key_once() {
        let stats = seeded().get_stats().unwrap();
        assert_eq!(
            stats,
            CacheStats {
                shadow_claims: 2,
                metro_transfers: 1,
                defi_llama_apy: 2,
                first_deposit: 1,
                other: 1,
                total: 7,
            }
        );
    }

    #[test]
    fn storage_failure_degrades() {
        let cache = CacheManager::new(Arc::new(BrokenStore));
        assert_eq!(cache.clear_by_prefix(SHADOW_CLAIMS_PREFIX), 0);
        assert_eq!(cache.clear_all_caches(), 0);
        assert!(cache.get_stats().is_none());
        assert!(cache
            .get_or_init_first_deposit_timestamp(Address::zero(), true)
            .is_none());
    }

    #[test]
    fn first_deposit_lifecycle() {
        let cache = CacheManager::new(Arc::new(MemoryStore::new()));
        let user = Address::from_low_u64_be(0xABC);

        assert_eq!(cache.get_or_init_first_deposit_timestamp_at(user, false, 1_000), None);
        assert_eq!(cache.get_stats().unwrap().total, 0, "no write without deposits");

        assert_eq!(cache.get_or_init_first_deposit_timestamp_at(user, true, 2_000), Some(2_000));
        assert_eq!(cache.get_or_init_first_deposit_timestamp_at(user, false, 3_000), Some(2_000));
        assert_eq!(cache.get_or_init_first_deposit_timestamp_at(user, true, 4_000), Some(2_000));
    }

    #[test]
    fn first_deposit_key_is_lowercased() {
        let user: Address = "0x00000000000000000000000000000000000ABCDE".parse().unwrap();
        assert_eq!(
            first_deposit_key(user),
            "first_deposit_0x00000000000000000000000000000000000abcde"
        );
    }
}
