//! Persisted local cache: storage backends, prefix invalidation, statistics
//! and first-deposit tracking.

pub mod manager;
pub mod store;
pub mod time_since;

pub use manager::{CacheManager, CacheStats};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use time_since::{format_time_since, FirstDepositClock};
