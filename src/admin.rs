//! Administrative cache commands.
//!
//! Operators reach these through the `vault_admin` binary; each command maps
//! onto one [`CacheManager`] operation and never fails, it reports what it did.

use ethers::prelude::Address;
use serde::Serialize;
use std::fmt;

use crate::cache::time_since::format_time_since;
use crate::cache::{CacheManager, CacheStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    ClearShadow,
    ClearMetro,
    ClearAll,
    ClearPrefix(String),
    Stats,
    /// Looks up (never initializes) the first-deposit timestamp.
    FirstDeposit { address: Address },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    Cleared { removed: usize },
    Stats { stats: Option<CacheStats> },
    FirstDeposit { timestamp_ms: Option<i64>, label: Option<String> },
}

impl AdminCommand {
    pub fn execute(&self, cache: &CacheManager) -> AdminOutcome {
        self.execute_at(cache, chrono::Utc::now().timestamp_millis())
    }

    pub fn execute_at(&self, cache: &CacheManager, now_ms: i64) -> AdminOutcome {
        match self {
            AdminCommand::ClearShadow => AdminOutcome::Cleared { removed: cache.clear_shadow_caches() },
            AdminCommand::ClearMetro => AdminOutcome::Cleared { removed: cache.clear_metro_caches() },
            AdminCommand::ClearAll => AdminOutcome::Cleared { removed: cache.clear_all_caches() },
            AdminCommand::ClearPrefix(prefix) => AdminOutcome::Cleared { removed: cache.clear_by_prefix(prefix) },
            AdminCommand::Stats => AdminOutcome::Stats { stats: cache.get_stats() },
            AdminCommand::FirstDeposit { address } => {
                let timestamp_ms = cache.get_or_init_first_deposit_timestamp_at(*address, false, now_ms);
                AdminOutcome::FirstDeposit {
                    timestamp_ms,
                    label: timestamp_ms.map(|ts| format_time_since(ts, now_ms)),
                }
            }
        }
    }
}

impl fmt::Display for AdminOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminOutcome::Cleared { removed } => write!(f, "Removed {} cache entries", removed),
            AdminOutcome::Stats { stats: None } => write!(f, "Cache stats unavailable"),
            AdminOutcome::Stats { stats: Some(s) } => write!(
                f,
                "total={} shadow_claims={} metro_transfers={} defi_llama_apy={} first_deposit={} other={}",
                s.total, s.shadow_claims, s.metro_transfers, s.defi_llama_apy, s.first_deposit, s.other
            ),
            AdminOutcome::FirstDeposit { timestamp_ms: Some(ts), label } => {
                write!(f, "First deposit at {} ({})", ts, label.as_deref().unwrap_or("unknown"))
            }
            AdminOutcome::FirstDeposit { timestamp_ms: None, .. } => write!(f, "No first deposit recorded"),
        }
    }
}
