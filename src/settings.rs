use config::{Config, ConfigError, File, FileFormat};
use ethers::types::Address;
use log::warn;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::types::conversions::{string_to_address, ConversionError};
use crate::types::{RangeProtocol, TokenMeta, VaultIdentity};

#[derive(Debug, Deserialize, Clone)]
pub struct Rpc {
    pub url: String,
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_rpc_timeout_ms() -> u64 {
    5000
}

impl Rpc {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PriceFeed {
    #[serde(default = "default_price_api_url")]
    pub base_url: String,
    /// CoinGecko id of the live-priced token (e.g. "sonic-3")
    pub asset_id: String,
    #[serde(default = "default_fresh_seconds")]
    pub fresh_seconds: u64,
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_price_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_price_api_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}
fn default_fresh_seconds() -> u64 {
    15
}
fn default_refresh_interval_seconds() -> u64 {
    30
}
fn default_price_request_timeout_ms() -> u64 {
    5000
}

impl PriceFeed {
    pub fn fresh_window(&self) -> Duration {
        Duration::from_secs(self.fresh_seconds)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Polling {
    #[serde(default = "default_balances_interval_seconds")]
    pub balances_interval_seconds: u64,
    #[serde(default = "default_range_interval_seconds")]
    pub range_interval_seconds: u64,
    #[serde(default = "default_clock_tick_seconds")]
    pub clock_tick_seconds: u64,
}

fn default_balances_interval_seconds() -> u64 {
    10
}
fn default_range_interval_seconds() -> u64 {
    10
}
fn default_clock_tick_seconds() -> u64 {
    60
}

impl Polling {
    pub fn balances_interval(&self) -> Duration {
        Duration::from_secs(self.balances_interval_seconds)
    }

    pub fn range_interval(&self) -> Duration {
        Duration::from_secs(self.range_interval_seconds)
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.clock_tick_seconds)
    }
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            balances_interval_seconds: default_balances_interval_seconds(),
            range_interval_seconds: default_range_interval_seconds(),
            clock_tick_seconds: default_clock_tick_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Cache {
    #[serde(default = "default_cache_path")]
    pub path: String,
}

fn default_cache_path() -> String {
    ".vault-cache.json".to_string()
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    pub name: String,
    pub vault_address: String,
    pub strategy_address: String,
    #[serde(default)]
    pub pool_address: Option<String>,
    #[serde(default)]
    pub book_address: Option<String>,
    /// When omitted, the protocol is inferred from the display name.
    #[serde(default)]
    pub protocol: Option<RangeProtocol>,
    pub token_x: TokenMeta,
    pub token_y: TokenMeta,
}

impl VaultConfig {
    pub fn to_identity(&self) -> Result<VaultIdentity, ConversionError> {
        let optional = |s: &Option<String>| -> Result<_, ConversionError> {
            match s.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(Some(string_to_address(v)?)),
                _ => Ok(None),
            }
        };
        let protocol = self
            .protocol
            .unwrap_or_else(|| RangeProtocol::from_display_name(&self.name));

        Ok(VaultIdentity {
            name: self.name.clone(),
            vault_address: string_to_address(&self.vault_address)?,
            strategy_address: string_to_address(&self.strategy_address)?,
            pool_address: optional(&self.pool_address)?,
            book_address: optional(&self.book_address)?,
            protocol,
            token_x: self.token_x.clone(),
            token_y: self.token_y.clone(),
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc: Rpc,
    pub price_feed: PriceFeed,
    #[serde(default)]
    pub polling: Polling,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub vaults: Vec<VaultConfig>,
    /// Depositor whose first-deposit timestamp is tracked
    #[serde(default)]
    pub account: Option<String>,
}

impl Settings {
    /// Loads `Config.toml` (or the file named by `VAULT_CONFIG`) plus env overrides.
    pub fn new() -> Result<Self, ConfigError> {
        let path = env::var("VAULT_CONFIG").unwrap_or_else(|_| "Config.toml".to_string());
        let s = Config::builder()
            .add_source(File::with_name(&path))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;
        s.try_deserialize()
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("VAULT_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(url) = non_empty_env("VAULT_PRICE_API_URL") {
            self.price_feed.base_url = url;
        }
        if let Some(path) = non_empty_env("VAULT_CACHE_PATH") {
            self.cache.path = path;
        }
        if let Some(account) = non_empty_env("VAULT_ACCOUNT") {
            self.account = Some(account);
        }
    }

    /// Parsed depositor address. `None` when unset or malformed (logged).
    pub fn account_address(&self) -> Option<Address> {
        let raw = self.account.as_deref()?;
        match string_to_address(raw) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!("Ignoring account '{}': {}", raw, e);
                None
            }
        }
    }

    /// Resolves every configured vault. Entries with malformed addresses are
    /// skipped with a warning so one bad row does not hide the others.
    pub fn vault_identities(&self) -> Vec<VaultIdentity> {
        self.vaults
            .iter()
            .filter_map(|v| match v.to_identity() {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!("Skipping vault '{}': {}", v.name, e);
                    None
                }
            })
            .collect()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
