//! # Protocol Adapter
//!
//! Dispatches a vault to its range protocol family and tracks the resulting
//! [`RangeState`]. Dispatch is driven by [`VaultIdentity::protocol`], which is
//! resolved once when the vault table is loaded.
//!
//! Only the matching family's reads are enabled. A vault that is `Unsupported`,
//! or that lacks the address its family needs, gets no adapter at all: every
//! refresh returns an all-`None` state without touching the chain.

use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::adapters::{ConcentratedLiquidityAdapter, LiquidityBookAdapter};
use crate::chain_reader::ContractReader;
use crate::range_adapter::RangeAdapter;
use crate::types::{RangeProtocol, RangeState, VaultIdentity};

/// Which protocol-specific reads are switched on for a vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledReads {
    pub liquidity_book: bool,
    pub concentrated_liquidity: bool,
}

impl EnabledReads {
    pub fn any(&self) -> bool {
        self.liquidity_book || self.concentrated_liquidity
    }
}

pub struct ProtocolAdapter {
    vault_name: String,
    inner: Option<Box<dyn RangeAdapter>>,
    enabled: EnabledReads,
    state: watch::Sender<RangeState>,
    refreshing: Mutex<()>,
}

impl ProtocolAdapter {
    pub fn for_vault(vault: &VaultIdentity, reader: Arc<dyn ContractReader>) -> Self {
        let (inner, enabled): (Option<Box<dyn RangeAdapter>>, EnabledReads) = match vault.protocol {
            RangeProtocol::LiquidityBook => match vault.book_address {
                Some(book) => (
                    Some(Box::new(LiquidityBookAdapter::new(book, vault.vault_address, reader))),
                    EnabledReads { liquidity_book: true, concentrated_liquidity: false },
                ),
                None => {
                    warn!("Vault '{}' is Liquidity Book but has no book address; range reads disabled", vault.name);
                    (None, EnabledReads::default())
                }
            },
            RangeProtocol::ConcentratedLiquidity => match vault.pool_address {
                Some(pool) => (
                    Some(Box::new(ConcentratedLiquidityAdapter::new(pool, vault.strategy_address, reader))),
                    EnabledReads { liquidity_book: false, concentrated_liquidity: true },
                ),
                None => {
                    warn!("Vault '{}' is concentrated liquidity but has no pool address; range reads disabled", vault.name);
                    (None, EnabledReads::default())
                }
            },
            RangeProtocol::Unsupported => {
                debug!("Vault '{}' has no supported range protocol", vault.name);
                (None, EnabledReads::default())
            }
        };

        let (state, _) = watch::channel(RangeState::default());
        Self {
            vault_name: vault.name.clone(),
            inner,
            enabled,
            state,
            refreshing: Mutex::new(()),
        }
    }

    pub fn vault_name(&self) -> &str {
        &self.vault_name
    }

    pub fn enabled_reads(&self) -> EnabledReads {
        self.enabled
    }

    /// Latest known state.
    pub fn state(&self) -> RangeState {
        *self.state.borrow()
    }

    /// Receives every incremental update, including partial ones.
    pub fn subscribe(&self) -> watch::Receiver<RangeState> {
        self.state.subscribe()
    }

    /// Issues both reads concurrently. Each result is applied as soon as it
    /// lands; a failed read keeps whatever that field held before.
    ///
    /// A call made while a refresh is running waits for it and returns its
    /// result instead of issuing reads of its own.
    pub async fn refresh(&self) -> RangeState {
        let Some(adapter) = self.inner.as_deref() else {
            return RangeState::default();
        };
        let _guard = match self.refreshing.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("[{}] joining in-flight range refresh", self.vault_name);
                let _done = self.refreshing.lock().await;
                return self.state();
            }
        };

        let active = async {
            match adapter.read_active_position().await {
                Ok(position) => self.state.send_modify(|s| s.active_position = Some(position)),
                Err(e) => warn!("[{}] {} active position read failed: {}", self.vault_name, adapter.name(), e),
            }
        };
        let bounds = async {
            match adapter.read_bounds().await {
                Ok((lower, upper)) => self.state.send_modify(|s| {
                    s.lower_bound = Some(lower);
                    s.upper_bound = Some(upper);
                }),
                Err(e) => warn!("[{}] {} range read failed: {}", self.vault_name, adapter.name(), e),
            }
        };
        futures::join!(active, bounds);

        self.state()
    }
}
