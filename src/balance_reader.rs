// Balance Reader - polls vault token balances
//
// Balances are never trusted beyond the poll: every tick re-reads every vault,
// and a failed read just leaves the previous value until the next tick.
// At most one getBalances read per vault is outstanding; concurrent callers
// share it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ethers::prelude::Address;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::chain_reader::ContractReader;
use crate::contracts::range_vault;
use crate::polling::PollHandle;
use crate::types::BalancePair;
use crate::vault_registry::VaultRegistry;

type SharedRead = Shared<BoxFuture<'static, Option<BalancePair>>>;

#[derive(Clone)]
pub struct BalanceReader {
    registry: Arc<VaultRegistry>,
    reader: Arc<dyn ContractReader>,
    latest: Arc<DashMap<String, BalancePair>>,
    in_flight: Arc<DashMap<String, SharedRead>>,
}

impl BalanceReader {
    pub fn new(registry: Arc<VaultRegistry>, reader: Arc<dyn ContractReader>) -> Self {
        Self {
            registry,
            reader,
            latest: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Reads current balances, joining an outstanding read for the same vault.
    /// `None` when the vault is not in the identity table or the read failed.
    pub async fn get_balances(&self, vault_name: &str) -> Option<BalancePair> {
        let Some(vault) = self.registry.resolve(vault_name) else {
            debug!("Balances unavailable: vault '{}' is not registered", vault_name);
            return None;
        };

        let read = match self.in_flight.entry(vault_name.to_string()) {
            Entry::Occupied(e) => {
                debug!("[{}] joining in-flight balance read", vault_name);
                e.get().clone()
            }
            Entry::Vacant(e) => {
                let read = self.read(vault_name.to_string(), vault.vault_address).boxed().shared();
                e.insert(read.clone());
                read
            }
        };
        read.await
    }

    /// Last successfully polled balances.
    pub fn latest(&self, vault_name: &str) -> Option<BalancePair> {
        self.latest.get(vault_name).map(|e| *e.value())
    }

    /// Polls every registered vault each `every`. A vault whose previous read
    /// is still outstanding is skipped for that tick.
    pub fn spawn_polling(&self, every: Duration) -> PollHandle {
        let this = self.clone();
        let task = tokio::spawn(async move {
            info!("Starting balance polling for {} vaults every {:?}", this.registry.len(), every);
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                for vault in this.registry.iter() {
                    if this.in_flight.contains_key(&vault.name) {
                        debug!("[{}] balance read still in flight, skipping tick", vault.name);
                        continue;
                    }
                    let worker = this.clone();
                    let name = vault.name.clone();
                    tokio::spawn(async move {
                        worker.get_balances(&name).await;
                    });
                }
            }
        });
        PollHandle::new("balance_reader", task)
    }

    fn read(&self, vault_name: String, vault_address: Address) -> impl std::future::Future<Output = Option<BalancePair>> + Send + 'static {
        let reader = Arc::clone(&self.reader);
        let latest = Arc::clone(&self.latest);
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            let out = match reader.call(&range_vault::get_balances(vault_address)).await {
                Ok(data) => match range_vault::decode_balances(&data) {
                    Ok((amount_x, amount_y)) => {
                        let pair = BalancePair { amount_x, amount_y };
                        latest.insert(vault_name.clone(), pair);
                        Some(pair)
                    }
                    Err(e) => {
                        warn!("[{}] getBalances returned unexpected data: {}", vault_name, e);
                        None
                    }
                },
                Err(e) => {
                    warn!("[{}] getBalances failed: {}", vault_name, e);
                    None
                }
            };

            in_flight.remove(&vault_name);
            out
        }
    }
}
