// Vault identity table, keyed by display name.

use std::collections::HashMap;

use crate::types::VaultIdentity;

#[derive(Debug, Clone, Default)]
pub struct VaultRegistry {
    vaults: Vec<VaultIdentity>,
    by_name: HashMap<String, usize>,
}

impl VaultRegistry {
    pub fn new(vaults: Vec<VaultIdentity>) -> Self {
        let mut registry = Self::default();
        for vault in vaults {
            registry.insert(vault);
        }
        registry
    }

    /// Later entries with the same name replace earlier ones.
    pub fn insert(&mut self, vault: VaultIdentity) {
        match self.by_name.get(&vault.name) {
            Some(&idx) => self.vaults[idx] = vault,
            None => {
                self.by_name.insert(vault.name.clone(), self.vaults.len());
                self.vaults.push(vault);
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&VaultIdentity> {
        self.by_name.get(name).map(|&idx| &self.vaults[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &VaultIdentity> {
        self.vaults.iter()
    }

    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RangeProtocol, TokenMeta};
    use ethers::types::Address;

    fn vault(name: &str, addr: u64) -> VaultIdentity {
        VaultIdentity {
            name: name.to_string(),
            vault_address: Address::from_low_u64_be(addr),
            strategy_address: Address::from_low_u64_be(addr + 1),
            pool_address: None,
            book_address: None,
            protocol: RangeProtocol::Unsupported,
            token_x: TokenMeta { symbol: "S".into(), decimals: 18 },
            token_y: TokenMeta { symbol: "USDC".into(), decimals: 6 },
        }
    }

    #[test]
    fn resolves_by_name_and_replaces_duplicates() {
        let registry = VaultRegistry::new(vec![vault("a", 1), vault("b", 10), vault("a", 20)]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.resolve("a").unwrap().vault_address,
            Address::from_low_u64_be(20)
        );
        assert!(registry.resolve("missing").is_none());
    }
}
