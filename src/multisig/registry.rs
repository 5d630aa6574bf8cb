//! Wallet registry
//!
//! Single source of truth for wallet ownership and thresholds.

use crate::multisig::error::MultisigError;
use crate::multisig::wallet::Wallet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Owns every wallet record
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalletRegistry {
    /// Wallets by id
    wallets: HashMap<String, Wallet>,
    /// Creation order
    order: Vec<String>,
    /// Counter for id generation
    nonce: u64,
}

impl WalletRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new wallet
    pub fn create_wallet(
        &mut self,
        name: &str,
        owners: Vec<String>,
        threshold: usize,
    ) -> Result<Wallet, MultisigError> {
        let id = format!("wallet-{}", self.nonce + 1);
        if self.wallets.contains_key(&id) {
            return Err(MultisigError::validation(format!(
                "wallet id {} is already taken",
                id
            )));
        }
        let wallet = Wallet::new(id, name, owners, threshold)?;

        if self.wallets.values().any(|w| w.address == wallet.address) {
            return Err(MultisigError::validation(format!(
                "address {} is already registered",
                wallet.address
            )));
        }

        self.nonce += 1;
        self.order.push(wallet.id.clone());
        self.wallets.insert(wallet.id.clone(), wallet.clone());

        log::info!(
            "Wallet created: {} \"{}\" ({}) at {}",
            wallet.id,
            wallet.name,
            wallet.description(),
            wallet.address
        );

        Ok(wallet)
    }

    /// Get a wallet by id
    pub fn get_wallet(&self, id: &str) -> Result<&Wallet, MultisigError> {
        self.wallets
            .get(id)
            .ok_or_else(|| MultisigError::wallet_not_found(id))
    }

    pub(crate) fn get_wallet_mut(&mut self, id: &str) -> Result<&mut Wallet, MultisigError> {
        self.wallets
            .get_mut(id)
            .ok_or_else(|| MultisigError::wallet_not_found(id))
    }

    /// Look up a wallet by its address
    pub fn find_by_address(&self, address: &str) -> Option<&Wallet> {
        self.wallets.values().find(|w| w.address == address)
    }

    /// Check whether an identity owns a wallet
    pub fn is_owner(&self, wallet_id: &str, identity: &str) -> Result<bool, MultisigError> {
        Ok(self.get_wallet(wallet_id)?.is_owner(identity))
    }

    /// List all wallets in creation order
    pub fn list_wallets(&self) -> Vec<&Wallet> {
        self.order
            .iter()
            .filter_map(|id| self.wallets.get(id))
            .collect()
    }

    /// Wallets where the identity is one of the owners
    pub fn wallets_for_owner(&self, identity: &str) -> Vec<&Wallet> {
        self.list_wallets()
            .into_iter()
            .filter(|w| w.is_owner(identity))
            .collect()
    }

    /// Sum of display balances across the identity's wallets
    pub fn total_balance_for_owner(&self, identity: &str) -> Decimal {
        self.wallets_for_owner(identity)
            .iter()
            .map(|w| w.balance)
            .sum()
    }

    /// Get wallet count
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    /// Rename a wallet; the actor must be an owner
    pub fn rename_wallet(
        &mut self,
        wallet_id: &str,
        actor: &str,
        name: &str,
    ) -> Result<&Wallet, MultisigError> {
        let wallet = self.owned_mut(wallet_id, actor)?;
        wallet.rename(name)?;
        Ok(&*wallet)
    }

    /// Add an owner; the actor must be an owner
    pub fn add_owner(
        &mut self,
        wallet_id: &str,
        actor: &str,
        owner: &str,
    ) -> Result<&Wallet, MultisigError> {
        let wallet = self.owned_mut(wallet_id, actor)?;
        wallet.add_owner(owner)?;
        log::info!("Owner {} added to {} by {}", owner, wallet_id, actor);
        Ok(&*wallet)
    }

    /// Remove an owner; the actor must be an owner
    pub fn remove_owner(
        &mut self,
        wallet_id: &str,
        actor: &str,
        owner: &str,
    ) -> Result<&Wallet, MultisigError> {
        let wallet = self.owned_mut(wallet_id, actor)?;
        wallet.remove_owner(owner)?;
        log::info!("Owner {} removed from {} by {}", owner, wallet_id, actor);
        Ok(&*wallet)
    }

    /// Change the approval threshold; the actor must be an owner
    pub fn change_threshold(
        &mut self,
        wallet_id: &str,
        actor: &str,
        threshold: usize,
    ) -> Result<&Wallet, MultisigError> {
        let wallet = self.owned_mut(wallet_id, actor)?;
        wallet.set_threshold(threshold)?;
        log::info!(
            "Threshold of {} changed to {} by {}",
            wallet_id,
            wallet.description(),
            actor
        );
        Ok(&*wallet)
    }

    /// Update the display balance
    pub fn set_balance(
        &mut self,
        wallet_id: &str,
        balance: Decimal,
    ) -> Result<&Wallet, MultisigError> {
        let wallet = self.get_wallet_mut(wallet_id)?;
        wallet.set_balance(balance)?;
        Ok(&*wallet)
    }

    fn owned_mut(&mut self, wallet_id: &str, actor: &str) -> Result<&mut Wallet, MultisigError> {
        let wallet = self.get_wallet_mut(wallet_id)?;
        if !wallet.is_owner(actor) {
            return Err(MultisigError::not_an_owner(wallet_id, actor));
        }
        Ok(wallet)
    }

    /// Re-check wallet invariants and registry-wide uniqueness
    pub fn verify_integrity(&self) -> Result<(), MultisigError> {
        if self.order.len() != self.wallets.len() {
            return Err(MultisigError::validation(
                "wallet order does not match wallet records",
            ));
        }

        let mut addresses = HashSet::new();
        for (id, wallet) in &self.wallets {
            if id != &wallet.id {
                return Err(MultisigError::validation(format!(
                    "wallet stored under {} claims id {}",
                    id, wallet.id
                )));
            }
            if !self.order.contains(id) {
                return Err(MultisigError::validation(format!(
                    "wallet {} missing from creation order",
                    id
                )));
            }
            check_issued_id(id, "wallet-", self.nonce)?;
            wallet.check_invariants()?;
            if !addresses.insert(wallet.address.as_str()) {
                return Err(MultisigError::validation(format!(
                    "duplicate wallet address {}",
                    wallet.address
                )));
            }
        }
        Ok(())
    }
}

/// Fail unless `id` is `<prefix><n>` with `n` already issued by a counter
/// standing at `nonce`
pub(crate) fn check_issued_id(id: &str, prefix: &str, nonce: u64) -> Result<(), MultisigError> {
    let seq = id
        .strip_prefix(prefix)
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| MultisigError::validation(format!("malformed id {}", id)))?;
    if seq == 0 || seq > nonce {
        return Err(MultisigError::validation(format!(
            "id {} was never issued (counter at {})",
            id, nonce
        )));
    }
    Ok(())
}
