//! Multisig wallet and transaction manager
//!
//! Coordinates the wallet registry and the transaction ledger. A manager
//! is one consistency domain: every mutation takes `&mut self`, so callers
//! sharing it across threads or tasks must hold a write lock for the whole
//! read-modify-write (see `api::ApiState`).

use crate::multisig::error::MultisigError;
use crate::multisig::ledger::{StatusChange, StatusCounts, TransactionLedger};
use crate::multisig::registry::WalletRegistry;
use crate::multisig::transaction::{Transaction, TransactionStatus};
use crate::multisig::wallet::Wallet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Overview of one wallet and its transactions
#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary {
    pub wallet_id: String,
    pub name: String,
    pub description: String,
    pub owner_count: usize,
    pub threshold: usize,
    pub balance: Decimal,
    pub transactions: StatusCounts,
}

/// Manager for multisig wallets and their transactions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MultisigManager {
    registry: WalletRegistry,
    ledger: TransactionLedger,
}

impl MultisigManager {
    /// Create a new empty manager
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    /// Create a new multisig wallet
    pub fn create_wallet(
        &mut self,
        name: &str,
        owners: Vec<String>,
        threshold: usize,
    ) -> Result<Wallet, MultisigError> {
        self.registry.create_wallet(name, owners, threshold)
    }

    /// Get a wallet by id
    pub fn get_wallet(&self, wallet_id: &str) -> Result<&Wallet, MultisigError> {
        self.registry.get_wallet(wallet_id)
    }

    /// Get a wallet by id, or by address when the key is `0x`-prefixed
    pub fn find_wallet(&self, key: &str) -> Result<&Wallet, MultisigError> {
        if key.starts_with("0x") {
            self.registry
                .find_by_address(key)
                .ok_or_else(|| MultisigError::wallet_not_found(key))
        } else {
            self.registry.get_wallet(key)
        }
    }

    /// Check whether an identity owns a wallet
    pub fn is_owner(&self, wallet_id: &str, identity: &str) -> Result<bool, MultisigError> {
        self.registry.is_owner(wallet_id, identity)
    }

    /// List all wallets in creation order
    pub fn list_wallets(&self) -> Vec<&Wallet> {
        self.registry.list_wallets()
    }

    /// Wallets where the identity is an owner
    pub fn wallets_for_owner(&self, identity: &str) -> Vec<&Wallet> {
        self.registry.wallets_for_owner(identity)
    }

    /// Sum of display balances across the identity's wallets
    pub fn total_balance_for_owner(&self, identity: &str) -> Decimal {
        self.registry.total_balance_for_owner(identity)
    }

    /// Get wallet count
    pub fn wallet_count(&self) -> usize {
        self.registry.wallet_count()
    }

    /// Rename a wallet
    pub fn rename_wallet(
        &mut self,
        wallet_id: &str,
        actor: &str,
        name: &str,
    ) -> Result<Wallet, MultisigError> {
        self.registry
            .rename_wallet(wallet_id, actor, name)
            .cloned()
    }

    /// Add an owner and re-evaluate the wallet's open transactions
    pub fn add_owner(
        &mut self,
        wallet_id: &str,
        actor: &str,
        owner: &str,
    ) -> Result<(Wallet, Vec<StatusChange>), MultisigError> {
        let wallet = self.registry.add_owner(wallet_id, actor, owner)?.clone();
        let changes = self.ledger.reevaluate_wallet(&wallet);
        Ok((wallet, changes))
    }

    /// Remove an owner, withdrawing their approvals from open transactions
    pub fn remove_owner(
        &mut self,
        wallet_id: &str,
        actor: &str,
        owner: &str,
    ) -> Result<(Wallet, Vec<StatusChange>), MultisigError> {
        let wallet = self.registry.remove_owner(wallet_id, actor, owner)?.clone();
        let changes = self.ledger.reevaluate_wallet(&wallet);
        Ok((wallet, changes))
    }

    /// Change the threshold and re-evaluate the wallet's open transactions
    pub fn change_threshold(
        &mut self,
        wallet_id: &str,
        actor: &str,
        threshold: usize,
    ) -> Result<(Wallet, Vec<StatusChange>), MultisigError> {
        let wallet = self
            .registry
            .change_threshold(wallet_id, actor, threshold)?
            .clone();
        let changes = self.ledger.reevaluate_wallet(&wallet);
        Ok((wallet, changes))
    }

    /// Update a wallet's display balance
    pub fn set_balance(
        &mut self,
        wallet_id: &str,
        balance: Decimal,
    ) -> Result<Wallet, MultisigError> {
        self.registry
            .set_balance(wallet_id, balance)
            .cloned()
    }

    /// Summarise a wallet and its transaction counts
    pub fn wallet_summary(&self, wallet_id: &str) -> Result<WalletSummary, MultisigError> {
        let wallet = self.registry.get_wallet(wallet_id)?;
        Ok(WalletSummary {
            wallet_id: wallet.id.clone(),
            name: wallet.name.clone(),
            description: wallet.description(),
            owner_count: wallet.owner_count(),
            threshold: wallet.threshold,
            balance: wallet.balance,
            transactions: self.ledger.status_counts(wallet_id),
        })
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Propose a new transaction from a multisig wallet
    pub fn propose_transaction(
        &mut self,
        wallet_id: &str,
        proposer: &str,
        recipient: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Transaction, MultisigError> {
        let wallet = self.registry.get_wallet(wallet_id)?;
        self.ledger
            .propose(wallet, proposer, recipient, amount, description)
            .cloned()
    }

    /// Get a transaction by id
    pub fn get_transaction(&self, tx_id: &str) -> Result<&Transaction, MultisigError> {
        self.ledger.get(tx_id)
    }

    /// Approve a transaction
    pub fn approve(&mut self, tx_id: &str, identity: &str) -> Result<Transaction, MultisigError> {
        let wallet_id = self.wallet_id_of(tx_id)?;
        let wallet = self.registry.get_wallet(&wallet_id)?;
        self.ledger
            .approve(tx_id, identity, wallet)
            .cloned()
    }

    /// Reject a transaction
    pub fn reject(&mut self, tx_id: &str, identity: &str) -> Result<Transaction, MultisigError> {
        let wallet_id = self.wallet_id_of(tx_id)?;
        let wallet = self.registry.get_wallet(&wallet_id)?;
        self.ledger
            .reject(tx_id, identity, wallet)
            .cloned()
    }

    /// Execute an approved transaction
    pub fn execute(&mut self, tx_id: &str, executor: &str) -> Result<Transaction, MultisigError> {
        let wallet_id = self.wallet_id_of(tx_id)?;
        let wallet = self.registry.get_wallet(&wallet_id)?;
        self.ledger
            .execute(tx_id, executor, wallet)
            .cloned()
    }

    /// List a wallet's transactions, oldest first
    pub fn list_by_wallet(
        &self,
        wallet_id: &str,
        status: Option<TransactionStatus>,
    ) -> Result<Vec<&Transaction>, MultisigError> {
        self.registry.get_wallet(wallet_id)?;
        Ok(self.ledger.list_by_wallet(wallet_id, status))
    }

    /// Get transaction count
    pub fn transaction_count(&self) -> usize {
        self.ledger.transaction_count()
    }

    fn wallet_id_of(&self, tx_id: &str) -> Result<String, MultisigError> {
        Ok(self.ledger.get(tx_id)?.wallet_id.clone())
    }

    /// Re-check every invariant across wallets and transactions
    ///
    /// Used after loading a snapshot; a violation means the snapshot must
    /// be rejected.
    pub fn verify_integrity(&self) -> Result<(), MultisigError> {
        self.registry.verify_integrity()?;
        self.ledger
            .verify_integrity(|id| self.registry.get_wallet(id).ok())
    }
}
