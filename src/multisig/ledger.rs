//! Transaction ledger
//!
//! Owns transaction records and drives the approval state machine. Every
//! state-changing call takes the owning wallet so membership and threshold
//! are always read from the registry's current record.

use crate::multisig::error::MultisigError;
use crate::multisig::registry::check_issued_id;
use crate::multisig::transaction::{Transaction, TransactionStatus};
use crate::multisig::wallet::Wallet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-status transaction counts for one wallet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub executed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.executed
    }

    fn bump(&mut self, status: TransactionStatus) {
        match status {
            TransactionStatus::Pending => self.pending += 1,
            TransactionStatus::Approved => self.approved += 1,
            TransactionStatus::Rejected => self.rejected += 1,
            TransactionStatus::Executed => self.executed += 1,
        }
    }
}

/// A status change caused by re-evaluating open transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub tx_id: String,
    pub from: TransactionStatus,
    pub to: TransactionStatus,
}

/// Owns every transaction record
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransactionLedger {
    /// Transactions by id
    transactions: HashMap<String, Transaction>,
    /// Creation order
    order: Vec<String>,
    /// Counter for id generation
    nonce: u64,
}

impl TransactionLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose a new transaction against a wallet
    pub fn propose(
        &mut self,
        wallet: &Wallet,
        proposer: &str,
        recipient: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<&Transaction, MultisigError> {
        let id = format!("tx-{}", self.nonce + 1);
        if self.transactions.contains_key(&id) {
            return Err(MultisigError::validation(format!(
                "transaction id {} is already taken",
                id
            )));
        }
        let tx = Transaction::propose(id, wallet, proposer, recipient, amount, description)?;

        self.nonce += 1;
        self.order.push(tx.id.clone());

        log::info!(
            "Transaction {} proposed on {} by {}: {} to {} ({})",
            tx.id,
            wallet.id,
            proposer,
            tx.amount,
            tx.recipient,
            tx.status
        );

        let id = tx.id.clone();
        Ok(&*self.transactions.entry(id).or_insert(tx))
    }

    /// Get a transaction by id
    pub fn get(&self, tx_id: &str) -> Result<&Transaction, MultisigError> {
        self.transactions
            .get(tx_id)
            .ok_or_else(|| MultisigError::transaction_not_found(tx_id))
    }

    fn get_for_wallet(
        &mut self,
        tx_id: &str,
        wallet: &Wallet,
    ) -> Result<&mut Transaction, MultisigError> {
        let tx = self
            .transactions
            .get_mut(tx_id)
            .ok_or_else(|| MultisigError::transaction_not_found(tx_id))?;
        if tx.wallet_id != wallet.id {
            return Err(MultisigError::transaction_not_found(tx_id));
        }
        Ok(tx)
    }

    /// Record an owner's approval
    pub fn approve(
        &mut self,
        tx_id: &str,
        identity: &str,
        wallet: &Wallet,
    ) -> Result<&Transaction, MultisigError> {
        let tx = self.get_for_wallet(tx_id, wallet)?;
        let before = tx.status;
        let after = tx.approve(identity, wallet)?;

        log::debug!(
            "Transaction {} approved by {} ({}/{})",
            tx_id,
            identity,
            tx.approvals.len(),
            wallet.threshold
        );
        if before != after && after == TransactionStatus::Approved {
            log::info!("Transaction {} reached quorum", tx_id);
        }

        Ok(&*tx)
    }

    /// Record an owner's rejection
    pub fn reject(
        &mut self,
        tx_id: &str,
        identity: &str,
        wallet: &Wallet,
    ) -> Result<&Transaction, MultisigError> {
        let tx = self.get_for_wallet(tx_id, wallet)?;
        tx.reject(identity, wallet)?;

        log::info!("Transaction {} rejected by {}", tx_id, identity);
        Ok(&*tx)
    }

    /// Execute an approved transaction
    pub fn execute(
        &mut self,
        tx_id: &str,
        executor: &str,
        wallet: &Wallet,
    ) -> Result<&Transaction, MultisigError> {
        let tx = self.get_for_wallet(tx_id, wallet)?;
        tx.execute(executor, wallet)?;

        log::info!(
            "Transaction {} executed by {}: {} to {}",
            tx_id,
            executor,
            tx.amount,
            tx.recipient
        );
        Ok(&*tx)
    }

    /// Transactions of a wallet ordered by creation time, optionally
    /// filtered by status
    pub fn list_by_wallet(
        &self,
        wallet_id: &str,
        status: Option<TransactionStatus>,
    ) -> Vec<&Transaction> {
        let mut txs: Vec<&Transaction> = self
            .order
            .iter()
            .filter_map(|id| self.transactions.get(id))
            .filter(|tx| tx.wallet_id == wallet_id)
            .filter(|tx| status.map_or(true, |s| tx.status == s))
            .collect();

        // Stable: ties keep proposal order
        txs.sort_by_key(|tx| tx.created_at);
        txs
    }

    /// Count a wallet's transactions per status
    pub fn status_counts(&self, wallet_id: &str) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for tx in self.transactions.values().filter(|tx| tx.wallet_id == wallet_id) {
            counts.bump(tx.status);
        }
        counts
    }

    /// Re-evaluate every open transaction of a wallet after its owner set
    /// or threshold changed
    pub fn reevaluate_wallet(&mut self, wallet: &Wallet) -> Vec<StatusChange> {
        let mut changes = Vec::new();

        for id in &self.order {
            let Some(tx) = self.transactions.get_mut(id) else {
                continue;
            };
            if tx.wallet_id != wallet.id {
                continue;
            }

            let from = tx.status;
            if tx.reevaluate(wallet) {
                log::info!("Transaction {} moved from {} to {}", tx.id, from, tx.status);
                changes.push(StatusChange {
                    tx_id: tx.id.clone(),
                    from,
                    to: tx.status,
                });
            }
        }

        changes
    }

    /// Get transaction count
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Re-check every transaction against its wallet
    pub fn verify_integrity<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a Wallet>,
    ) -> Result<(), MultisigError> {
        if self.order.len() != self.transactions.len() {
            return Err(MultisigError::validation(
                "transaction order does not match transaction records",
            ));
        }

        for id in &self.order {
            let tx = self.transactions.get(id).ok_or_else(|| {
                MultisigError::validation(format!("transaction {} missing from records", id))
            })?;
            if &tx.id != id {
                return Err(MultisigError::validation(format!(
                    "transaction stored under {} claims id {}",
                    id, tx.id
                )));
            }
            check_issued_id(id, "tx-", self.nonce)?;
            let wallet = lookup(&tx.wallet_id).ok_or_else(|| {
                MultisigError::validation(format!(
                    "transaction {} references unknown wallet {}",
                    tx.id, tx.wallet_id
                ))
            })?;
            tx.check_invariants(wallet)?;
        }
        Ok(())
    }
}
