//! Proposed transfer awaiting owner approval
//!
//! A transaction is created `Pending` with the proposer's approval already
//! recorded. Owners then approve or reject it; after every action the
//! status is recomputed by [`quorum::evaluate`](crate::multisig::quorum::evaluate).
//! `Rejected` and `Executed` are terminal.

use crate::multisig::error::MultisigError;
use crate::multisig::quorum;
use crate::multisig::wallet::Wallet;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Status of a multisig transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting for more approvals
    Pending,
    /// Has enough approvals, ready to execute
    Approved,
    /// Vetoed by an owner
    Rejected,
    /// Carried out
    Executed,
}

/// Actions an owner can take on a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionAction {
    Approve,
    Reject,
    Execute,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Approved,
        TransactionStatus::Rejected,
        TransactionStatus::Executed,
    ];

    /// Whether no further action is accepted
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Executed)
    }

    /// Transition table: which actions a status accepts
    pub fn permits(self, action: TransactionAction) -> bool {
        match (self, action) {
            (Self::Pending | Self::Approved, TransactionAction::Approve) => true,
            (Self::Pending | Self::Approved, TransactionAction::Reject) => true,
            (Self::Approved, TransactionAction::Execute) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = MultisigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "executed" => Ok(Self::Executed),
            other => Err(MultisigError::validation(format!(
                "unknown transaction status: {}",
                other
            ))),
        }
    }
}

/// A transaction proposed against a multisig wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Ledger-assigned identifier
    pub id: String,
    /// Owning wallet
    pub wallet_id: String,
    /// Destination identity
    pub recipient: String,
    /// Amount to send
    pub amount: Decimal,
    /// What the transfer is for
    pub description: String,
    /// Owner who proposed it
    pub proposer: String,
    /// Owners who approved
    pub approvals: BTreeSet<String>,
    /// Owners who rejected
    pub rejections: BTreeSet<String>,
    /// Current status
    pub status: TransactionStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Set once, when the transaction is executed
    pub executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Create a new pending transaction with the proposer's approval recorded
    ///
    /// The proposer must own `wallet`. The initial status is evaluated
    /// immediately, so a 1-of-N wallet yields an `Approved` transaction.
    pub fn propose(
        id: String,
        wallet: &Wallet,
        proposer: &str,
        recipient: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Self, MultisigError> {
        if amount <= Decimal::ZERO {
            return Err(MultisigError::validation(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(MultisigError::validation("recipient must not be empty"));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(MultisigError::validation("description must not be empty"));
        }

        if !wallet.is_owner(proposer) {
            return Err(MultisigError::not_an_owner(&wallet.id, proposer));
        }

        let mut approvals = BTreeSet::new();
        approvals.insert(proposer.to_string());
        let rejections = BTreeSet::new();
        let status = quorum::evaluate(
            wallet.threshold,
            &approvals,
            &rejections,
            TransactionStatus::Pending,
        );

        Ok(Self {
            id,
            wallet_id: wallet.id.clone(),
            recipient: recipient.to_string(),
            amount,
            description: description.to_string(),
            proposer: proposer.to_string(),
            approvals,
            rejections,
            status,
            created_at: Utc::now(),
            executed_at: None,
        })
    }

    fn guard(&self, action: TransactionAction) -> Result<(), MultisigError> {
        if !self.status.permits(action) {
            return Err(MultisigError::TerminalState {
                tx_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn check_actor(&self, identity: &str, wallet: &Wallet) -> Result<(), MultisigError> {
        if !wallet.is_owner(identity) {
            return Err(MultisigError::not_an_owner(&wallet.id, identity));
        }
        if self.approvals.contains(identity) {
            return Err(self.duplicate(identity, "approved"));
        }
        if self.rejections.contains(identity) {
            return Err(self.duplicate(identity, "rejected"));
        }
        Ok(())
    }

    fn duplicate(&self, identity: &str, action: &'static str) -> MultisigError {
        MultisigError::DuplicateAction {
            tx_id: self.id.clone(),
            identity: identity.to_string(),
            action,
        }
    }

    /// Record an approval and re-evaluate the status
    ///
    /// An owner who already approved or rejected cannot act again; state
    /// is left untouched on every error path.
    pub fn approve(
        &mut self,
        identity: &str,
        wallet: &Wallet,
    ) -> Result<TransactionStatus, MultisigError> {
        self.guard(TransactionAction::Approve)?;
        self.check_actor(identity, wallet)?;

        self.approvals.insert(identity.to_string());
        self.reevaluate(wallet);
        Ok(self.status)
    }

    /// Record a rejection; a single rejection vetoes the transaction
    pub fn reject(
        &mut self,
        identity: &str,
        wallet: &Wallet,
    ) -> Result<TransactionStatus, MultisigError> {
        self.guard(TransactionAction::Reject)?;
        self.check_actor(identity, wallet)?;

        self.rejections.insert(identity.to_string());
        self.reevaluate(wallet);
        Ok(self.status)
    }

    /// Mark an approved transaction as executed
    ///
    /// Approvals are re-counted against the wallet's current owners and
    /// threshold before the transition is made.
    pub fn execute(&mut self, executor: &str, wallet: &Wallet) -> Result<(), MultisigError> {
        if self.status.is_terminal() {
            return Err(MultisigError::TerminalState {
                tx_id: self.id.clone(),
                status: self.status,
            });
        }
        if !wallet.is_owner(executor) {
            return Err(MultisigError::not_an_owner(&wallet.id, executor));
        }

        let have = self.valid_approvals(wallet);
        if self.status != TransactionStatus::Approved || have < wallet.threshold {
            return Err(MultisigError::QuorumNotMet {
                tx_id: self.id.clone(),
                have,
                need: wallet.threshold,
            });
        }

        self.status = TransactionStatus::Executed;
        self.executed_at = Some(Utc::now());
        Ok(())
    }

    /// Drop approvals from identities that no longer own the wallet and
    /// recompute the status. Terminal transactions are left alone.
    ///
    /// Returns true if the status changed.
    pub fn reevaluate(&mut self, wallet: &Wallet) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.approvals.retain(|a| wallet.is_owner(a));
        let next = quorum::evaluate(
            wallet.threshold,
            &self.approvals,
            &self.rejections,
            self.status,
        );
        let changed = next != self.status;
        self.status = next;
        changed
    }

    /// Approvals held by current owners of the wallet
    pub fn valid_approvals(&self, wallet: &Wallet) -> usize {
        self.approvals.iter().filter(|a| wallet.is_owner(a)).count()
    }

    /// How many more approvals from current owners are needed to reach
    /// quorum
    pub fn approvals_remaining(&self, wallet: &Wallet) -> usize {
        wallet.threshold.saturating_sub(self.valid_approvals(wallet))
    }

    /// Whether this identity has approved or rejected already
    pub fn has_acted(&self, identity: &str) -> bool {
        self.approvals.contains(identity) || self.rejections.contains(identity)
    }

    /// Whether an execute call would currently succeed
    pub fn can_execute(&self, wallet: &Wallet) -> bool {
        self.status == TransactionStatus::Approved
            && self.valid_approvals(wallet) >= wallet.threshold
    }

    /// Re-check every transaction invariant against its wallet, used when
    /// loading a snapshot
    pub fn check_invariants(&self, wallet: &Wallet) -> Result<(), MultisigError> {
        let invalid = |msg: &str| {
            Err(MultisigError::validation(format!(
                "transaction {}: {}",
                self.id, msg
            )))
        };

        if self.amount <= Decimal::ZERO {
            return invalid("amount must be positive");
        }
        if self.recipient.trim().is_empty() {
            return invalid("recipient is empty");
        }
        if self.description.trim().is_empty() {
            return invalid("description is empty");
        }
        if self.approvals.intersection(&self.rejections).next().is_some() {
            return invalid("an identity both approved and rejected");
        }
        if self.executed_at.is_some() != (self.status == TransactionStatus::Executed) {
            return invalid("executed_at must be set exactly when executed");
        }
        if self.status == TransactionStatus::Rejected && self.rejections.is_empty() {
            return invalid("rejected without any rejection");
        }
        if !self.status.is_terminal() {
            if let Some(stranger) = self.approvals.iter().find(|a| !wallet.is_owner(a)) {
                return invalid(&format!("approval from non-owner {}", stranger));
            }
            let expected =
                quorum::evaluate(wallet.threshold, &self.approvals, &self.rejections, self.status);
            if expected != self.status {
                return invalid(&format!(
                    "status {} disagrees with quorum ({})",
                    self.status, expected
                ));
            }
        }
        Ok(())
    }
}
