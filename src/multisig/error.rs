//! Error taxonomy for the quorum engine
//!
//! Every failing operation returns one of these synchronously. None of them
//! are fatal; each is scoped to the call that produced it.

use crate::multisig::transaction::TransactionStatus;
use serde::Serialize;
use thiserror::Error;

/// Errors related to multisig wallet and transaction operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{identity} is not an owner of wallet {wallet_id}")]
    NotAnOwner { wallet_id: String, identity: String },
    #[error("{identity} has already {action} transaction {tx_id}")]
    DuplicateAction {
        tx_id: String,
        identity: String,
        action: &'static str,
    },
    #[error("Transaction {tx_id} is {status} and accepts no further actions")]
    TerminalState {
        tx_id: String,
        status: TransactionStatus,
    },
    #[error("Quorum not met for transaction {tx_id}: have {have}, need {need}")]
    QuorumNotMet {
        tx_id: String,
        have: usize,
        need: usize,
    },
}

/// Coarse classification of a [`MultisigError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    NotAnOwner,
    DuplicateAction,
    TerminalState,
    QuorumNotMet,
}

impl MultisigError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn wallet_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Wallet",
            id: id.to_string(),
        }
    }

    pub(crate) fn transaction_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Transaction",
            id: id.to_string(),
        }
    }

    pub(crate) fn not_an_owner(wallet_id: &str, identity: &str) -> Self {
        Self::NotAnOwner {
            wallet_id: wallet_id.to_string(),
            identity: identity.to_string(),
        }
    }

    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotAnOwner { .. } => ErrorKind::NotAnOwner,
            Self::DuplicateAction { .. } => ErrorKind::DuplicateAction,
            Self::TerminalState { .. } => ErrorKind::TerminalState,
            Self::QuorumNotMet { .. } => ErrorKind::QuorumNotMet,
        }
    }
}
