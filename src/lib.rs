//! Quorum Vault: multi-owner wallets with M-of-N transaction approval
//!
//! This crate provides:
//! - Wallets owned by a set of identities with an approval threshold
//! - A transaction approval state machine (pending, approved, rejected,
//!   executed) with single-rejection veto
//! - JSON persistence that re-validates every invariant on load
//! - A `vault` CLI and an axum REST API over the same engine
//!
//! # Example
//!
//! ```rust
//! use quorum_vault::multisig::{MultisigManager, TransactionStatus};
//! use rust_decimal::Decimal;
//!
//! let mut manager = MultisigManager::new();
//! let owners = vec!["alice".to_string(), "bob".to_string()];
//! let wallet = manager.create_wallet("Ops", owners, 2).unwrap();
//! println!("{} at {}", wallet.description(), wallet.address);
//!
//! let tx = manager
//!     .propose_transaction(&wallet.id, "alice", "0xbeef", Decimal::new(250, 2), "Hosting")
//!     .unwrap();
//!
//! // A single rejection vetoes the transaction
//! let tx = manager.reject(&tx.id, "bob").unwrap();
//! assert_eq!(tx.status, TransactionStatus::Rejected);
//! ```

pub mod api;
pub mod cli;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use multisig::{
    MultisigError, MultisigManager, Transaction, TransactionStatus, Wallet, WalletSummary,
};
pub use storage::{Storage, StorageConfig, StorageError};
