//! Multi-owner quorum authorization
//!
//! Wallets carry an owner set and an M-of-N approval threshold. Transfers
//! proposed against a wallet execute only once M distinct owners have
//! approved them; a single rejection vetoes the transfer.
//!
//! # Example
//!
//! ```
//! use quorum_vault::multisig::{MultisigManager, TransactionStatus};
//! use rust_decimal::Decimal;
//!
//! let mut manager = MultisigManager::new();
//! let owners = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
//! let wallet = manager.create_wallet("Treasury", owners, 2).unwrap();
//!
//! // The proposer's approval is recorded automatically
//! let tx = manager
//!     .propose_transaction(&wallet.id, "alice", "0xdead", Decimal::new(5, 0), "Audit fee")
//!     .unwrap();
//! assert_eq!(tx.status, TransactionStatus::Pending);
//!
//! let tx = manager.approve(&tx.id, "bob").unwrap();
//! assert_eq!(tx.status, TransactionStatus::Approved);
//!
//! let tx = manager.execute(&tx.id, "carol").unwrap();
//! assert_eq!(tx.status, TransactionStatus::Executed);
//! ```

pub mod error;
pub mod ledger;
pub mod manager;
pub mod quorum;
pub mod registry;
pub mod transaction;
pub mod wallet;

pub use error::{ErrorKind, MultisigError};
pub use ledger::{StatusChange, StatusCounts, TransactionLedger};
pub use manager::{MultisigManager, WalletSummary};
pub use quorum::evaluate;
pub use registry::WalletRegistry;
pub use transaction::{Transaction, TransactionAction, TransactionStatus};
pub use wallet::Wallet;
