//! REST API module
//!
//! HTTP access to the vault. Every mutating endpoint takes the manager's
//! write lock, applies the change, and saves the vault before responding.
//!
//! # Endpoints
//!
//! ## Wallets
//! - `GET /api/wallets` - List wallets
//! - `POST /api/wallets` - Create wallet
//! - `GET /api/wallets/{id}` - Get wallet
//! - `GET /api/wallets/{id}/summary` - Per-status transaction counts
//! - `POST /api/wallets/{id}/rename|owners|owners/remove|threshold|balance`
//! - `GET /api/owners/{identity}/wallets` - Wallets of an owner
//!
//! ## Transactions
//! - `GET /api/wallets/{id}/transactions?status=` - List transactions
//! - `POST /api/wallets/{id}/transactions` - Propose transaction
//! - `GET /api/transactions/{id}` - Get transaction
//! - `POST /api/transactions/{id}/approve|reject|execute`

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::{create_router, ROUTE_TABLE};
