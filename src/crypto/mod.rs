//! Cryptographic utilities
//!
//! SHA-256 hashing used to derive wallet addresses.

pub mod hash;

pub use hash::{sha256, sha256_hex, short_hex_digest};
