//! SHA-256 hashing helpers
//!
//! Wallet addresses are derived from a SHA-256 digest of the wallet's id,
//! owner set and threshold.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Hex digest truncated to `len` characters with a `0x` prefix
pub fn short_hex_digest(data: &[u8], len: usize) -> String {
    let digest = sha256_hex(data);
    format!("0x{}", &digest[..len.min(digest.len())])
}
