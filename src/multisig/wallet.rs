//! Multi-owner wallet record
//!
//! A wallet holds the owner set and approval threshold that every
//! transaction against it is measured by. The invariant
//! `1 <= threshold <= owners.len()` is checked on creation and before
//! every owner-set or threshold mutation is applied.

use crate::crypto::short_hex_digest;
use crate::multisig::error::MultisigError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A multi-owner wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    /// Registry-assigned identifier
    pub id: String,
    /// Display label
    pub name: String,
    /// Chain address, derived once at creation
    pub address: String,
    /// Signer identities allowed to propose, approve and reject
    pub owners: Vec<String>,
    /// Approvals required before a transaction may execute
    pub threshold: usize,
    /// Display-only balance
    pub balance: Decimal,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with a zero balance
    ///
    /// # Errors
    /// Returns `Validation` if the name is empty, the owner list is empty
    /// or has duplicates, or the threshold is out of range.
    pub fn new(
        id: String,
        name: &str,
        owners: Vec<String>,
        threshold: usize,
    ) -> Result<Self, MultisigError> {
        let name = validate_name(name)?;
        let owners = validate_owners(owners)?;
        validate_threshold(threshold, owners.len())?;

        let address = derive_address(&id, &owners, threshold);

        Ok(Self {
            id,
            name,
            address,
            owners,
            threshold,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        })
    }

    /// Check if an identity is one of the owners
    pub fn is_owner(&self, identity: &str) -> bool {
        self.owners.iter().any(|o| o == identity)
    }

    /// Get the total number of owners
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    /// Change the display label
    pub fn rename(&mut self, name: &str) -> Result<(), MultisigError> {
        self.name = validate_name(name)?;
        Ok(())
    }

    /// Add an owner to the owner set
    pub fn add_owner(&mut self, owner: &str) -> Result<(), MultisigError> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(MultisigError::validation("owner identity must not be empty"));
        }
        if self.is_owner(owner) {
            return Err(MultisigError::validation(format!(
                "{} is already an owner",
                owner
            )));
        }
        self.owners.push(owner.to_string());
        Ok(())
    }

    /// Remove an owner from the owner set
    ///
    /// The owner set must stay at least as large as the threshold.
    pub fn remove_owner(&mut self, owner: &str) -> Result<(), MultisigError> {
        let owner = owner.trim();
        let index = self
            .owners
            .iter()
            .position(|o| o == owner)
            .ok_or_else(|| MultisigError::not_an_owner(&self.id, owner))?;

        let remaining = self.owners.len() - 1;
        if remaining == 0 {
            return Err(MultisigError::validation(
                "cannot remove the last owner of a wallet",
            ));
        }
        validate_threshold(self.threshold, remaining)?;

        self.owners.remove(index);
        Ok(())
    }

    /// Change the approval threshold
    pub fn set_threshold(&mut self, threshold: usize) -> Result<(), MultisigError> {
        validate_threshold(threshold, self.owners.len())?;
        self.threshold = threshold;
        Ok(())
    }

    /// Update the display balance
    pub fn set_balance(&mut self, balance: Decimal) -> Result<(), MultisigError> {
        if balance < Decimal::ZERO {
            return Err(MultisigError::validation(format!(
                "balance must not be negative, got {}",
                balance
            )));
        }
        self.balance = balance;
        Ok(())
    }

    /// Re-check every wallet invariant, used when loading a snapshot
    pub fn check_invariants(&self) -> Result<(), MultisigError> {
        if validate_name(&self.name)? != self.name {
            return Err(MultisigError::validation(format!(
                "wallet {} name has surrounding whitespace",
                self.id
            )));
        }
        if validate_owners(self.owners.clone())? != self.owners {
            return Err(MultisigError::validation(format!(
                "wallet {} owner identities have surrounding whitespace",
                self.id
            )));
        }
        validate_threshold(self.threshold, self.owners.len())?;
        if self.address.is_empty() {
            return Err(MultisigError::validation(format!(
                "wallet {} has no address",
                self.id
            )));
        }
        if self.balance < Decimal::ZERO {
            return Err(MultisigError::validation(format!(
                "wallet {} has a negative balance",
                self.id
            )));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, MultisigError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MultisigError::validation("wallet name must not be empty"));
    }
    Ok(name.to_string())
}

fn validate_owners(owners: Vec<String>) -> Result<Vec<String>, MultisigError> {
    if owners.is_empty() {
        return Err(MultisigError::validation(
            "a wallet needs at least one owner",
        ));
    }

    let owners: Vec<String> = owners.into_iter().map(|o| o.trim().to_string()).collect();
    if owners.iter().any(|o| o.is_empty()) {
        return Err(MultisigError::validation("owner identity must not be empty"));
    }

    let mut seen = HashSet::new();
    for owner in &owners {
        if !seen.insert(owner.as_str()) {
            return Err(MultisigError::validation(format!(
                "duplicate owner: {}",
                owner
            )));
        }
    }

    Ok(owners)
}

fn validate_threshold(threshold: usize, owner_count: usize) -> Result<(), MultisigError> {
    if threshold == 0 {
        return Err(MultisigError::validation("threshold must be at least 1"));
    }
    if threshold > owner_count {
        return Err(MultisigError::validation(format!(
            "threshold {} exceeds owner count {}",
            threshold, owner_count
        )));
    }
    Ok(())
}

/// Address = "0x" + first 40 hex chars of SHA256(id : sorted owners : threshold)
fn derive_address(id: &str, owners: &[String], threshold: usize) -> String {
    let mut sorted = owners.to_vec();
    sorted.sort();

    let input = format!("{}:{}:{}", id, sorted.join(","), threshold);
    short_hex_digest(input.as_bytes(), 40)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wallet_creation() {
        let wallet =
            Wallet::new("wallet-1".into(), "Treasury", owners(&["A", "B", "C"]), 2).unwrap();

        assert_eq!(wallet.threshold, 2);
        assert_eq!(wallet.owner_count(), 3);
        assert_eq!(wallet.description(), "2-of-3");
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert!(wallet.address.starts_with("0x"));
        assert_eq!(wallet.address.len(), 42);
    }

    #[test]
    fn test_creation_validation() {
        // Empty name
        assert!(Wallet::new("w".into(), "  ", owners(&["A"]), 1).is_err());

        // No owners
        assert!(Wallet::new("w".into(), "Fund", vec![], 1).is_err());

        // Zero threshold
        assert!(Wallet::new("w".into(), "Fund", owners(&["A"]), 0).is_err());

        // Threshold above owner count
        let result = Wallet::new("w".into(), "Fund", owners(&["A"]), 2);
        assert!(matches!(result, Err(MultisigError::Validation(_))));

        // Duplicate owners
        assert!(Wallet::new("w".into(), "Fund", owners(&["A", "A"]), 1).is_err());

        // A single owner with threshold 1 is fine
        assert!(Wallet::new("w".into(), "Solo", owners(&["A"]), 1).is_ok());
    }

    #[test]
    fn test_address_depends_on_id() {
        let w1 = Wallet::new("wallet-1".into(), "X", owners(&["A", "B"]), 1).unwrap();
        let w2 = Wallet::new("wallet-2".into(), "X", owners(&["A", "B"]), 1).unwrap();
        let w1_again = Wallet::new("wallet-1".into(), "Y", owners(&["B", "A"]), 1).unwrap();

        assert_ne!(w1.address, w2.address);
        assert_eq!(w1.address, w1_again.address);
    }

    #[test]
    fn test_owner_mutations_keep_threshold_valid() {
        let mut wallet =
            Wallet::new("wallet-1".into(), "Ops", owners(&["A", "B"]), 2).unwrap();

        // Removing would leave 1 owner for a threshold of 2
        assert!(matches!(
            wallet.remove_owner("B"),
            Err(MultisigError::Validation(_))
        ));
        assert_eq!(wallet.owner_count(), 2);

        wallet.add_owner("C").unwrap();
        assert!(wallet.add_owner("C").is_err());
        wallet.remove_owner("B").unwrap();
        assert_eq!(wallet.owners, owners(&["A", "C"]));

        assert!(matches!(
            wallet.remove_owner("Z"),
            Err(MultisigError::NotAnOwner { .. })
        ));
    }

    #[test]
    fn test_threshold_and_balance_updates() {
        let mut wallet =
            Wallet::new("wallet-1".into(), "Ops", owners(&["A", "B", "C"]), 2).unwrap();

        wallet.set_threshold(3).unwrap();
        assert!(wallet.set_threshold(4).is_err());
        assert!(wallet.set_threshold(0).is_err());
        assert_eq!(wallet.threshold, 3);

        wallet.set_balance(Decimal::new(1575, 2)).unwrap();
        assert!(wallet.set_balance(Decimal::NEGATIVE_ONE).is_err());
        assert_eq!(wallet.balance, Decimal::new(1575, 2));
    }

    #[test]
    fn test_owner_identities_are_trimmed_both_ways() {
        let mut wallet =
            Wallet::new("wallet-1".into(), "Ops", owners(&["A", "B"]), 1).unwrap();

        wallet.add_owner(" D ").unwrap();
        assert!(wallet.is_owner("D"));
        wallet.remove_owner(" D ").unwrap();
        assert_eq!(wallet.owners, owners(&["A", "B"]));
        assert!(wallet.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_reject_untrimmed_stored_values() {
        let mut wallet =
            Wallet::new("wallet-1".into(), "Ops", owners(&["A", "B"]), 1).unwrap();
        wallet.owners[0] = " A".to_string();
        assert!(matches!(
            wallet.check_invariants(),
            Err(MultisigError::Validation(_))
        ));

        wallet.owners[0] = "A".to_string();
        wallet.name = "Ops ".to_string();
        assert!(wallet.check_invariants().is_err());
    }

    #[test]
    fn test_last_owner_cannot_be_removed() {
        let mut wallet = Wallet::new("wallet-1".into(), "Solo", owners(&["A"]), 1).unwrap();
        assert!(wallet.remove_owner("A").is_err());
    }
}
