//! Quorum evaluation
//!
//! Pure decision logic: given a threshold and the approval/rejection sets
//! of a transaction, compute the status it should be in. Nothing here
//! touches ledger state, so quorum arithmetic can be checked in isolation.

use crate::multisig::transaction::TransactionStatus;
use std::collections::BTreeSet;

/// Compute the status a transaction should hold
///
/// - terminal statuses (`Rejected`, `Executed`) are returned unchanged
/// - any rejection vetoes the transaction
/// - otherwise the transaction is `Approved` once `approvals.len() >= threshold`
pub fn evaluate(
    threshold: usize,
    approvals: &BTreeSet<String>,
    rejections: &BTreeSet<String>,
    current: TransactionStatus,
) -> TransactionStatus {
    if current.is_terminal() {
        return current;
    }

    if !rejections.is_empty() {
        return TransactionStatus::Rejected;
    }

    if approvals.len() >= threshold {
        TransactionStatus::Approved
    } else {
        TransactionStatus::Pending
    }
}
