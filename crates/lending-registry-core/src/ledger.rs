//! Loan ledger: which account currently holds which item.
//!
//! An account holds at most one item at a time. Entries are opened by a
//! successful borrow and closed by a successful return, nothing else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::types::{AccountId, ItemKey};

/// Active loans keyed by borrower.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLedger {
    loans: BTreeMap<AccountId, ItemKey>,
}

impl LoanLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The item `borrower` currently holds, if any.
    pub fn active(&self, borrower: &AccountId) -> Option<ItemKey> {
        self.loans.get(borrower).copied()
    }

    /// Fail if `borrower` already holds an item.
    pub fn ensure_free(&self, borrower: &AccountId) -> Result<(), StateError> {
        match self.active(borrower) {
            Some(key) => Err(StateError::AlreadyBorrowing {
                borrower: *borrower,
                key,
            }),
            None => Ok(()),
        }
    }

    /// Record that `borrower` now holds `key`.
    pub fn open(&mut self, borrower: AccountId, key: ItemKey) -> Result<(), StateError> {
        self.ensure_free(&borrower)?;
        self.loans.insert(borrower, key);
        Ok(())
    }

    /// Close the loan of `borrower`, returning the item it held.
    pub fn close(&mut self, borrower: &AccountId) -> Result<ItemKey, StateError> {
        self.loans
            .remove(borrower)
            .ok_or(StateError::NoActiveLoan(*borrower))
    }

    /// Number of active loans.
    pub fn len(&self) -> usize {
        self.loans.len()
    }

    /// Whether no loans are active.
    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    /// Number of active loans on `key`.
    pub fn count_of(&self, key: &ItemKey) -> usize {
        self.loans.values().filter(|k| *k == key).count()
    }

    /// All active loans, ordered by borrower.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &ItemKey)> {
        self.loans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_loan_per_account() {
        let mut ledger = LoanLedger::new();
        let alice = AccountId::from_bytes([1; 20]);

        ledger.open(alice, ItemKey::new(1)).unwrap();
        let err = ledger.open(alice, ItemKey::new(2)).unwrap_err();

        assert_eq!(
            err,
            StateError::AlreadyBorrowing {
                borrower: alice,
                key: ItemKey::new(1)
            }
        );
        assert_eq!(ledger.active(&alice), Some(ItemKey::new(1)));
    }

    #[test]
    fn test_close_without_loan() {
        let mut ledger = LoanLedger::new();
        let bob = AccountId::from_bytes([2; 20]);

        assert_eq!(ledger.close(&bob), Err(StateError::NoActiveLoan(bob)));
    }

    #[test]
    fn test_close_clears_entry() {
        let mut ledger = LoanLedger::new();
        let carol = AccountId::from_bytes([3; 20]);

        ledger.open(carol, ItemKey::new(5)).unwrap();
        assert_eq!(ledger.count_of(&ItemKey::new(5)), 1);
        assert_eq!(ledger.close(&carol).unwrap(), ItemKey::new(5));
        assert!(ledger.is_empty());
        assert_eq!(ledger.active(&carol), None);
    }
}
