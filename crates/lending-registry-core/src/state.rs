//! Registry state: the catalog, the loan ledger and the deposit tally,
//! advanced one validated transition at a time.
//!
//! Every transition checks all of its preconditions before touching any
//! field, so a rejected call leaves the state exactly as it was. Access
//! control is not checked here; callers gate admin-only transitions.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::deposit::{Deposit, DepositTally};
use crate::error::{CoreError, StateError};
use crate::event::{EventRecord, RegistryEvent};
use crate::keys::KeyStrategy;
use crate::ledger::LoanLedger;
use crate::types::{AccountId, Amount, ItemKey, BORROW_FEE};

/// Which keys count as available books.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// Every key ever stocked, even if all units are out.
    #[default]
    EverStocked,
    /// Only keys with at least one unit on the shelf.
    InStock,
}

/// All persisted registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RegistryState<K: KeyStrategy> {
    keys: K,
    catalog: Catalog,
    ledger: LoanLedger,
    deposits: DepositTally,
    last_seq: u64,
}

impl<K: KeyStrategy> Default for RegistryState<K> {
    fn default() -> Self {
        Self {
            keys: K::default(),
            catalog: Catalog::new(),
            ledger: LoanLedger::new(),
            deposits: DepositTally::default(),
            last_seq: 0,
        }
    }
}

impl<K: KeyStrategy> RegistryState<K> {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Add `qty` units of the item `input` resolves to.
    pub fn stock(&mut self, input: &K::Input, qty: u64) -> Result<RegistryEvent, StateError> {
        if qty == 0 {
            return Err(StateError::InvalidQuantity);
        }
        let resolved = self.keys.resolve(input)?;
        let key = resolved.key;
        if self.catalog.stock_of(&key).checked_add(qty).is_none() {
            return Err(StateError::StockOverflow(key));
        }

        self.keys.record(input, resolved);
        let stock = self.catalog.restock(key, qty)?;
        Ok(RegistryEvent::Stocked {
            key,
            quantity: qty,
            stock,
        })
    }

    /// Lend one unit of `key` to `borrower` against `paid`.
    pub fn borrow(
        &mut self,
        borrower: AccountId,
        key: ItemKey,
        paid: Amount,
    ) -> Result<RegistryEvent, StateError> {
        if paid != BORROW_FEE {
            return Err(StateError::WrongFee {
                paid,
                expected: BORROW_FEE,
            });
        }
        self.ledger.ensure_free(&borrower)?;
        self.catalog.ensure_available(&key)?;

        self.catalog.lend(&key, borrower)?;
        self.ledger.open(borrower, key)?;
        Ok(RegistryEvent::Borrowed { key, borrower })
    }

    /// Take back whatever `borrower` holds.
    pub fn return_book(&mut self, borrower: AccountId) -> Result<RegistryEvent, StateError> {
        let key = self
            .ledger
            .active(&borrower)
            .ok_or(StateError::NoActiveLoan(borrower))?;
        if self.catalog.stock_of(&key).checked_add(1).is_none() {
            return Err(StateError::StockOverflow(key));
        }

        self.ledger.close(&borrower)?;
        self.catalog.take_back(&key)?;
        Ok(RegistryEvent::Returned { key, borrower })
    }

    /// Accept an unsolicited deposit. Never fails.
    pub fn deposit(&mut self, deposit: Deposit) -> RegistryEvent {
        self.deposits.record(&deposit);
        RegistryEvent::from(deposit)
    }

    /// Assign the next sequence number to an event.
    pub fn next_record(&mut self, event: RegistryEvent) -> EventRecord {
        self.last_seq += 1;
        EventRecord::new(self.last_seq, event)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Current stock of `key`, zero if never stocked.
    pub fn stock_of(&self, key: &ItemKey) -> u64 {
        self.catalog.stock_of(key)
    }

    /// Borrowers of `key`, oldest first.
    pub fn history_of(&self, key: &ItemKey) -> &[AccountId] {
        self.catalog.history_of(key)
    }

    /// Available keys in insertion order.
    pub fn available(&self, availability: Availability) -> Vec<ItemKey> {
        match availability {
            Availability::EverStocked => self.catalog.keys().collect(),
            Availability::InStock => self.catalog.keys_in_stock().collect(),
        }
    }

    /// The item `borrower` holds, if any.
    pub fn active_loan(&self, borrower: &AccountId) -> Option<ItemKey> {
        self.ledger.active(borrower)
    }

    /// The key `input` resolved to when it was stocked.
    pub fn key_of(&self, input: &K::Input) -> Option<ItemKey> {
        self.keys
            .lookup(input)
            .filter(|key| self.catalog.contains(key))
    }

    /// The key strategy and its assignments.
    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The loan ledger.
    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    /// The deposit tally.
    pub fn deposits(&self) -> &DepositTally {
        &self.deposits
    }

    /// Sequence number of the last event produced.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────────────────

    /// Encode the whole state as CBOR.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode state produced by [`RegistryState::to_snapshot`].
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
