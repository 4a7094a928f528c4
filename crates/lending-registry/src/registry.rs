//! The Registry: access guard, state machine and event sinks in one place.
//!
//! A [`Registry`] is synchronous and owns its state outright. Each call runs
//! to completion before the next; there is nothing to lock. For a registry
//! whose state survives restarts, see [`crate::Library`].

use std::borrow;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use lending_registry_core::{
    AccountId, Amount, Availability, Deposit, DepositTally, EventRecord, ItemKey, KeyStrategy,
    RegistryEvent, RegistryState, StateError, BORROW_FEE,
};
use lending_registry_perms::AccessGuard;

use crate::call::Call;
use crate::error::Result;
use crate::sink::EventSink;

/// Configuration for a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The administrator. Fixed for the registry's lifetime.
    pub admin: AccountId,
    /// Which keys `available_books` lists.
    pub availability: Availability,
}

impl RegistryConfig {
    /// Configuration with the given administrator and default availability.
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            availability: Availability::default(),
        }
    }

    /// Set which keys count as available.
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }
}

/// A lending registry.
pub struct Registry<K: KeyStrategy> {
    guard: AccessGuard,
    availability: Availability,
    state: RegistryState<K>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl<K: KeyStrategy> fmt::Debug for Registry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("admin", &self.guard.admin())
            .field("availability", &self.availability)
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl<K: KeyStrategy> Registry<K> {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_state(config, RegistryState::new())
    }

    /// Create a registry around existing state.
    pub fn with_state(config: RegistryConfig, state: RegistryState<K>) -> Self {
        Self {
            guard: AccessGuard::new(config.admin),
            availability: config.availability,
            state,
            sinks: Vec::new(),
        }
    }

    /// Attach a sink. Sinks see every record committed from now on.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// The configuration this registry was built with.
    pub fn config(&self) -> RegistryConfig {
        RegistryConfig {
            admin: self.guard.admin(),
            availability: self.availability,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Route a call from `caller` carrying `value`.
    pub fn dispatch<I: borrow::Borrow<K::Input>>(
        &mut self,
        caller: &AccountId,
        value: Amount,
        call: Call<I>,
    ) -> Result<EventRecord> {
        let record = self.apply(caller, value, call)?;
        self.publish(&record);
        Ok(record)
    }

    /// Add `quantity` units of `item`. Administrator only.
    pub fn stock(
        &mut self,
        caller: &AccountId,
        item: &K::Input,
        quantity: u64,
    ) -> Result<EventRecord> {
        self.dispatch(caller, Amount::ZERO, Call::Stock { item, quantity })
    }

    /// Borrow one unit of `key`, paying `paid`.
    pub fn borrow(&mut self, caller: &AccountId, key: ItemKey, paid: Amount) -> Result<EventRecord> {
        self.dispatch::<&K::Input>(caller, paid, Call::Borrow { key })
    }

    /// Return whatever `caller` holds.
    pub fn return_book(&mut self, caller: &AccountId) -> Result<EventRecord> {
        self.dispatch::<&K::Input>(caller, Amount::ZERO, Call::ReturnBook)
    }

    /// Accept a call that matched no operation.
    pub fn fallback(
        &mut self,
        caller: &AccountId,
        value: Amount,
        data: impl Into<Bytes>,
    ) -> Result<EventRecord> {
        let data = data.into();
        self.dispatch::<&K::Input>(caller, value, Call::Unmatched { data })
    }

    /// Accept a plain value transfer.
    pub fn receive(&mut self, caller: &AccountId, value: Amount) -> Result<EventRecord> {
        self.dispatch::<&K::Input>(caller, value, Call::Transfer)
    }

    /// Validate and commit a call without notifying sinks.
    ///
    /// On error nothing has changed.
    pub(crate) fn apply<I: borrow::Borrow<K::Input>>(
        &mut self,
        caller: &AccountId,
        value: Amount,
        call: Call<I>,
    ) -> Result<EventRecord> {
        let operation = call.operation();
        self.guard.authorize(caller, operation)?;
        if !call.is_payable() && !value.is_zero() {
            return Err(StateError::WrongFee {
                paid: value,
                expected: Amount::ZERO,
            }
            .into());
        }

        let event = match call {
            Call::Stock { item, quantity } => {
                self.state.stock(borrow::Borrow::<K::Input>::borrow(&item), quantity)?
            }
            Call::Borrow { key } => self.state.borrow(*caller, key, value)?,
            Call::ReturnBook => self.state.return_book(*caller)?,
            Call::Unmatched { data } => self.deposit(Deposit::fallback(*caller, value, data)),
            Call::Transfer => self.deposit(Deposit::receive(*caller, value)),
        };

        let record = self.state.next_record(event);
        tracing::debug!(
            seq = record.seq,
            kind = ?record.kind(),
            caller = %caller,
            %operation,
            "committed"
        );
        Ok(record)
    }

    fn deposit(&mut self, deposit: Deposit) -> RegistryEvent {
        tracing::info!(
            from = %deposit.from,
            amount = %deposit.amount,
            channel = ?deposit.channel,
            data_len = deposit.data.len(),
            "unsolicited deposit"
        );
        self.state.deposit(deposit)
    }

    /// Hand a committed record to every sink.
    pub(crate) fn publish(&self, record: &EventRecord) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(record) {
                tracing::warn!(sink = sink.name(), seq = record.seq, error = %e, "sink failed");
            }
        }
    }

    /// Replace the state wholesale.
    pub(crate) fn restore(&mut self, state: RegistryState<K>) {
        self.state = state;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Current stock of `key`; zero if never stocked.
    pub fn get_stock(&self, key: &ItemKey) -> u64 {
        self.state.stock_of(key)
    }

    /// The key `item` was stocked under, if it was.
    pub fn key_of(&self, item: &K::Input) -> Option<ItemKey> {
        self.state.key_of(item)
    }

    /// Like [`Registry::key_of`], with the "none" sentinel for unknown items.
    pub fn get_id(&self, item: &K::Input) -> ItemKey {
        self.key_of(item).unwrap_or(ItemKey::NONE)
    }

    /// Available keys in the order they were first stocked.
    pub fn available_books(&self) -> Vec<ItemKey> {
        self.state.available(self.availability)
    }

    /// Everyone who has borrowed `key`, oldest first, repeats included.
    pub fn book_history(&self, key: &ItemKey) -> &[AccountId] {
        self.state.history_of(key)
    }

    /// What `account` holds, or the "none" sentinel.
    pub fn has_borrowed(&self, account: &AccountId) -> ItemKey {
        self.active_loan(account).unwrap_or(ItemKey::NONE)
    }

    /// What `account` holds, if anything.
    pub fn active_loan(&self, account: &AccountId) -> Option<ItemKey> {
        self.state.active_loan(account)
    }

    /// The borrowing fee.
    pub fn fee(&self) -> Amount {
        BORROW_FEE
    }

    /// The administrator.
    pub fn admin(&self) -> AccountId {
        self.guard.admin()
    }

    /// The administrator, under its other name.
    pub fn owner(&self) -> AccountId {
        self.admin()
    }

    /// Unsolicited deposits seen so far.
    pub fn deposits(&self) -> &DepositTally {
        self.state.deposits()
    }

    /// Insertion-order position of `key`, if it was ever stocked.
    pub fn catalog_position(&self, key: &ItemKey) -> Option<usize> {
        self.state.catalog().position(key)
    }

    /// The underlying state.
    pub fn state(&self) -> &RegistryState<K> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::sink::EventLog;
    use lending_registry_core::{Isbn, IsbnKeys, SequentialKeys};
    use lending_registry_perms::Operation;

    fn account(n: u8) -> AccountId {
        AccountId::from_bytes([n; 20])
    }

    fn titles() -> Registry<SequentialKeys> {
        Registry::new(RegistryConfig::new(account(1)))
    }

    #[test]
    fn test_stock_requires_admin() {
        let mut registry = titles();

        let err = registry.stock(&account(2), "testing", 50).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NotAuthorized {
                operation: Operation::Stock,
                ..
            }
        ));
        assert_eq!(registry.get_id("testing"), ItemKey::NONE);
        assert_eq!(registry.state().last_seq(), 0);
    }

    #[test]
    fn test_not_authorized_beats_invalid_quantity() {
        let mut registry = titles();
        let err = registry.stock(&account(2), "testing", 0).unwrap_err();
        assert!(matches!(err, RegistryError::NotAuthorized { .. }));
    }

    #[test]
    fn test_value_on_non_payable_call() {
        let mut registry = titles();
        registry.stock(&account(1), "testing", 5).unwrap();

        let err = registry
            .dispatch(
                &account(1),
                BORROW_FEE,
                Call::Stock {
                    item: "testing",
                    quantity: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::WrongFee { .. }));
        assert_eq!(registry.get_stock(&ItemKey::new(1)), 5);

        registry.borrow(&account(3), ItemKey::new(1), BORROW_FEE).unwrap();
        let err = registry
            .dispatch::<&str>(&account(3), BORROW_FEE, Call::ReturnBook)
            .unwrap_err();
        assert!(matches!(err, RegistryError::WrongFee { .. }));
        assert_eq!(registry.has_borrowed(&account(3)), ItemKey::new(1));
    }

    #[test]
    fn test_sinks_see_committed_records_only() {
        let mut registry = titles();
        let log = EventLog::new();
        registry.subscribe(log.clone());

        registry.stock(&account(1), "testing", 2).unwrap();
        registry.borrow(&account(2), ItemKey::new(1), Amount::ZERO).unwrap_err();
        registry.borrow(&account(2), ItemKey::new(1), BORROW_FEE).unwrap();

        let seqs: Vec<u64> = log.records().unwrap().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_deposits_are_tallied() {
        let mut registry = Registry::<IsbnKeys>::new(RegistryConfig::new(account(1)));
        registry
            .fallback(&account(4), Amount::from_wei(5), &b"\xde\xad"[..])
            .unwrap();
        registry.receive(&account(4), Amount::from_wei(7)).unwrap();

        assert_eq!(registry.deposits().fallback_count, 1);
        assert_eq!(registry.deposits().receive_count, 1);
        assert_eq!(registry.deposits().total, Amount::from_wei(12));
        assert!(registry.available_books().is_empty());
    }

    #[test]
    fn test_catalog_position_follows_first_stocking() {
        let mut registry = Registry::<IsbnKeys>::new(RegistryConfig::new(account(1)));
        registry.stock(&account(1), &Isbn(30), 1).unwrap();
        registry.stock(&account(1), &Isbn(10), 1).unwrap();
        registry.stock(&account(1), &Isbn(30), 1).unwrap();

        assert_eq!(registry.catalog_position(&ItemKey::new(30)), Some(0));
        assert_eq!(registry.catalog_position(&ItemKey::new(10)), Some(1));
        assert_eq!(registry.catalog_position(&ItemKey::new(20)), None);
    }

    #[test]
    fn test_owner_and_fee() {
        let registry = titles();
        assert_eq!(registry.owner(), account(1));
        assert_eq!(registry.admin(), account(1));
        assert_eq!(registry.fee().format_ether(), "0.001");
    }
}
