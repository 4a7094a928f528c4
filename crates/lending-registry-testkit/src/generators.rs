//! Proptest generators for property-based testing.
//!
//! Accounts and ISBNs are drawn from small pools so that random operation
//! sequences collide often: the same reader borrowing twice, two readers
//! chasing the last unit, returns with nothing on loan.

use proptest::prelude::*;

use lending_registry::{Registry, RegistryEvent, Result};
use lending_registry_core::{AccountId, Amount, EventRecord, Isbn, IsbnKeys, BORROW_FEE};

/// Number of distinct accounts generated operations use. Index 0 is the
/// administrator.
pub const ACCOUNT_POOL: usize = 4;

/// Number of distinct ISBNs generated operations use.
pub const ISBN_POOL: usize = 3;

/// The account at `index` in the pool.
pub fn pool_account(index: usize) -> AccountId {
    AccountId::from_bytes([index as u8 + 1; 20])
}

/// The ISBN at `index` in the pool.
pub fn pool_isbn(index: usize) -> Isbn {
    Isbn(9780062886149 + index as u64)
}

/// Generate a random AccountId.
pub fn account_id() -> impl Strategy<Value = AccountId> {
    any::<[u8; 20]>().prop_map(AccountId::from_bytes)
}

/// Generate a valid ISBN.
pub fn isbn() -> impl Strategy<Value = Isbn> {
    (1u64..=lending_registry_core::MAX_ISBN).prop_map(Isbn)
}

/// Generate a stocking quantity, zero included.
pub fn quantity() -> impl Strategy<Value = u64> {
    prop_oneof![
        1 => Just(0u64),
        8 => 1u64..=100,
    ]
}

/// Generate an attached value: mostly the fee, sometimes not.
pub fn payment() -> impl Strategy<Value = Amount> {
    prop_oneof![
        6 => Just(BORROW_FEE),
        1 => Just(Amount::ZERO),
        1 => (0u128..10u128.pow(18)).prop_map(Amount::from_wei),
    ]
}

/// One call against an ISBN-keyed registry.
#[derive(Debug, Clone)]
pub enum Op {
    Stock {
        caller: usize,
        isbn: usize,
        quantity: u64,
    },
    Borrow {
        caller: usize,
        isbn: usize,
        paid: Amount,
    },
    Return {
        caller: usize,
    },
    Fallback {
        caller: usize,
        value: Amount,
        data: Vec<u8>,
    },
    Receive {
        caller: usize,
        value: Amount,
    },
}

impl Op {
    /// Run this operation against `registry`, with pool index 0 as admin.
    pub fn apply(&self, registry: &mut Registry<IsbnKeys>) -> Result<EventRecord> {
        match self {
            Op::Stock {
                caller,
                isbn,
                quantity,
            } => registry.stock(&pool_account(*caller), &pool_isbn(*isbn), *quantity),
            Op::Borrow { caller, isbn, paid } => {
                registry.borrow(&pool_account(*caller), pool_isbn(*isbn).key(), *paid)
            }
            Op::Return { caller } => registry.return_book(&pool_account(*caller)),
            Op::Fallback {
                caller,
                value,
                data,
            } => registry.fallback(&pool_account(*caller), *value, data.clone()),
            Op::Receive { caller, value } => registry.receive(&pool_account(*caller), *value),
        }
    }
}

impl Arbitrary for Op {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let caller = 0..ACCOUNT_POOL;
        let item = 0..ISBN_POOL;
        prop_oneof![
            3 => (caller.clone(), item.clone(), quantity())
                .prop_map(|(caller, isbn, quantity)| Op::Stock { caller, isbn, quantity }),
            4 => (caller.clone(), item, payment())
                .prop_map(|(caller, isbn, paid)| Op::Borrow { caller, isbn, paid }),
            3 => caller.clone().prop_map(|caller| Op::Return { caller }),
            1 => (caller.clone(), payment(), prop::collection::vec(any::<u8>(), 0..36))
                .prop_map(|(caller, value, data)| Op::Fallback { caller, value, data }),
            1 => (caller, payment())
                .prop_map(|(caller, value)| Op::Receive { caller, value }),
        ]
        .boxed()
    }
}

/// Generate a sequence of operations.
pub fn ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=max_len)
}

/// Total quantity ever stocked per key, read off a record stream.
pub fn stocked_totals(records: &[EventRecord]) -> std::collections::BTreeMap<u64, u64> {
    let mut totals = std::collections::BTreeMap::new();
    for record in records {
        if let RegistryEvent::Stocked { key, quantity, .. } = &record.event {
            *totals.entry(key.value()).or_insert(0) += quantity;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use lending_registry::{RegistryConfig, RegistryError};
    use lending_registry_core::ItemKey;

    fn registry() -> Registry<IsbnKeys> {
        Registry::new(RegistryConfig::new(pool_account(0)))
    }

    proptest! {
        #[test]
        fn test_stock_accumulates(quantities in prop::collection::vec(1u64..=1_000, 1..20)) {
            let mut registry = registry();
            let isbn = pool_isbn(0);
            for q in &quantities {
                registry.stock(&pool_account(0), &isbn, *q).unwrap();
            }
            prop_assert_eq!(registry.get_stock(&isbn.key()), quantities.iter().sum::<u64>());
        }

        #[test]
        fn test_non_admin_never_stocks(caller in 1..ACCOUNT_POOL, isbn in isbn(), qty in quantity()) {
            let mut registry = registry();
            let err = registry.stock(&pool_account(caller), &isbn, qty).unwrap_err();
            let is_not_authorized = matches!(err, RegistryError::NotAuthorized { .. });
            prop_assert!(is_not_authorized);
            prop_assert_eq!(registry.get_stock(&isbn.key()), 0);
        }

        #[test]
        fn test_wrong_fee_always_rejected(paid in any::<u128>()) {
            prop_assume!(Amount::from_wei(paid) != BORROW_FEE);
            let mut registry = registry();
            registry.stock(&pool_account(0), &pool_isbn(0), 5).unwrap();

            let err = registry
                .borrow(&pool_account(1), pool_isbn(0).key(), Amount::from_wei(paid))
                .unwrap_err();
            let is_wrong_fee = matches!(err, RegistryError::WrongFee { .. });
            prop_assert!(is_wrong_fee);
            prop_assert_eq!(registry.get_stock(&pool_isbn(0).key()), 5);
        }

        #[test]
        fn test_failed_ops_change_nothing(ops in ops(40)) {
            let mut registry = registry();
            for op in &ops {
                let before = registry.state().clone();
                if op.apply(&mut registry).is_err() {
                    prop_assert_eq!(registry.state(), &before);
                }
            }
        }

        #[test]
        fn test_stock_is_conserved(ops in ops(60)) {
            let mut registry = registry();
            let mut records = Vec::new();
            for op in &ops {
                if let Ok(record) = op.apply(&mut registry) {
                    records.push(record);
                }
            }

            for (key, total) in stocked_totals(&records) {
                let key = ItemKey::new(key);
                let on_loan = registry.state().ledger().count_of(&key) as u64;
                prop_assert_eq!(registry.get_stock(&key) + on_loan, total);
            }
        }

        #[test]
        fn test_single_active_loan(ops in ops(60)) {
            let mut registry = registry();
            for op in &ops {
                let holding = (0..ACCOUNT_POOL)
                    .map(|i| registry.active_loan(&pool_account(i)))
                    .collect::<Vec<_>>();

                let result = op.apply(&mut registry);

                if let Op::Borrow { caller, .. } = op {
                    if holding[*caller].is_some() {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(registry.active_loan(&pool_account(*caller)), holding[*caller]);
                    } else if result.is_ok() {
                        prop_assert!(registry.active_loan(&pool_account(*caller)).is_some());
                    }
                }
            }
        }

        #[test]
        fn test_borrow_then_return_restores_stock(caller in 0..ACCOUNT_POOL, qty in 1u64..50) {
            let mut registry = registry();
            let key = pool_isbn(1).key();
            registry.stock(&pool_account(0), &pool_isbn(1), qty).unwrap();

            registry.borrow(&pool_account(caller), key, BORROW_FEE).unwrap();
            prop_assert_eq!(registry.get_stock(&key), qty - 1);
            prop_assert_eq!(registry.has_borrowed(&pool_account(caller)), key);
            prop_assert_eq!(registry.book_history(&key).last(), Some(&pool_account(caller)));

            registry.return_book(&pool_account(caller)).unwrap();
            prop_assert_eq!(registry.get_stock(&key), qty);
            prop_assert_eq!(registry.has_borrowed(&pool_account(caller)), ItemKey::NONE);
            prop_assert_eq!(registry.book_history(&key).len(), 1);
        }

        #[test]
        fn test_records_are_numbered_densely(ops in ops(40)) {
            let mut registry = registry();
            let mut expected = 1;
            for op in &ops {
                if let Ok(record) = op.apply(&mut registry) {
                    prop_assert_eq!(record.seq, expected);
                    prop_assert!(record.verify_id());
                    expected += 1;
                }
            }
        }
    }
}
