//! # Lending Registry Core
//!
//! Pure primitives for the lending registry: identifiers, the catalog, the
//! loan ledger, deposits, events and the state machine that ties them
//! together.
//!
//! This crate contains no I/O, no storage, no access control. It is pure
//! computation over registry state.
//!
//! ## Key Types
//!
//! - [`RegistryState`] - Catalog + loan ledger + deposit tally, advanced by validated transitions
//! - [`ItemKey`] - Item identifier; zero is the "none" sentinel
//! - [`KeyStrategy`] - How stocking requests map to keys ([`SequentialKeys`], [`IsbnKeys`])
//! - [`EventRecord`] - A numbered, content-addressed [`RegistryEvent`]
//!
//! ## Canonicalization
//!
//! Events are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod catalog;
pub mod deposit;
pub mod error;
pub mod event;
pub mod keys;
pub mod ledger;
pub mod state;
pub mod types;

pub use canonical::{canonical_event_bytes, decode_event};
pub use catalog::{Catalog, Item};
pub use deposit::{Deposit, DepositChannel, DepositTally};
pub use error::{CoreError, Result, StateError};
pub use event::{EventId, EventKind, EventRecord, RegistryEvent};
pub use keys::{IsbnKeys, KeyStrategy, Resolved, SequentialKeys};
pub use ledger::LoanLedger;
pub use state::{Availability, RegistryState};
pub use types::{AccountId, Amount, Isbn, ItemKey, BORROW_FEE, KEY_WIDTH, MAX_ISBN};
