//! # Lending Registry
//!
//! A single-administrator lending registry: the administrator stocks items,
//! any account may borrow one item at a time against a fixed fee and later
//! return it.
//!
//! ## Overview
//!
//! - **Catalog**: stock count and borrow history per item, in first-stocked order
//! - **Loan ledger**: at most one active loan per account
//! - **Access guard**: stocking is administrator-only
//! - **Deposit sink**: unmatched calls and plain transfers are accepted and tallied
//!
//! Every call either commits completely or fails and changes nothing.
//! Committed calls produce numbered [`EventRecord`]s that are handed to
//! any subscribed [`EventSink`].
//!
//! ## Usage
//!
//! ```rust
//! use lending_registry::{Registry, RegistryConfig};
//! use lending_registry::core::{AccountId, SequentialKeys, BORROW_FEE};
//!
//! let admin = AccountId::from_bytes([1; 20]);
//! let reader = AccountId::from_bytes([2; 20]);
//! let mut registry = Registry::<SequentialKeys>::new(RegistryConfig::new(admin));
//!
//! registry.stock(&admin, "testing", 50).unwrap();
//! let key = registry.get_id("testing");
//!
//! registry.borrow(&reader, key, BORROW_FEE).unwrap();
//! assert_eq!(registry.get_stock(&key), 49);
//! assert_eq!(registry.has_borrowed(&reader), key);
//!
//! registry.return_book(&reader).unwrap();
//! assert_eq!(registry.get_stock(&key), 50);
//! ```
//!
//! For state that survives restarts, wrap a [`Store`](store::Store) in a
//! [`Library`].
//!
//! ## Re-exports
//!
//! - `lending_registry::core` - Primitives and the state machine
//! - `lending_registry::perms` - The access guard
//! - `lending_registry::store` - Storage abstraction and SQLite

pub mod call;
pub mod error;
pub mod library;
pub mod registry;
pub mod sink;

// Re-export component crates
pub use lending_registry_core as core;
pub use lending_registry_perms as perms;
pub use lending_registry_store as store;

// Re-export main types for convenience
pub use call::Call;
pub use error::{RegistryError, Result, SinkError};
pub use library::Library;
pub use registry::{Registry, RegistryConfig};
pub use sink::{EventLog, EventSink, TracingSink};

// Re-export commonly used core types
pub use lending_registry_core::{
    AccountId, Amount, Availability, EventRecord, Isbn, IsbnKeys, ItemKey, RegistryEvent,
    SequentialKeys, BORROW_FEE,
};
