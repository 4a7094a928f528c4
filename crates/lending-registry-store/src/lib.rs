//! # Lending Registry Store
//!
//! Storage abstraction for the lending registry. Provides a trait-based
//! interface for persisting registry state with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! Persisted state is two things: the latest snapshot of the registry
//! state (opaque CBOR bytes produced by the core crate) and the journal of
//! every event emitted so far. Both are written together by
//! [`Store::commit`], so a reader never sees a snapshot without the events
//! that produced it.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lending_registry_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("library.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let snapshot = store.load_snapshot().await.unwrap();
//!     assert!(snapshot.is_none());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Contiguous journal**: events must continue the journal at `last_seq + 1`
//! - **Verified reads**: events read back are checked against their content id
//! - **All or nothing**: a rejected commit writes neither snapshot nor events

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{check_sequence, Store};
