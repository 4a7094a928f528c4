//! # Lending Registry Permissions
//!
//! The access guard for the lending registry.
//!
//! ## Overview
//!
//! Exactly one administrator exists for the lifetime of a registry. It is
//! fixed at construction and cannot be changed. Stock-mutating operations
//! are restricted to the administrator; borrowing, returning, deposits and
//! every query are open to any caller.
//!
//! The guard is a pure policy check: it holds no mutable state and never
//! changes registry state. A failed check means the operation must not run.
//!
//! ## Usage
//!
//! ```rust
//! use lending_registry_core::AccountId;
//! use lending_registry_perms::{AccessGuard, Operation};
//!
//! let admin = AccountId::from_bytes([1; 20]);
//! let guard = AccessGuard::new(admin);
//!
//! assert!(guard.authorize(&admin, Operation::Stock).is_ok());
//! assert!(guard
//!     .authorize(&AccountId::from_bytes([2; 20]), Operation::Stock)
//!     .is_err());
//! ```

pub mod error;
pub mod guard;

pub use error::{PermsError, Result};
pub use guard::{AccessGuard, Operation};
