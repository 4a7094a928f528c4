//! # Lending Registry Testkit
//!
//! Testing utilities for the lending registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Pinned canonical encodings for events
//! - **Generators**: Proptest strategies and random operation sequences
//! - **Fixtures**: Deterministic accounts and pre-stocked registries
//!
//! ## Golden Vectors
//!
//! ```rust
//! use lending_registry_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//!     println!("{}: {}", vector.name, vector.record().id);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use lending_registry_testkit::generators::ops;
//! use lending_registry_testkit::TestFixture;
//!
//! proptest! {
//!     #[test]
//!     fn never_panics(ops in ops(50)) {
//!         let mut registry = TestFixture::new().isbns();
//!         for op in &ops {
//!             let _ = op.apply(&mut registry);
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use lending_registry_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let registry = fixture.with_books(10).unwrap();
//! assert_eq!(registry.available_books().len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{account, random_account, TestFixture, DEPLOY_ISBNS};
pub use generators::{ops, Op};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, GoldenVector};
