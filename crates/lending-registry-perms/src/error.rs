//! Error types for the access guard.

use lending_registry_core::AccountId;
use thiserror::Error;

use crate::guard::Operation;

/// Errors that can occur during permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The caller may not perform the operation.
    #[error("caller {caller} is not authorized to {operation}")]
    NotAuthorized {
        caller: AccountId,
        operation: Operation,
    },
}

/// Result type for permission checks.
pub type Result<T> = std::result::Result<T, PermsError>;
