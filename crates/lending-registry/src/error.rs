//! Error types for the registry.

use lending_registry_core::{AccountId, Amount, CoreError, ItemKey, StateError};
use lending_registry_perms::{Operation, PermsError};
use lending_registry_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Every rejection leaves the registry exactly as it was before the call.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The caller lacks administrator rights for a restricted operation.
    #[error("caller {caller} is not authorized to {operation}")]
    NotAuthorized {
        caller: AccountId,
        operation: Operation,
    },

    /// Stocking quantity was zero.
    #[error("quantity must be at least 1 unit")]
    InvalidQuantity,

    /// Attached value differs from what the operation requires.
    #[error("wrong transfer value: paid {paid}, expected {expected}")]
    WrongFee { paid: Amount, expected: Amount },

    /// Borrow against an unknown or empty item.
    #[error("item {0} is out of stock")]
    OutOfStock(ItemKey),

    /// The borrower already holds an item.
    #[error("account {borrower} already holds item {key}")]
    AlreadyBorrowing { borrower: AccountId, key: ItemKey },

    /// Return attempted with nothing on loan.
    #[error("account {0} has no active loan")]
    NoActiveLoan(AccountId),

    /// The key strategy rejected the supplied identifier.
    #[error("invalid item key: {0}")]
    InvalidKey(String),

    /// Adding units would overflow the stock counter.
    #[error("stock of item {0} would overflow")]
    StockOverflow(ItemKey),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or decoding error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl RegistryError {
    /// Whether this error is a rejection of the call itself, as opposed to
    /// a failure of the machinery around it.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, RegistryError::Store(_) | RegistryError::Core(_))
    }
}

impl From<StateError> for RegistryError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::InvalidQuantity => RegistryError::InvalidQuantity,
            StateError::WrongFee { paid, expected } => RegistryError::WrongFee { paid, expected },
            StateError::OutOfStock(key) => RegistryError::OutOfStock(key),
            StateError::AlreadyBorrowing { borrower, key } => {
                RegistryError::AlreadyBorrowing { borrower, key }
            }
            StateError::NoActiveLoan(borrower) => RegistryError::NoActiveLoan(borrower),
            StateError::InvalidKey(reason) => RegistryError::InvalidKey(reason),
            StateError::StockOverflow(key) => RegistryError::StockOverflow(key),
        }
    }
}

impl From<PermsError> for RegistryError {
    fn from(e: PermsError) -> Self {
        match e {
            PermsError::NotAuthorized { caller, operation } => {
                RegistryError::NotAuthorized { caller, operation }
            }
        }
    }
}

/// A sink could not accept an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event sink {sink} failed: {reason}")]
pub struct SinkError {
    pub sink: &'static str,
    pub reason: String,
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_errors_map_one_to_one() {
        let err: RegistryError = StateError::OutOfStock(ItemKey::new(7)).into();
        assert!(matches!(err, RegistryError::OutOfStock(k) if k == ItemKey::new(7)));

        let err: RegistryError = StateError::WrongFee {
            paid: Amount::ZERO,
            expected: Amount::from_wei(1),
        }
        .into();
        assert!(matches!(err, RegistryError::WrongFee { .. }));
        assert!(err.is_rejection());
    }

    #[test]
    fn test_store_errors_are_not_rejections() {
        let err: RegistryError = StoreError::Lock("poisoned".into()).into();
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_not_authorized_message() {
        let err: RegistryError = PermsError::NotAuthorized {
            caller: AccountId::from_bytes([0xab; 20]),
            operation: Operation::Stock,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "caller 0xabababababababababababababababababababab is not authorized to stock"
        );
    }
}
