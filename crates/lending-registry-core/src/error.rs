//! Error types for the lending registry core.

use thiserror::Error;

use crate::types::{AccountId, Amount, ItemKey};

/// Errors from parsing and encoding primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid ether amount: {0:?}")]
    InvalidAmount(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed event: {0}")]
    MalformedEvent(String),
}

/// Rejections raised by the registry state machine.
///
/// Every variant is raised before any mutation, so a rejected
/// operation leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("quantity must be at least 1 unit")]
    InvalidQuantity,

    #[error("wrong transfer value: paid {paid:?}, fee is {expected:?}")]
    WrongFee { paid: Amount, expected: Amount },

    #[error("item {0} is out of stock")]
    OutOfStock(ItemKey),

    #[error("account {borrower} already holds item {key}")]
    AlreadyBorrowing { borrower: AccountId, key: ItemKey },

    #[error("account {0} has no active loan")]
    NoActiveLoan(AccountId),

    #[error("invalid item key: {0}")]
    InvalidKey(String),

    #[error("stock of item {0} would overflow")]
    StockOverflow(ItemKey),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
