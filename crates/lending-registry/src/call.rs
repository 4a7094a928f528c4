//! The call surface: every inbound request the registry can receive.
//!
//! A call carries a caller and an attached value. Recognized operations are
//! routed to the catalog and loan ledger; anything else lands in the deposit
//! sink, which never fails.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use lending_registry_core::ItemKey;
use lending_registry_perms::Operation;

/// An inbound request.
///
/// `I` is the stocking identifier: a title (`String`, `&str`) for
/// sequential keys, an `Isbn` for ISBN keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call<I> {
    /// Add units of an item. Administrator only; no value may be attached.
    Stock { item: I, quantity: u64 },
    /// Borrow one unit. The attached value must equal the fee.
    Borrow { key: ItemKey },
    /// Return whatever the caller holds. No value may be attached.
    ReturnBook,
    /// A call matching no operation.
    Unmatched { data: Bytes },
    /// A plain value transfer with no call data.
    Transfer,
}

impl<I> Call<I> {
    /// How the access guard classifies this call.
    pub fn operation(&self) -> Operation {
        match self {
            Call::Stock { .. } => Operation::Stock,
            Call::Borrow { .. } => Operation::Borrow,
            Call::ReturnBook => Operation::ReturnBook,
            Call::Unmatched { .. } | Call::Transfer => Operation::Deposit,
        }
    }

    /// Whether value may be attached to this call.
    pub fn is_payable(&self) -> bool {
        !matches!(self, Call::Stock { .. } | Call::ReturnBook)
    }
}
