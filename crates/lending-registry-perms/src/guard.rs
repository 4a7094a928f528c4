//! The access guard: who may perform which operation.
//!
//! Policy is fixed: [`Operation::Stock`] is administrator-only, everything
//! else is open. The check happens before the operation runs, so a denied
//! call never observes or produces a partial state change.

use serde::{Deserialize, Serialize};
use std::fmt;

use lending_registry_core::AccountId;

use crate::error::{PermsError, Result};

/// Classes of registry operations, as seen by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Add units to an item.
    Stock,
    /// Borrow an item.
    Borrow,
    /// Return a borrowed item.
    ReturnBook,
    /// Unsolicited value transfer or unmatched call.
    Deposit,
}

impl Operation {
    /// Whether only the administrator may perform this operation.
    pub fn requires_admin(self) -> bool {
        matches!(self, Operation::Stock)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Stock => "stock",
            Operation::Borrow => "borrow",
            Operation::ReturnBook => "return a book",
            Operation::Deposit => "deposit",
        };
        f.write_str(name)
    }
}

/// Single-administrator access guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGuard {
    admin: AccountId,
}

impl AccessGuard {
    /// Create a guard for the given administrator.
    pub fn new(admin: AccountId) -> Self {
        Self { admin }
    }

    /// The administrator.
    pub fn admin(&self) -> AccountId {
        self.admin
    }

    /// Whether `caller` is the administrator.
    pub fn is_admin(&self, caller: &AccountId) -> bool {
        *caller == self.admin
    }

    /// Check that `caller` may perform `operation`.
    pub fn authorize(&self, caller: &AccountId, operation: Operation) -> Result<()> {
        if operation.requires_admin() && !self.is_admin(caller) {
            return Err(PermsError::NotAuthorized {
                caller: *caller,
                operation,
            });
        }
        Ok(())
    }
}
