//! Deposit sink: value that arrives without matching an operation.
//!
//! Deposits never fail and never touch the catalog or the loan ledger.
//! They are tallied so operators can spot stray funds.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount};

/// How an unsolicited deposit arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositChannel {
    /// A call whose data matched no known operation.
    Fallback,
    /// A plain transfer carrying no call data.
    Receive,
}

/// A single unsolicited deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Who sent it.
    pub from: AccountId,
    /// Attached value, possibly zero.
    pub amount: Amount,
    /// The channel it arrived on.
    pub channel: DepositChannel,
    /// Unmatched call data. Always empty for [`DepositChannel::Receive`].
    pub data: Bytes,
}

impl Deposit {
    /// A deposit made through an unmatched call.
    pub fn fallback(from: AccountId, amount: Amount, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            amount,
            channel: DepositChannel::Fallback,
            data: data.into(),
        }
    }

    /// A deposit made through a plain transfer.
    pub fn receive(from: AccountId, amount: Amount) -> Self {
        Self {
            from,
            amount,
            channel: DepositChannel::Receive,
            data: Bytes::new(),
        }
    }
}

/// Running totals of unsolicited deposits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTally {
    /// Deposits seen through unmatched calls.
    pub fallback_count: u64,
    /// Deposits seen through plain transfers.
    pub receive_count: u64,
    /// Sum of all deposited value.
    pub total: Amount,
}

impl DepositTally {
    /// Count a deposit.
    pub fn record(&mut self, deposit: &Deposit) {
        match deposit.channel {
            DepositChannel::Fallback => self.fallback_count += 1,
            DepositChannel::Receive => self.receive_count += 1,
        }
        self.total = self.total.saturating_add(deposit.amount);
    }

    /// Total number of deposits.
    pub fn count(&self) -> u64 {
        self.fallback_count + self.receive_count
    }
}
