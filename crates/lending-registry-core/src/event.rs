//! Events: the observable record of every committed state change.
//!
//! Events are notifications, not control flow. They are produced after a
//! transition has been validated and applied, numbered with a monotonic
//! sequence, and content-addressed by the BLAKE3 hash of their canonical
//! encoding.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::canonical_event_bytes;
use crate::deposit::{Deposit, DepositChannel};
use crate::types::{AccountId, Amount, ItemKey};

/// Discriminator for event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EventKind {
    // Catalog and loan kinds (0x0000 - 0x00FF)
    /// Units were added to an item.
    Stocked = 0x0001,
    /// An item was lent.
    Borrowed = 0x0002,
    /// An item came back.
    Returned = 0x0003,

    // Deposit kinds (0x0100 - 0x01FF)
    /// Value arrived through an unmatched call.
    DepositFallback = 0x0100,
    /// Value arrived through a plain transfer.
    DepositReceive = 0x0101,
}

impl EventKind {
    /// Convert to u16 for serialization.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Try to parse from u16.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Stocked),
            0x0002 => Some(Self::Borrowed),
            0x0003 => Some(Self::Returned),
            0x0100 => Some(Self::DepositFallback),
            0x0101 => Some(Self::DepositReceive),
            _ => None,
        }
    }

    /// Check if this is a deposit kind.
    pub fn is_deposit(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0100
    }
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// Units were added; carries the resolved key so callers learn it.
    Stocked {
        key: ItemKey,
        quantity: u64,
        stock: u64,
    },
    /// `borrower` took one unit of `key`.
    Borrowed { key: ItemKey, borrower: AccountId },
    /// `borrower` returned `key`.
    Returned { key: ItemKey, borrower: AccountId },
    /// Unsolicited value through an unmatched call.
    DepositFallback {
        from: AccountId,
        amount: Amount,
        data: Bytes,
    },
    /// Unsolicited value through a plain transfer.
    DepositReceive { from: AccountId, amount: Amount },
}

impl RegistryEvent {
    /// The event's kind.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Stocked { .. } => EventKind::Stocked,
            Self::Borrowed { .. } => EventKind::Borrowed,
            Self::Returned { .. } => EventKind::Returned,
            Self::DepositFallback { .. } => EventKind::DepositFallback,
            Self::DepositReceive { .. } => EventKind::DepositReceive,
        }
    }

    /// The item the event concerns, if any.
    pub fn key(&self) -> Option<ItemKey> {
        match self {
            Self::Stocked { key, .. } | Self::Borrowed { key, .. } | Self::Returned { key, .. } => {
                Some(*key)
            }
            Self::DepositFallback { .. } | Self::DepositReceive { .. } => None,
        }
    }
}

impl From<Deposit> for RegistryEvent {
    fn from(deposit: Deposit) -> Self {
        match deposit.channel {
            DepositChannel::Fallback => Self::DepositFallback {
                from: deposit.from,
                amount: deposit.amount,
                data: deposit.data,
            },
            DepositChannel::Receive => Self::DepositReceive {
                from: deposit.from,
                amount: deposit.amount,
            },
        }
    }
}

/// A 32-byte event identifier, computed as Blake3(canonical_event_bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    /// Hash canonical bytes into an id.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl TryFrom<&[u8]> for EventId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// A numbered, content-addressed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the registry's event sequence, starting at 1.
    pub seq: u64,
    /// Content address of the canonical encoding.
    pub id: EventId,
    /// The event itself.
    pub event: RegistryEvent,
}

impl EventRecord {
    /// Number an event and compute its id.
    pub fn new(seq: u64, event: RegistryEvent) -> Self {
        let id = EventId::hash(&canonical_event_bytes(seq, &event));
        Self { seq, id, event }
    }

    /// Canonical bytes of this record.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_event_bytes(self.seq, &self.event)
    }

    /// Whether the stored id matches the content.
    pub fn verify_id(&self) -> bool {
        EventId::hash(&self.canonical_bytes()) == self.id
    }

    /// The event's kind.
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            EventKind::Stocked,
            EventKind::Borrowed,
            EventKind::Returned,
            EventKind::DepositFallback,
            EventKind::DepositReceive,
        ] {
            assert_eq!(EventKind::from_u16(kind.to_u16()), Some(kind));
        }
        assert_eq!(EventKind::from_u16(0x0200), None);
        assert!(EventKind::DepositReceive.is_deposit());
        assert!(!EventKind::Borrowed.is_deposit());
    }

    #[test]
    fn test_record_id_depends_on_seq() {
        let event = RegistryEvent::Borrowed {
            key: ItemKey::new(1),
            borrower: AccountId::from_bytes([1; 20]),
        };
        let a = EventRecord::new(1, event.clone());
        let b = EventRecord::new(2, event);

        assert_ne!(a.id, b.id);
        assert!(a.verify_id());
        assert!(b.verify_id());
    }

    #[test]
    fn test_tampered_record_fails_verification() {
        let mut record = EventRecord::new(
            3,
            RegistryEvent::Stocked {
                key: ItemKey::new(9),
                quantity: 5,
                stock: 5,
            },
        );
        record.event = RegistryEvent::Stocked {
            key: ItemKey::new(9),
            quantity: 50,
            stock: 50,
        };
        assert!(!record.verify_id());
    }

    #[test]
    fn test_deposit_into_event() {
        let from = AccountId::from_bytes([4; 20]);
        let event = RegistryEvent::from(Deposit::receive(from, Amount::from_wei(1)));

        assert_eq!(event.kind(), EventKind::DepositReceive);
        assert_eq!(event.key(), None);
    }
}
