//! Canonical CBOR encoding for events.
//!
//! This module implements the subset of RFC 8949 Core Deterministic Encoding
//! that events need:
//! - Maps with unsigned integer keys, sorted ascending
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats; amounts are 16-byte big-endian byte strings
//!
//! A record encodes as `{0: seq, 1: kind, 2: body}`. The canonical bytes
//! feed the event id, so the same event at the same position always hashes
//! to the same id.

use ciborium::value::Value;

use crate::error::CoreError;
use crate::event::{EventKind, RegistryEvent};
use crate::types::{AccountId, Amount, ItemKey};

/// Record field keys.
mod keys {
    pub const SEQ: u64 = 0;
    pub const KIND: u64 = 1;
    pub const BODY: u64 = 2;
}

/// The shapes the encoder emits.
enum Cbor {
    Uint(u64),
    Bytes(Vec<u8>),
    Map(Vec<(u64, Cbor)>),
}

/// Encode an event at position `seq` to canonical bytes.
pub fn canonical_event_bytes(seq: u64, event: &RegistryEvent) -> Vec<u8> {
    let record = Cbor::Map(vec![
        (keys::SEQ, Cbor::Uint(seq)),
        (keys::KIND, Cbor::Uint(event.kind().to_u16().into())),
        (keys::BODY, body_to_cbor(event)),
    ]);
    let mut buf = Vec::new();
    encode_to(&mut buf, &record);
    buf
}

/// Decode canonical bytes back into `(seq, event)`.
///
/// Rejects unknown kinds, missing fields and any encoding that is not
/// byte-identical to the canonical form.
pub fn decode_event(bytes: &[u8]) -> Result<(u64, RegistryEvent), CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let record = as_map(&value, "record")?;
    let seq = get_u64(record, keys::SEQ, "seq")?;
    let raw_kind = get_u64(record, keys::KIND, "kind")?;
    let kind = u16::try_from(raw_kind)
        .ok()
        .and_then(EventKind::from_u16)
        .ok_or_else(|| CoreError::MalformedEvent(format!("unknown kind {:#x}", raw_kind)))?;
    let body = as_map(get(record, keys::BODY, "body")?, "body")?;

    let event = match kind {
        EventKind::Stocked => RegistryEvent::Stocked {
            key: ItemKey::new(get_u64(body, 0, "key")?),
            quantity: get_u64(body, 1, "quantity")?,
            stock: get_u64(body, 2, "stock")?,
        },
        EventKind::Borrowed => RegistryEvent::Borrowed {
            key: ItemKey::new(get_u64(body, 0, "key")?),
            borrower: get_account(body, 1, "borrower")?,
        },
        EventKind::Returned => RegistryEvent::Returned {
            key: ItemKey::new(get_u64(body, 0, "key")?),
            borrower: get_account(body, 1, "borrower")?,
        },
        EventKind::DepositFallback => RegistryEvent::DepositFallback {
            from: get_account(body, 0, "from")?,
            amount: get_amount(body, 1, "amount")?,
            data: get_bytes(body, 2, "data")?.to_vec().into(),
        },
        EventKind::DepositReceive => RegistryEvent::DepositReceive {
            from: get_account(body, 0, "from")?,
            amount: get_amount(body, 1, "amount")?,
        },
    };

    if canonical_event_bytes(seq, &event) != bytes {
        return Err(CoreError::MalformedEvent("non-canonical encoding".into()));
    }

    Ok((seq, event))
}

fn body_to_cbor(event: &RegistryEvent) -> Cbor {
    let fields = match event {
        RegistryEvent::Stocked {
            key,
            quantity,
            stock,
        } => vec![
            (0, Cbor::Uint(key.value())),
            (1, Cbor::Uint(*quantity)),
            (2, Cbor::Uint(*stock)),
        ],
        RegistryEvent::Borrowed { key, borrower } | RegistryEvent::Returned { key, borrower } => {
            vec![
                (0, Cbor::Uint(key.value())),
                (1, Cbor::Bytes(borrower.0.to_vec())),
            ]
        }
        RegistryEvent::DepositFallback { from, amount, data } => vec![
            (0, Cbor::Bytes(from.0.to_vec())),
            (1, Cbor::Bytes(amount.wei().to_be_bytes().to_vec())),
            (2, Cbor::Bytes(data.to_vec())),
        ],
        RegistryEvent::DepositReceive { from, amount } => vec![
            (0, Cbor::Bytes(from.0.to_vec())),
            (1, Cbor::Bytes(amount.wei().to_be_bytes().to_vec())),
        ],
    };
    Cbor::Map(fields)
}

/// Recursively encode a value.
fn encode_to(buf: &mut Vec<u8>, value: &Cbor) {
    match value {
        Cbor::Uint(n) => encode_uint(buf, 0, *n),
        Cbor::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Cbor::Map(entries) => {
            // Numeric order equals encoded byte order for unsigned keys.
            let mut sorted: Vec<&(u64, Cbor)> = entries.iter().collect();
            sorted.sort_by_key(|(k, _)| *k);
            encode_uint(buf, 5, sorted.len() as u64);
            for (k, v) in sorted {
                encode_uint(buf, 0, *k);
                encode_to(buf, v);
            }
        }
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

type Entries = Vec<(Value, Value)>;

fn as_map<'a>(value: &'a Value, what: &str) -> Result<&'a Entries, CoreError> {
    value
        .as_map()
        .ok_or_else(|| CoreError::MalformedEvent(format!("{} is not a map", what)))
}

fn get<'a>(map: &'a Entries, key: u64, what: &str) -> Result<&'a Value, CoreError> {
    map.iter()
        .find(|(k, _)| {
            k.as_integer()
                .and_then(|i| u64::try_from(i).ok())
                .map_or(false, |k| k == key)
        })
        .map(|(_, v)| v)
        .ok_or_else(|| CoreError::MalformedEvent(format!("missing {}", what)))
}

fn get_u64(map: &Entries, key: u64, what: &str) -> Result<u64, CoreError> {
    get(map, key, what)?
        .as_integer()
        .and_then(|i| u64::try_from(i).ok())
        .ok_or_else(|| CoreError::MalformedEvent(format!("{} is not an unsigned integer", what)))
}

fn get_bytes<'a>(map: &'a Entries, key: u64, what: &str) -> Result<&'a [u8], CoreError> {
    get(map, key, what)?
        .as_bytes()
        .map(Vec::as_slice)
        .ok_or_else(|| CoreError::MalformedEvent(format!("{} is not a byte string", what)))
}

fn get_account(map: &Entries, key: u64, what: &str) -> Result<AccountId, CoreError> {
    let bytes: [u8; 20] = get_bytes(map, key, what)?
        .try_into()
        .map_err(|_| CoreError::MalformedEvent(format!("{} must be 20 bytes", what)))?;
    Ok(AccountId(bytes))
}

fn get_amount(map: &Entries, key: u64, what: &str) -> Result<Amount, CoreError> {
    let bytes: [u8; 16] = get_bytes(map, key, what)?
        .try_into()
        .map_err(|_| CoreError::MalformedEvent(format!("{} must be 16 bytes", what)))?;
    Ok(Amount::from_wei(u128::from_be_bytes(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_bytes([0xa1; 20])
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let event = RegistryEvent::Stocked {
            key: ItemKey::new(1),
            quantity: 50,
            stock: 50,
        };
        assert_eq!(
            canonical_event_bytes(1, &event),
            canonical_event_bytes(1, &event)
        );
    }

    #[test]
    fn test_known_prefix() {
        let event = RegistryEvent::Stocked {
            key: ItemKey::new(1),
            quantity: 50,
            stock: 50,
        };
        let bytes = canonical_event_bytes(1, &event);

        // map(3), 0 => 1, 1 => 1, 2 => map(3) ...
        assert_eq!(&bytes[..6], &[0xa3, 0x00, 0x01, 0x01, 0x01, 0x02]);
        assert_eq!(bytes[6], 0xa3);
        // quantity 50 needs the one-byte form
        assert_eq!(&bytes[9..12], &[0x01, 0x18, 0x32]);
    }

    #[test]
    fn test_decode_every_kind() {
        let events = vec![
            RegistryEvent::Stocked {
                key: ItemKey::new(9780062886149),
                quantity: 15,
                stock: 30,
            },
            RegistryEvent::Borrowed {
                key: ItemKey::new(2),
                borrower: alice(),
            },
            RegistryEvent::Returned {
                key: ItemKey::new(2),
                borrower: alice(),
            },
            RegistryEvent::DepositFallback {
                from: alice(),
                amount: Amount::from_wei(u128::MAX),
                data: vec![0x12, 0x34, 0x56, 0x78].into(),
            },
            RegistryEvent::DepositReceive {
                from: alice(),
                amount: Amount::from_wei(1_000_000_000_000_000_000),
            },
        ];

        for (i, event) in events.into_iter().enumerate() {
            let seq = i as u64 + 1;
            let bytes = canonical_event_bytes(seq, &event);
            let (decoded_seq, decoded) = decode_event(&bytes).unwrap();
            assert_eq!(decoded_seq, seq);
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        // {0: 1, 1: 0x0200, 2: {}}
        let bytes = [0xa3, 0x00, 0x01, 0x01, 0x19, 0x02, 0x00, 0x02, 0xa0];
        assert!(matches!(
            decode_event(&bytes),
            Err(CoreError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_event(&[0xff, 0x00]).is_err());
        assert!(decode_event(&[0x01]).is_err());
    }

    #[test]
    fn test_decode_rejects_non_canonical() {
        let event = RegistryEvent::Borrowed {
            key: ItemKey::new(1),
            borrower: alice(),
        };
        let mut bytes = canonical_event_bytes(1, &event);
        // Re-encode seq 1 in the two-byte form: 0x18 0x01.
        bytes.splice(2..3, [0x18, 0x01]);

        assert!(matches!(
            decode_event(&bytes),
            Err(CoreError::MalformedEvent(_))
        ));
    }
}
