//! Golden test vectors for the canonical event encoding.
//!
//! Each vector pins the exact bytes an event encodes to. Any change to the
//! encoding changes event ids, so these must only change deliberately.

use serde::{Deserialize, Serialize};

use lending_registry_core::{
    canonical_event_bytes, decode_event, AccountId, Amount, EventId, EventRecord, ItemKey,
    RegistryEvent, BORROW_FEE,
};

/// A single golden vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,
    pub seq: u64,
    pub event: RegistryEvent,
    /// Expected canonical bytes, hex.
    pub canonical_hex: String,
}

impl GoldenVector {
    fn new(name: &str, description: &str, seq: u64, event: RegistryEvent, hex: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            seq,
            event,
            canonical_hex: hex.to_string(),
        }
    }

    /// The record this vector describes.
    pub fn record(&self) -> EventRecord {
        EventRecord::new(self.seq, self.event.clone())
    }
}

/// Every golden vector.
pub fn all_vectors() -> Vec<GoldenVector> {
    let reader = AccountId::from_bytes([0x70; 20]);
    let isbn = ItemKey::new(9780062886149);

    vec![
        GoldenVector::new(
            "stocked_title",
            "first title stocked with 50 units",
            1,
            RegistryEvent::Stocked {
                key: ItemKey::new(1),
                quantity: 50,
                stock: 50,
            },
            "a30001010102a30001011832021832",
        ),
        GoldenVector::new(
            "borrowed_isbn",
            "an ISBN key needs the eight-byte integer form",
            2,
            RegistryEvent::Borrowed {
                key: isbn,
                borrower: reader,
            },
            "a30002010202a2001b000008e5192c990501547070707070707070707070707070707070707070",
        ),
        GoldenVector::new(
            "deposit_receive_fee",
            "plain transfer of one finney",
            3,
            RegistryEvent::DepositReceive {
                from: AccountId::from_bytes([0x11; 20]),
                amount: BORROW_FEE,
            },
            "a300030119010102a2005411111111111111111111111111111111111111110150000000000000000000038d7ea4c68000",
        ),
        GoldenVector::new(
            "deposit_fallback_data",
            "unmatched call carrying four bytes and no value",
            4,
            RegistryEvent::DepositFallback {
                from: AccountId::from_bytes([0x22; 20]),
                amount: Amount::ZERO,
                data: vec![0xde, 0xad, 0xbe, 0xef].into(),
            },
            "a300040119010002a3005422222222222222222222222222222222222222220150000000000000000000000000000000000244deadbeef",
        ),
        GoldenVector::new(
            "returned_isbn",
            "differs from borrowed_isbn only in seq and kind",
            5,
            RegistryEvent::Returned {
                key: isbn,
                borrower: reader,
            },
            "a30005010302a2001b000008e5192c990501547070707070707070707070707070707070707070",
        ),
    ]
}

/// Check one vector: encoding, decoding and id.
pub fn verify_vector(vector: &GoldenVector) -> Result<(), String> {
    let bytes = canonical_event_bytes(vector.seq, &vector.event);
    let actual = hex::encode(&bytes);
    if actual != vector.canonical_hex {
        return Err(format!(
            "{}: expected {}, got {}",
            vector.name, vector.canonical_hex, actual
        ));
    }

    let (seq, event) = decode_event(&bytes).map_err(|e| format!("{}: {}", vector.name, e))?;
    if seq != vector.seq || event != vector.event {
        return Err(format!("{}: decoded to a different event", vector.name));
    }

    let record = vector.record();
    if record.id != EventId::hash(&bytes) || !record.verify_id() {
        return Err(format!("{}: id does not match bytes", vector.name));
    }
    Ok(())
}

/// Check every vector, collecting all failures.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

/// Export all vectors as JSON.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        if let Err(failures) = verify_all_vectors() {
            panic!("golden vectors failed:\n{}", failures.join("\n"));
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_ids_differ_across_vectors() {
        let mut ids: Vec<_> = all_vectors().iter().map(|v| v.record().id).collect();
        let count = ids.len();
        ids.sort_by_key(|id| id.0);
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_json_export_reloads() {
        let json = vectors_json().unwrap();
        let reloaded: Vec<GoldenVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, all_vectors());
    }

    #[test]
    fn test_tampered_vector_detected() {
        let mut vector = all_vectors().remove(0);
        vector.canonical_hex.replace_range(..2, "a4");
        assert!(verify_vector(&vector).is_err());
    }
}
