//! Store trait: the abstract interface for registry persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use lending_registry_core::EventRecord;

use crate::error::{Result, StoreError};

/// The Store trait: async interface for registry persistence.
///
/// # Design Notes
///
/// - **Single writer**: one registry owns a store; the trait does not
///   arbitrate between concurrent writers.
/// - **Atomic commits**: [`Store::commit`] replaces the snapshot and appends
///   events as one unit.
/// - **Contiguous journal**: the first appended event must carry
///   `last_event_seq() + 1`, and each following one the next number.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Snapshot Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the latest snapshot, if one was ever committed.
    async fn load_snapshot(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the snapshot and append the events that produced it.
    ///
    /// # Returns
    /// - `SequenceGap` if `events` does not continue the journal; nothing is
    ///   written in that case.
    async fn commit(&self, snapshot: &[u8], events: &[EventRecord]) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Journal Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get an event by its sequence number.
    async fn get_event(&self, seq: u64) -> Result<Option<EventRecord>>;

    /// Get all events after a given sequence number, ordered by seq.
    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>>;

    /// Sequence number of the last journaled event, zero if none.
    async fn last_event_seq(&self) -> Result<u64>;
}

/// Check that `events` continue a journal whose last entry is `last_seq`.
pub fn check_sequence(last_seq: u64, events: &[EventRecord]) -> Result<()> {
    let mut expected = last_seq + 1;
    for record in events {
        if record.seq != expected {
            return Err(StoreError::SequenceGap {
                expected,
                got: record.seq,
            });
        }
        if !record.verify_id() {
            return Err(StoreError::InvalidData(format!(
                "event {} does not match its id",
                record.seq
            )));
        }
        expected += 1;
    }
    Ok(())
}
