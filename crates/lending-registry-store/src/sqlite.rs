//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the lending registry. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use lending_registry_core::{decode_event, EventId, EventRecord};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{check_sequence, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Lock(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn last_seq(conn: &Connection) -> Result<u64> {
    let seq: u64 = conn.query_row("SELECT COALESCE(MAX(seq), 0) FROM events", [], |row| {
        row.get(0)
    })?;
    Ok(seq)
}

/// Decode a stored event and check it against its indexed columns.
fn decode_row(seq: u64, id_bytes: &[u8], canonical: &[u8]) -> Result<EventRecord> {
    let (decoded_seq, event) = decode_event(canonical)?;
    if decoded_seq != seq {
        return Err(StoreError::InvalidData(format!(
            "event row {} encodes seq {}",
            seq, decoded_seq
        )));
    }

    let stored_id = EventId::try_from(id_bytes)
        .map_err(|e| StoreError::InvalidData(format!("event row {}: {}", seq, e)))?;
    let record = EventRecord::new(seq, event);
    if record.id != stored_id {
        return Err(StoreError::InvalidData(format!(
            "event row {} does not match its id",
            seq
        )));
    }
    Ok(record)
}

fn row_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u64, Vec<u8>, Vec<u8>)> {
    Ok((row.get("seq")?, row.get("event_id")?, row.get("canonical_bytes")?))
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<u8>>> {
        self.run(|conn| {
            let state = conn
                .query_row("SELECT state FROM snapshots WHERE id = 1", [], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(state)
        })
        .await
    }

    async fn commit(&self, snapshot: &[u8], events: &[EventRecord]) -> Result<()> {
        let snapshot = snapshot.to_vec();
        let events = events.to_vec();

        self.run(move |conn| {
            let tx = conn.transaction()?;
            let last = last_seq(&tx)?;
            check_sequence(last, &events)?;

            let now = now_millis();
            let snapshot_seq = events.last().map(|r| r.seq).unwrap_or(last);
            tx.execute(
                "INSERT OR REPLACE INTO snapshots (id, state, last_seq, updated_at)
                 VALUES (1, ?1, ?2, ?3)",
                params![snapshot, snapshot_seq, now],
            )?;

            for record in &events {
                tx.execute(
                    "INSERT INTO events (seq, event_id, kind, item_key, canonical_bytes, recorded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        record.seq,
                        record.id.as_bytes().as_slice(),
                        record.kind().to_u16(),
                        record.event.key().map(|k| k.value()),
                        record.canonical_bytes(),
                        now,
                    ],
                )?;
            }

            tx.commit()?;
            tracing::debug!(
                events = events.len(),
                last_seq = snapshot_seq,
                "committed snapshot"
            );
            Ok(())
        })
        .await
    }

    async fn get_event(&self, seq: u64) -> Result<Option<EventRecord>> {
        self.run(move |conn| {
            let parts = conn
                .query_row(
                    "SELECT seq, event_id, canonical_bytes FROM events WHERE seq = ?1",
                    params![seq],
                    row_parts,
                )
                .optional()?;

            parts
                .map(|(seq, id, canonical)| decode_row(seq, &id, &canonical))
                .transpose()
        })
        .await
    }

    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, event_id, canonical_bytes FROM events
                 WHERE seq > ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt
                .query_map(params![after_seq], row_parts)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.iter()
                .map(|(seq, id, canonical)| decode_row(*seq, id, canonical))
                .collect()
        })
        .await
    }

    async fn last_event_seq(&self) -> Result<u64> {
        self.run(|conn| last_seq(conn)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lending_registry_core::{AccountId, Amount, ItemKey, RegistryEvent};

    fn stocked(seq: u64) -> EventRecord {
        EventRecord::new(
            seq,
            RegistryEvent::Stocked {
                key: ItemKey::new(9780062886149),
                quantity: 15,
                stock: 15 * seq,
            },
        )
    }

    fn received(seq: u64) -> EventRecord {
        EventRecord::new(
            seq,
            RegistryEvent::DepositReceive {
                from: AccountId::from_bytes([7; 20]),
                amount: Amount::from_wei(1_000),
            },
        )
    }

    #[tokio::test]
    async fn test_commit_and_read_back() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.load_snapshot().await.unwrap(), None);
        assert_eq!(store.last_event_seq().await.unwrap(), 0);

        store
            .commit(b"snapshot", &[stocked(1), received(2)])
            .await
            .unwrap();

        assert_eq!(store.load_snapshot().await.unwrap(), Some(b"snapshot".to_vec()));
        assert_eq!(store.last_event_seq().await.unwrap(), 2);
        assert_eq!(store.get_event(1).await.unwrap(), Some(stocked(1)));
        assert_eq!(store.get_event(3).await.unwrap(), None);
        assert_eq!(store.events_since(0).await.unwrap(), vec![stocked(1), received(2)]);
        assert_eq!(store.events_since(2).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_gap_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        store.commit(b"first", &[stocked(1)]).await.unwrap();

        let err = store
            .commit(b"second", &[stocked(2), stocked(4)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SequenceGap { expected: 3, got: 4 }));

        assert_eq!(store.load_snapshot().await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(store.last_event_seq().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_only_commit() {
        let store = SqliteStore::open_memory().unwrap();
        store.commit(b"a", &[stocked(1)]).await.unwrap();
        store.commit(b"b", &[]).await.unwrap();

        assert_eq!(store.load_snapshot().await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.last_event_seq().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .commit(b"persisted", &[stocked(1), received(2)])
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_snapshot().await.unwrap(), Some(b"persisted".to_vec()));
        assert_eq!(store.last_event_seq().await.unwrap(), 2);
        assert_eq!(store.get_event(2).await.unwrap(), Some(received(2)));
    }

    #[tokio::test]
    async fn test_corrupted_row_detected() {
        let store = SqliteStore::open_memory().unwrap();
        store.commit(b"s", &[stocked(1)]).await.unwrap();

        store
            .run(|conn| {
                conn.execute(
                    "UPDATE events SET event_id = ?1 WHERE seq = 1",
                    params![[0u8; 32].as_slice()],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            store.get_event(1).await,
            Err(StoreError::InvalidData(_))
        ));
    }
}
