//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use lending_registry_core::EventRecord;

use crate::error::{Result, StoreError};
use crate::traits::{check_sequence, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Latest committed snapshot.
    snapshot: Option<Vec<u8>>,

    /// Journal indexed by seq.
    events: BTreeMap<u64, EventRecord>,
}

impl MemoryStoreInner {
    fn last_seq(&self) -> u64 {
        self.events.keys().next_back().copied().unwrap_or(0)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_snapshot(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.read()?.snapshot.clone())
    }

    async fn commit(&self, snapshot: &[u8], events: &[EventRecord]) -> Result<()> {
        let mut inner = self.write()?;
        check_sequence(inner.last_seq(), events)?;

        inner.snapshot = Some(snapshot.to_vec());
        for record in events {
            inner.events.insert(record.seq, record.clone());
        }
        Ok(())
    }

    async fn get_event(&self, seq: u64) -> Result<Option<EventRecord>> {
        Ok(self.read()?.events.get(&seq).cloned())
    }

    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        let inner = self.read()?;
        Ok(inner
            .events
            .range(after_seq.saturating_add(1)..)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn last_event_seq(&self) -> Result<u64> {
        Ok(self.read()?.last_seq())
    }
}
