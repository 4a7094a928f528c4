//! The Library: a registry whose state lives in a [`Store`].
//!
//! Each mutating call runs against the in-memory registry first. The new
//! snapshot and the call's record are then committed to the store in one
//! unit. If that fails the registry is put back the way it was, so a failed
//! write commits nothing. Sinks hear about a record only once it is durable.

use std::borrow;
use std::sync::Arc;

use bytes::Bytes;

use lending_registry_core::{AccountId, Amount, EventRecord, ItemKey, KeyStrategy, RegistryState};
use lending_registry_store::{Store, StoreError};

use crate::call::Call;
use crate::error::Result;
use crate::registry::{Registry, RegistryConfig};
use crate::sink::EventSink;

/// A persistent lending registry.
pub struct Library<K: KeyStrategy, S: Store> {
    registry: Registry<K>,
    store: Arc<S>,
}

impl<K: KeyStrategy, S: Store> Library<K, S> {
    /// Open a library over `store`.
    ///
    /// Restores the last committed snapshot, or starts empty if the store
    /// has never been written.
    pub async fn open(config: RegistryConfig, store: S) -> Result<Self> {
        let state = match store.load_snapshot().await? {
            Some(bytes) => RegistryState::<K>::from_snapshot(&bytes)?,
            None => RegistryState::new(),
        };

        let journaled = store.last_event_seq().await?;
        if state.last_seq() != journaled {
            return Err(StoreError::InvalidData(format!(
                "snapshot is at seq {} but the journal ends at {}",
                state.last_seq(),
                journaled
            ))
            .into());
        }

        tracing::debug!(
            last_seq = journaled,
            items = state.catalog().len(),
            loans = state.ledger().len(),
            "opened library"
        );
        Ok(Self {
            registry: Registry::with_state(config, state),
            store: Arc::new(store),
        })
    }

    /// Attach a sink. Sinks see every record persisted from now on.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.registry.subscribe(sink);
    }

    /// The in-memory registry, for queries.
    pub fn registry(&self) -> &Registry<K> {
        &self.registry
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Route a call, persist its outcome, then notify sinks.
    pub async fn dispatch<I: borrow::Borrow<K::Input>>(
        &mut self,
        caller: &AccountId,
        value: Amount,
        call: Call<I>,
    ) -> Result<EventRecord> {
        let previous = self.registry.state().clone();
        let record = self.registry.apply(caller, value, call)?;

        if let Err(e) = self.persist(&record).await {
            tracing::warn!(seq = record.seq, error = %e, "persist failed, rolling back");
            self.registry.restore(previous);
            return Err(e);
        }

        self.registry.publish(&record);
        Ok(record)
    }

    async fn persist(&self, record: &EventRecord) -> Result<()> {
        let snapshot = self.registry.state().to_snapshot()?;
        self.store
            .commit(&snapshot, std::slice::from_ref(record))
            .await?;
        Ok(())
    }

    /// Add `quantity` units of `item`. Administrator only.
    pub async fn stock(
        &mut self,
        caller: &AccountId,
        item: &K::Input,
        quantity: u64,
    ) -> Result<EventRecord> {
        self.dispatch(caller, Amount::ZERO, Call::Stock { item, quantity })
            .await
    }

    /// Borrow one unit of `key`, paying `paid`.
    pub async fn borrow(
        &mut self,
        caller: &AccountId,
        key: ItemKey,
        paid: Amount,
    ) -> Result<EventRecord> {
        self.dispatch::<&K::Input>(caller, paid, Call::Borrow { key })
            .await
    }

    /// Return whatever `caller` holds.
    pub async fn return_book(&mut self, caller: &AccountId) -> Result<EventRecord> {
        self.dispatch::<&K::Input>(caller, Amount::ZERO, Call::ReturnBook)
            .await
    }

    /// Accept a call that matched no operation.
    pub async fn fallback(
        &mut self,
        caller: &AccountId,
        value: Amount,
        data: impl Into<Bytes>,
    ) -> Result<EventRecord> {
        let data = data.into();
        self.dispatch::<&K::Input>(caller, value, Call::Unmatched { data })
            .await
    }

    /// Accept a plain value transfer.
    pub async fn receive(&mut self, caller: &AccountId, value: Amount) -> Result<EventRecord> {
        self.dispatch::<&K::Input>(caller, value, Call::Transfer)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Journal
    // ─────────────────────────────────────────────────────────────────────────

    /// Persisted records after `after_seq`, oldest first.
    pub async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        Ok(self.store.events_since(after_seq).await?)
    }

    /// The persisted record with sequence number `seq`.
    pub async fn event(&self, seq: u64) -> Result<Option<EventRecord>> {
        Ok(self.store.get_event(seq).await?)
    }
}

impl<K: KeyStrategy, S: Store> std::fmt::Debug for Library<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
