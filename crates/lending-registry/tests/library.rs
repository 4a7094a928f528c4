//! Persistence: libraries over real and failing stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lending_registry::core::{EventRecord, RegistryState};
use lending_registry::store::{self, MemoryStore, SqliteStore, Store, StoreError};
use lending_registry::{
    AccountId, Amount, EventLog, Isbn, IsbnKeys, ItemKey, Library, RegistryConfig, RegistryError,
    SequentialKeys, BORROW_FEE,
};

fn admin() -> AccountId {
    AccountId::from_bytes([1; 20])
}

fn reader() -> AccountId {
    AccountId::from_bytes([2; 20])
}

/// A memory store whose commits can be made to fail on demand.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: Arc<MemoryStore>,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn load_snapshot(&self) -> store::Result<Option<Vec<u8>>> {
        self.inner.load_snapshot().await
    }

    async fn commit(&self, snapshot: &[u8], events: &[EventRecord]) -> store::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidData("disk full".into()));
        }
        self.inner.commit(snapshot, events).await
    }

    async fn get_event(&self, seq: u64) -> store::Result<Option<EventRecord>> {
        self.inner.get_event(seq).await
    }

    async fn events_since(&self, after_seq: u64) -> store::Result<Vec<EventRecord>> {
        self.inner.events_since(after_seq).await
    }

    async fn last_event_seq(&self) -> store::Result<u64> {
        self.inner.last_event_seq().await
    }
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");
    let isbn = Isbn(9780062886149);

    {
        let store = SqliteStore::open(&path).unwrap();
        let mut library = Library::<IsbnKeys, _>::open(RegistryConfig::new(admin()), store)
            .await
            .unwrap();
        library.stock(&admin(), &isbn, 15).await.unwrap();
        library.borrow(&reader(), isbn.key(), BORROW_FEE).await.unwrap();
        library
            .receive(&reader(), Amount::parse_ether("1").unwrap())
            .await
            .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let mut library = Library::<IsbnKeys, _>::open(RegistryConfig::new(admin()), store)
        .await
        .unwrap();

    let registry = library.registry();
    assert_eq!(registry.get_stock(&isbn.key()), 14);
    assert_eq!(registry.has_borrowed(&reader()), isbn.key());
    assert_eq!(registry.book_history(&isbn.key()), &[reader()]);
    assert_eq!(registry.deposits().receive_count, 1);
    assert_eq!(registry.state().last_seq(), 3);

    // Numbering continues where it left off.
    let record = library.return_book(&reader()).await.unwrap();
    assert_eq!(record.seq, 4);
    assert_eq!(library.events_since(3).await.unwrap(), vec![record]);
}

#[tokio::test]
async fn titles_survive_reopen() {
    let store = FlakyStore::default();
    {
        let mut library =
            Library::<SequentialKeys, _>::open(RegistryConfig::new(admin()), store.clone())
                .await
                .unwrap();
        library.stock(&admin(), "testing", 50).await.unwrap();
    }

    let mut library = Library::<SequentialKeys, _>::open(RegistryConfig::new(admin()), store)
        .await
        .unwrap();
    assert_eq!(library.registry().get_id("testing"), ItemKey::new(1));

    library.stock(&admin(), "testing 2", 1).await.unwrap();
    assert_eq!(library.registry().get_id("testing 2"), ItemKey::new(2));
}

#[tokio::test]
async fn failed_persist_rolls_back() {
    let store = FlakyStore::default();
    let mut library = Library::<IsbnKeys, _>::open(RegistryConfig::new(admin()), store.clone())
        .await
        .unwrap();
    let log = EventLog::new();
    library.subscribe(log.clone());

    let isbn = Isbn(9780062886150);
    library.stock(&admin(), &isbn, 2).await.unwrap();
    let before = library.registry().state().clone();

    store.fail(true);
    let err = library
        .borrow(&reader(), isbn.key(), BORROW_FEE)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Store(_)));
    assert!(!err.is_rejection());

    assert_eq!(library.registry().state(), &before);
    assert_eq!(library.registry().has_borrowed(&reader()), ItemKey::NONE);
    assert_eq!(log.len().unwrap(), 1, "sinks must not see unpersisted records");

    store.fail(false);
    let record = library
        .borrow(&reader(), isbn.key(), BORROW_FEE)
        .await
        .unwrap();
    assert_eq!(record.seq, 2);
    assert_eq!(log.len().unwrap(), 2);
    assert_eq!(store.last_event_seq().await.unwrap(), 2);
}

#[tokio::test]
async fn rejected_call_never_reaches_store() {
    let store = FlakyStore::default();
    let mut library = Library::<IsbnKeys, _>::open(RegistryConfig::new(admin()), store.clone())
        .await
        .unwrap();

    // A failing store is never consulted for a call that is rejected first.
    store.fail(true);
    let err = library
        .stock(&reader(), &Isbn(9780062886151), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized { .. }));
}

#[tokio::test]
async fn mismatched_snapshot_refused() {
    let store = MemoryStore::new();
    let mut state = RegistryState::<IsbnKeys>::new();
    state.stock(&Isbn(7), 1).unwrap();
    let event = state.stock(&Isbn(7), 1).unwrap();
    let record = state.next_record(event);
    // Snapshot claims seq 1 but the journal is empty.
    let bytes = state.to_snapshot().unwrap();
    store.commit(&bytes, &[]).await.unwrap();
    assert_eq!(record.seq, 1);

    let result = Library::<IsbnKeys, _>::open(RegistryConfig::new(admin()), store).await;
    assert!(matches!(
        result,
        Err(RegistryError::Store(StoreError::InvalidData(_)))
    ));
}
