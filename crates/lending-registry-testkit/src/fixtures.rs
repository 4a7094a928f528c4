//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use lending_registry::{Library, Registry, RegistryConfig, Result};
use lending_registry_core::{AccountId, Isbn, IsbnKeys, SequentialKeys};
use lending_registry_store::MemoryStore;

/// The three ISBNs the second-generation suites stock.
pub const DEPLOY_ISBNS: [Isbn; 3] = [
    Isbn(9780062886149),
    Isbn(9780062886150),
    Isbn(9780062886151),
];

/// A deterministic account derived from a label.
pub fn account(label: &str) -> AccountId {
    let hash = blake3::hash(label.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[..20]);
    AccountId::from_bytes(bytes)
}

/// A fresh random account.
pub fn random_account() -> AccountId {
    AccountId::from_bytes(rand::random())
}

/// An administrator and three other accounts.
#[derive(Debug, Clone)]
pub struct TestFixture {
    pub owner: AccountId,
    pub others: [AccountId; 3],
}

impl TestFixture {
    /// Create a fixture with deterministic accounts.
    pub fn new() -> Self {
        Self {
            owner: account("owner"),
            others: [account("other-1"), account("other-2"), account("other-3")],
        }
    }

    /// Create a fixture whose accounts are random.
    pub fn random() -> Self {
        Self {
            owner: random_account(),
            others: [random_account(), random_account(), random_account()],
        }
    }

    /// Configuration naming this fixture's owner as administrator.
    pub fn config(&self) -> RegistryConfig {
        RegistryConfig::new(self.owner)
    }

    /// An empty title-keyed registry.
    pub fn titles(&self) -> Registry<SequentialKeys> {
        Registry::new(self.config())
    }

    /// An empty ISBN-keyed registry.
    pub fn isbns(&self) -> Registry<IsbnKeys> {
        Registry::new(self.config())
    }

    /// An ISBN-keyed registry holding `quantity` of each [`DEPLOY_ISBNS`] entry.
    pub fn with_books(&self, quantity: u64) -> Result<Registry<IsbnKeys>> {
        let mut registry = self.isbns();
        for isbn in &DEPLOY_ISBNS {
            registry.stock(&self.owner, isbn, quantity)?;
        }
        Ok(registry)
    }

    /// An ISBN-keyed library over a fresh memory store.
    pub async fn library(&self) -> Result<Library<IsbnKeys, MemoryStore>> {
        Library::open(self.config(), MemoryStore::new()).await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
