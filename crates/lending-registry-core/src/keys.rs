//! Key strategies: how a stocking request becomes an [`ItemKey`].
//!
//! Two strategies exist:
//!
//! - [`SequentialKeys`]: the administrator stocks by title, and each new
//!   title is assigned the next counter value starting at 1.
//! - [`IsbnKeys`]: the administrator supplies a numeric ISBN that is used
//!   verbatim as the key.
//!
//! Resolution is split in two so the registry can validate a request
//! completely before committing anything: [`KeyStrategy::resolve`] is pure,
//! [`KeyStrategy::record`] commits the assignment.

use std::collections::HashMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::types::{Isbn, ItemKey};

/// Outcome of resolving a stocking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// The key the request maps to.
    pub key: ItemKey,
    /// Whether the key is being assigned for the first time.
    pub fresh: bool,
}

/// A pluggable key-resolution strategy.
pub trait KeyStrategy:
    Debug + Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// What the administrator supplies when stocking.
    type Input: ?Sized + Debug;

    /// Work out the key for `input` without changing any state.
    fn resolve(&self, input: &Self::Input) -> Result<Resolved, StateError>;

    /// Commit a resolution produced by [`KeyStrategy::resolve`].
    fn record(&mut self, input: &Self::Input, resolved: Resolved);

    /// The key previously assigned to `input`, if any.
    fn lookup(&self, input: &Self::Input) -> Option<ItemKey>;
}

/// Title-based keys assigned from a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialKeys {
    next: u64,
    titles: HashMap<String, ItemKey>,
}

impl SequentialKeys {
    /// Create a strategy whose first key is 1.
    pub fn new() -> Self {
        Self {
            next: 1,
            titles: HashMap::new(),
        }
    }

    /// The title a key was assigned to.
    pub fn title_of(&self, key: &ItemKey) -> Option<&str> {
        self.titles
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(title, _)| title.as_str())
    }

    /// Number of titles seen so far.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether no title has been seen.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl Default for SequentialKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStrategy for SequentialKeys {
    type Input = str;

    fn resolve(&self, title: &str) -> Result<Resolved, StateError> {
        if let Some(&key) = self.titles.get(title) {
            return Ok(Resolved { key, fresh: false });
        }
        if self.next == u64::MAX {
            return Err(StateError::InvalidKey("title counter exhausted".into()));
        }
        Ok(Resolved {
            key: ItemKey::new(self.next),
            fresh: true,
        })
    }

    fn record(&mut self, title: &str, resolved: Resolved) {
        if resolved.fresh {
            self.titles.insert(title.to_string(), resolved.key);
            self.next = resolved.key.value() + 1;
        }
    }

    fn lookup(&self, title: &str) -> Option<ItemKey> {
        self.titles.get(title).copied()
    }
}

/// Caller-supplied ISBN keys.
///
/// Holds no state: an ISBN is known exactly when the catalog contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsbnKeys;

impl KeyStrategy for IsbnKeys {
    type Input = Isbn;

    fn resolve(&self, isbn: &Isbn) -> Result<Resolved, StateError> {
        if !isbn.is_valid() {
            return Err(StateError::InvalidKey(format!(
                "isbn {} is zero or wider than 6 bytes",
                isbn
            )));
        }
        // Freshness is the catalog's concern for ISBNs.
        Ok(Resolved {
            key: isbn.key(),
            fresh: false,
        })
    }

    fn record(&mut self, _isbn: &Isbn, _resolved: Resolved) {}

    fn lookup(&self, isbn: &Isbn) -> Option<ItemKey> {
        isbn.is_valid().then(|| isbn.key())
    }
}
