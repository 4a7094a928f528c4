//! Catalog: every item ever stocked, its stock count, and its borrow history.
//!
//! Items are never removed. Insertion order is preserved so that key
//! enumeration is stable across calls and across snapshot restores.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::types::{AccountId, ItemKey};

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// The item key, immutable once created.
    pub key: ItemKey,
    /// Units currently on the shelf.
    pub stock: u64,
    /// Every borrower of this item, oldest first. Repeats are kept.
    pub history: Vec<AccountId>,
}

impl Item {
    fn new(key: ItemKey) -> Self {
        Self {
            key,
            stock: 0,
            history: Vec::new(),
        }
    }

    /// Whether at least one unit can be lent.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Insertion-ordered mapping from key to item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Item>", into = "Vec<Item>")]
pub struct Catalog {
    items: Vec<Item>,
    index: HashMap<ItemKey, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct items ever stocked.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been stocked yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the key has been stocked at least once.
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.index.contains_key(key)
    }

    /// Look up an item.
    pub fn get(&self, key: &ItemKey) -> Option<&Item> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    /// Insertion position of a key.
    pub fn position(&self, key: &ItemKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Current stock, zero for unknown keys.
    pub fn stock_of(&self, key: &ItemKey) -> u64 {
        self.get(key).map_or(0, |item| item.stock)
    }

    /// Borrow history, empty for unknown keys.
    pub fn history_of(&self, key: &ItemKey) -> &[AccountId] {
        self.get(key)
            .map(|item| item.history.as_slice())
            .unwrap_or(&[])
    }

    /// All items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Every key ever stocked, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.items.iter().map(|item| item.key)
    }

    /// Keys with at least one unit on the shelf, in insertion order.
    pub fn keys_in_stock(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.items
            .iter()
            .filter(|item| item.is_available())
            .map(|item| item.key)
    }

    /// Add `qty` units, creating the item if unseen. Returns the new total.
    pub fn restock(&mut self, key: ItemKey, qty: u64) -> Result<u64, StateError> {
        if qty == 0 {
            return Err(StateError::InvalidQuantity);
        }
        let total = self
            .stock_of(&key)
            .checked_add(qty)
            .ok_or(StateError::StockOverflow(key))?;

        let item = self.entry(key);
        item.stock = total;
        Ok(total)
    }

    /// Fail unless at least one unit of `key` is on the shelf.
    pub fn ensure_available(&self, key: &ItemKey) -> Result<(), StateError> {
        match self.get(key) {
            Some(item) if item.is_available() => Ok(()),
            _ => Err(StateError::OutOfStock(*key)),
        }
    }

    /// Take one unit off the shelf for `borrower`. Returns the remaining stock.
    pub fn lend(&mut self, key: &ItemKey, borrower: AccountId) -> Result<u64, StateError> {
        self.ensure_available(key)?;
        let item = self.get_mut(key).ok_or(StateError::OutOfStock(*key))?;
        item.stock -= 1;
        item.history.push(borrower);
        Ok(item.stock)
    }

    /// Put one unit back on the shelf. Returns the new stock.
    pub fn take_back(&mut self, key: &ItemKey) -> Result<u64, StateError> {
        let item = self.get_mut(key).ok_or(StateError::OutOfStock(*key))?;
        item.stock = item
            .stock
            .checked_add(1)
            .ok_or(StateError::StockOverflow(*key))?;
        Ok(item.stock)
    }

    fn get_mut(&mut self, key: &ItemKey) -> Option<&mut Item> {
        let i = self.index.get(key).copied()?;
        self.items.get_mut(i)
    }

    fn entry(&mut self, key: ItemKey) -> &mut Item {
        let i = match self.index.get(&key).copied() {
            Some(i) => i,
            None => {
                self.items.push(Item::new(key));
                let i = self.items.len() - 1;
                self.index.insert(key, i);
                i
            }
        };
        &mut self.items[i]
    }
}

impl From<Vec<Item>> for Catalog {
    fn from(items: Vec<Item>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.key, i))
            .collect();
        Self { items, index }
    }
}

impl From<Catalog> for Vec<Item> {
    fn from(catalog: Catalog) -> Self {
        catalog.items
    }
}
