//! Insertion-ordered, identity de-duplicated item collection.

use std::collections::HashSet;

use bazaar_core::Keyed;

/// Items in display order, each identity present at most once.
#[derive(Debug, Clone)]
pub struct ItemCollection<T: Keyed> {
    items: Vec<T>,
    keys: HashSet<T::Key>,
}

impl<T: Keyed> Default for ItemCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<T: Keyed> ItemCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything and take `items`, keeping the first of any repeated key.
    pub fn replace(&mut self, items: Vec<T>) -> usize {
        self.clear();
        self.append(items)
    }

    /// Append items whose key is not already present. Returns how many were added.
    pub fn append(&mut self, items: Vec<T>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.keys.insert(item.key()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
