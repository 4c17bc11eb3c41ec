use super::entry::Entry;
use std::{collections::HashMap, hash::Hash};
use tokio::time::Instant;

/// Key to value mapping for live entries, iterated in insertion order.
///
/// The table has no notion of time beyond recording when a key was
/// last written; removing entries whose deadline has passed is the
/// reaper's job alone.
#[derive(Debug)]
pub(crate) struct EntryTable<K, V> {
    entries: HashMap<K, Entry<V>>,
    order: Vec<K>,
}

impl<K, V> EntryTable<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Inserts or overwrites. A re-inserted key keeps its original
    /// position in the iteration order.
    pub(crate) fn insert(&mut self, key: K, value: V, touched_at: Instant) {
        let replaced = self
            .entries
            .insert(key.clone(), Entry::new(value, touched_at));

        if replaced.is_none() {
            self.order.push(key);
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<&Entry<V>> {
        self.entries.get(key)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Live keys, oldest insertion first.
    pub(crate) fn keys(&self) -> Vec<K> {
        self.order.clone()
    }

    /// Live values, in key insertion order.
    pub(crate) fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| entry.value.clone()))
            .collect()
    }
}

// Size queries place no demands on the key type.
impl<K, V> EntryTable<K, V> {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
