use super::{heap::ExpiryHeap, table::EntryTable};
use std::hash::Hash;
use tokio::time::Instant;

/// Everything the store mutates under its one lock.
///
/// The table and the heap move in lockstep: every live key has exactly
/// one heap entry carrying its current deadline.
#[derive(Debug)]
pub(crate) struct State<K, V> {
    pub(crate) table: EntryTable<K, V>,
    pub(crate) heap: ExpiryHeap<K>,
    pub(crate) shutdown: bool,
}

impl<K, V> State<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            table: EntryTable::new(),
            heap: ExpiryHeap::new(),
            shutdown: false,
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }
}
