use tokio::time::Instant;

#[derive(Debug)]
pub(crate) struct HeapEntry<K> {
    pub(crate) deadline: Instant,
    pub(crate) key: K,
}

/// Binary min-heap over entry deadlines, one entry per live key.
///
/// The root is always the next key due to expire. Backed by a `Vec`
/// rather than `std::collections::BinaryHeap` because removal by key
/// has to report the position the entry held, which the standard heap
/// cannot do.
#[derive(Debug)]
pub(crate) struct ExpiryHeap<K> {
    entries: Vec<HeapEntry<K>>,
}

impl<K> ExpiryHeap<K>
where
    K: Eq,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an entry for `key`. The caller must have removed any
    /// previous entry for the same key first.
    pub(crate) fn push(&mut self, deadline: Instant, key: K) {
        self.entries.push(HeapEntry { deadline, key });
        self.sift_up(self.entries.len() - 1);
    }

    pub(crate) fn peek(&self) -> Option<&HeapEntry<K>> {
        self.entries.first()
    }

    pub(crate) fn pop(&mut self) -> Option<HeapEntry<K>> {
        if self.is_empty() {
            return None;
        }

        let removed = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }

        Some(removed)
    }

    /// Removes the entry for `key`, restoring heap order afterwards.
    ///
    /// Returns the index the entry occupied, found by a linear scan;
    /// `Some(0)` means the earliest deadline was removed, which is the
    /// caller's cue to wake the reaper. `None` if the key has no entry.
    pub(crate) fn remove_key(&mut self, key: &K) -> Option<usize> {
        let index = self.entries.iter().position(|entry| entry.key == *key)?;

        self.entries.swap_remove(index);
        if index < self.entries.len() {
            // the element swapped in may be out of order in either direction
            if self.sift_up(index) == index {
                self.sift_down(index);
            }
        }

        Some(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sift_up(&mut self, index: usize) -> usize {
        let mut child = index;

        while child > 0 {
            let parent = (child - 1) / 2;
            if self.entries[parent].deadline <= self.entries[child].deadline {
                break;
            }
            self.entries.swap(child, parent);
            child = parent;
        }

        child
    }

    fn sift_down(&mut self, index: usize) {
        let mut parent = index;

        loop {
            let left = 2 * parent + 1;
            let right = left + 1;

            let mut earliest = parent;
            if left < self.entries.len()
                && self.entries[left].deadline < self.entries[earliest].deadline
            {
                earliest = left;
            }
            if right < self.entries.len()
                && self.entries[right].deadline < self.entries[earliest].deadline
            {
                earliest = right;
            }

            if earliest == parent {
                break;
            }

            self.entries.swap(parent, earliest);
            parent = earliest;
        }
    }
}
