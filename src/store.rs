pub(crate) mod builder;
pub(crate) mod entry;
pub(crate) mod heap;
pub(crate) mod reaper;
pub(crate) mod shared_state;
pub(crate) mod state;
pub(crate) mod table;

pub use builder::Builder;

use self::shared_state::Shared;
use crate::error::{StoreError, StoreResult};

use std::{fmt, hash::Hash, sync::Arc};
use tokio::time::{Duration, Instant};
use tracing::debug;

/// A key-value store whose entries expire a fixed time after their
/// last write.
///
/// Handles are cheap to clone and share one underlying store. A
/// background reaper task, spawned at construction, removes entries as
/// their deadline passes and hands each removal to the optional
/// callback. Reads never expire entries themselves: a key past its
/// deadline stays visible until the reaper gets to it.
pub struct TtlStore<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> TtlStore<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    pub fn builder() -> Builder<K, V> {
        Builder::new()
    }

    /// Store with the given entry lifetime and no removal callback.
    pub fn new(ttl: Duration) -> StoreResult<Self> {
        Builder::new().with_ttl(ttl).build()
    }

    /// Inserts `value` under `key`, starting a fresh lifetime.
    ///
    /// Overwriting an existing key resets its deadline; the key is
    /// never observed absent across the overwrite.
    pub fn set(&self, key: K, value: V) {
        let mut state = self.shared.state.lock().unwrap();

        let was_empty = state.table.is_empty();
        let now = Instant::now();

        // one heap entry per live key: displace any old deadline first
        state.heap.remove_key(&key);
        state.heap.push(now + self.shared.ttl, key.clone());
        state.table.insert(key, value, now);

        debug_assert_eq!(state.table.len(), state.heap.len());
        drop(state);

        if was_empty {
            if self.shared.debug {
                debug!("store no longer empty, waking reaper");
            }
            self.shared.reaper_task.notify_one();
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// Absence reflects the table as-is: a key whose deadline has
    /// passed but which the reaper has not yet removed is still
    /// returned. That lag is bounded by reaper scheduling and is part
    /// of the contract, not repaired here by checking deadlines on
    /// read.
    pub fn get(&self, key: &K) -> StoreResult<V>
    where
        V: Clone,
    {
        let state = self.shared.state.lock().unwrap();

        state
            .table
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or(StoreError::KeyNotFound)
    }

    /// Removes `key`, delivering it to the removal callback.
    pub fn delete(&self, key: &K) -> StoreResult<()> {
        self.take(key).map(|_| ())
    }

    /// Removes `key` and returns its value, delivering both to the
    /// removal callback first.
    pub fn pop(&self, key: &K) -> StoreResult<V> {
        self.take(key)
    }

    /// Returns the value under `key` if present, leaving its deadline
    /// untouched; otherwise inserts `default` exactly as [`set`] would
    /// and returns it.
    ///
    /// [`set`]: TtlStore::set
    pub fn get_or_insert(&self, key: K, default: V) -> V
    where
        V: Clone,
    {
        let mut state = self.shared.state.lock().unwrap();

        if let Some(entry) = state.table.get(&key) {
            return entry.value.clone();
        }

        let was_empty = state.table.is_empty();
        let now = Instant::now();

        state.heap.push(now + self.shared.ttl, key.clone());
        state.table.insert(key, default.clone(), now);

        debug_assert_eq!(state.table.len(), state.heap.len());
        drop(state);

        if was_empty {
            if self.shared.debug {
                debug!("store no longer empty, waking reaper");
            }
            self.shared.reaper_task.notify_one();
        }

        default
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let state = self.shared.state.lock().unwrap();
        state.table.contains(key)
    }

    pub fn len(&self) -> usize {
        let state = self.shared.state.lock().unwrap();
        state.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the live keys, oldest insertion first.
    pub fn keys(&self) -> Vec<K> {
        let state = self.shared.state.lock().unwrap();
        state.table.keys()
    }

    /// Snapshot of the live values, in key insertion order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let state = self.shared.state.lock().unwrap();
        state.table.values()
    }

    // Bulk mutation is intentionally outside the supported surface;
    // every supported mutation keeps the table and the expiry heap in
    // lockstep, one key at a time.

    /// Not supported; fails with [`StoreError::Unsupported`].
    pub fn clear(&self) -> StoreResult<()> {
        Err(StoreError::Unsupported("clear"))
    }

    /// Not supported; fails with [`StoreError::Unsupported`].
    pub fn extend<I>(&self, _entries: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Err(StoreError::Unsupported("extend"))
    }

    /// Not supported; fails with [`StoreError::Unsupported`].
    pub fn snapshot(&self) -> StoreResult<Self> {
        Err(StoreError::Unsupported("snapshot"))
    }

    /// Not supported; fails with [`StoreError::Unsupported`].
    pub fn pop_any(&self) -> StoreResult<(K, V)> {
        Err(StoreError::Unsupported("pop_any"))
    }

    /// Stops the reaper and waits for it to finish. Idempotent.
    ///
    /// The store keeps serving reads and writes afterwards, but no
    /// entry expires any more. Dropping every handle without calling
    /// this also winds the reaper down, on its next wake-up.
    pub async fn close(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }
        self.shared.reaper_task.notify_one();

        let handle = self.shared.reaper_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            // the reaper never panics; a join error only means the
            // runtime is already tearing down
            let _ = handle.await;
        }
    }

    fn take(&self, key: &K) -> StoreResult<V> {
        let mut state = self.shared.state.lock().unwrap();

        let entry = match state.table.remove(key) {
            Some(entry) => entry,
            None => return Err(StoreError::KeyNotFound),
        };
        let removed_root = state.heap.remove_key(key) == Some(0);

        debug_assert_eq!(state.table.len(), state.heap.len());
        drop(state);

        if removed_root {
            // the reaper may be sleeping on the deadline that just left
            if self.shared.debug {
                debug!(key = ?key, "earliest deadline removed, waking reaper");
            }
            self.shared.reaper_task.notify_one();
        }

        self.shared.deliver(key, &entry.value);
        Ok(entry.value)
    }
}

impl<K, V> Clone for TtlStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<K, V> fmt::Debug for TtlStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.shared.state.lock().unwrap().table.len();

        f.debug_struct("TtlStore")
            .field("ttl", &self.shared.ttl)
            .field("len", &len)
            .finish()
    }
}
