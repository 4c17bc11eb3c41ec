use super::state::State;
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Mutex,
};
use tokio::{sync::Notify, task::JoinHandle, time::Duration};
use tracing::warn;

pub(crate) type RemovalCallback<K, V> = Box<dyn Fn(&K, &V) + Send + Sync>;

/// State shared between every store handle and the reaper task.
pub(crate) struct Shared<K, V> {
    pub(crate) state: Mutex<State<K, V>>,
    pub(crate) reaper_task: Notify,
    pub(crate) reaper_handle: Mutex<Option<JoinHandle<()>>>,
    pub(crate) ttl: Duration,
    pub(crate) debug: bool,
    pub(super) callback: Option<RemovalCallback<K, V>>,
}

impl<K, V> Shared<K, V>
where
    K: fmt::Debug,
{
    /// Runs the removal callback for one removed entry.
    ///
    /// Must be called with the state lock released; the callback is
    /// user code of arbitrary duration. A panicking callback is logged
    /// and contained, never surfaced to the caller or the reaper.
    pub(crate) fn deliver(&self, key: &K, value: &V) {
        if let Some(callback) = &self.callback {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(key, value))).is_err() {
                warn!(key = ?key, "removal callback panicked");
            }
        }
    }
}
