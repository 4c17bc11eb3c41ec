use super::{
    reaper,
    shared_state::{RemovalCallback, Shared},
    state::State,
    TtlStore,
};
use crate::error::{StoreError, StoreResult};

use std::{
    fmt,
    hash::Hash,
    sync::{Arc, Mutex},
};
use tokio::{sync::Notify, time::Duration};
use tracing::debug;

/// Configures and starts a [`TtlStore`].
pub struct Builder<K, V> {
    ttl: Option<Duration>,
    callback: Option<RemovalCallback<K, V>>,
    debug: bool,
}

impl<K, V> Builder<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            ttl: None,
            callback: None,
            debug: false,
        }
    }

    /// Lifetime of every entry, measured from its last write. Required,
    /// and must be greater than zero.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Called once for every removed entry, explicit or expired, with
    /// the store lock released.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Enables verbose internal logging. No behavioral effect.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Builds the store and spawns its reaper.
    ///
    /// # Panics
    ///
    /// The reaper is a Tokio task, so this panics when called outside a
    /// Tokio runtime.
    pub fn build(self) -> StoreResult<TtlStore<K, V>> {
        let ttl = match self.ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            Some(_) => {
                return Err(StoreError::Configuration(
                    "ttl must be greater than zero".into(),
                ))
            }
            None => return Err(StoreError::Configuration("ttl is required".into())),
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(State::new()),
            reaper_task: Notify::new(),
            reaper_handle: Mutex::new(None),
            ttl,
            debug: self.debug,
            callback: self.callback,
        });

        let handle = tokio::spawn(reaper::run(Arc::downgrade(&shared)));
        *shared.reaper_handle.lock().unwrap() = Some(handle);

        if self.debug {
            debug!(ttl = ?ttl, "store created, reaper spawned");
        }

        Ok(TtlStore { shared })
    }
}

impl<K, V> Default for Builder<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
