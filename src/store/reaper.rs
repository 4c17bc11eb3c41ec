use super::shared_state::Shared;
use std::{fmt, hash::Hash, sync::Weak};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, instrument};

/// Upper bound on an idle wait; the reaper re-polls at least this often.
const IDLE_POLL: Duration = Duration::from_secs(10);

enum Sweep {
    /// Keep running; sleep until the deadline if there is one.
    Wait(Option<Instant>),
    /// The store shut down.
    Halt,
}

/// Drives deadline expiry for one store.
///
/// Holds the shared state weakly so a store abandoned without a
/// `close` unwinds the task on its next wake-up instead of pinning the
/// state alive.
#[instrument(name = "reaper", skip(shared))]
pub(crate) async fn run<K, V>(shared: Weak<Shared<K, V>>)
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    loop {
        let store = match shared.upgrade() {
            Some(store) => store,
            None => {
                // every handle is gone; nothing left to expire
                debug!("store dropped, reaper exiting");
                return;
            }
        };

        let next = match sweep(&store) {
            Sweep::Wait(next) => next,
            Sweep::Halt => {
                if store.debug {
                    debug!("store closed, reaper exiting");
                }
                return;
            }
        };

        // a notification stored while the lock was held above is kept
        // as a permit and completes the wait immediately
        match next {
            Some(deadline) => {
                tokio::select! {
                    _ = time::sleep_until(deadline) => {},
                    _ = store.reaper_task.notified() => {}
                }
            }
            None => {
                tokio::select! {
                    _ = time::sleep(IDLE_POLL) => {},
                    _ = store.reaper_task.notified() => {}
                }
            }
        }
    }
}

/// Removes every entry whose deadline has passed and reports when the
/// next one falls due.
fn sweep<K, V>(store: &Shared<K, V>) -> Sweep
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    let mut removed = Vec::new();

    let next = {
        let mut state = store.state.lock().unwrap();

        if state.shutdown {
            return Sweep::Halt;
        }

        let now = Instant::now();
        while state
            .next_deadline()
            .map(|deadline| deadline <= now)
            .unwrap_or(false)
        {
            let expired = match state.heap.pop() {
                Some(expired) => expired,
                None => break,
            };

            match state.table.remove(&expired.key) {
                Some(entry) => {
                    if store.debug {
                        debug!(key = ?expired.key, age = ?entry.age(), "entry expired");
                    }
                    removed.push((expired.key, entry));
                }
                None => {
                    // removed by a caller in the same instant; nothing to do
                    if store.debug {
                        debug!(key = ?expired.key, "expired key already removed");
                    }
                }
            }
        }

        state.next_deadline()
    };

    // callbacks run after the lock is released
    for (key, entry) in &removed {
        store.deliver(key, &entry.value);
    }

    Sweep::Wait(next)
}
