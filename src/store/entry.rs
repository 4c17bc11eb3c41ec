use tokio::time::{Duration, Instant};

#[derive(Debug)]
pub(crate) struct Entry<V> {
    pub(crate) value: V,
    pub(crate) touched_at: Instant,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, touched_at: Instant) -> Self {
        Self { value, touched_at }
    }

    /// Time since this entry was last written.
    pub(crate) fn age(&self) -> Duration {
        self.touched_at.elapsed()
    }
}
