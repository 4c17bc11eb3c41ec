//! An in-memory key-value store whose entries expire a fixed time
//! after their last write.
//!
//! Every entry shares one store-wide time-to-live, set at
//! construction. A single background task per store, the reaper,
//! sleeps until the next deadline falls due and removes the entry,
//! handing it to an optional removal callback. Mutations wake the
//! reaper early whenever they change what it should be sleeping on.
//!
//! Reads are deliberately cheap: `get` and friends consult only the
//! live table, so a key whose deadline has just passed may remain
//! visible for the short moment before the reaper runs.
//!
//! ```
//! use mayfly::TtlStore;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sessions: TtlStore<String, String> = TtlStore::new(Duration::from_secs(30)).unwrap();
//!
//! sessions.set("token".into(), "alice".into());
//! assert_eq!(sessions.get(&"token".into()).unwrap(), "alice");
//! # }
//! ```

pub(crate) mod error;
pub(crate) mod store;


pub use error::{StoreError, StoreResult};
pub use store::{Builder, TtlStore};
