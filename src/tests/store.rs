use crate::{StoreError, TtlStore};

use bytes::Bytes;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::time::{sleep, Duration};

/// Collects every removal the store reports, explicit or expired.
#[derive(Clone, Default)]
struct Recorder {
    removed: Arc<Mutex<Vec<(String, Bytes)>>>,
}

impl Recorder {
    fn callback(&self) -> impl Fn(&String, &Bytes) + Send + Sync + 'static {
        let removed = self.removed.clone();
        move |key: &String, value: &Bytes| {
            removed.lock().unwrap().push((key.clone(), value.clone()));
        }
    }

    fn removals(&self) -> Vec<(String, Bytes)> {
        self.removed.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn missing_or_zero_ttl_is_a_configuration_error() {
    let missing = TtlStore::<String, Bytes>::builder().build();
    assert!(matches!(missing, Err(StoreError::Configuration(_))));

    let zero = TtlStore::<String, Bytes>::builder()
        .with_ttl(Duration::ZERO)
        .build();
    assert!(matches!(zero, Err(StoreError::Configuration(_))));
}

#[tokio::test]
async fn fresh_store_is_empty() {
    let store: TtlStore<String, Bytes> = TtlStore::new(Duration::from_secs(1)).unwrap();

    assert_eq!(store.len(), 0);
    assert!(store.is_empty());
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn get_before_any_insert_is_key_not_found() {
    let store: TtlStore<String, Bytes> = TtlStore::new(Duration::from_secs(1)).unwrap();

    assert!(matches!(
        store.get(&"a".to_string()),
        Err(StoreError::KeyNotFound)
    ));
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let store = TtlStore::new(Duration::from_secs(5)).unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    assert_eq!(store.get(&"a".to_string()).unwrap(), Bytes::from("x"));
    assert!(store.contains_key(&"a".to_string()));

    store.set("a".to_string(), Bytes::from("y"));
    assert_eq!(store.get(&"a".to_string()).unwrap(), Bytes::from("y"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn entries_expire_after_the_ttl() {
    let store = TtlStore::new(Duration::from_millis(100)).unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    assert!(store.contains_key(&"a".to_string()));

    sleep(Duration::from_millis(150)).await;

    assert!(!store.contains_key(&"a".to_string()));
    assert!(matches!(
        store.get(&"a".to_string()),
        Err(StoreError::KeyNotFound)
    ));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn reinsert_resets_the_deadline() {
    let store = TtlStore::new(Duration::from_millis(150)).unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    sleep(Duration::from_millis(90)).await;
    store.set("a".to_string(), Bytes::from("y"));

    // past the original deadline, before the new one
    sleep(Duration::from_millis(90)).await;
    assert_eq!(store.get(&"a".to_string()).unwrap(), Bytes::from("y"));

    sleep(Duration::from_millis(120)).await;
    assert!(!store.contains_key(&"a".to_string()));
}

#[tokio::test]
async fn reinsert_does_not_disturb_other_keys() {
    let store = TtlStore::new(Duration::from_millis(150)).unwrap();

    store.set("a".to_string(), Bytes::from("1"));
    store.set("b".to_string(), Bytes::from("2"));
    sleep(Duration::from_millis(60)).await;

    // refreshing "a" must leave "b" on its original deadline
    store.set("a".to_string(), Bytes::from("1"));

    sleep(Duration::from_millis(60)).await;
    assert!(store.contains_key(&"a".to_string()));
    assert!(store.contains_key(&"b".to_string()));

    sleep(Duration::from_millis(60)).await;
    assert!(store.contains_key(&"a".to_string()));
    assert!(!store.contains_key(&"b".to_string()));

    sleep(Duration::from_millis(90)).await;
    assert!(!store.contains_key(&"a".to_string()));
}

#[tokio::test]
async fn delete_fires_the_callback_exactly_once() {
    let recorder = Recorder::default();
    let store = TtlStore::builder()
        .with_ttl(Duration::from_millis(100))
        .with_callback(recorder.callback())
        .build()
        .unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    store.delete(&"a".to_string()).unwrap();

    assert_eq!(recorder.removals(), vec![("a".to_string(), Bytes::from("x"))]);
    assert!(matches!(
        store.delete(&"a".to_string()),
        Err(StoreError::KeyNotFound)
    ));

    // past the original deadline: the expiry path must not see it again
    sleep(Duration::from_millis(150)).await;
    assert_eq!(recorder.removals().len(), 1);
}

#[tokio::test]
async fn expiry_delivers_the_callback_exactly_once() {
    let recorder = Recorder::default();
    let store = TtlStore::builder()
        .with_ttl(Duration::from_millis(100))
        .with_callback(recorder.callback())
        .build()
        .unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    sleep(Duration::from_millis(150)).await;

    assert_eq!(recorder.removals(), vec![("a".to_string(), Bytes::from("x"))]);
    assert!(!store.contains_key(&"a".to_string()));
}

#[tokio::test]
async fn pop_returns_the_value() {
    let store = TtlStore::new(Duration::from_secs(5)).unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    assert_eq!(store.pop(&"a".to_string()).unwrap(), Bytes::from("x"));
    assert!(matches!(
        store.pop(&"a".to_string()),
        Err(StoreError::KeyNotFound)
    ));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn get_or_insert_leaves_a_live_deadline_untouched() {
    let store = TtlStore::new(Duration::from_millis(150)).unwrap();

    store.set("a".to_string(), Bytes::from("x"));
    sleep(Duration::from_millis(90)).await;

    let existing = store.get_or_insert("a".to_string(), Bytes::from("other"));
    assert_eq!(existing, Bytes::from("x"));

    // the key still expires at its original deadline
    sleep(Duration::from_millis(90)).await;
    assert!(!store.contains_key(&"a".to_string()));

    // absent key: inserts exactly like a fresh set
    let inserted = store.get_or_insert("a".to_string(), Bytes::from("y"));
    assert_eq!(inserted, Bytes::from("y"));
    assert_eq!(store.get(&"a".to_string()).unwrap(), Bytes::from("y"));
}

#[tokio::test]
async fn staggered_inserts_expire_independently() {
    let store = TtlStore::new(Duration::from_millis(150)).unwrap();

    store.set("c".to_string(), Bytes::from("3"));
    store.set("d".to_string(), Bytes::from("4"));
    sleep(Duration::from_millis(90)).await;
    store.set("e".to_string(), Bytes::from("5"));

    sleep(Duration::from_millis(90)).await;
    assert!(!store.contains_key(&"c".to_string()));
    assert!(!store.contains_key(&"d".to_string()));
    assert!(store.contains_key(&"e".to_string()));

    sleep(Duration::from_millis(90)).await;
    assert!(!store.contains_key(&"e".to_string()));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn deleting_the_earliest_key_wakes_the_reaper() {
    let started = std::time::Instant::now();
    let store = TtlStore::new(Duration::from_secs(60)).unwrap();

    store.set("a".to_string(), 1u32);
    store.delete(&"a".to_string()).unwrap();
    store.close().await;

    // never waits out the stale 60s deadline
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn keys_iterate_in_insertion_order_until_expiry() {
    let store = TtlStore::new(Duration::from_millis(100)).unwrap();

    for (key, value) in [("a", "1"), ("b", "2"), ("c", "3")] {
        store.set(key.to_string(), Bytes::from(value));
    }

    assert_eq!(store.keys(), vec!["a", "b", "c"]);
    assert_eq!(
        store.values(),
        vec![Bytes::from("1"), Bytes::from("2"), Bytes::from("3")]
    );

    sleep(Duration::from_millis(150)).await;

    assert!(store.keys().is_empty());
    assert!(store.values().is_empty());
}

#[tokio::test]
async fn bulk_operations_are_unsupported() {
    let store = TtlStore::new(Duration::from_secs(1)).unwrap();
    store.set("a".to_string(), 1u32);

    assert!(matches!(store.clear(), Err(StoreError::Unsupported("clear"))));
    assert!(matches!(
        store.extend([("b".to_string(), 2)]),
        Err(StoreError::Unsupported("extend"))
    ));
    assert!(matches!(
        store.snapshot(),
        Err(StoreError::Unsupported("snapshot"))
    ));
    assert!(matches!(
        store.pop_any(),
        Err(StoreError::Unsupported("pop_any"))
    ));

    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_writers_from_plain_threads() {
    let store = TtlStore::new(Duration::from_secs(30)).unwrap();

    let mut handles = Vec::new();
    for worker in 0..4 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..50u32 {
                store.set(format!("w{worker}-k{i}"), i);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 200);
    store.close().await;
}

#[tokio::test]
async fn close_joins_the_reaper_and_halts_expiry() {
    let store = TtlStore::new(Duration::from_millis(50)).unwrap();

    store.set("a".to_string(), 1u32);
    store.close().await;
    store.close().await;

    store.set("b".to_string(), 2);
    sleep(Duration::from_millis(120)).await;

    // no reaper left: entries outlive their deadline
    assert_eq!(store.get(&"a".to_string()).unwrap(), 1);
    assert_eq!(store.get(&"b".to_string()).unwrap(), 2);
}

#[tokio::test]
async fn callback_panic_is_contained() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    let store = TtlStore::builder()
        .with_ttl(Duration::from_millis(80))
        .with_callback(move |_key: &String, _value: &u32| {
            seen.fetch_add(1, Ordering::SeqCst);
            panic!("callback failure");
        })
        .build()
        .unwrap();

    store.set("a".to_string(), 1);
    store.delete(&"a".to_string()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    store.set("b".to_string(), 2);
    sleep(Duration::from_millis(120)).await;

    // the reaper survived the panicking callback and kept reaping
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!store.contains_key(&"b".to_string()));
}

#[tokio::test]
async fn set_wakes_an_idle_reaper() {
    let store = TtlStore::new(Duration::from_millis(80)).unwrap();

    // let the reaper settle into its idle wait first
    sleep(Duration::from_millis(30)).await;

    store.set("a".to_string(), 1u32);
    sleep(Duration::from_millis(120)).await;

    // reaped at its deadline, not after the idle poll interval
    assert!(!store.contains_key(&"a".to_string()));
}

#[tokio::test]
async fn debug_formatting_reports_ttl_and_len() {
    let store = TtlStore::new(Duration::from_secs(60)).unwrap();
    store.set("a".to_string(), Bytes::from("1"));
    store.set("b".to_string(), Bytes::from("2"));

    let rendered = format!("{store:?}");
    assert!(rendered.contains("TtlStore"));
    assert!(rendered.contains("ttl"));
    assert!(rendered.contains("len: 2"));
}
