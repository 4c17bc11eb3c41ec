use anyhow::Result;
use bytes::Bytes;
use mayfly::TtlStore;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .init();

    basic_expiry().await?;
    eviction_callback().await?;
    sustained_load().await?;

    Ok(())
}

/// Sessions disappear on their own half a second after the last write.
async fn basic_expiry() -> Result<()> {
    info!("---- basic expiry ----");

    let sessions = TtlStore::builder()
        .with_ttl(Duration::from_millis(500))
        .with_debug(true)
        .build()?;

    sessions.set("tok-1".to_string(), Bytes::from("alice"));
    sessions.set("tok-2".to_string(), Bytes::from("bob"));

    let user = sessions.get(&"tok-1".to_string())?;
    info!(user = ?user, "tok-1 resolved");

    // bob re-authenticates: the overwrite restarts his session clock
    sessions.set("tok-2".to_string(), Bytes::from("bob"));

    // alice signs out; bob's refreshed session is left to expire
    sessions.delete(&"tok-1".to_string())?;

    sleep(Duration::from_millis(600)).await;
    info!(live = sessions.len(), "after the ttl elapsed");

    sessions.close().await;
    Ok(())
}

/// Every removal, explicit or expired, lands in the callback.
async fn eviction_callback() -> Result<()> {
    info!("---- eviction callback ----");

    let sessions = TtlStore::builder()
        .with_ttl(Duration::from_millis(500))
        .with_callback(|token: &String, user: &Bytes| {
            debug!(token = %token, user = ?user, "session evicted");
        })
        .build()?;

    sessions.set("tok-1".to_string(), Bytes::from("alice"));
    sessions.set("tok-2".to_string(), Bytes::from("bob"));
    sessions.delete(&"tok-1".to_string())?;

    let user = sessions.get_or_insert("tok-3".to_string(), Bytes::from("carol"));
    info!(user = ?user, "tok-3 admitted");

    sleep(Duration::from_millis(600)).await;
    info!(live = sessions.len(), "after the ttl elapsed");

    sessions.close().await;
    Ok(())
}

/// The reaper keeps up while writes continue.
async fn sustained_load() -> Result<()> {
    info!("---- sustained load ----");

    let store = TtlStore::new(Duration::from_millis(500))?;

    let started = std::time::Instant::now();
    for i in 0..1000u32 {
        store.set(i, i + 1);
    }
    info!(elapsed = ?started.elapsed(), live = store.len(), "tight-loop inserts done");

    sleep(Duration::from_millis(600)).await;
    info!(live = store.len(), "after the ttl elapsed");

    // a steady trickle outliving the ttl: live count levels off well
    // below the total written
    let started = std::time::Instant::now();
    for i in 0..1000u32 {
        sleep(Duration::from_millis(1)).await;
        store.set(i, i + 1);
    }
    info!(elapsed = ?started.elapsed(), live = store.len(), "sporadic inserts done");

    sleep(Duration::from_millis(600)).await;
    info!(live = store.len(), "after the ttl elapsed");

    store.close().await;
    Ok(())
}
