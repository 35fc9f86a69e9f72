//! Walks one pair of entries through their whole lifecycle.
//!
//! Run with `cargo run --example lifecycle`. Set `RUST_LOG=expirable=debug`
//! to see the scan passes.

use expirable::{ExpirableStore, Hooks, Key, StoreConfig};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let started = Instant::now();
    let hooks = Hooks::new()
        .on_expiry(move |key: &Key, value: &String| {
            info!(key = %key, value = %value, "entry expired");
        })
        .on_clean(move || {
            info!(at_ms = started.elapsed().as_millis() as u64, "expired entries purged");
        });

    let config = StoreConfig::new()
        .with_entry_lifespan(Duration::from_millis(1000))
        .with_cleanup_interval(Duration::from_millis(2500));
    let store = ExpirableStore::with_hooks(config, hooks)?;

    store.add(12345, String::new())?;
    store.add("abc", "something".to_string())?;

    tokio::time::sleep(Duration::from_millis(600)).await;
    store.delay_expiry("abc", true)?;
    info!(life_ms = store.life("abc")?.as_millis() as u64, "delayed \"abc\"");

    for checkpoint in [1100u64, 2100, 3000] {
        let elapsed = started.elapsed().as_millis() as u64;
        tokio::time::sleep(Duration::from_millis(checkpoint.saturating_sub(elapsed))).await;
        info!(
            at_ms = checkpoint,
            live = ?store.live_keys(),
            expired = ?store.expired_keys(),
            "checkpoint"
        );
    }

    info!(stats = ?store.stats(), "done");
    store.stop();

    Ok(())
}
