//! # Expirable - An In-Memory Store With Expiring Entries
//!
//! Expirable keeps values under primitive keys for a limited lifespan.
//! Entries age out of a *live* bucket into an *expired* bucket, where they
//! wait until a periodic cleanup pass purges them.
//!
//! ## Features
//!
//! - **Per-Entry Lifespans**: a store-wide default, overridable per insert
//! - **Delayed Expiry**: refreshing an entry resets its age clock
//! - **Hooks**: a callback per expired entry and one per cleanup flush
//! - **Bounded Expired Bucket**: forced flushes keep it under a size cap
//! - **Pause/Resume**: expiry passes can be suspended without losing data
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          ExpirableStore                             │
//! │                                                                     │
//! │   add / get / delay_expiry / remove / life / for_each_*             │
//! │                               │                                     │
//! │                               ▼                                     │
//! │  ┌──────────────────────────────────────────────────────────────┐  │
//! │  │                      StorageEngine                           │  │
//! │  │        ┌──────────────┐   expiry   ┌──────────────┐          │  │
//! │  │        │     live     │ ─────────> │   expired    │ ──> flush│  │
//! │  │        └──────────────┘            └──────────────┘          │  │
//! │  └──────────────────────────────────────────────────────────────┘  │
//! │                  ▲                               ▲                  │
//! │   ┌──────────────┴──────────────┐ ┌──────────────┴──────────────┐  │
//! │   │  expiry loop (pausable)     │ │  cleanup loop               │  │
//! │   │  every expiry_check_interval│ │  every cleanup_interval     │  │
//! │   └─────────────────────────────┘ └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use expirable::{ExpirableStore, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), expirable::StoreError> {
//!     let store = ExpirableStore::new(
//!         StoreConfig::default().with_entry_lifespan(Duration::from_millis(500)),
//!     )?;
//!
//!     store.add("session", "token123")?;
//!     assert_eq!(store.get("session")?, "token123");
//!
//!     tokio::time::sleep(Duration::from_millis(600)).await;
//!     assert!(store.get("session").is_err());
//!     assert!(store.is_expired("session"));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: Options record and its validation
//! - [`storage`]: The two-bucket engine, keys and the scan loops
//! - [`store`]: The public `ExpirableStore` handle
//! - [`error`]: Error type
//!
//! ## Timing
//!
//! Expiry is detected only when a pass runs, so an entry may stay live for
//! up to one `expiry_check_interval` past its lifespan. Timestamps use
//! Tokio's clock; tests can pause it and advance time deterministically.

pub mod config;
pub mod error;
pub mod storage;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{Settings, StoreConfig};
pub use error::StoreError;
pub use storage::{Hooks, IntoKey, Key, StoreStats};
pub use store::ExpirableStore;

/// Version of Expirable
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
