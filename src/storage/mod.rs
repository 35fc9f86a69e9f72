//! Storage Module
//!
//! This module provides the core of the expirable store: the two-bucket
//! storage engine and the background loops that age entries out of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │        Mutex ┌──────────────┐      ┌──────────────┐         │
//! │              │  live bucket │ ───> │ expired bkt. │ ──> ∅   │
//! │              └──────────────┘      └──────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//!                   ▲                          ▲
//!                   │                          │
//!        ┌──────────┴──────────┐    ┌──────────┴──────────┐
//!        │     expiry loop     │    │    cleanup loop     │
//!        │ (pausable, Tokio)   │    │      (Tokio)        │
//!        └─────────────────────┘    └─────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use expirable::config::StoreConfig;
//! use expirable::storage::{Hooks, Key, StorageEngine};
//! use std::time::Duration;
//!
//! let settings = StoreConfig::default().resolve().unwrap();
//! let engine = StorageEngine::new(settings, Hooks::new());
//!
//! engine.insert(Key::Str("session".into()), "token123", Duration::from_secs(60));
//! assert_eq!(engine.get(&Key::Str("session".into())), Ok("token123"));
//! ```

pub mod engine;
pub mod expiry;
pub mod key;

// Re-export commonly used types
pub use engine::{CleanHook, Entry, ExpiryHook, Hooks, StorageEngine, StoreStats};
pub use expiry::ScanLoops;
pub use key::{IntoKey, Key};
