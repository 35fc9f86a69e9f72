//! Error types for the expirable store.

use crate::storage::Key;
use thiserror::Error;

/// Errors returned by store construction and the mutation API.
///
/// Every error is local to the call that produced it. Nothing that happens
/// inside a background scan pass is ever reported through this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The resolved configuration is unusable; construction is aborted
    #[error("invalid config: {0}")]
    Config(String),

    /// The key is not a primitive (string, integer or bool)
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The key is not present in the live bucket
    #[error("key not found: {0}")]
    NotFound(Key),

    /// The store was created outside of a Tokio runtime
    #[error("no Tokio runtime available to drive the scan loops")]
    NoRuntime,
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
