//! Store Configuration
//!
//! [`StoreConfig`] is the options record callers fill in; [`StoreConfig::resolve`]
//! validates it and fills the remaining defaults, producing the [`Settings`]
//! the engine and the scan loops run with.
//!
//! ## Example
//!
//! ```
//! use expirable::StoreConfig;
//! use std::time::Duration;
//!
//! let settings = StoreConfig::default()
//!     .with_entry_lifespan(Duration::from_millis(500))
//!     .with_cleanup_interval(Duration::from_secs(2))
//!     .resolve()
//!     .unwrap();
//!
//! assert_eq!(settings.expiry_check_interval, Duration::from_millis(501));
//! ```

use crate::error::{Result, StoreError};
use std::time::Duration;

/// Default lifespan of an entry (1s).
pub const DEFAULT_ENTRY_LIFESPAN: Duration = Duration::from_millis(1000);

/// Default period of the cleanup loop (5s).
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_millis(5000);

/// Default capacity of the expired bucket.
pub const DEFAULT_MAX_EXPIRED_ENTRIES: usize = 2000;

/// Configuration for an [`ExpirableStore`](crate::ExpirableStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Lifespan given to entries inserted without an override (default: 1s)
    pub entry_lifespan: Duration,

    /// Period of the expiry scan (default: `entry_lifespan + 1ms`)
    pub expiry_check_interval: Option<Duration>,

    /// Period of the cleanup scan (default: 5s)
    pub cleanup_interval: Duration,

    /// Size at which the expired bucket is force-flushed (default: 2000)
    pub max_expired_entries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            entry_lifespan: DEFAULT_ENTRY_LIFESPAN,
            expiry_check_interval: None,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            max_expired_entries: DEFAULT_MAX_EXPIRED_ENTRIES,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default entry lifespan
    pub fn with_entry_lifespan(mut self, lifespan: Duration) -> Self {
        self.entry_lifespan = lifespan;
        self
    }

    /// Sets the expiry scan period explicitly
    pub fn with_expiry_check_interval(mut self, interval: Duration) -> Self {
        self.expiry_check_interval = Some(interval);
        self
    }

    /// Sets the cleanup scan period
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets the expired bucket capacity
    pub fn with_max_expired_entries(mut self, max: usize) -> Self {
        self.max_expired_entries = max;
        self
    }

    /// Validates the configuration and fills in derived defaults.
    ///
    /// The interval ordering is only checked against an explicitly supplied
    /// `expiry_check_interval`. A derived interval (`entry_lifespan + 1ms`)
    /// is never compared against `cleanup_interval`, so the stock defaults
    /// (5s cleanup, 1001ms expiry scan) resolve cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] when:
    /// - an explicit `expiry_check_interval` is shorter than `cleanup_interval`
    /// - either scan period is zero
    /// - `max_expired_entries` is zero
    pub fn resolve(&self) -> Result<Settings> {
        if let Some(expiry) = self.expiry_check_interval {
            if self.cleanup_interval > expiry {
                return Err(StoreError::Config(format!(
                    "cleanup_interval ({:?}) must not exceed expiry_check_interval ({:?})",
                    self.cleanup_interval, expiry
                )));
            }
        }

        let expiry_check_interval = self
            .expiry_check_interval
            .unwrap_or_else(|| self.entry_lifespan.saturating_add(Duration::from_millis(1)));

        if expiry_check_interval.is_zero() {
            return Err(StoreError::Config(
                "expiry_check_interval must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(StoreError::Config(
                "cleanup_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_expired_entries == 0 {
            return Err(StoreError::Config(
                "max_expired_entries must be at least 1".to_string(),
            ));
        }

        Ok(Settings {
            entry_lifespan: self.entry_lifespan,
            expiry_check_interval,
            cleanup_interval: self.cleanup_interval,
            max_expired_entries: self.max_expired_entries,
        })
    }
}

/// Fully resolved, validated configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Lifespan given to entries inserted without an override
    pub entry_lifespan: Duration,
    /// Period of the expiry scan, explicit or derived from `entry_lifespan`
    pub expiry_check_interval: Duration,
    /// Period of the cleanup scan
    pub cleanup_interval: Duration,
    /// Size at which the expired bucket is force-flushed
    pub max_expired_entries: usize,
}
