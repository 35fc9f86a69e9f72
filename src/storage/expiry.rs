//! Background Scan Loops
//!
//! This module runs the two periodic tasks that keep an expirable store
//! moving:
//!
//! - the **expiry loop** (period `expiry_check_interval`) moves timed-out
//!   live entries into the expired bucket;
//! - the **cleanup loop** (period `cleanup_interval`) flushes the expired
//!   bucket.
//!
//! ## Design
//!
//! Each loop is a Tokio task with its own `interval` ticker. Both select on a
//! shared `watch` shutdown channel and exit as soon as it flips.
//!
//! Only the expiry loop can be paused. The pause flag is read when a tick
//! fires: a pass that already started always runs to completion, and ticks
//! that fire while paused are skipped. Resuming runs one pass immediately
//! and restarts the period from that moment.
//!
//! ```text
//!            pause()                       resume()
//!  Running ───────────> Paused ──────────────────────> Running
//!     ▲                    │   (one pass now, ticker reset)
//!     └── resume() no-op   └── ticks skipped
//! ```

use crate::storage::StorageEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Pause state shared between the control handle and the expiry loop.
#[derive(Debug, Default)]
struct ScanControl {
    paused: AtomicBool,
    resumed: Notify,
}

/// A handle to the running scan loops.
///
/// When this handle is dropped, both loops are stopped.
#[derive(Debug)]
pub struct ScanLoops {
    control: Arc<ScanControl>,
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ScanLoops {
    /// Spawns the expiry and cleanup loops on the given runtime.
    pub fn start<V>(engine: Arc<StorageEngine<V>>, runtime: &Handle) -> Self
    where
        V: Send + 'static,
    {
        let settings = *engine.settings();
        let control = Arc::new(ScanControl::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        runtime.spawn(expiry_loop(
            Arc::clone(&engine),
            Arc::clone(&control),
            settings.expiry_check_interval,
            shutdown_rx.clone(),
        ));
        runtime.spawn(cleanup_loop(engine, settings.cleanup_interval, shutdown_rx));

        info!(
            expiry_check_ms = settings.expiry_check_interval.as_millis() as u64,
            cleanup_ms = settings.cleanup_interval.as_millis() as u64,
            "Scan loops started"
        );

        Self {
            control,
            shutdown_tx,
        }
    }

    /// Suppresses future expiry passes. A pass already running completes.
    pub fn pause(&self) {
        if !self.control.paused.swap(true, Ordering::SeqCst) {
            info!("Expiry scan paused");
        }
    }

    /// Clears the pause flag.
    ///
    /// Returns `true` if the loop was paused. The caller is expected to run
    /// the immediate pass; the expiry loop restarts its period once woken.
    pub fn resume(&self) -> bool {
        if !self.control.paused.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.control.resumed.notify_one();
        info!("Expiry scan resumed");
        true
    }

    /// Checks whether the expiry loop is paused.
    pub fn is_paused(&self) -> bool {
        self.control.paused.load(Ordering::SeqCst)
    }

    /// Stops both loops.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Scan loops stopped");
        }
    }

    /// Checks whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for ScanLoops {
    fn drop(&mut self) {
        self.stop();
    }
}

/// First deadline used when `now + period` does not fit an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn ticker(period: Duration) -> Interval {
    let now = Instant::now();
    let start = now
        .checked_add(period)
        .unwrap_or_else(|| now + FAR_FUTURE);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    match shutdown_rx.changed().await {
        Ok(()) => *shutdown_rx.borrow(),
        Err(_) => true,
    }
}

/// The expiry scan loop.
async fn expiry_loop<V>(
    engine: Arc<StorageEngine<V>>,
    control: Arc<ScanControl>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = control.resumed.notified() => {
                ticker.reset();
                continue;
            }
            stop = shutdown_requested(&mut shutdown_rx) => {
                if stop {
                    debug!("Expiry loop received shutdown signal");
                    return;
                }
                continue;
            }
        }

        if control.paused.load(Ordering::SeqCst) {
            trace!("Expiry loop paused, skipping pass");
            continue;
        }

        engine.scan_expired();
    }
}

/// The cleanup scan loop. Unaffected by pause.
async fn cleanup_loop<V>(
    engine: Arc<StorageEngine<V>>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            stop = shutdown_requested(&mut shutdown_rx) => {
                if stop {
                    debug!("Cleanup loop received shutdown signal");
                    return;
                }
                continue;
            }
        }

        let flushed = engine.flush_expired();
        if flushed > 0 {
            trace!(flushed = flushed, "Cleanup pass flushed expired bucket");
        }
    }
}
