//! Background change watching.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::loader::{Loader, PollOutcome};

/// Errors starting a watch loop.
#[derive(Debug, Error)]
pub enum WatchError {
    /// This loader already has a running loop.
    #[error("a watch loop is already running for this loader")]
    AlreadyWatching,

    /// `watch` was called outside of a tokio runtime.
    #[error("watching requires a tokio runtime")]
    NoRuntime,

    /// The polling interval was zero.
    #[error("watch interval must be greater than zero")]
    ZeroInterval,
}

/// Counters for a watch session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Completed ticks, failed ones included.
    pub ticks: u64,
    /// Ticks that reloaded content and fired the callback.
    pub changes: u64,
    /// Ticks that failed.
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    changes: AtomicU64,
    failures: AtomicU64,
    running: AtomicBool,
}

impl Counters {
    fn snapshot(&self) -> WatchStats {
        WatchStats {
            ticks: self.ticks.load(Ordering::Acquire),
            changes: self.changes.load(Ordering::Acquire),
            failures: self.failures.load(Ordering::Acquire),
        }
    }
}

/// A running polling loop.
///
/// Dropping the session stops the loop after the current tick; use
/// [`WatchSession::stop`] to wait for it.
pub struct WatchSession {
    interval: Duration,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl WatchSession {
    /// Time between two ticks.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the loop task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.counters.running.load(Ordering::Acquire)
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> WatchStats {
        self.counters.snapshot()
    }

    /// Stop the loop and wait for it to exit. An in-flight tick, including its
    /// reload and callback, completes first.
    pub async fn stop(mut self) -> WatchStats {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "watch task ended abnormally");
        }
        self.counters.snapshot()
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Releases the loader's watch slot when the loop exits, even on panic.
struct WatchingGuard {
    loader: Loader,
    counters: Arc<Counters>,
}

impl Drop for WatchingGuard {
    fn drop(&mut self) {
        self.counters.running.store(false, Ordering::Release);
        self.loader.inner.watching.store(false, Ordering::Release);
    }
}

impl Loader {
    /// Start polling for changes every `every`.
    ///
    /// Each tick runs [`Loader::poll`]. When content was reloaded `on_change`
    /// runs once, after the new snapshot is published. Failed ticks are
    /// logged and skipped. Ticks never overlap: the next one waits until the
    /// previous reload and callback are done.
    pub fn watch<F>(&self, every: Duration, on_change: F) -> Result<WatchSession, WatchError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if every.is_zero() {
            return Err(WatchError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| WatchError::NoRuntime)?;

        if self
            .inner
            .watching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WatchError::AlreadyWatching);
        }

        let counters = Arc::new(Counters::default());
        counters.running.store(true, Ordering::Release);
        let (stop_tx, stop_rx) = watch::channel(false);

        let guard = WatchingGuard {
            loader: self.clone(),
            counters: counters.clone(),
        };
        let handle = runtime.spawn(run_loop(guard, every, stop_rx, on_change));

        info!(interval_ms = every.as_millis() as u64, "watching content for changes");

        Ok(WatchSession {
            interval: every,
            stop_tx,
            handle: Some(handle),
            counters,
        })
    }
}

async fn run_loop<F>(
    guard: WatchingGuard,
    every: Duration,
    mut stop_rx: watch::Receiver<bool>,
    on_change: F,
) where
    F: Fn() + Send + Sync + 'static,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial load already ran.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                // A dropped sender also means stop.
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let counters = &guard.counters;
        match guard.loader.poll().await {
            Ok(PollOutcome::Unchanged) => {}
            Ok(PollOutcome::Reloaded) => {
                info!("content changed");
                counters.changes.fetch_add(1, Ordering::AcqRel);
                on_change();
            }
            Err(e) => {
                warn!(error = %e, "content check failed, will retry next tick");
                counters.failures.fetch_add(1, Ordering::AcqRel);
            }
        }
        counters.ticks.fetch_add(1, Ordering::AcqRel);
    }

    debug!("watch loop stopped");
}
