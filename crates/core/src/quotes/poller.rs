//! Quote poller: keeps a symbol set fresh on a timer.
//!
//! One driver task per active configuration runs every fetch cycle, so cycles
//! never overlap. Timer ticks that fall due during a slow cycle fire once
//! afterwards, and manual refetches coalesce into a single pending request.
//!
//! Reconfiguring or stopping bumps a generation counter. A cycle started under
//! an older generation may still finish its network call, but its result is
//! discarded without touching the snapshot.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{watch, Notify};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use marketpulse_market_data::{BatchQuotes, MarketDataError, QuoteSource};

use super::model::{PollSnapshot, PollerConfig, PollerState};

/// Periodic quote fetcher exposing a [`PollSnapshot`].
///
/// `start` and every reconfiguration that restarts the driver spawn a tokio
/// task, so they must be called from within a runtime.
pub struct QuotePoller {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn QuoteSource>,
    snapshot: watch::Sender<PollSnapshot>,
    /// Bumped (under the lifecycle lock) whenever the running driver retires.
    generation: watch::Sender<u64>,
    lifecycle: Mutex<Lifecycle>,
}

struct Lifecycle {
    state: PollerState,
    config: PollerConfig,
    started: bool,
    /// Present while a driver runs.
    refetch: Option<Arc<Notify>>,
}

impl QuotePoller {
    pub fn new(source: Arc<dyn QuoteSource>, config: PollerConfig) -> Self {
        let (snapshot, _) = watch::channel(PollSnapshot::default());
        let (generation, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                source,
                snapshot,
                generation,
                lifecycle: Mutex::new(Lifecycle {
                    state: PollerState::Idle,
                    config,
                    started: false,
                    refetch: None,
                }),
            }),
        }
    }

    /// Fetch immediately, then every `refresh_interval`.
    ///
    /// Stays idle while disabled or without symbols. Calling `start` twice is
    /// a no-op, and a stopped poller cannot be started again.
    pub fn start(&self) {
        let mut lifecycle = self.inner.lock();
        if lifecycle.state == PollerState::Stopped {
            warn!("Quote poller is stopped and cannot be restarted");
            return;
        }
        if lifecycle.started {
            debug!("Quote poller already started");
            return;
        }

        lifecycle.started = true;
        self.inner.restart(&mut lifecycle);
    }

    /// Tear down for good. An in-flight cycle is left to finish, but its
    /// result is dropped.
    pub fn stop(&self) {
        let mut lifecycle = self.inner.lock();
        if lifecycle.state == PollerState::Stopped {
            return;
        }

        self.inner.retire(&mut lifecycle);
        lifecycle.state = PollerState::Stopped;
        info!("Quote poller stopped");
    }

    /// Run one cycle now, outside the timer phase.
    ///
    /// Requests made while a cycle is in flight collapse into one follow-up
    /// cycle. Ignored when no driver runs.
    pub fn refetch(&self) {
        let lifecycle = self.inner.lock();
        match &lifecycle.refetch {
            Some(refetch) => refetch.notify_one(),
            None => debug!("Refetch ignored: quote poller is not running"),
        }
    }

    /// Replace the symbol set and restart the fetch sequence.
    pub fn set_symbols(&self, symbols: Vec<String>) {
        self.reconfigure(|config| config.symbols = symbols);
    }

    /// Change the timer period and restart the fetch sequence.
    pub fn set_refresh_interval(&self, refresh_interval: Duration) {
        self.reconfigure(|config| config.refresh_interval = refresh_interval);
    }

    /// Disabling tears the driver down; enabling restarts it.
    pub fn set_enabled(&self, enabled: bool) {
        self.reconfigure(|config| config.enabled = enabled);
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn state(&self) -> PollerState {
        self.inner.lock().state
    }

    pub fn config(&self) -> PollerConfig {
        self.inner.lock().config.clone()
    }

    fn reconfigure(&self, apply: impl FnOnce(&mut PollerConfig)) {
        let mut lifecycle = self.inner.lock();
        if lifecycle.state == PollerState::Stopped {
            warn!("Ignoring reconfiguration of a stopped quote poller");
            return;
        }

        let previous = lifecycle.config.clone();
        apply(&mut lifecycle.config);
        if lifecycle.config == previous {
            return;
        }

        if lifecycle.started {
            self.inner.restart(&mut lifecycle);
        }
    }
}

impl Drop for QuotePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| {
            warn!("Quote poller mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn current_generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Invalidate the running driver, if any.
    fn retire(&self, lifecycle: &mut Lifecycle) {
        self.generation.send_modify(|generation| *generation += 1);
        lifecycle.refetch = None;
        self.snapshot
            .send_if_modified(|snapshot| std::mem::replace(&mut snapshot.is_loading, false));
    }

    fn restart(self: &Arc<Self>, lifecycle: &mut Lifecycle) {
        self.retire(lifecycle);

        if !lifecycle.config.is_active() {
            debug!(
                "Quote poller idle (enabled: {}, symbols: {})",
                lifecycle.config.enabled,
                lifecycle.config.symbols.len()
            );
            lifecycle.state = PollerState::Idle;
            return;
        }

        let generation = self.current_generation();
        let refetch = Arc::new(Notify::new());
        lifecycle.refetch = Some(refetch.clone());

        info!(
            "Quote poller started for {} symbols (interval: {:?})",
            lifecycle.config.symbols.len(),
            lifecycle.config.refresh_interval
        );

        tokio::spawn(drive(
            self.clone(),
            generation,
            lifecycle.config.symbols.clone(),
            lifecycle.config.refresh_interval,
            refetch,
        ));
    }

    async fn run_cycle(&self, generation: u64, symbols: &[String]) {
        if !self.begin_cycle(generation) {
            return;
        }
        let outcome = self.source.fetch_quotes(symbols).await;
        self.finish_cycle(generation, outcome);
    }

    fn begin_cycle(&self, generation: u64) -> bool {
        let mut lifecycle = self.lock();
        if self.current_generation() != generation {
            return false;
        }

        lifecycle.state = PollerState::Fetching;
        self.snapshot.send_modify(|snapshot| snapshot.is_loading = true);
        true
    }

    fn finish_cycle(&self, generation: u64, outcome: Result<BatchQuotes, MarketDataError>) {
        let mut lifecycle = self.lock();
        if self.current_generation() != generation {
            debug!(
                "Discarding quote cycle result from retired generation {}",
                generation
            );
            return;
        }

        match cycle_result(outcome) {
            Ok(batch) => {
                debug!(
                    "Quote cycle fetched {} quotes ({} failed)",
                    batch.quotes.len(),
                    batch.failures.len()
                );
                lifecycle.state = PollerState::Ready;
                self.snapshot.send_modify(|snapshot| {
                    snapshot.quotes = batch.quotes;
                    snapshot.failures = batch.failures;
                    snapshot.last_error = None;
                    snapshot.last_updated = Some(Utc::now());
                    snapshot.is_loading = false;
                });
            }
            Err(message) => {
                warn!("Quote cycle failed: {}", message);
                lifecycle.state = PollerState::Error;
                self.snapshot.send_modify(|snapshot| {
                    snapshot.last_error = Some(message);
                    snapshot.is_loading = false;
                });
            }
        }
    }
}

/// A batch where every symbol failed counts as a failed cycle.
fn cycle_result(outcome: Result<BatchQuotes, MarketDataError>) -> Result<BatchQuotes, String> {
    let batch = outcome.map_err(|e| e.to_string())?;
    if batch.is_total_failure() {
        return Err(batch
            .failure_summary()
            .unwrap_or_else(|| "All symbols failed".to_string()));
    }
    Ok(batch)
}

async fn drive(
    inner: Arc<Inner>,
    generation: u64,
    symbols: Vec<String>,
    refresh_interval: Duration,
    refetch: Arc<Notify>,
) {
    let mut retired = inner.generation.subscribe();
    if *retired.borrow_and_update() != generation {
        return;
    }

    let mut ticker = schedule(refresh_interval);
    inner.run_cycle(generation, &symbols).await;

    loop {
        tokio::select! {
            biased;
            _ = retired.changed() => break,
            _ = refetch.notified() => debug!("Manual quote refetch"),
            _ = next_tick(&mut ticker) => {}
        }
        inner.run_cycle(generation, &symbols).await;
    }

    debug!("Quote poller driver {} exited", generation);
}

/// `None` for a zero interval: no timer at all.
fn schedule(refresh_interval: Duration) -> Option<Interval> {
    if refresh_interval.is_zero() {
        return None;
    }
    let mut ticker = interval_at(Instant::now() + refresh_interval, refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
