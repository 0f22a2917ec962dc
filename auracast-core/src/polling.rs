//! Timer-driven refresh of one [`ViewModelState`].
//!
//! A controller is `Idle` until [`PollingController::start`], then `Running`
//! until [`PollingController::stop`]. While running it fetches once right
//! away and again after every poll interval.
//!
//! At most one fetch per controller is outstanding at any time. Timer ticks
//! and manual refreshes that arrive while a fetch is in flight are skipped;
//! only the first fetch after `start` waits, so that it is never lost behind
//! a stale fetch from a previous run.
//!
//! Every start and stop bumps a generation counter. A fetch remembers the
//! generation it began under and its result is dropped if that generation is
//! no longer current, so a stopped controller never publishes late results.

use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    config::SettingsProvider,
    fetcher::Fetcher,
    state::{FetchState, ViewModelState},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// What happened to a requested fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch ran and its result was published.
    Applied,
    /// Another fetch was already in flight.
    Skipped,
    /// The controller was started or stopped meanwhile; nothing was published.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Start,
    Tick,
    Manual,
}

#[derive(Debug, Default)]
struct Lifecycle {
    generation: u64,
    timer: Option<CancellationToken>,
}

struct Shared<F: Fetcher> {
    fetcher: F,
    settings: Arc<dyn SettingsProvider>,
    state: Arc<ViewModelState<F::Record>>,
    lifecycle: Mutex<Lifecycle>,
    in_flight: tokio::sync::Mutex<()>,
}

impl<F: Fetcher> Shared<F> {
    async fn run_timer(self: Arc<Self>, generation: u64, period: Duration, cancel: CancellationToken) {
        self.fetch_once(generation, Trigger::Start).await;

        // Sleeping after each fetch keeps retries at least one interval apart.
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(period) => {
                    self.fetch_once(generation, Trigger::Tick).await;
                }
            }
        }

        tracing::debug!(kind = %self.fetcher.kind(), generation, "poll timer stopped");
    }

    async fn fetch_once(&self, generation: u64, trigger: Trigger) -> RefreshOutcome {
        let kind = self.fetcher.kind();

        let _in_flight = match trigger {
            Trigger::Start => self.in_flight.lock().await,
            Trigger::Tick | Trigger::Manual => match self.in_flight.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::debug!(%kind, ?trigger, "fetch already in flight, skipping");
                    return RefreshOutcome::Skipped;
                }
            },
        };

        if !self.publish(generation, FetchState::begin) {
            return RefreshOutcome::Discarded;
        }

        tracing::debug!(%kind, ?trigger, "fetching");
        let result = match self.settings.settings() {
            Ok(settings) => self.fetcher.fetch(&settings).await,
            Err(e) => Err(e),
        };

        let published = match result {
            Ok(record) => {
                tracing::info!(%kind, "fetch succeeded");
                self.publish(generation, move |s| s.succeed(record, Utc::now()))
            }
            Err(err) => {
                if err.is_empty_result() {
                    tracing::info!(%kind, "{}", err);
                } else {
                    tracing::warn!(%kind, "fetch failed: {}", err);
                }
                self.publish(generation, |s| s.fail(&err))
            }
        };

        if published {
            RefreshOutcome::Applied
        } else {
            tracing::debug!(%kind, generation, "controller restarted or stopped, discarding result");
            RefreshOutcome::Discarded
        }
    }

    /// Applies `f` only if `generation` is still current. The lifecycle lock is
    /// held across the write so `stop` cannot interleave with it.
    fn publish(&self, generation: u64, f: impl FnOnce(&mut FetchState<F::Record>)) -> bool {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.generation != generation {
            return false;
        }
        self.state.update(f);
        true
    }
}

/// Periodic refresh engine for one fetcher and one published state.
pub struct PollingController<F: Fetcher> {
    shared: Arc<Shared<F>>,
    interval: Duration,
}

impl<F: Fetcher> fmt::Debug for PollingController<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingController")
            .field("fetcher", &self.shared.fetcher)
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

impl<F: Fetcher> PollingController<F> {
    pub fn new(
        fetcher: F,
        settings: Arc<dyn SettingsProvider>,
        state: Arc<ViewModelState<F::Record>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                settings,
                state,
                lifecycle: Mutex::new(Lifecycle::default()),
                in_flight: tokio::sync::Mutex::new(()),
            }),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn is_running(&self) -> bool {
        self.shared.lifecycle.lock().timer.is_some()
    }

    /// Fetch now and then every interval.
    ///
    /// Returns `false` without doing anything if already running, or if
    /// called outside a Tokio runtime.
    pub fn start(&self) -> bool {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("Cannot start polling outside a Tokio runtime: {}", e);
                return false;
            }
        };

        let mut lifecycle = self.shared.lifecycle.lock();
        if lifecycle.timer.is_some() {
            tracing::debug!(kind = %self.shared.fetcher.kind(), "already running");
            return false;
        }

        lifecycle.generation += 1;
        let generation = lifecycle.generation;
        let cancel = CancellationToken::new();
        lifecycle.timer = Some(cancel.clone());
        drop(lifecycle);

        tracing::info!(
            kind = %self.shared.fetcher.kind(),
            interval_secs = self.interval.as_secs(),
            "polling started"
        );
        runtime.spawn(Arc::clone(&self.shared).run_timer(generation, self.interval, cancel));
        true
    }

    /// Cancel the timer. A fetch already in flight runs to completion but its
    /// result is dropped. Calling this while idle does nothing.
    ///
    /// The published state is left as it was, so `is_loading` stays `true`
    /// after stopping mid-fetch until the next `start` publishes again.
    pub fn stop(&self) {
        let mut lifecycle = self.shared.lifecycle.lock();
        let Some(timer) = lifecycle.timer.take() else {
            return;
        };
        lifecycle.generation += 1;
        timer.cancel();

        tracing::info!(kind = %self.shared.fetcher.kind(), "polling stopped");
    }

    /// Manual "refresh now". Works whether or not the timer is running and
    /// obeys the same one-in-flight rule as timer ticks.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let generation = self.shared.lifecycle.lock().generation;
        self.shared.fetch_once(generation, Trigger::Manual).await
    }
}

impl<F: Fetcher> Drop for PollingController<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Settings, error::FetchError, fetcher::DataKind};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LATENCY: Duration = Duration::from_secs(5);

    #[derive(Debug, Default)]
    struct Script {
        results: Mutex<VecDeque<Result<u32, FetchError>>>,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl Script {
        fn push(&self, result: Result<u32, FetchError>) {
            self.results.lock().push_back(result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn max_active(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    struct ScriptedFetcher {
        script: Arc<Script>,
        latency: Duration,
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        type Record = u32;

        fn kind(&self) -> DataKind {
            DataKind::Observation
        }

        async fn fetch(&self, _settings: &Settings) -> Result<u32, FetchError> {
            let call = self.script.calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
            let active = self.script.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.script.max_active.fetch_max(active, Ordering::SeqCst);

            tokio::time::sleep(self.latency).await;

            self.script.active.fetch_sub(1, Ordering::SeqCst);
            self.script.results.lock().pop_front().unwrap_or(Ok(call))
        }
    }

    type Harness = (PollingController<ScriptedFetcher>, Arc<ViewModelState<u32>>, Arc<Script>);

    fn controller(latency: Duration) -> Harness {
        let script = Arc::new(Script::default());
        let state = Arc::new(ViewModelState::new());
        let fetcher = ScriptedFetcher { script: Arc::clone(&script), latency };
        let settings: Arc<dyn SettingsProvider> = Arc::new(Settings::new("IMELLE143", "KEY"));
        let controller = PollingController::new(fetcher, settings, Arc::clone(&state));
        (controller, state, script)
    }

    #[tokio::test(start_paused = true)]
    async fn start_fetches_immediately() {
        let (controller, state, script) = controller(LATENCY);
        let mut rx = state.subscribe();

        assert!(controller.start());

        // Well before the first interval elapses.
        tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|s| s.data.is_some()))
            .await
            .expect("first fetch must not wait for the timer")
            .expect("state alive");

        assert_eq!(script.calls(), 1);
        assert_eq!(state.data(), Some(1));
        assert!(!state.is_loading());
        assert!(state.fetched_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_interval_and_second_start_is_noop() {
        let (controller, _state, script) = controller(LATENCY);

        assert!(controller.start());
        assert!(!controller.start());
        assert!(controller.is_running());

        // Fetches begin at 0, 65, 130 and 195 seconds.
        tokio::time::sleep(Duration::from_secs(200)).await;

        assert_eq!(script.calls(), 4);
        assert_eq!(script.max_active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_during_fetch_is_skipped() {
        let (controller, _state, script) = controller(LATENCY);
        let controller = Arc::new(controller);

        controller.start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let c = Arc::clone(&controller);
            handles.push(tokio::spawn(async move { c.refresh_now().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.expect("task"), RefreshOutcome::Skipped);
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(controller.refresh_now().await, RefreshOutcome::Applied);

        assert_eq!(script.calls(), 2);
        assert_eq!(script.max_active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_during_manual_refresh_is_skipped() {
        let (controller, _state, script) = controller(Duration::from_secs(30));
        let controller = Arc::new(controller.with_interval(Duration::from_secs(10)));

        // First fetch runs 0..30, so the next tick is due at 40.
        controller.start();
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(script.calls(), 1);

        // Manual fetch runs 35..65 and overlaps the ticks at 40, 50 and 60.
        let c = Arc::clone(&controller);
        let manual = tokio::spawn(async move { c.refresh_now().await });

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(manual.await.expect("task"), RefreshOutcome::Applied);
        assert_eq!(script.calls(), 2);
        assert_eq!(script.max_active(), 1);

        // The timer keeps going once the guard is free again.
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(script.calls(), 3);
        assert_eq!(script.max_active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (controller, state, script) = controller(LATENCY);
        let before = state.snapshot();

        controller.stop();
        controller.stop();

        assert!(!controller.is_running());
        assert_eq!(state.snapshot(), before);
        assert_eq!(script.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_result() {
        let (controller, state, script) = controller(LATENCY);

        controller.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(state.is_loading());

        let before = state.snapshot();
        controller.stop();

        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(state.snapshot(), before);
        assert!(state.is_loading());
        assert!(!controller.is_running());
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_keep_previous_data() {
        let (controller, state, script) = controller(LATENCY);
        script.push(Ok(42));
        script.push(Err(FetchError::EmptyResult("station IMELLE143".into())));
        script.push(Err(FetchError::HttpStatus { code: 503 }));

        assert_eq!(controller.refresh_now().await, RefreshOutcome::Applied);
        assert_eq!(state.data(), Some(42));

        assert_eq!(controller.refresh_now().await, RefreshOutcome::Applied);
        let snap = state.snapshot();
        assert_eq!(snap.data, Some(42));
        assert!(!snap.is_loading);
        assert!(snap.error_message.as_deref().is_some_and(|m| m.contains("No data found")));

        assert_eq!(controller.refresh_now().await, RefreshOutcome::Applied);
        let snap = state.snapshot();
        assert_eq!(snap.data, Some(42));
        assert!(snap.error_message.as_deref().is_some_and(|m| m.contains("503")));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_waits_for_stale_fetch_then_fetches() {
        let (controller, state, script) = controller(LATENCY);
        script.push(Ok(1));
        script.push(Ok(2));

        controller.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.stop();
        assert!(controller.start());

        let mut rx = state.subscribe();
        tokio::time::timeout(Duration::from_secs(30), rx.wait_for(|s| s.data.is_some()))
            .await
            .expect("restart must fetch")
            .expect("state alive");

        assert_eq!(state.data(), Some(2));
        assert_eq!(script.calls(), 2);
        assert_eq!(script.max_active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_stops_timer() {
        let (controller, _state, script) = controller(LATENCY);

        controller.start();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(controller);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(script.calls(), 1);
    }

    #[test]
    fn start_outside_runtime_is_refused() {
        let (controller, _state, script) = controller(LATENCY);

        assert!(!controller.start());
        assert!(!controller.is_running());
        assert_eq!(script.calls(), 0);
    }
}
