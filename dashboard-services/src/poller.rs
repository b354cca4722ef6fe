//! Periodic view poller
//!
//! A `ViewPoller` owns one periodic timer and turns each tick into an
//! independent fetch cycle. Cycles are stamped with the dependency epoch they
//! were issued under plus a monotonically increasing generation; a result is
//! only committed when its epoch is still current and nothing newer has been
//! committed. Out-of-order arrivals and arrivals after `stop()` are dropped.

use std::fmt::Debug;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashboard_core::{DashboardResult, Exchange, PollResult, Ticker};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::market_service::{DependencySnapshot, DetailLimits, MarketDetail, MarketService};

// ============================================================================
// Fetchers
// ============================================================================

/// One fetch of whatever a view displays
#[async_trait]
pub trait ViewFetcher: Send + Sync + 'static {
    /// Values the fetch depends on; a change starts a new epoch
    type Params: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    async fn fetch(&self, params: &Self::Params) -> DashboardResult<Self::Output>;
}

/// Fetches an exchange's full price list
pub struct PriceListFetcher {
    service: Arc<MarketService>,
    exchange: Exchange,
}

impl PriceListFetcher {
    pub fn new(service: Arc<MarketService>, exchange: Exchange) -> Self {
        Self { service, exchange }
    }
}

#[async_trait]
impl ViewFetcher for PriceListFetcher {
    type Params = ();
    type Output = Vec<Ticker>;

    async fn fetch(&self, _params: &()) -> DashboardResult<Vec<Ticker>> {
        self.service.fetch_price_list(self.exchange).await
    }
}

/// Fetches order book, trades and candles for one symbol
pub struct DetailFetcher {
    service: Arc<MarketService>,
    exchange: Exchange,
    limits: DetailLimits,
}

impl DetailFetcher {
    pub fn new(service: Arc<MarketService>, exchange: Exchange, limits: DetailLimits) -> Self {
        Self {
            service,
            exchange,
            limits,
        }
    }
}

#[async_trait]
impl ViewFetcher for DetailFetcher {
    type Params = DependencySnapshot;
    type Output = MarketDetail;

    async fn fetch(&self, params: &DependencySnapshot) -> DashboardResult<MarketDetail> {
        self.service
            .fetch_detail(self.exchange, params, &self.limits)
            .await
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Where a poller stands, derived from its current result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// Nothing fetched under the current dependencies
    Idle,
    /// At least one current cycle is in flight
    Loading,
    /// Last committed cycle succeeded
    Ready,
    /// Last committed cycle failed
    Failed,
}

/// Aborts the timer task when dropped
struct TimerGuard {
    id: u64,
    handle: JoinHandle<()>,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct PollState<P, T> {
    params: P,
    /// Bumped on every dependency change
    epoch: u64,
    /// Last generation handed to a cycle
    issued: u64,
    /// Generation of the last committed cycle
    committed: u64,
    /// Current-epoch cycles still running
    in_flight: usize,
    stopped: bool,
    next_timer_id: u64,
    timer: Option<TimerGuard>,
    result: PollResult<T>,
}

struct Inner<F: ViewFetcher> {
    name: String,
    period: Duration,
    fetcher: F,
    state: Mutex<PollState<F::Params, F::Output>>,
    tx: watch::Sender<PollResult<F::Output>>,
}

impl<F: ViewFetcher> Inner<F> {
    fn publish(&self, state: &PollState<F::Params, F::Output>) {
        self.tx.send_replace(state.result.clone());
    }

    /// Issue one cycle; `timer_id` is set when the tick came from a timer
    ///
    /// Returns false when the poller is stopped or the timer was replaced,
    /// which tells the timer loop to exit.
    fn spawn_cycle(self: &Arc<Self>, timer_id: Option<u64>) -> bool {
        let (epoch, generation, params) = {
            let mut state = self.state.lock();
            if state.stopped {
                return false;
            }
            if let Some(id) = timer_id {
                if state.timer.as_ref().map(|t| t.id) != Some(id) {
                    return false;
                }
            }

            state.issued += 1;
            state.in_flight += 1;
            state.result.loading = true;
            self.publish(&state);
            (state.epoch, state.issued, state.params.clone())
        };

        debug!(
            "{}: poll cycle {} (epoch {}) for {:?}",
            self.name, generation, epoch, params
        );

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.fetcher.fetch(&params).await;
            inner.complete(epoch, generation, outcome);
        });

        true
    }

    fn complete(&self, epoch: u64, generation: u64, outcome: DashboardResult<F::Output>) {
        let mut state = self.state.lock();

        if state.stopped {
            debug!("{}: dropping cycle {} after stop", self.name, generation);
            return;
        }
        if epoch != state.epoch {
            debug!(
                "{}: dropping stale cycle {} (epoch {} != {})",
                self.name, generation, epoch, state.epoch
            );
            return;
        }

        state.in_flight = state.in_flight.saturating_sub(1);

        if generation <= state.committed {
            debug!(
                "{}: dropping superseded cycle {} (committed {})",
                self.name, generation, state.committed
            );
        } else {
            state.committed = generation;
            state.result = match outcome {
                Ok(data) => {
                    debug!("{}: cycle {} ready", self.name, generation);
                    PollResult::ready(data)
                }
                Err(e) => {
                    warn!("{}: cycle {} failed: {}", self.name, generation, e);
                    PollResult::failed(&e)
                }
            };
        }

        state.result.loading = state.in_flight > 0;
        self.publish(&state);
    }

    /// Replace any running timer with a fresh one whose first tick is immediate
    fn install_timer(self: &Arc<Self>, state: &mut PollState<F::Params, F::Output>) {
        // Release the old timer before the new one exists
        state.timer = None;

        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !inner.spawn_cycle(Some(id)) {
                    break;
                }
            }
        });

        state.timer = Some(TimerGuard { id, handle });
    }
}

/// Polls one view on a fixed period and exposes its latest `PollResult`
pub struct ViewPoller<F: ViewFetcher> {
    inner: Arc<Inner<F>>,
}

impl<F: ViewFetcher> ViewPoller<F> {
    /// Create a poller; nothing is fetched until `start()`
    pub fn new(name: impl Into<String>, fetcher: F, params: F::Params, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(PollResult::idle());
        let inner = Inner {
            name: name.into(),
            period,
            fetcher,
            state: Mutex::new(PollState {
                params,
                epoch: 0,
                issued: 0,
                committed: 0,
                in_flight: 0,
                stopped: false,
                next_timer_id: 0,
                timer: None,
                result: PollResult::idle(),
            }),
            tx,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Start the periodic timer; a no-op when running or stopped
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        if state.stopped || state.timer.is_some() {
            return;
        }
        info!(
            "{}: polling every {:?} for {:?}",
            self.inner.name, self.inner.period, state.params
        );
        self.inner.install_timer(&mut state);
    }

    /// Stop polling for good
    ///
    /// Releases the timer and turns every later arrival into a no-op.
    /// Calling it again does nothing.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if state.stopped {
            return;
        }
        state.stopped = true;
        state.timer = None;
        state.in_flight = 0;
        state.result.loading = false;
        self.inner.publish(&state);
        info!("{}: polling stopped", self.inner.name);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopped
    }

    pub fn is_running(&self) -> bool {
        let state = self.inner.state.lock();
        !state.stopped && state.timer.is_some()
    }

    /// Change the fetch dependencies
    ///
    /// Equal values are a no-op and return false. Otherwise the displayed
    /// data is cleared, in-flight cycles become stale, and a running timer is
    /// replaced by one that polls immediately.
    pub fn set_params(&self, params: F::Params) -> bool {
        let mut state = self.inner.state.lock();
        if state.params == params {
            return false;
        }

        info!(
            "{}: dependencies changed {:?} -> {:?}",
            self.inner.name, state.params, params
        );

        state.params = params;
        state.epoch += 1;
        state.in_flight = 0;
        state.result = PollResult::idle();
        self.inner.publish(&state);

        if !state.stopped && state.timer.is_some() {
            self.inner.install_timer(&mut state);
        }
        true
    }

    /// Issue one cycle outside the timer
    pub fn refresh(&self) {
        self.inner.spawn_cycle(None);
    }

    /// Current dependencies
    pub fn params(&self) -> F::Params {
        self.inner.state.lock().params.clone()
    }

    /// Generation of the last committed cycle; changes whenever data is replaced
    pub fn revision(&self) -> u64 {
        self.inner.state.lock().committed
    }

    /// Current data, loading flag and error
    pub fn snapshot(&self) -> PollResult<F::Output> {
        self.inner.state.lock().result.clone()
    }

    pub fn phase(&self) -> PollPhase {
        let state = self.inner.state.lock();
        let result = &state.result;
        if result.loading {
            PollPhase::Loading
        } else if result.error.is_some() {
            PollPhase::Failed
        } else if result.data.is_some() {
            PollPhase::Ready
        } else {
            PollPhase::Idle
        }
    }

    /// Receiver updated on every state change
    pub fn subscribe(&self) -> watch::Receiver<PollResult<F::Output>> {
        self.inner.tx.subscribe()
    }
}

impl<F: ViewFetcher> Drop for ViewPoller<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::DashboardError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::sleep;

    /// Echoes its params back after a per-value delay
    struct EchoFetcher {
        calls: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    impl EchoFetcher {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fail = Arc::new(AtomicBool::new(false));
            let fetcher = Self {
                calls: Arc::clone(&calls),
                fail: Arc::clone(&fail),
            };
            (fetcher, calls, fail)
        }
    }

    #[async_trait]
    impl ViewFetcher for EchoFetcher {
        type Params = String;
        type Output = String;

        async fn fetch(&self, params: &String) -> DashboardResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if params.starts_with("BTC") { 300 } else { 10 };
            sleep(Duration::from_millis(delay)).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(DashboardError::transport("Failed to fetch data (HTTP 500)"));
            }
            Ok(params.clone())
        }
    }

    fn poller(params: &str) -> (ViewPoller<EchoFetcher>, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let (fetcher, calls, fail) = EchoFetcher::new();
        let poller = ViewPoller::new("test", fetcher, params.to_string(), Duration::from_secs(5));
        (poller, calls, fail)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate_and_periodic() {
        let (poller, calls, _) = poller("ETHUSDT");
        poller.start();

        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.snapshot().data.as_deref(), Some("ETHUSDT"));
        assert_eq!(poller.phase(), PollPhase::Ready);

        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_cycles_and_is_idempotent() {
        let (poller, calls, _) = poller("ETHUSDT");
        poller.start();
        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        poller.stop();
        poller.stop();
        assert!(poller.is_stopped());
        assert!(!poller.is_running());

        sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Restart after stop is refused
        poller.start();
        poller.refresh();
        sleep(Duration::from_secs(6)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arrival_after_stop_is_dropped() {
        let (poller, _, _) = poller("BTCUSDT");
        poller.start();
        sleep(Duration::from_millis(50)).await;
        assert!(poller.snapshot().loading);

        poller.stop();
        sleep(Duration::from_millis(500)).await;
        let snapshot = poller.snapshot();
        assert!(snapshot.data.is_none());
        assert!(!snapshot.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_never_overwrites_newer_params() {
        let (poller, calls, _) = poller("BTCUSDT");
        poller.start();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(poller.phase(), PollPhase::Loading);

        assert!(poller.set_params("ETHUSDT".to_string()));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(poller.snapshot().data.as_deref(), Some("ETHUSDT"));

        // BTC finishes at ~300ms and must be discarded
        sleep(Duration::from_millis(400)).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.data.as_deref(), Some("ETHUSDT"));
        assert!(!snapshot.loading);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Returns its call index; the first call hangs for 7s
    struct SequenceFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ViewFetcher for SequenceFetcher {
        type Params = ();
        type Output = usize;

        async fn fetch(&self, _params: &()) -> DashboardResult<usize> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if call == 0 { 7_000 } else { 10 };
            sleep(Duration::from_millis(delay)).await;
            Ok(call)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_older_cycle_never_overwrites_newer_data() {
        let fetcher = SequenceFetcher {
            calls: AtomicUsize::new(0),
        };
        let poller = ViewPoller::new("overlap", fetcher, (), Duration::from_secs(5));
        poller.start();

        // Cycle 0 is still hanging when cycle 1 (t=5s) lands
        sleep(Duration::from_millis(5_100)).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.data, Some(1));
        assert!(snapshot.loading);

        // Cycle 0 arrives at t=7s and is dropped
        sleep(Duration::from_secs(2)).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.data, Some(1));
        assert!(!snapshot.loading);
        assert_eq!(poller.phase(), PollPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_param_changes_never_duplicate_the_timer() {
        let (poller, calls, _) = poller("AAA");
        poller.start();

        sleep(Duration::from_secs(1)).await;
        poller.set_params("BBB".to_string());
        sleep(Duration::from_secs(1)).await;
        poller.set_params("CCC".to_string());

        // Only the timer installed at t=2s survives: next tick at t=7s
        sleep(Duration::from_millis(4_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_params_are_a_no_op() {
        let (poller, calls, _) = poller("ETHUSDT");
        poller.start();
        sleep(Duration::from_millis(100)).await;

        assert!(!poller.set_params("ETHUSDT".to_string()));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.snapshot().data.as_deref(), Some("ETHUSDT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_clears_data_and_keeps_message() {
        let (poller, _, fail) = poller("ETHUSDT");
        poller.start();
        sleep(Duration::from_millis(100)).await;
        assert!(poller.snapshot().is_ready());

        fail.store(true, Ordering::SeqCst);
        poller.refresh();
        sleep(Duration::from_millis(100)).await;

        let snapshot = poller.snapshot();
        assert!(snapshot.data.is_none());
        assert_eq!(snapshot.error_message(), Some("Failed to fetch data (HTTP 500)"));
        assert_eq!(poller.phase(), PollPhase::Failed);

        fail.store(false, Ordering::SeqCst);
        poller.refresh();
        sleep(Duration::from_millis(100)).await;
        assert!(poller.snapshot().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let (poller, _, _) = poller("ETHUSDT");
        let mut rx = poller.subscribe();
        poller.start();

        let result = rx.wait_for(|r| r.is_ready()).await.unwrap().clone();
        assert_eq!(result.data.as_deref(), Some("ETHUSDT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_params_before_start_only_stores() {
        let (poller, calls, _) = poller("AAA");
        poller.set_params("BBB".to_string());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(poller.params(), "BBB");

        poller.start();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(poller.snapshot().data.as_deref(), Some("BBB"));
    }
}
