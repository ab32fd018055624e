//! Periodic tickers that drive the clocks.
//!
//! Every registration gets its own tokio task, so ticks of one clock are
//! strictly ordered while different clocks tick independently. The returned
//! `TickerId` is the cancellation handle. A ticker registered with a phase
//! signal restarts its period whenever the signal fires.

use crate::common::TickerId;
use crate::components::Tick;
use slotmap::SlotMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, trace};

#[doc(hidden)]
struct Ticker {
    label: &'static str,
    handle: JoinHandle<()>,
}

/// Owns the ticker tasks of all registered clocks.
#[derive(Clone)]
pub struct TickScheduler {
    tickers: Arc<RwLock<SlotMap<TickerId, Ticker>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TickScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            tickers: Arc::new(RwLock::new(SlotMap::with_key())),
            shutdown_tx,
        }
    }

    /// Calls `target.tick()` every `period`, starting one period from now.
    ///
    /// The task holds only `target`. Must be called from within a tokio runtime.
    pub async fn schedule(
        &self,
        label: &'static str,
        period: Duration,
        target: Arc<dyn Tick>,
    ) -> TickerId {
        self.register(label, period, target, None).await
    }

    /// Like [`schedule`](Self::schedule), but every `phase.notify_one()`
    /// restarts the period: the next tick comes one full `period` after the
    /// notification.
    pub async fn schedule_with_phase(
        &self,
        label: &'static str,
        period: Duration,
        target: Arc<dyn Tick>,
        phase: Arc<Notify>,
    ) -> TickerId {
        self.register(label, period, target, Some(phase)).await
    }

    async fn register(
        &self,
        label: &'static str,
        period: Duration,
        target: Arc<dyn Tick>,
        phase: Option<Arc<Notify>>,
    ) -> TickerId {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                let rephase = async {
                    match &phase {
                        Some(phase) => phase.notified().await,
                        None => std::future::pending().await,
                    }
                };
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = rephase => {
                        trace!("[{}] ticker re-phased", label);
                        ticker.reset();
                    }
                    _ = ticker.tick() => target.tick(),
                }
            }
            debug!("[{}] ticker stopped", label);
        });
        let id = self.tickers.write().await.insert(Ticker { label, handle });
        info!("[{}] ticker scheduled every {:?}", label, period);
        id
    }

    /// Cancels one ticker. Returns `true` if it was still registered.
    pub async fn cancel(&self, id: TickerId) -> bool {
        match self.tickers.write().await.remove(id) {
            Some(ticker) => {
                ticker.handle.abort();
                info!("[{}] ticker cancelled", ticker.label);
                true
            }
            None => false,
        }
    }

    /// Stops every ticker and waits for their tasks to finish.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send(()).ok();
        let tickers: Vec<Ticker> = self.tickers.write().await.drain().map(|(_, t)| t).collect();
        for ticker in tickers {
            ticker.handle.await.ok();
        }
        info!("All tickers stopped.");
    }

    pub async fn active_count(&self) -> usize {
        self.tickers.read().await.len()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counter(AtomicU32);

    impl Tick for Counter {
        fn tick(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let scheduler = TickScheduler::new();
        let counter = Arc::new(Counter::default());
        scheduler
            .schedule("counter", Duration::from_millis(100), counter.clone())
            .await;

        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_ticker_stops_ticking() {
        let scheduler = TickScheduler::new();
        let counter = Arc::new(Counter::default());
        let id = scheduler
            .schedule("counter", Duration::from_millis(100), counter.clone())
            .await;

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(scheduler.cancel(id).await);
        assert!(!scheduler.cancel(id).await);
        let seen = counter.0.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), seen);
        assert_eq!(scheduler.active_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_signal_restarts_the_period() {
        let scheduler = TickScheduler::new();
        let counter = Arc::new(Counter::default());
        let phase = Arc::new(Notify::new());
        scheduler
            .schedule_with_phase("counter", Duration::from_secs(1), counter.clone(), phase.clone())
            .await;

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        // Without the signal the next tick would land 100ms from now.
        phase.notify_one();
        tokio::time::sleep(Duration::from_millis(950)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_everything() {
        let scheduler = TickScheduler::new();
        let fast = Arc::new(Counter::default());
        let slow = Arc::new(Counter::default());
        scheduler
            .schedule("fast", Duration::from_millis(100), fast.clone())
            .await;
        scheduler
            .schedule("slow", Duration::from_secs(1), slow.clone())
            .await;

        tokio::time::sleep(Duration::from_millis(2050)).await;
        scheduler.shutdown().await;
        let (f, s) = (fast.0.load(Ordering::SeqCst), slow.0.load(Ordering::SeqCst));
        assert_eq!((f, s), (20, 2));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fast.0.load(Ordering::SeqCst), f);
        assert_eq!(slow.0.load(Ordering::SeqCst), s);
    }
}
