use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use super::store::AccountStore;
use crate::oracle::{BalanceOracle, OracleError};

/// Summary of one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub updated: usize,
    pub unhealthy: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Background worker that periodically refreshes every tracked balance
pub struct RefreshWorker {
    store: Arc<AccountStore>,
    oracle: Arc<dyn BalanceOracle>,
    interval: Duration,
    fetch_timeout: Duration,
    /// Set while a cycle is running
    in_progress: AtomicBool,
    /// Shutdown signal sender
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

/// Clears the in-progress flag even if the cycle future is dropped
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshWorker {
    pub fn new(
        store: Arc<AccountStore>,
        oracle: Arc<dyn BalanceOracle>,
        interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            oracle,
            interval,
            fetch_timeout,
            in_progress: AtomicBool::new(false),
            shutdown_tx: Mutex::new(None),
        }
    }

    /// Start the periodic refresh.
    ///
    /// The first cycle runs one interval after start; callers that want an
    /// immediate refresh run [`RefreshWorker::run_cycle`] first. The task
    /// only finishes after [`RefreshWorker::stop`] or when the interval
    /// cannot be scheduled.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.lock() = Some(shutdown_tx);

        tokio::spawn(async move {
            tracing::info!("Refresh worker started with interval {:?}", self.interval);

            let Some(first_tick) = time::Instant::now().checked_add(self.interval) else {
                tracing::error!(
                    interval = ?self.interval,
                    "Refresh interval is out of range, refresh worker exiting"
                );
                return;
            };
            let mut ticker = time::interval_at(first_tick, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(report) = self.run_cycle().await {
                            if report.elapsed > self.interval {
                                tracing::warn!(
                                    elapsed = ?report.elapsed,
                                    interval = ?self.interval,
                                    "Refresh cycle overran its interval, skipping missed ticks"
                                );
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            tracing::info!("Refresh worker stopped");
        })
    }

    /// Stop the background worker
    pub fn stop(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.try_send(());
        }
    }

    /// Run one refresh cycle over all tracked accounts.
    ///
    /// Returns `None` without touching the store when another cycle is
    /// still in progress.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Previous refresh cycle still running, skipping this one");
            return None;
        }
        let _guard = CycleGuard(&self.in_progress);

        let started = Instant::now();
        let addresses = self.store.addresses();
        let mut results = Vec::with_capacity(addresses.len());

        for address in addresses {
            let fetch = self.oracle.fetch_balance(address);
            let result = match time::timeout(self.fetch_timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(self.fetch_timeout)),
            };

            if let Err(ref e) = result {
                tracing::warn!(
                    address = %address,
                    error = %e,
                    "Failed to fetch balance"
                );
            }

            results.push((address, result));
        }

        let summary = self.store.update_all(results);
        let report = CycleReport {
            updated: summary.updated,
            unhealthy: summary.unhealthy,
            failed: summary.failed,
            elapsed: started.elapsed(),
        };

        tracing::debug!(
            updated = report.updated,
            unhealthy = report.unhealthy,
            failed = report.failed,
            elapsed = ?report.elapsed,
            "Refresh cycle complete"
        );

        Some(report)
    }
}
