//! Once-per-second housekeeping, independent of the slot schedule.
//!
//! Detects blocks whose ancestors have gone missing and dispatches backfill
//! requests for them, but only while the sync manager is idle: during a
//! range sync the missing ancestors are exactly what is being fetched.

use crate::metrics;
use beacon_metrics::set_gauge;
use network::{NodeTypes, Quarantine, RequestManager, SyncReader};
use slog::{debug, o};
use std::sync::Arc;
use std::time::{Duration, Instant};
use task_executor::TaskExecutor;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct SecondTicker<T: NodeTypes> {
    sync: Arc<T::Sync>,
    quarantine: Arc<Quarantine>,
    request_manager: RequestManager<T>,
    log: slog::Logger,
}

impl<T: NodeTypes> SecondTicker<T> {
    pub fn new(
        sync: Arc<T::Sync>,
        quarantine: Arc<Quarantine>,
        request_manager: RequestManager<T>,
        log: &slog::Logger,
    ) -> Self {
        Self {
            sync,
            quarantine,
            request_manager,
            log: log.new(o!("service" => "second_ticker")),
        }
    }

    async fn run(self) {
        let mut expected_wake = Instant::now() + TICK_INTERVAL;
        loop {
            tokio::time::sleep_until(expected_wake.into()).await;

            // The drift between the scheduled and the actual wake time is a
            // direct measure of event-loop starvation.
            let lag = Instant::now().saturating_duration_since(expected_wake);
            set_gauge(&metrics::TICKS_DELAY, lag.as_millis() as i64);
            expected_wake += TICK_INTERVAL;

            self.tick().await;
        }
    }

    /// One housekeeping pass.
    async fn tick(&self) {
        if self.sync.is_syncing() {
            return;
        }

        let missing = self.quarantine.check_missing();
        if !missing.is_empty() {
            debug!(
                self.log, "Missing ancestors detected";
                "roots" => missing.len(),
            );
            self.request_manager.fetch_ancestor_blocks(missing).await;
        }
    }
}

/// Spawns the once-per-second housekeeping loop.
pub fn spawn<T: NodeTypes>(
    executor: &TaskExecutor,
    ticker: SecondTicker<T>,
) -> Result<(), &'static str> {
    executor.spawn(ticker.run(), "second_ticker");
    Ok(())
}
