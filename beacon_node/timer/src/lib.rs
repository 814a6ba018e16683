//! A timer service for the beacon node.
//!
//! Drives the per-slot work of the node: fork-choice head updates, validator
//! duties, the gossip gate and the per-epoch subnet rotation. A second,
//! independent once-per-second ticker handles missing-block housekeeping.

pub mod metrics;
pub mod second_ticker;

pub use second_ticker::SecondTicker;

use beacon_metrics::{inc_counter, set_gauge};
use futures::channel::mpsc::Sender;
use network::{GossipGate, NodeTypes, Processor, SubnetService, SyncReader, ValidatorDuties};
use slog::{o, warn};
use slot_clock::SlotClock;
use std::sync::Arc;
use task_executor::{ShutdownReason, TaskExecutor};
use types::{Epoch, EthSpec, Slot, GENESIS_SLOT};

/// Drives `on_slot_start` once per slot.
///
/// Exactly one pending tick exists at any moment: the loop sleeps until the
/// wall-clock start of `next_slot`, runs the slot body to completion, and
/// only then arms the next tick. Slot bodies therefore never overlap, and a
/// body overrunning its slot simply delays (or, past an epoch, skips) the
/// following ones.
pub struct SlotScheduler<T: NodeTypes> {
    clock: T::SlotClock,
    processor: Arc<T::Processor>,
    duties: Arc<T::Duties>,
    sync: Arc<T::Sync>,
    gate: GossipGate<T>,
    subnets: SubnetService<T>,
    /// Request shutdown once this epoch is reached, if set.
    stop_at_epoch: Option<Epoch>,
    shutdown_tx: Sender<ShutdownReason>,
    /// The slot most recently processed.
    last_slot: Slot,
    /// The slot the pending timer is armed for.
    next_slot: Slot,
    log: slog::Logger,
}

impl<T: NodeTypes> SlotScheduler<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: T::SlotClock,
        processor: Arc<T::Processor>,
        duties: Arc<T::Duties>,
        sync: Arc<T::Sync>,
        gate: GossipGate<T>,
        subnets: SubnetService<T>,
        stop_at_epoch: Option<Epoch>,
        shutdown_tx: Sender<ShutdownReason>,
        log: &slog::Logger,
    ) -> Self {
        let current_slot = clock.now_or_genesis();
        Self {
            clock,
            processor,
            duties,
            sync,
            gate,
            subnets,
            stop_at_epoch,
            shutdown_tx,
            last_slot: current_slot,
            next_slot: current_slot + 1,
            log: log.new(o!("service" => "slot_timer")),
        }
    }

    /// The slot the next tick is armed for.
    pub fn next_slot(&self) -> Slot {
        self.next_slot
    }

    pub fn last_slot(&self) -> Slot {
        self.last_slot
    }

    pub fn gate(&self) -> &GossipGate<T> {
        &self.gate
    }

    pub fn subnets(&self) -> &SubnetService<T> {
        &self.subnets
    }

    async fn run(mut self) {
        loop {
            let wait = self.clock.time_until(self.next_slot).saturating_wait();
            tokio::time::sleep(wait).await;

            let scheduled_slot = self.next_slot;
            self.on_slot_start(scheduled_slot).await;
        }
    }

    /// The body of a slot tick.
    ///
    /// Reads the wall clock exactly once and handles the three cases: clock
    /// regression, falling more than an epoch behind, and the common path.
    async fn on_slot_start(&mut self, scheduled_slot: Slot) {
        let slots_per_epoch = T::EthSpec::slots_per_epoch();
        let (after_genesis, wall_slot) = self
            .clock
            .beacon_time_now()
            .to_slot(self.clock.slot_duration());

        // An NTP step-back (or a pre-genesis clock) re-arms for the slot
        // after the last one processed rather than repeating any work.
        if !after_genesis || wall_slot < self.last_slot {
            warn!(
                self.log, "Clock went backwards, rescheduling slot";
                "scheduled_slot" => %scheduled_slot,
                "wall_slot" => %wall_slot,
                "last_slot" => %self.last_slot,
            );
            inc_counter(&metrics::CLOCK_REGRESSIONS);
            self.next_slot = std::cmp::max(self.last_slot, GENESIS_SLOT) + 1;
            return;
        }

        // More than an epoch behind: replaying the missed slots is the sync
        // manager's job, and running duties for stale slots would be
        // harmful. Skip straight to the present.
        if wall_slot > self.last_slot + slots_per_epoch {
            warn!(
                self.log, "Unable to keep up, skipping ahead";
                "last_slot" => %self.last_slot,
                "wall_slot" => %wall_slot,
            );
            inc_counter(&metrics::SLOT_TICKS_SKIPPED);
            self.last_slot = wall_slot;
            self.next_slot = wall_slot + 1;
            return;
        }

        set_gauge(&metrics::BEACON_SLOT, wall_slot.as_u64() as i64);
        let finalization_delay = scheduled_slot
            .epoch(slots_per_epoch)
            .saturating_sub(self.processor.finalized_epoch());
        set_gauge(
            &metrics::FINALIZATION_DELAY,
            finalization_delay.as_u64() as i64,
        );

        self.processor.update_head(wall_slot);

        // Duty handling may await aggregation windows within the slot; it
        // completes before the gate is consulted.
        self.duties.handle_duties(self.last_slot, wall_slot).await;

        let sync_queue_len = self.sync.sync_queue_len();
        self.gate
            .on_slot_end(wall_slot, sync_queue_len, &mut self.subnets)
            .await;

        if wall_slot.as_u64() % slots_per_epoch == 0 && self.gate.is_enabled() {
            self.subnets.cycle(wall_slot).await;
        }

        if let Some(stop_at) = self.stop_at_epoch {
            if wall_slot.epoch(slots_per_epoch) >= stop_at {
                let _ = self
                    .shutdown_tx
                    .try_send(ShutdownReason::Success("reached stop-at-epoch"));
            }
        }

        self.last_slot = wall_slot;
        self.next_slot = wall_slot + 1;
    }
}

/// Spawns the timer service which drives the per-slot tasks of the node.
pub fn spawn<T: NodeTypes>(
    executor: &TaskExecutor,
    scheduler: SlotScheduler<T>,
) -> Result<(), &'static str> {
    executor.spawn(scheduler.run(), "slot_timer");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc::channel;
    use network::testing::{MockGossip, MockSync, NullFetcher, NullProcessor, TestDuties};
    use network::{NetworkGlobals, Witness};
    use slog::Logger;
    use sloggers::{null::NullLoggerBuilder, Build};
    use slot_clock::ManualSlotClock;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use types::{MainnetEthSpec, SubnetId};

    type E = MainnetEthSpec;
    type T = Witness<
        ManualSlotClock,
        MockGossip<E>,
        NullProcessor,
        TestDuties,
        MockSync,
        NullFetcher,
        E,
    >;

    const SLOT_DURATION: Duration = Duration::from_secs(12);

    fn get_logger() -> Logger {
        NullLoggerBuilder.build().expect("logger should build")
    }

    struct Tester {
        scheduler: SlotScheduler<T>,
        clock: ManualSlotClock,
        processor: Arc<NullProcessor>,
        duties: Arc<TestDuties>,
        sync: Arc<MockSync>,
        shutdown_rx: futures::channel::mpsc::Receiver<ShutdownReason>,
    }

    fn get_scheduler(genesis_offset_secs: u64) -> Tester {
        let log = get_logger();
        let clock = ManualSlotClock::new(
            Slot::new(0),
            Duration::from_secs(genesis_offset_secs),
            SLOT_DURATION,
        );
        let gossip = Arc::new(MockGossip::default());
        let processor = Arc::new(NullProcessor::default());
        let duties = Arc::new(TestDuties::default());
        let sync = Arc::new(MockSync::default());
        let globals = Arc::new(NetworkGlobals::new("enr:-test".to_string()));
        let spec = types::ChainSpec::mainnet();
        let digest = [0, 0, 0, 0];

        let subnets = SubnetService::<T>::new(
            gossip.clone(),
            duties.clone(),
            globals.clone(),
            digest,
            spec,
            &log,
        );
        let gate = GossipGate::<T>::new(gossip, globals, digest, &log);
        let (shutdown_tx, shutdown_rx) = channel(1);

        let scheduler = SlotScheduler::new(
            clock.clone(),
            processor.clone(),
            duties.clone(),
            sync.clone(),
            gate,
            subnets,
            None,
            shutdown_tx,
            &log,
        );

        Tester {
            scheduler,
            clock,
            processor,
            duties,
            sync,
            shutdown_rx,
        }
    }

    #[tokio::test]
    async fn normal_tick_processes_the_slot() {
        let mut tester = get_scheduler(0);
        // Sync debt keeps the gate closed so the gossip side stays inert.
        tester.sync.set_queue_len(1_000);

        tester.clock.set_slot(1);
        let scheduled = tester.scheduler.next_slot();
        tester.scheduler.on_slot_start(scheduled).await;

        assert_eq!(tester.processor.head_updates(), vec![Slot::new(1)]);
        assert_eq!(
            tester.duties.duty_calls(),
            vec![(Slot::new(0), Slot::new(1))]
        );
        assert_eq!(tester.scheduler.last_slot(), Slot::new(1));
        assert_eq!(tester.scheduler.next_slot(), Slot::new(2));
    }

    #[tokio::test]
    async fn clock_regression_reschedules_without_rework() {
        let mut tester = get_scheduler(0);
        tester.sync.set_queue_len(1_000);

        // Process up to slot 100.
        tester.clock.set_slot(100);
        tester.scheduler.last_slot = Slot::new(100);
        tester.scheduler.next_slot = Slot::new(101);

        // The clock steps back a whole slot before the next tick fires.
        tester.clock.set_slot(99);
        tester.scheduler.on_slot_start(Slot::new(101)).await;

        assert!(tester.processor.head_updates().is_empty());
        assert!(tester.duties.duty_calls().is_empty());
        // Re-armed for the slot after the last processed one.
        assert_eq!(tester.scheduler.next_slot(), Slot::new(101));
        assert_eq!(tester.scheduler.last_slot(), Slot::new(100));
    }

    #[tokio::test]
    async fn small_regression_runs_no_duties_twice() {
        let mut tester = get_scheduler(100);
        tester.sync.set_queue_len(1_000);

        tester.clock.set_slot(100);
        tester.scheduler.last_slot = Slot::new(100);
        tester.scheduler.next_slot = Slot::new(101);

        // A 3 s step-back leaves the wall clock inside slot 100.
        tester.clock.rewind(Duration::from_secs(3));
        tester.scheduler.on_slot_start(Slot::new(101)).await;

        // The duty interval (last, wall] is empty, so nothing runs twice.
        for (last, wall) in tester.duties.duty_calls() {
            assert!(last >= wall, "no duty interval may reopen slot 100");
        }
        assert_eq!(tester.scheduler.next_slot(), Slot::new(101));
    }

    #[tokio::test]
    async fn pre_genesis_clock_reschedules() {
        let mut tester = get_scheduler(1_000_000);

        // Wall time well before genesis.
        tester.clock.set_current_time(Duration::from_secs(10));
        tester.scheduler.on_slot_start(Slot::new(1)).await;

        assert!(tester.processor.head_updates().is_empty());
        assert_eq!(tester.scheduler.next_slot(), Slot::new(1));
    }

    #[tokio::test]
    async fn fall_behind_skips_to_the_present() {
        let mut tester = get_scheduler(0);
        tester.sync.set_queue_len(1_000);

        tester.scheduler.last_slot = Slot::new(50);
        tester.scheduler.next_slot = Slot::new(51);

        // The clock jumps forward by 200 slots.
        tester.clock.set_slot(250);
        tester.scheduler.on_slot_start(Slot::new(51)).await;

        // The slot body was skipped entirely and the timer re-armed for the
        // slot after the present one.
        assert!(tester.processor.head_updates().is_empty());
        assert!(tester.duties.duty_calls().is_empty());
        assert_eq!(tester.scheduler.last_slot(), Slot::new(250));
        assert_eq!(tester.scheduler.next_slot(), Slot::new(251));
    }

    #[tokio::test]
    async fn exactly_one_epoch_behind_still_processes() {
        let mut tester = get_scheduler(0);
        tester.sync.set_queue_len(1_000);

        tester.scheduler.last_slot = Slot::new(10);
        tester.scheduler.next_slot = Slot::new(11);

        // Exactly `last + slots_per_epoch`: the boundary is exclusive.
        tester.clock.set_slot(42);
        tester.scheduler.on_slot_start(Slot::new(11)).await;

        assert_eq!(tester.processor.head_updates(), vec![Slot::new(42)]);
        assert_eq!(tester.scheduler.next_slot(), Slot::new(43));
    }

    #[tokio::test]
    async fn epoch_boundary_cycles_subnets_only_while_enabled() {
        let mut tester = get_scheduler(0);
        tester
            .duties
            .set_subnets(Some([7].into_iter().map(SubnetId::new).collect::<BTreeSet<_>>()));

        // Gate disabled (deep sync debt): the boundary slot must not cycle.
        tester.sync.set_queue_len(100_000);
        tester.clock.set_slot(32);
        tester.scheduler.last_slot = Slot::new(31);
        tester.scheduler.next_slot = Slot::new(32);
        tester.scheduler.on_slot_start(Slot::new(32)).await;
        assert!(!tester.scheduler.gate().is_enabled());
        assert_eq!(tester.scheduler.subnets().subscription_count(), 0);

        // Queue drains: the gate opens mid-epoch (full fan-out), and the
        // next boundary rotates down to the duty-derived set.
        tester.sync.set_queue_len(10);
        tester.clock.set_slot(40);
        tester.scheduler.on_slot_start(Slot::new(33)).await;
        assert!(tester.scheduler.gate().is_enabled());
        assert_eq!(tester.scheduler.subnets().subscription_count(), 64);

        tester.clock.set_slot(64);
        tester.scheduler.on_slot_start(Slot::new(41)).await;
        tester.clock.set_slot(96);
        tester.scheduler.on_slot_start(Slot::new(65)).await;

        // Both buckets now hold only subnet 7 (plus the stability subnet).
        assert!(tester.scheduler.subnets().subscription_count() <= 2);
        assert!(tester.scheduler.subnets().metadata_consistent());
    }

    #[tokio::test]
    async fn stop_at_epoch_requests_shutdown() {
        let mut tester = get_scheduler(0);
        tester.sync.set_queue_len(1_000);
        tester.scheduler.stop_at_epoch = Some(Epoch::new(1));

        tester.clock.set_slot(31);
        tester.scheduler.on_slot_start(Slot::new(1)).await;
        assert!(tester.shutdown_rx.try_next().is_err());

        tester.clock.set_slot(32);
        tester.scheduler.on_slot_start(Slot::new(32)).await;
        match tester.shutdown_rx.try_next() {
            Ok(Some(ShutdownReason::Success(_))) => {}
            other => panic!("expected a success shutdown request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn scheduled_wake_times_are_monotone() {
        let mut tester = get_scheduler(0);
        tester.sync.set_queue_len(1_000);

        let mut previous_next = tester.scheduler.next_slot();
        for slot in [1u64, 2, 3] {
            tester.clock.set_slot(slot);
            let scheduled = tester.scheduler.next_slot();
            tester.scheduler.on_slot_start(scheduled).await;
            assert!(tester.scheduler.next_slot() >= previous_next);
            previous_next = tester.scheduler.next_slot();
        }

        // Even a regression never re-arms earlier than the previous wake.
        tester.clock.set_slot(1);
        let scheduled = tester.scheduler.next_slot();
        tester.scheduler.on_slot_start(scheduled).await;
        assert!(tester.scheduler.next_slot() >= previous_next);
    }
}
