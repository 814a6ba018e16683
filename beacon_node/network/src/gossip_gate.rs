//! Enables and disables the full set of gossip topic subscriptions based on
//! how far behind the chain head the sync queue says we are.
//!
//! While deeply out of sync there is no point validating gossip: everything
//! fails the finalized-ancestor checks and wastes peer goodwill. The gate
//! closes the subscriptions and re-opens them, with hysteresis, once the
//! sync queue drains.

use crate::globals::NetworkGlobals;
use crate::metrics;
use crate::service::GossipNetwork;
use crate::subnet_service::SubnetService;
use crate::types::{GossipKind, GossipTopic};
use crate::NodeTypes;
use beacon_metrics::{set_gauge, set_gauge_by_u64};
use futures::future::join_all;
use slog::{info, o, warn};
use std::sync::Arc;
use types::{EthSpec, ForkDigest, Slot};

/// The sync-queue depth, in slots, below which gossip is worth processing.
pub const TOPIC_SUBSCRIBE_THRESHOLD_SLOTS: u64 = 64;

/// Extra queue depth required before an enabled gate closes again, so a
/// queue oscillating around the threshold does not thrash subscriptions.
pub const HYSTERESIS_BUFFER: u64 = 16;

/// The outcome of evaluating the gate at the end of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Enable,
    Disable,
    Keep,
}

/// Decide whether topic subscriptions should change, from the sync-queue
/// depth and the current wall slot.
///
/// The `2 * current_slot` upper bound filters the pathological queue lengths
/// the sync manager reports when its debt exceeds forward progress. The mask
/// is a magnitude heuristic: at very low wall slots (below roughly 32) a
/// genuine deep queue can fail the bound and hold the gate open. An explicit
/// underflow flag from the sync manager would remove the ambiguity; until
/// then the bound is kept as-is.
pub fn evaluate_gate(enabled: bool, sync_queue_len: u64, current_slot: Slot) -> GateDecision {
    if !enabled {
        if sync_queue_len < TOPIC_SUBSCRIBE_THRESHOLD_SLOTS {
            GateDecision::Enable
        } else {
            GateDecision::Keep
        }
    } else if sync_queue_len > TOPIC_SUBSCRIBE_THRESHOLD_SLOTS + HYSTERESIS_BUFFER
        && sync_queue_len < current_slot.as_u64().saturating_mul(2)
    {
        GateDecision::Disable
    } else {
        GateDecision::Keep
    }
}

pub struct GossipGate<T: NodeTypes> {
    gossip: Arc<T::Gossip>,
    globals: Arc<NetworkGlobals<T::EthSpec>>,
    fork_digest: ForkDigest,
    enabled: bool,
    log: slog::Logger,
}

impl<T: NodeTypes> GossipGate<T> {
    pub fn new(
        gossip: Arc<T::Gossip>,
        globals: Arc<NetworkGlobals<T::EthSpec>>,
        fork_digest: ForkDigest,
        log: &slog::Logger,
    ) -> Self {
        Self {
            gossip,
            globals,
            fork_digest,
            enabled: false,
            log: log.new(o!("service" => "gossip_gate")),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Evaluate the transition table and apply any resulting subscription
    /// change. Called by the slot scheduler at the end of each slot.
    pub async fn on_slot_end(
        &mut self,
        wall_slot: Slot,
        sync_queue_len: u64,
        subnets: &mut SubnetService<T>,
    ) {
        set_gauge_by_u64(&metrics::SYNC_QUEUE_LENGTH, sync_queue_len);

        match evaluate_gate(self.enabled, sync_queue_len, wall_slot) {
            GateDecision::Enable => {
                info!(
                    self.log, "Enabling topic subscriptions";
                    "slot" => %wall_slot,
                    "sync_queue_len" => sync_queue_len,
                );
                self.add_message_handlers(wall_slot, subnets).await;
                self.enabled = true;
                set_gauge(&metrics::GOSSIP_ENABLED, 1);
            }
            GateDecision::Disable => {
                info!(
                    self.log, "Disabling topic subscriptions";
                    "slot" => %wall_slot,
                    "sync_queue_len" => sync_queue_len,
                );
                self.remove_message_handlers(subnets).await;
                self.enabled = false;
                set_gauge(&metrics::GOSSIP_ENABLED, 0);
            }
            GateDecision::Keep => {}
        }
    }

    /// The topics owned by the gate itself. The aggregate topic and the
    /// attestation subnets are owned by the subnet service, which the gate
    /// drives through `initial_subscribe`/`unsubscribe_all`.
    fn core_topics(&self) -> Vec<GossipTopic> {
        [
            GossipKind::BeaconBlock,
            GossipKind::VoluntaryExit,
            GossipKind::ProposerSlashing,
            GossipKind::AttesterSlashing,
        ]
        .into_iter()
        .map(|kind| GossipTopic::new(kind, self.fork_digest))
        .collect()
    }

    /// Subscribe the core topics and the subnet service's initial
    /// attestation fan-out, in parallel, awaiting all.
    async fn add_message_handlers(&self, wall_slot: Slot, subnets: &mut SubnetService<T>) {
        let epoch = wall_slot.epoch(T::EthSpec::slots_per_epoch());

        let core = async {
            let topics: Vec<GossipTopic> = self
                .core_topics()
                .into_iter()
                .filter(|topic| !self.globals.is_subscribed(topic))
                .collect();
            let results =
                join_all(topics.iter().map(|topic| self.gossip.subscribe(*topic))).await;
            let mut subscriptions = self.globals.gossipsub_subscriptions.write();
            for (topic, result) in topics.into_iter().zip(results) {
                match result {
                    Ok(()) => {
                        subscriptions.insert(topic);
                    }
                    Err(e) => {
                        warn!(self.log, "Failed to subscribe to topic"; "topic" => %topic, "error" => e);
                    }
                }
            }
        };

        futures::join!(core, subnets.initial_subscribe(epoch));
    }

    /// The inverse of `add_message_handlers`; additionally clears both
    /// subnet rotation buckets.
    async fn remove_message_handlers(&self, subnets: &mut SubnetService<T>) {
        let core = async {
            let mut topics = self.core_topics();
            topics.push(GossipTopic::new(
                GossipKind::BeaconAggregateAndProof,
                self.fork_digest,
            ));
            let results = join_all(
                topics
                    .iter()
                    .map(|topic| self.gossip.unsubscribe(*topic)),
            )
            .await;
            let mut subscriptions = self.globals.gossipsub_subscriptions.write();
            for (topic, result) in topics.into_iter().zip(results) {
                subscriptions.remove(&topic);
                if let Err(e) = result {
                    warn!(self.log, "Failed to unsubscribe from topic"; "topic" => %topic, "error" => e);
                }
            }
        };

        futures::join!(core, subnets.unsubscribe_all());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGossip, MockSync, NullFetcher, NullProcessor, TestDuties};
    use crate::Witness;
    use slog::Logger;
    use sloggers::{null::NullLoggerBuilder, Build};
    use slot_clock::ManualSlotClock;
    use types::MainnetEthSpec;

    type T = Witness<
        ManualSlotClock,
        MockGossip<MainnetEthSpec>,
        NullProcessor,
        TestDuties,
        MockSync,
        NullFetcher,
        MainnetEthSpec,
    >;

    const DIGEST: ForkDigest = [0, 0, 0, 0];

    fn get_logger() -> Logger {
        NullLoggerBuilder.build().expect("logger should build")
    }

    fn get_gate() -> (
        GossipGate<T>,
        SubnetService<T>,
        Arc<NetworkGlobals<MainnetEthSpec>>,
    ) {
        let log = get_logger();
        let gossip = Arc::new(MockGossip::default());
        let duties = Arc::new(TestDuties::default());
        let globals = Arc::new(NetworkGlobals::new("enr:-test".to_string()));
        let subnets = SubnetService::<T>::new(
            gossip.clone(),
            duties,
            globals.clone(),
            DIGEST,
            types::ChainSpec::mainnet(),
            &log,
        );
        let gate = GossipGate::<T>::new(gossip, globals.clone(), DIGEST, &log);
        (gate, subnets, globals)
    }

    #[test]
    fn transition_table() {
        use GateDecision::*;

        // Disabled, queue below threshold: enable.
        assert_eq!(evaluate_gate(false, 0, Slot::new(1_000)), Enable);
        assert_eq!(evaluate_gate(false, 63, Slot::new(1_000)), Enable);
        // Disabled, queue at or above threshold: keep.
        assert_eq!(evaluate_gate(false, 64, Slot::new(1_000)), Keep);
        assert_eq!(evaluate_gate(false, 10_000, Slot::new(12_000)), Keep);

        // Enabled, queue within hysteresis: keep.
        assert_eq!(evaluate_gate(true, 64, Slot::new(1_000)), Keep);
        // The comparison is a strict greater-than: exactly threshold +
        // hysteresis (80) must keep the gate open.
        assert_eq!(evaluate_gate(true, 80, Slot::new(1_000)), Keep);
        assert_eq!(evaluate_gate(true, 81, Slot::new(1_000)), Disable);
    }

    #[test]
    fn underflow_guard_filters_huge_queue_lengths() {
        // A queue length beyond twice the wall slot is treated as metric
        // noise rather than a reason to disable.
        assert_eq!(
            evaluate_gate(true, u64::MAX, Slot::new(1_000)),
            GateDecision::Keep
        );
        assert_eq!(
            evaluate_gate(true, 2_000, Slot::new(1_000)),
            GateDecision::Keep
        );
        assert_eq!(
            evaluate_gate(true, 1_999, Slot::new(1_000)),
            GateDecision::Disable
        );
    }

    #[tokio::test]
    async fn catch_up_scenario() {
        let (mut gate, mut subnets, globals) = get_gate();

        // Deep in sync debt: the gate stays closed slot after slot.
        assert_eq!(
            evaluate_gate(false, 10_000, Slot::new(12_000)),
            GateDecision::Keep
        );
        gate.on_slot_end(Slot::new(12_000), 10_000, &mut subnets).await;
        assert!(!gate.is_enabled());
        assert_eq!(globals.subscription_count(), 0);

        // Queue drains: gate enables, attnets goes fully-set and the
        // sequence number increments exactly once.
        gate.on_slot_end(Slot::new(12_100), 50, &mut subnets).await;
        assert!(gate.is_enabled());
        let meta = globals.local_metadata.read();
        assert_eq!(meta.attnets_count(), 64);
        assert_eq!(meta.seq_number, 1);
        drop(meta);

        // 64 subnets + 5 core topics.
        assert_eq!(globals.subscription_count(), 69);
    }

    #[tokio::test]
    async fn disabled_gate_clears_rotation_buckets() {
        let (mut gate, mut subnets, globals) = get_gate();

        gate.on_slot_end(Slot::new(100), 0, &mut subnets).await;
        assert!(gate.is_enabled());
        assert_eq!(subnets.subscription_count(), 64);

        // Fall far behind: queue grows past threshold + hysteresis.
        gate.on_slot_end(Slot::new(200), 150, &mut subnets).await;
        assert!(!gate.is_enabled());
        assert!(subnets.rotation_buckets()[0].is_empty());
        assert!(subnets.rotation_buckets()[1].is_empty());

        // Only the stability subnet remains subscribed and advertised.
        assert_eq!(subnets.subscription_count(), 1);
        assert_eq!(
            globals.local_metadata.read().attnets_count(),
            1
        );
        assert!(subnets.metadata_consistent());
    }

    #[tokio::test]
    async fn enable_disable_enable_restores_advertised_topics() {
        let (mut gate, mut subnets, globals) = get_gate();

        gate.on_slot_end(Slot::new(100), 0, &mut subnets).await;
        let subscribed_once: std::collections::BTreeSet<String> = globals
            .gossipsub_subscriptions
            .read()
            .iter()
            .map(|topic| topic.to_string())
            .collect();

        gate.on_slot_end(Slot::new(200), 150, &mut subnets).await;
        gate.on_slot_end(Slot::new(300), 0, &mut subnets).await;

        let subscribed_again: std::collections::BTreeSet<String> = globals
            .gossipsub_subscriptions
            .read()
            .iter()
            .map(|topic| topic.to_string())
            .collect();

        assert_eq!(subscribed_once, subscribed_again);
        assert!(subnets.metadata_consistent());
    }
}
