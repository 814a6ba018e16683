//! Keeps track of which attestation subnets the node should be subscribed to
//! at any given time, rotating subscriptions as validator assignments change
//! each epoch and keeping the advertised metadata record consistent with the
//! live subscription set.

use crate::globals::NetworkGlobals;
use crate::metrics;
use crate::service::GossipNetwork;
use crate::types::{GossipKind, GossipTopic};
use crate::NodeTypes;
use crate::ValidatorDuties;
use beacon_metrics::{set_gauge, set_gauge_by_u64};
use futures::future::join_all;
use rand::Rng;
use slog::{debug, o, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use types::{ChainSpec, Epoch, EthSpec, ForkDigest, Slot, SubnetId};

/// Rotating subnet subscriptions, bucketed by epoch parity.
///
/// The bucket for the current epoch's parity holds this epoch's
/// assignments; the other bucket still holds the previous epoch's, so an
/// assignment remains live across the boundary at which it is attested.
pub struct SubnetService<T: NodeTypes> {
    /// Handle to the gossip substrate.
    gossip: Arc<T::Gossip>,

    /// Source of per-epoch subnet assignments for attached validators.
    duties: Arc<T::Duties>,

    /// Shared view of the advertised metadata and subscription set.
    globals: Arc<NetworkGlobals<T::EthSpec>>,

    /// The two epoch-parity buckets of subscribed subnet ids.
    subscribed_subnets: [BTreeSet<SubnetId>; 2],

    /// The long-lived subnet this node stays on for privacy, once drawn.
    stability_subnet: Option<SubnetId>,

    /// The epoch at which the stability subnet is reshuffled.
    stability_subnet_expiration: Epoch,

    fork_digest: ForkDigest,

    spec: ChainSpec,

    log: slog::Logger,
}

impl<T: NodeTypes> SubnetService<T> {
    /* Public functions */

    pub fn new(
        gossip: Arc<T::Gossip>,
        duties: Arc<T::Duties>,
        globals: Arc<NetworkGlobals<T::EthSpec>>,
        fork_digest: ForkDigest,
        spec: ChainSpec,
        log: &slog::Logger,
    ) -> Self {
        Self {
            gossip,
            duties,
            globals,
            subscribed_subnets: [BTreeSet::new(), BTreeSet::new()],
            stability_subnet: None,
            stability_subnet_expiration: Epoch::new(0),
            fork_digest,
            spec,
            log: log.new(o!("service" => "subnet_service")),
        }
    }

    /// Startup subscription: join every attestation subnet plus the
    /// aggregate topic, so the node is useful to the network before any
    /// validator assignments are known.
    pub async fn initial_subscribe(&mut self, current_epoch: Epoch) {
        let aggregate_topic =
            GossipTopic::new(GossipKind::BeaconAggregateAndProof, self.fork_digest);
        if !self.globals.is_subscribed(&aggregate_topic) {
            if let Err(e) = self.gossip.subscribe(aggregate_topic).await {
                warn!(self.log, "Failed to subscribe to topic"; "topic" => %aggregate_topic, "error" => e);
            } else {
                self.globals
                    .gossipsub_subscriptions
                    .write()
                    .insert(aggregate_topic);
            }
        }

        self.subscribe_all(current_epoch).await;
    }

    /// Subscribe to the full attestation subnet fan-out, filling both
    /// rotation buckets and advertising every subnet.
    pub async fn subscribe_all(&mut self, current_epoch: Epoch) {
        self.ensure_stability_subnet(current_epoch);

        let all_subnets: BTreeSet<SubnetId> = (0..self.spec.attestation_subnet_count)
            .map(SubnetId::new)
            .collect();

        self.install_handlers(&all_subnets).await;
        self.subscribed_subnets = [all_subnets.clone(), all_subnets];

        self.advertise(|meta| {
            let mut changed = false;
            for i in 0..self.spec.attestation_subnet_count {
                changed |= meta.set_attnet(SubnetId::new(i), true);
            }
            changed
        });

        debug_assert!(self.metadata_consistent());
        self.update_metrics();
    }

    /// Drop the subnet fan-out: unsubscribe every rotation-bucket subnet and
    /// clear both buckets. The stability subnet stays subscribed and
    /// advertised.
    pub async fn unsubscribe_all(&mut self) {
        let to_drop: BTreeSet<SubnetId> = self
            .subnet_union()
            .into_iter()
            .filter(|subnet_id| Some(*subnet_id) != self.stability_subnet)
            .collect();

        self.unsubscribe_subnets(&to_drop).await;
        self.subscribed_subnets = [BTreeSet::new(), BTreeSet::new()];

        self.advertise(|meta| {
            let mut changed = false;
            for subnet_id in &to_drop {
                changed |= meta.set_attnet(*subnet_id, false);
            }
            changed
        });

        debug_assert!(self.metadata_consistent());
        self.update_metrics();
    }

    /// Epoch rotation, called at the first slot of each epoch while gossip
    /// is enabled.
    ///
    /// If no validators are attached this is a no-op and the node retains
    /// whatever fan-out it already has.
    pub async fn cycle(&mut self, slot: Slot) {
        let epoch = slot.epoch(T::EthSpec::slots_per_epoch());

        let target = match self.duties.subnets_for_epoch(epoch) {
            Some(target) => target,
            None => return,
        };

        let prior_union = self.subnet_union();

        if self.stability_subnet.is_none() || epoch >= self.stability_subnet_expiration {
            self.draw_stability_subnet(epoch);
        }

        let bucket = (epoch.as_u64() % 2) as usize;
        self.subscribed_subnets[bucket] = target;

        let new_union = self.subnet_union();
        let expiring: BTreeSet<SubnetId> =
            prior_union.difference(&new_union).copied().collect();
        let newly_joined: BTreeSet<SubnetId> =
            new_union.difference(&prior_union).copied().collect();

        debug!(
            self.log, "Rotating attestation subnets";
            "epoch" => %epoch,
            "expiring" => expiring.len(),
            "joining" => newly_joined.len(),
        );

        // Unsubscribes complete before the advertised record changes, so the
        // window in which peers see us subscribed to a topic we have left is
        // as small as the substrate allows.
        self.unsubscribe_subnets(&expiring).await;

        self.advertise(|meta| {
            let mut changed = false;
            for subnet_id in &expiring {
                changed |= meta.set_attnet(*subnet_id, false);
            }
            changed
        });

        self.install_handlers(&newly_joined).await;

        self.advertise(|meta| {
            let mut changed = false;
            for subnet_id in &newly_joined {
                changed |= meta.set_attnet(*subnet_id, true);
            }
            changed
        });

        debug_assert!(self.metadata_consistent());
        self.update_metrics();
    }

    /// Idempotent subscribe for a set of subnets: topics that already have a
    /// live subscription are left untouched.
    pub async fn install_handlers(&mut self, subnets: &BTreeSet<SubnetId>) {
        let to_subscribe: Vec<GossipTopic> = subnets
            .iter()
            .map(|subnet_id| self.attestation_topic(*subnet_id))
            .filter(|topic| !self.globals.is_subscribed(topic))
            .collect();

        let results = join_all(
            to_subscribe
                .iter()
                .map(|topic| self.gossip.subscribe(*topic)),
        )
        .await;

        let mut subscriptions = self.globals.gossipsub_subscriptions.write();
        for (topic, result) in to_subscribe.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    subscriptions.insert(topic);
                }
                Err(e) => {
                    warn!(self.log, "Failed to subscribe to topic"; "topic" => %topic, "error" => e);
                }
            }
        }
    }

    /// The set of subnets the node considers itself on: both rotation
    /// buckets plus the stability subnet.
    pub fn subnet_union(&self) -> BTreeSet<SubnetId> {
        let mut union: BTreeSet<SubnetId> = self.subscribed_subnets[0]
            .union(&self.subscribed_subnets[1])
            .copied()
            .collect();
        if let Some(stability) = self.stability_subnet {
            union.insert(stability);
        }
        union
    }

    pub fn subscription_count(&self) -> usize {
        self.subnet_union().len()
    }

    pub fn stability_subnet(&self) -> Option<SubnetId> {
        self.stability_subnet
    }

    pub fn stability_subnet_expiration(&self) -> Epoch {
        self.stability_subnet_expiration
    }

    /// Both rotation buckets, for inspection.
    pub fn rotation_buckets(&self) -> &[BTreeSet<SubnetId>; 2] {
        &self.subscribed_subnets
    }

    /// Checks that the advertised bitfield matches the union of the
    /// rotation buckets and the stability subnet.
    pub fn metadata_consistent(&self) -> bool {
        let union = self.subnet_union();
        let meta = self.globals.local_metadata.read();
        (0..self.spec.attestation_subnet_count).all(|i| {
            let subnet_id = SubnetId::new(i);
            meta.attnet(subnet_id) == union.contains(&subnet_id)
        })
    }

    /* Internal private functions */

    fn attestation_topic(&self, subnet_id: SubnetId) -> GossipTopic {
        GossipTopic::new(GossipKind::Attestation(subnet_id), self.fork_digest)
    }

    async fn unsubscribe_subnets(&mut self, subnets: &BTreeSet<SubnetId>) {
        let topics: Vec<GossipTopic> = subnets
            .iter()
            .map(|subnet_id| self.attestation_topic(*subnet_id))
            .collect();

        let results =
            join_all(topics.iter().map(|topic| self.gossip.unsubscribe(*topic))).await;

        let mut subscriptions = self.globals.gossipsub_subscriptions.write();
        for (topic, result) in topics.into_iter().zip(results) {
            // A failed unsubscribe is treated as left: the substrate will
            // drop the mesh on its own and the next cycle reconciles.
            subscriptions.remove(&topic);
            if let Err(e) = result {
                warn!(self.log, "Failed to unsubscribe from topic"; "topic" => %topic, "error" => e);
            }
        }
    }

    /// Applies `update` to the metadata record and, if it reports a change,
    /// bumps the sequence number. Any change is pushed into the ENR.
    fn advertise<F: FnOnce(&mut crate::types::MetaData<T::EthSpec>) -> bool>(&self, update: F) {
        let attnets = {
            let mut meta = self.globals.local_metadata.write();
            let seq_before = meta.seq_number;
            if update(&mut meta) {
                meta.seq_number += 1;
            }
            if meta.seq_number == seq_before {
                return;
            }
            set_gauge_by_u64(&metrics::METADATA_SEQ_NUMBER, meta.seq_number);
            meta.attnets.clone()
        };

        if let Err(e) = self.gossip.update_enr_attnets(&attnets) {
            warn!(self.log, "Failed to update ENR bitfield"; "error" => e);
        }
    }

    fn ensure_stability_subnet(&mut self, current_epoch: Epoch) {
        if self.stability_subnet.is_none() || current_epoch >= self.stability_subnet_expiration {
            self.draw_stability_subnet(current_epoch);
        }
    }

    /// Picks a uniformly-random stability subnet and schedules its renewal.
    fn draw_stability_subnet(&mut self, current_epoch: Epoch) {
        let mut rng = rand::thread_rng();
        let subnet_id = SubnetId::new(rng.gen_range(0..self.spec.attestation_subnet_count));
        let length = self.spec.epochs_per_random_subnet_subscription
            + rng.gen_range(0..self.spec.epochs_per_random_subnet_subscription);

        debug!(
            self.log, "Stability subnet chosen";
            "subnet_id" => %subnet_id,
            "expiration_epoch" => %(current_epoch + length),
        );

        self.stability_subnet = Some(subnet_id);
        self.stability_subnet_expiration = current_epoch + length;
    }

    fn update_metrics(&self) {
        set_gauge(
            &metrics::SUBNET_SUBSCRIPTIONS,
            self.subscription_count() as i64,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GossipCall, MockGossip, MockSync, NullFetcher, NullProcessor, TestDuties};
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

    struct Tester {
        service: SubnetService<T>,
        gossip: Arc<MockGossip<MainnetEthSpec>>,
        duties: Arc<TestDuties>,
        globals: Arc<NetworkGlobals<MainnetEthSpec>>,
    }

    fn get_subnet_service() -> Tester {
        let gossip = Arc::new(MockGossip::default());
        let duties = Arc::new(TestDuties::default());
        let globals = Arc::new(NetworkGlobals::new("enr:-test".to_string()));
        let service = SubnetService::<T>::new(
            gossip.clone(),
            duties.clone(),
            globals.clone(),
            DIGEST,
            ChainSpec::mainnet(),
            &get_logger(),
        );
        Tester {
            service,
            gossip,
            duties,
            globals,
        }
    }

    /// Fixes the stability subnet (with its advertised bit) so random
    /// renewal does not interfere with rotation assertions.
    fn pin_stability(tester: &mut Tester, subnet: u64) {
        tester.service.stability_subnet = Some(SubnetId::new(subnet));
        tester.service.stability_subnet_expiration = Epoch::new(10_000);
        tester
            .globals
            .local_metadata
            .write()
            .set_attnet(SubnetId::new(subnet), true);
    }

    #[tokio::test]
    async fn initial_subscribe_joins_every_subnet() {
        let mut tester = get_subnet_service();

        tester.service.initial_subscribe(Epoch::new(0)).await;

        // 64 subnets plus the aggregate topic.
        assert_eq!(tester.globals.subscription_count(), 65);
        assert_eq!(tester.service.subscription_count(), 64);
        assert!(tester.service.stability_subnet().is_some());
        assert!(tester.service.stability_subnet_expiration() >= Epoch::new(256));

        // All bits advertised with exactly one sequence bump.
        let meta = tester.globals.local_metadata.read();
        assert_eq!(meta.attnets_count(), 64);
        assert_eq!(meta.seq_number, 1);
        drop(meta);

        assert!(tester.service.metadata_consistent());
    }

    #[tokio::test]
    async fn cycle_without_validators_is_a_noop() {
        let mut tester = get_subnet_service();
        tester.service.initial_subscribe(Epoch::new(0)).await;
        let seq_before = tester.globals.seq_number();
        let calls_before = tester.gossip.calls().len();

        // No validators attached: `subnets_for_epoch` returns `None`.
        tester.duties.set_subnets(None);
        tester.service.cycle(Slot::new(32)).await;

        assert_eq!(tester.globals.seq_number(), seq_before);
        assert_eq!(tester.gossip.calls().len(), calls_before);
        assert_eq!(tester.service.subscription_count(), 64);
    }

    #[tokio::test]
    async fn cycle_rotates_expiring_before_joining() {
        let mut tester = get_subnet_service();

        // Start from a known, small subscription state: the epoch-parity
        // bucket for epoch 2 holds subnet 3, and the stability subnet is
        // pinned far away so it does not reshuffle mid-test.
        tester.service.subscribed_subnets[0] =
            [3].into_iter().map(SubnetId::new).collect();
        tester
            .globals
            .local_metadata
            .write()
            .set_attnet(SubnetId::new(3), true);
        pin_stability(&mut tester, 40);

        // Epoch 2 rotation: subnet 3 expires, 17 joins.
        tester.duties.set_subnets(Some([17].into_iter().map(SubnetId::new).collect()));
        tester.service.cycle(Slot::new(64)).await;

        let calls = tester.gossip.calls();
        let unsubscribe_pos = calls
            .iter()
            .position(|call| {
                matches!(call, GossipCall::Unsubscribe(topic) if topic.subnet_id() == Some(SubnetId::new(3)))
            })
            .expect("should unsubscribe from subnet 3");
        let subscribe_pos = calls
            .iter()
            .position(|call| {
                matches!(call, GossipCall::Subscribe(topic) if topic.subnet_id() == Some(SubnetId::new(17)))
            })
            .expect("should subscribe to subnet 17");
        assert!(unsubscribe_pos < subscribe_pos);

        let meta = tester.globals.local_metadata.read();
        assert!(!meta.attnet(SubnetId::new(3)));
        assert!(meta.attnet(SubnetId::new(17)));
        assert!(meta.seq_number >= 1);
        drop(meta);

        assert!(tester.service.metadata_consistent());
    }

    #[tokio::test]
    async fn seq_number_strictly_increases_across_changes() {
        let mut tester = get_subnet_service();
        pin_stability(&mut tester, 60);

        let mut last_seq = tester.globals.seq_number();
        for (epoch, subnet) in [(0u64, 1u64), (1, 2), (2, 3), (3, 4)] {
            tester
                .duties
                .set_subnets(Some([subnet].into_iter().map(SubnetId::new).collect()));
            tester
                .service
                .cycle(Epoch::new(epoch).start_slot(MainnetEthSpec::slots_per_epoch()))
                .await;

            let seq = tester.globals.seq_number();
            assert!(seq > last_seq, "advertised change must bump seq number");
            last_seq = seq;
        }
    }

    #[tokio::test]
    async fn install_handlers_is_idempotent() {
        let mut tester = get_subnet_service();
        let subnets: BTreeSet<SubnetId> = [5, 9].into_iter().map(SubnetId::new).collect();

        tester.service.install_handlers(&subnets).await;
        let calls_after_first = tester.gossip.calls().len();
        assert_eq!(calls_after_first, 2);

        tester.service.install_handlers(&subnets).await;
        assert_eq!(tester.gossip.calls().len(), calls_after_first);
        assert_eq!(tester.globals.subscription_count(), 2);
    }

    #[tokio::test]
    async fn failed_subscribe_is_reconciled_on_next_cycle() {
        let mut tester = get_subnet_service();
        pin_stability(&mut tester, 60);

        tester.gossip.fail_subscribes(true);
        tester.duties.set_subnets(Some([7].into_iter().map(SubnetId::new).collect()));
        tester.service.cycle(Slot::new(0)).await;

        // The failed topic never made it into the subscription set.
        assert!(!tester
            .globals
            .is_subscribed(&GossipTopic::new(GossipKind::Attestation(SubnetId::new(7)), DIGEST)));

        // Substrate recovers; the next cycle with the same duty re-issues the
        // subscribe because the topic is still missing.
        tester.gossip.fail_subscribes(false);
        tester.gossip.clear_calls();
        tester.service.cycle(Slot::new(32)).await;
        let missing: BTreeSet<SubnetId> = [7].into_iter().map(SubnetId::new).collect();
        tester.service.install_handlers(&missing).await;
        assert!(tester
            .globals
            .is_subscribed(&GossipTopic::new(GossipKind::Attestation(SubnetId::new(7)), DIGEST)));
    }
}
