//! Routes incoming gossip payloads to the processor's verification queues.
//!
//! The router is installed into the gossip substrate once at startup and
//! persists across gate enable/disable cycles: a disabled topic simply
//! delivers nothing.

use crate::metrics;
use crate::processor::{Processor, ValidationResult};
use crate::service::GossipHandler;
use crate::types::PubsubMessage;
use beacon_metrics::inc_counter;
use slog::{o, trace};
use std::sync::Arc;

pub struct Router<P: Processor> {
    processor: Arc<P>,
    log: slog::Logger,
}

impl<P: Processor> Router<P> {
    pub fn new(processor: Arc<P>, log: &slog::Logger) -> Arc<Self> {
        Arc::new(Self {
            processor,
            log: log.new(o!("service" => "router")),
        })
    }

    fn route(&self, message: PubsubMessage) -> ValidationResult {
        match message {
            PubsubMessage::BeaconBlock(block) => {
                inc_counter(&metrics::GOSSIP_BLOCKS_RX);
                self.processor.on_gossip_block(block)
            }
            PubsubMessage::AggregateAndProofAttestation(aggregate) => {
                inc_counter(&metrics::GOSSIP_AGGREGATED_ATTESTATIONS_RX);
                self.processor.on_gossip_aggregate(aggregate)
            }
            PubsubMessage::Attestation(subnet_id, attestation) => {
                inc_counter(&metrics::GOSSIP_UNAGGREGATED_ATTESTATIONS_RX);
                self.processor.on_gossip_attestation(subnet_id, attestation)
            }
            PubsubMessage::VoluntaryExit(exit) => {
                trace!(self.log, "Received a voluntary exit");
                self.processor.on_gossip_voluntary_exit(exit)
            }
            PubsubMessage::ProposerSlashing(slashing) => {
                trace!(self.log, "Received a proposer slashing");
                self.processor.on_gossip_proposer_slashing(slashing)
            }
            PubsubMessage::AttesterSlashing(slashing) => {
                trace!(self.log, "Received an attester slashing");
                self.processor.on_gossip_attester_slashing(slashing)
            }
        }
    }
}

impl<P: Processor> GossipHandler for Router<P> {
    fn on_pubsub_message(&self, message: PubsubMessage) -> ValidationResult {
        self.route(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NullProcessor;
    use sloggers::{null::NullLoggerBuilder, Build};
    use types::SubnetId;

    fn get_router() -> (Arc<Router<NullProcessor>>, Arc<NullProcessor>) {
        let log = NullLoggerBuilder.build().expect("logger should build");
        let processor = Arc::new(NullProcessor::default());
        (Router::new(processor.clone(), &log), processor)
    }

    #[test]
    fn routes_each_topic_to_its_queue() {
        let (router, processor) = get_router();

        router.on_pubsub_message(PubsubMessage::BeaconBlock(vec![1]));
        router.on_pubsub_message(PubsubMessage::AggregateAndProofAttestation(vec![2]));
        router.on_pubsub_message(PubsubMessage::Attestation(SubnetId::new(9), vec![3]));
        router.on_pubsub_message(PubsubMessage::VoluntaryExit(vec![4]));
        router.on_pubsub_message(PubsubMessage::ProposerSlashing(vec![5]));
        router.on_pubsub_message(PubsubMessage::AttesterSlashing(vec![6]));

        assert_eq!(processor.gossip_blocks(), vec![vec![1]]);
        assert_eq!(processor.gossip_aggregates(), vec![vec![2]]);
        assert_eq!(
            processor.gossip_attestations(),
            vec![(SubnetId::new(9), vec![3])]
        );
        assert_eq!(processor.gossip_exits(), vec![vec![4]]);
        assert_eq!(processor.gossip_proposer_slashings(), vec![vec![5]]);
        assert_eq!(processor.gossip_attester_slashings(), vec![vec![6]]);
    }

    #[test]
    fn verdict_is_returned_synchronously() {
        let (router, processor) = get_router();

        processor.set_verdict(ValidationResult::Ignore);
        assert_eq!(
            router.on_pubsub_message(PubsubMessage::BeaconBlock(vec![])),
            ValidationResult::Ignore
        );

        processor.set_verdict(ValidationResult::Reject);
        assert_eq!(
            router.on_pubsub_message(PubsubMessage::VoluntaryExit(vec![])),
            ValidationResult::Reject
        );
    }
}
