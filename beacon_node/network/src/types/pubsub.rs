//! Gossip payloads as they arrive off the wire.
//!
//! Payloads are opaque to the orchestration layer: decoding and validation
//! belong to the processor, so the variants carry raw SSZ-snappy frames.

use crate::types::topics::GossipKind;
use types::SubnetId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PubsubMessage {
    /// Gossipsub message providing notification of a new block.
    BeaconBlock(Vec<u8>),
    /// Gossipsub message providing notification of an aggregate attestation and associated proof.
    AggregateAndProofAttestation(Vec<u8>),
    /// Gossipsub message providing notification of a raw attestation on a given subnet.
    Attestation(SubnetId, Vec<u8>),
    /// Gossipsub message providing notification of a voluntary exit.
    VoluntaryExit(Vec<u8>),
    /// Gossipsub message providing notification of a proposer slashing.
    ProposerSlashing(Vec<u8>),
    /// Gossipsub message providing notification of an attester slashing.
    AttesterSlashing(Vec<u8>),
}

impl PubsubMessage {
    /// The kind of topic this message arrived on.
    pub fn kind(&self) -> GossipKind {
        match self {
            PubsubMessage::BeaconBlock(_) => GossipKind::BeaconBlock,
            PubsubMessage::AggregateAndProofAttestation(_) => GossipKind::BeaconAggregateAndProof,
            PubsubMessage::Attestation(subnet_id, _) => GossipKind::Attestation(*subnet_id),
            PubsubMessage::VoluntaryExit(_) => GossipKind::VoluntaryExit,
            PubsubMessage::ProposerSlashing(_) => GossipKind::ProposerSlashing,
            PubsubMessage::AttesterSlashing(_) => GossipKind::AttesterSlashing,
        }
    }
}
