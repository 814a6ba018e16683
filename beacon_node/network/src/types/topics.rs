use std::fmt;
use types::{ForkDigest, SubnetId};

/// The gossip topic prefix identifying the consensus-layer protocol.
pub const TOPIC_PREFIX: &str = "eth2";
/// The postfix identifying the topic encoding.
pub const SSZ_SNAPPY_ENCODING_POSTFIX: &str = "ssz_snappy";

pub const BEACON_BLOCK_TOPIC: &str = "beacon_block";
pub const BEACON_AGGREGATE_AND_PROOF_TOPIC: &str = "beacon_aggregate_and_proof";
pub const BEACON_ATTESTATION_PREFIX: &str = "beacon_attestation_";
pub const VOLUNTARY_EXIT_TOPIC: &str = "voluntary_exit";
pub const PROPOSER_SLASHING_TOPIC: &str = "proposer_slashing";
pub const ATTESTER_SLASHING_TOPIC: &str = "attester_slashing";

/// Wire-level encoding applied to payloads on a topic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GossipEncoding {
    /// Messages are SSZ-encoded then snappy-compressed.
    #[default]
    SSZSnappy,
}

/// The kinds of gossip topics defined by the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GossipKind {
    /// Topic for publishing beacon blocks.
    BeaconBlock,
    /// Topic for publishing aggregate attestations and proofs.
    BeaconAggregateAndProof,
    /// Topic for publishing raw attestations on a particular subnet.
    Attestation(SubnetId),
    /// Topic for publishing voluntary exits.
    VoluntaryExit,
    /// Topic for publishing block proposer slashings.
    ProposerSlashing,
    /// Topic for publishing attester slashings.
    AttesterSlashing,
}

impl fmt::Display for GossipKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GossipKind::BeaconBlock => write!(f, "{}", BEACON_BLOCK_TOPIC),
            GossipKind::BeaconAggregateAndProof => {
                write!(f, "{}", BEACON_AGGREGATE_AND_PROOF_TOPIC)
            }
            GossipKind::Attestation(subnet_id) => {
                write!(f, "{}{}", BEACON_ATTESTATION_PREFIX, **subnet_id)
            }
            GossipKind::VoluntaryExit => write!(f, "{}", VOLUNTARY_EXIT_TOPIC),
            GossipKind::ProposerSlashing => write!(f, "{}", PROPOSER_SLASHING_TOPIC),
            GossipKind::AttesterSlashing => write!(f, "{}", ATTESTER_SLASHING_TOPIC),
        }
    }
}

/// A fully-qualified gossip topic: kind, fork digest and encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GossipTopic {
    kind: GossipKind,
    fork_digest: ForkDigest,
    encoding: GossipEncoding,
}

impl GossipTopic {
    pub fn new(kind: GossipKind, fork_digest: ForkDigest) -> Self {
        Self {
            kind,
            fork_digest,
            encoding: GossipEncoding::default(),
        }
    }

    pub fn kind(&self) -> &GossipKind {
        &self.kind
    }

    pub fn fork_digest(&self) -> ForkDigest {
        self.fork_digest
    }

    /// The subnet id, if this is an attestation subnet topic.
    pub fn subnet_id(&self) -> Option<SubnetId> {
        match self.kind {
            GossipKind::Attestation(subnet_id) => Some(subnet_id),
            _ => None,
        }
    }
}

impl fmt::Display for GossipTopic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let encoding = match self.encoding {
            GossipEncoding::SSZSnappy => SSZ_SNAPPY_ENCODING_POSTFIX,
        };
        write!(
            f,
            "/{}/{}/{}/{}",
            TOPIC_PREFIX,
            hex::encode(self.fork_digest),
            self.kind,
            encoding
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: ForkDigest = [0xb5, 0x30, 0x3f, 0x2a];

    #[test]
    fn topic_names_are_fully_qualified() {
        let topic = GossipTopic::new(GossipKind::BeaconBlock, DIGEST);
        assert_eq!(topic.to_string(), "/eth2/b5303f2a/beacon_block/ssz_snappy");

        let topic = GossipTopic::new(GossipKind::Attestation(SubnetId::new(17)), DIGEST);
        assert_eq!(
            topic.to_string(),
            "/eth2/b5303f2a/beacon_attestation_17/ssz_snappy"
        );
    }

    #[test]
    fn subnet_id_accessor() {
        let topic = GossipTopic::new(GossipKind::Attestation(SubnetId::new(3)), DIGEST);
        assert_eq!(topic.subnet_id(), Some(SubnetId::new(3)));

        let topic = GossipTopic::new(GossipKind::VoluntaryExit, DIGEST);
        assert_eq!(topic.subnet_id(), None);
    }
}
