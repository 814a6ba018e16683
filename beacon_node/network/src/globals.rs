//! A collection of variables that are accessible outside of the network
//! services themselves.

use crate::types::{EnrAttestationBitfield, GossipTopic, MetaData};
use parking_lot::RwLock;
use std::collections::HashSet;
use types::EthSpec;

pub struct NetworkGlobals<E: EthSpec> {
    /// The ASCII-encoded local ENR, as advertised to peers.
    pub local_enr: RwLock<String>,
    /// The local metadata record of our node.
    pub local_metadata: RwLock<MetaData<E>>,
    /// The current gossipsub topic subscriptions.
    pub gossipsub_subscriptions: RwLock<HashSet<GossipTopic>>,
}

impl<E: EthSpec> NetworkGlobals<E> {
    pub fn new(enr: String) -> Self {
        Self {
            local_enr: RwLock::new(enr),
            local_metadata: RwLock::new(MetaData::default()),
            gossipsub_subscriptions: RwLock::new(HashSet::new()),
        }
    }

    /// Returns the local ENR that external peers may connect to.
    pub fn local_enr(&self) -> String {
        self.local_enr.read().clone()
    }

    /// The sequence number currently advertised with the metadata record.
    pub fn seq_number(&self) -> u64 {
        self.local_metadata.read().seq_number
    }

    /// A copy of the advertised attestation subnet bitfield.
    pub fn attnets(&self) -> EnrAttestationBitfield<E> {
        self.local_metadata.read().attnets.clone()
    }

    /// Whether the node currently holds a gossipsub subscription for `topic`.
    pub fn is_subscribed(&self, topic: &GossipTopic) -> bool {
        self.gossipsub_subscriptions.read().contains(topic)
    }

    /// The number of current gossipsub subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.gossipsub_subscriptions.read().len()
    }
}
