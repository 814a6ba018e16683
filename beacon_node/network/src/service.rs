//! The interface to the gossip transport.
//!
//! The libp2p stack (gossipsub, discovery, the peer manager) is an external
//! component; the orchestration layer drives it exclusively through
//! [`GossipNetwork`] and receives payloads back through an installed
//! [`GossipHandler`].

use crate::processor::ValidationResult;
use crate::types::{EnrAttestationBitfield, GossipTopic, PubsubMessage};
use async_trait::async_trait;
use std::sync::Arc;
use types::{EnrForkId, EthSpec};

/// Handle to the gossip substrate.
///
/// Subscription methods resolve when the substrate has applied the change;
/// the subnet manager relies on this ordering when sequencing metadata
/// updates around unsubscribes.
#[async_trait]
pub trait GossipNetwork<E: EthSpec>: Send + Sync + 'static {
    /// Subscribe to the given topic, resolving once the mesh has been joined.
    async fn subscribe(&self, topic: GossipTopic) -> Result<(), String>;

    /// Unsubscribe from the given topic, resolving once the mesh has been left.
    async fn unsubscribe(&self, topic: GossipTopic) -> Result<(), String>;

    /// Replace the `attnets` field of the local ENR.
    fn update_enr_attnets(&self, attnets: &EnrAttestationBitfield<E>) -> Result<(), String>;

    /// Replace the `eth2` field of the local ENR.
    fn update_enr_fork_id(&self, fork_id: &EnrForkId) -> Result<(), String>;

    /// Install the validation callback invoked synchronously for every
    /// received gossip payload. Installed once; survives subscription churn.
    fn install_handler(&self, handler: Arc<dyn GossipHandler>);

    /// The ASCII-encoded local ENR.
    fn local_enr(&self) -> String;

    /// The number of connected peers.
    fn connected_peers(&self) -> usize;

    /// Stop listeners and disconnect from all peers.
    fn shutdown(&self);
}

/// Synchronous verdict callback handed to the gossip substrate.
pub trait GossipHandler: Send + Sync {
    fn on_pubsub_message(&self, message: PubsubMessage) -> ValidationResult;
}
