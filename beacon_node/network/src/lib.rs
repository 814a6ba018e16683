//! The network-facing orchestration of the beacon node: attestation subnet
//! management, the sync-state gossip gate, gossip message routing and
//! missing-ancestor backfill.
//!
//! The gossip transport itself lives behind the [`service::GossipNetwork`]
//! trait; this crate decides *what* to subscribe to and *when*, never *how*
//! bytes move.

pub mod globals;
pub mod gossip_gate;
pub mod metrics;
pub mod processor;
pub mod router;
pub mod service;
pub mod subnet_service;
pub mod sync;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use globals::NetworkGlobals;
pub use gossip_gate::{GateDecision, GossipGate};
pub use processor::{Processor, ValidationResult, ValidatorDuties};
pub use router::Router;
pub use service::{GossipHandler, GossipNetwork};
pub use subnet_service::SubnetService;
pub use sync::{BlockFetcher, Quarantine, RequestManager, SyncReader};

use slot_clock::SlotClock;
use std::marker::PhantomData;
use ::types::EthSpec;

/// The set of collaborator implementations a node instance is built over.
///
/// Carried as a single type parameter so that every service names one `T`
/// instead of a parameter per collaborator.
pub trait NodeTypes: Send + Sync + 'static {
    type EthSpec: EthSpec;
    type SlotClock: SlotClock + 'static;
    type Gossip: GossipNetwork<Self::EthSpec>;
    type Processor: Processor;
    type Duties: ValidatorDuties;
    type Sync: SyncReader;
    type Fetcher: BlockFetcher;
}

/// A zero-sized implementation of [`NodeTypes`] assembled from its parts.
pub struct Witness<C, G, P, D, S, F, E>(PhantomData<(C, G, P, D, S, F, E)>);

impl<C, G, P, D, S, F, E> NodeTypes for Witness<C, G, P, D, S, F, E>
where
    C: SlotClock + 'static,
    G: GossipNetwork<E>,
    P: Processor,
    D: ValidatorDuties,
    S: SyncReader,
    F: BlockFetcher,
    E: EthSpec,
{
    type EthSpec = E;
    type SlotClock = C;
    type Gossip = G;
    type Processor = P;
    type Duties = D;
    type Sync = S;
    type Fetcher = F;
}
