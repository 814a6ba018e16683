//! Types used at the orchestration layer of the beacon node.
//!
//! The consensus objects themselves (blocks, states, attestations) are owned
//! by the state-transition layer and cross this crate only as opaque SSZ
//! bytes; what lives here is the slot arithmetic, fork identification and
//! protocol constants that the node's scheduling and networking needs.

pub mod chain_spec;
pub mod checkpoint;
pub mod eth_spec;
pub mod fork;
pub mod graffiti;
pub mod slot_epoch;
pub mod subnet_id;

pub use chain_spec::ChainSpec;
pub use checkpoint::Checkpoint;
pub use eth_spec::{EthSpec, MainnetEthSpec, MinimalEthSpec};
pub use fork::{compute_fork_digest, EnrForkId, ForkData, ForkDigest};
pub use graffiti::Graffiti;
pub use slot_epoch::{Epoch, Slot};
pub use subnet_id::SubnetId;

pub type Hash256 = ethereum_types::H256;

/// The slot at which the chain begins.
pub const GENESIS_SLOT: Slot = Slot::new(0);

/// An epoch that will never arrive, used to mark unscheduled forks.
pub const FAR_FUTURE_EPOCH: Epoch = Epoch::new(u64::MAX);
