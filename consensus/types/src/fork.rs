//! Fork identification for gossip topics and the ENR `eth2` field.

use crate::{Epoch, Hash256};
use eth2_hashing::hash;
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

/// The 4-byte tag that prefixes every gossip topic on a given fork.
pub type ForkDigest = [u8; 4];

/// Inputs to the fork-digest derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ForkData {
    pub current_version: [u8; 4],
    pub genesis_validators_root: Hash256,
}

impl ForkData {
    /// The first four bytes of `hash_tree_root(self)`.
    ///
    /// `ForkData` is a two-field container of fixed 32-byte chunks, so the
    /// tree root is a single hash of the padded version followed by the
    /// validators root.
    pub fn fork_digest(&self) -> ForkDigest {
        let mut chunks = [0u8; 64];
        chunks[..4].copy_from_slice(&self.current_version);
        chunks[32..].copy_from_slice(self.genesis_validators_root.as_bytes());

        let root = hash(&chunks);
        let mut digest = [0u8; 4];
        digest.copy_from_slice(&root[..4]);
        digest
    }
}

/// Computes the fork digest qualifying every gossip topic name.
pub fn compute_fork_digest(
    current_version: [u8; 4],
    genesis_validators_root: Hash256,
) -> ForkDigest {
    ForkData {
        current_version,
        genesis_validators_root,
    }
    .fork_digest()
}

/// The `eth2` ENR field, advertising the fork a node is on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct EnrForkId {
    pub fork_digest: ForkDigest,
    pub next_fork_version: [u8; 4],
    pub next_fork_epoch: Epoch,
}

impl EnrForkId {
    /// The fork id for a chain with no scheduled fork.
    pub fn from_genesis(
        genesis_fork_version: [u8; 4],
        genesis_validators_root: Hash256,
    ) -> Self {
        Self {
            fork_digest: compute_fork_digest(genesis_fork_version, genesis_validators_root),
            next_fork_version: genesis_fork_version,
            next_fork_epoch: crate::FAR_FUTURE_EPOCH,
        }
    }
}
