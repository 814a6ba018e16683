use crate::{Epoch, Hash256};
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

/// Casper FFG checkpoint, used in attestations and weak-subjectivity sync.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: Hash256,
}
