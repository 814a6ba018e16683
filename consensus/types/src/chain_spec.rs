use crate::{Epoch, Slot};
use serde_derive::{Deserialize, Serialize};

/// The subset of the protocol configuration that the node orchestration
/// layer consumes.
///
/// Values that only matter to the state-transition function are not carried
/// here; they live with the layer that owns them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub seconds_per_slot: u64,
    pub attestation_subnet_count: u64,
    pub epochs_per_random_subnet_subscription: u64,
    pub random_subnets_per_validator: u64,
    /// Measured in epochs.
    pub min_validator_withdrawability_delay: u64,
    pub safety_decay: u64,
    pub churn_limit_quotient: u64,
    pub min_per_epoch_churn_limit: u64,
    pub genesis_fork_version: [u8; 4],
    pub genesis_slot: Slot,
    pub far_future_epoch: Epoch,
}

impl ChainSpec {
    /// Returns the specification for the mainnet configuration.
    pub fn mainnet() -> Self {
        Self {
            seconds_per_slot: 12,
            attestation_subnet_count: 64,
            epochs_per_random_subnet_subscription: 256,
            random_subnets_per_validator: 1,
            min_validator_withdrawability_delay: 256,
            safety_decay: 10,
            churn_limit_quotient: 65_536,
            min_per_epoch_churn_limit: 4,
            genesis_fork_version: [0, 0, 0, 0],
            genesis_slot: Slot::new(0),
            far_future_epoch: Epoch::new(u64::MAX),
        }
    }

    /// The minimal configuration, with short slots and epochs for testing.
    pub fn minimal() -> Self {
        Self {
            seconds_per_slot: 6,
            epochs_per_random_subnet_subscription: 256,
            churn_limit_quotient: 32,
            genesis_fork_version: [0, 0, 0, 1],
            ..Self::mainnet()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_sanity() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.attestation_subnet_count, 64);
        assert_eq!(spec.seconds_per_slot, 12);
    }
}
