use crate::ChainSpec;
use ssz_types::typenum::{Unsigned, U64};
use std::fmt::Debug;

/// Compile-time network presets.
///
/// Carried as a type parameter through the node so that bitfield lengths are
/// fixed at compile time, following the usual preset pattern.
pub trait EthSpec:
    'static + Default + Clone + Copy + Sync + Send + Debug + PartialEq + Eq
{
    /// The length of the `attnets` bitfield advertised to peers.
    type SubnetBitfieldLength: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;

    fn slots_per_epoch() -> u64;

    fn default_spec() -> ChainSpec;

    fn spec_name() -> &'static str;
}

/// Ethereum Foundation mainnet specification.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct MainnetEthSpec;

impl EthSpec for MainnetEthSpec {
    type SubnetBitfieldLength = U64;

    fn slots_per_epoch() -> u64 {
        32
    }

    fn default_spec() -> ChainSpec {
        ChainSpec::mainnet()
    }

    fn spec_name() -> &'static str {
        "mainnet"
    }
}

/// Specification with small constants, suitable for testing.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct MinimalEthSpec;

impl EthSpec for MinimalEthSpec {
    type SubnetBitfieldLength = U64;

    fn slots_per_epoch() -> u64 {
        8
    }

    fn default_spec() -> ChainSpec {
        ChainSpec::minimal()
    }

    fn spec_name() -> &'static str {
        "minimal"
    }
}
