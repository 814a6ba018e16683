mod cli;
mod config;
mod eth2_network;

pub use cli::cli_app;
pub use client::{Client, ClientBuilder, ClientConfig, ClientGenesis};
pub use config::get_config;
pub use eth2_network::Eth2NetworkConfig;

use client::testing::{MemoryDatabase, MockChainDag, MockEth1};
use environment::RuntimeContext;
use network::testing::{MockGossip, MockSync, NullFetcher, NullProcessor, TestDuties};
use network::Witness;
use slot_clock::SystemTimeSlotClock;
use std::sync::Arc;
use types::EthSpec;

pub const VERSION: &str = concat!("beacon-node/v", env!("CARGO_PKG_VERSION"));

/// The collaborator set the binary currently wires in: the orchestration
/// core running over in-process stand-ins for the consensus, sync and
/// transport layers. Production deployments replace each stand-in with the
/// crate that implements it for real; the orchestration paths exercised are
/// the same.
pub type InteropNodeTypes<E> = Witness<
    SystemTimeSlotClock,
    MockGossip<E>,
    NullProcessor,
    TestDuties,
    MockSync,
    NullFetcher,
    E,
>;

/// A beacon node client over the interop collaborator set.
pub struct ProductionBeaconNode<E: EthSpec>(Client<InteropNodeTypes<E>>);

impl<E: EthSpec> ProductionBeaconNode<E> {
    /// Starts a new beacon node client in the given `context`.
    ///
    /// Client behaviour is defined by the given `client_config`.
    pub async fn new(
        context: RuntimeContext<E>,
        client_config: ClientConfig,
    ) -> Result<Self, String> {
        let spec = context.spec.clone();
        let executor = context.executor;

        let client = ClientBuilder::<InteropNodeTypes<E>>::new(executor, client_config, spec)
            .database(Arc::new(MemoryDatabase::default()))
            .chain_dag(Arc::new(MockChainDag::default()))
            .gossip(Arc::new(MockGossip::default()))
            .processor(Arc::new(NullProcessor::default()))
            .validator_duties(Arc::new(TestDuties::default()))
            .sync_reader(Arc::new(MockSync::default()))
            .block_fetcher(Arc::new(NullFetcher))
            .eth1_genesis(Arc::new(MockEth1::default()))
            .build()
            .await?;

        Ok(Self(client))
    }

    pub fn into_inner(self) -> Client<InteropNodeTypes<E>> {
        self.0
    }
}

impl<E: EthSpec> std::ops::Deref for ProductionBeaconNode<E> {
    type Target = Client<InteropNodeTypes<E>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
