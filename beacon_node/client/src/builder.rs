//! Builds a `Client` instance, running the node's initialization sequence in
//! its required order: database, genesis source, DAG, clock, validator
//! pool, network and finally the timers.

use crate::config::{ClientGenesis, Config as ClientConfig};
use crate::notifier::spawn_notifier;
use crate::weak_subjectivity::is_within_weak_subjectivity_period;
use crate::{ChainDag, Client, Database, Eth1GenesisProvider, RpcServer, ValidatorPool};
use network::{
    GossipGate, GossipNetwork, NetworkGlobals, NodeTypes, Quarantine, RequestManager, Router,
    SubnetService,
};
use slog::{info, warn};
use slot_clock::SlotClock;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use task_executor::{advance_node_status, NodeStatus, TaskExecutor};
use timer::{second_ticker, SecondTicker, SlotScheduler};
use types::{ChainSpec, EnrForkId, Epoch, EthSpec, Slot};

/// Builds a `Client` instance.
///
/// ## Notes
///
/// Collaborators are handed in before `build`; `build` itself performs the
/// ordered, potentially-awaiting initialization and spawns the service
/// loops. Missing collaborators surface as errors from `build`, never as
/// panics.
pub struct ClientBuilder<T: NodeTypes> {
    executor: TaskExecutor,
    config: ClientConfig,
    spec: ChainSpec,
    db: Option<Arc<dyn Database>>,
    dag: Option<Arc<dyn ChainDag>>,
    slot_clock: Option<T::SlotClock>,
    gossip: Option<Arc<T::Gossip>>,
    processor: Option<Arc<T::Processor>>,
    duties: Option<Arc<T::Duties>>,
    sync: Option<Arc<T::Sync>>,
    fetcher: Option<Arc<T::Fetcher>>,
    quarantine: Option<Arc<Quarantine>>,
    validator_pool: Option<Arc<dyn ValidatorPool>>,
    rpc: Option<Arc<dyn RpcServer>>,
    eth1: Option<Arc<dyn Eth1GenesisProvider>>,
    log: slog::Logger,
}

impl<T: NodeTypes> ClientBuilder<T> {
    pub fn new(executor: TaskExecutor, config: ClientConfig, spec: ChainSpec) -> Self {
        let log = executor.log().clone();
        Self {
            executor,
            config,
            spec,
            db: None,
            dag: None,
            slot_clock: None,
            gossip: None,
            processor: None,
            duties: None,
            sync: None,
            fetcher: None,
            quarantine: None,
            validator_pool: None,
            rpc: None,
            eth1: None,
            log,
        }
    }

    pub fn database(mut self, db: Arc<dyn Database>) -> Self {
        self.db = Some(db);
        self
    }

    pub fn chain_dag(mut self, dag: Arc<dyn ChainDag>) -> Self {
        self.dag = Some(dag);
        self
    }

    /// Overrides the system-time slot clock, for deterministic tests.
    pub fn slot_clock(mut self, clock: T::SlotClock) -> Self {
        self.slot_clock = Some(clock);
        self
    }

    pub fn gossip(mut self, gossip: Arc<T::Gossip>) -> Self {
        self.gossip = Some(gossip);
        self
    }

    pub fn processor(mut self, processor: Arc<T::Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn validator_duties(mut self, duties: Arc<T::Duties>) -> Self {
        self.duties = Some(duties);
        self
    }

    pub fn sync_reader(mut self, sync: Arc<T::Sync>) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn block_fetcher(mut self, fetcher: Arc<T::Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn quarantine(mut self, quarantine: Arc<Quarantine>) -> Self {
        self.quarantine = Some(quarantine);
        self
    }

    pub fn validator_pool(mut self, pool: Arc<dyn ValidatorPool>) -> Self {
        self.validator_pool = Some(pool);
        self
    }

    pub fn rpc_server(mut self, rpc: Arc<dyn RpcServer>) -> Self {
        self.rpc = Some(rpc);
        self
    }

    pub fn eth1_genesis(mut self, eth1: Arc<dyn Eth1GenesisProvider>) -> Self {
        self.eth1 = Some(eth1);
        self
    }

    /// Consumes the builder, initializing the node and spawning its service
    /// loops. Every failure here is fatal to startup.
    pub async fn build(mut self) -> Result<Client<T>, String> {
        let log = self.log.clone();
        let spec = self.spec.clone();

        let db = self.db.take().ok_or("build requires a database")?;
        let dag = self.dag.take().ok_or("build requires a chain DAG")?;
        let gossip = self.gossip.take().ok_or("build requires a gossip handle")?;
        let processor = self.processor.take().ok_or("build requires a processor")?;
        let duties = self
            .duties
            .take()
            .ok_or("build requires a validator duty handler")?;
        let sync = self.sync.take().ok_or("build requires a sync reader")?;
        let fetcher = self.fetcher.take().ok_or("build requires a block fetcher")?;

        let data_dir = self.config.create_data_dir()?;

        // Resolve the genesis source. The state bytes are a one-shot buffer:
        // taking them out of the config here is what clears it.
        match std::mem::take(&mut self.config.genesis) {
            ClientGenesis::Checkpoint {
                state_bytes,
                block_bytes,
            } => {
                let state_slot = dag.decode_state_slot(&state_bytes)?;
                if block_bytes.is_none() && state_slot != Slot::new(0) {
                    return Err(format!(
                        "Checkpoint state at slot {} requires a matching checkpoint block",
                        state_slot
                    ));
                }
                info!(
                    log, "Starting from finalized checkpoint";
                    "state_slot" => %state_slot,
                );
                dag.pre_init(None, Some(&state_bytes), block_bytes.as_deref())?;
            }
            ClientGenesis::GenesisState { state_bytes } => {
                info!(log, "Starting from known genesis state");
                dag.pre_init(Some(&state_bytes), None, None)?;
            }
            ClientGenesis::DepositContract => {
                let eth1 = self
                    .eth1
                    .clone()
                    .ok_or("Deposit-contract genesis requires an eth1 connection")?;
                info!(
                    log, "Waiting for eth1 genesis";
                    "contract" => self.config.deposit_contract_address.as_deref().unwrap_or("<unset>"),
                );
                let state_bytes = eth1.wait_for_genesis_state().await?;
                info!(log, "Eth1 genesis detected");
                dag.pre_init(Some(&state_bytes), None, None)?;
            }
        }

        dag.init(self.config.verify_finalization)?;

        let clock = match self.slot_clock.take() {
            Some(clock) => clock,
            None => T::SlotClock::new(
                spec.genesis_slot,
                Duration::from_secs(dag.genesis_time()),
                Duration::from_secs(spec.seconds_per_slot),
            ),
        };

        if let Some(checkpoint) = &self.config.weak_subjectivity_checkpoint {
            let current_slot = clock.now_or_genesis();
            if !is_within_weak_subjectivity_period(
                current_slot,
                dag.active_validator_count(),
                checkpoint,
                T::EthSpec::slots_per_epoch(),
                &spec,
            ) {
                return Err(format!(
                    "Weak subjectivity checkpoint at epoch {} is stale at slot {}; obtain a newer checkpoint",
                    checkpoint.epoch, current_slot
                ));
            }
        }

        if let Some(pool) = &self.validator_pool {
            pool.attach(
                dag.genesis_validators_root(),
                &self.config.slashing_protection_path(),
            )?;
        }

        if let (Some(pool), Some(eth1)) = (&self.validator_pool, &self.eth1) {
            if pool.has_validators() && self.config.web3_url.is_some() {
                eth1.spawn_monitor(&self.executor);
            }
        }

        let enr_fork_id = EnrForkId::from_genesis(
            spec.genesis_fork_version,
            dag.genesis_validators_root(),
        );
        let fork_digest = enr_fork_id.fork_digest;
        if let Err(e) = gossip.update_enr_fork_id(&enr_fork_id) {
            warn!(log, "Failed to update ENR fork id"; "error" => e);
        }

        let globals = Arc::new(NetworkGlobals::<T::EthSpec>::new(gossip.local_enr()));

        let router = Router::new(processor.clone(), &log);
        gossip.install_handler(router);

        let enr_path = data_dir.join("beacon_node.enr");
        if let Err(e) = fs::write(&enr_path, gossip.local_enr()) {
            warn!(
                log, "Failed to write ENR file";
                "file" => %enr_path.display(),
                "error" => %e,
            );
        }

        let rpc = if self.config.rpc.enabled {
            let rpc = self
                .rpc
                .take()
                .ok_or("RPC is enabled but no handlers are installed")?;
            rpc.start(&self.config.rpc.address, self.config.rpc.port)?;
            info!(
                log, "RPC server started";
                "address" => &self.config.rpc.address,
                "port" => self.config.rpc.port,
            );
            Some(rpc)
        } else {
            None
        };

        let subnets = SubnetService::<T>::new(
            gossip.clone(),
            duties.clone(),
            globals.clone(),
            fork_digest,
            spec.clone(),
            &log,
        );
        let gate = GossipGate::<T>::new(gossip.clone(), globals.clone(), fork_digest, &log);

        let scheduler = SlotScheduler::new(
            clock.clone(),
            processor.clone(),
            duties,
            sync.clone(),
            gate,
            subnets,
            self.config.stop_at_epoch.map(Epoch::new),
            self.executor.shutdown_sender(),
            &log,
        );
        timer::spawn(&self.executor, scheduler).map_err(|e| e.to_string())?;

        let quarantine = self
            .quarantine
            .take()
            .unwrap_or_else(|| Arc::new(Quarantine::new()));
        let request_manager = RequestManager::<T>::new(fetcher, processor, &log);
        let ticker = SecondTicker::new(sync.clone(), quarantine, request_manager, &log);
        second_ticker::spawn(&self.executor, ticker).map_err(|e| e.to_string())?;

        spawn_notifier::<T>(&self.executor, clock, dag.clone(), gossip.clone(), sync)
            .map_err(|e| e.to_string())?;

        let pid_path = data_dir.join("beacon_node.pid");
        fs::write(&pid_path, std::process::id().to_string())
            .map_err(|e| format!("Unable to write PID file: {}", e))?;

        advance_node_status(NodeStatus::Running);
        let head = dag.head();
        info!(
            log, "Beacon node initialized";
            "head_slot" => %head.slot,
            "head_root" => %head.root,
        );

        Ok(Client {
            db,
            dag,
            gossip,
            validator_pool: self.validator_pool.take(),
            rpc,
            pid_path: Some(pid_path),
            log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use network::testing::{MockGossip, MockSync, NullFetcher, NullProcessor, TestDuties};
    use network::Witness;
    use slot_clock::ManualSlotClock;
    use types::{Checkpoint, Hash256, MainnetEthSpec};

    type E = MainnetEthSpec;
    type T = Witness<
        ManualSlotClock,
        MockGossip<E>,
        NullProcessor,
        TestDuties,
        MockSync,
        NullFetcher,
        E,
    >;

    struct Harness {
        builder: ClientBuilder<T>,
        dag: Arc<MockChainDag>,
        db: Arc<MemoryDatabase>,
        gossip: Arc<MockGossip<E>>,
        _data_dir: tempfile::TempDir,
        // Firing this would cancel the spawned service loops mid-test.
        _exit_signal: exit_future::Signal,
    }

    fn get_harness(config_mutator: impl FnOnce(&mut ClientConfig)) -> Harness {
        let data_dir = tempfile::tempdir().expect("should create temp dir");
        let mut config = ClientConfig::default();
        config.set_data_dir(data_dir.path().to_path_buf());
        config_mutator(&mut config);

        let (executor, exit_signal) = test_executor();
        let dag = Arc::new(MockChainDag::default());
        let db = Arc::new(MemoryDatabase::default());
        let gossip = Arc::new(MockGossip::default());

        let builder = ClientBuilder::<T>::new(executor, config, ChainSpec::mainnet())
            .database(db.clone())
            .chain_dag(dag.clone())
            .gossip(gossip.clone())
            .processor(Arc::new(NullProcessor::default()))
            .validator_duties(Arc::new(TestDuties::default()))
            .sync_reader(Arc::new(MockSync::default()))
            .block_fetcher(Arc::new(NullFetcher));

        Harness {
            builder,
            dag,
            db,
            gossip,
            _data_dir: data_dir,
            _exit_signal: exit_signal,
        }
    }

    #[tokio::test]
    async fn fresh_start_via_baked_genesis() {
        let genesis_state = state_prefix(100, Hash256::zero(), 0);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::GenesisState {
                state_bytes: genesis_state.clone(),
            };
        });

        let client = harness.builder.build().await.expect("build should succeed");

        assert_eq!(
            harness.dag.pre_init_calls(),
            vec![(Some(genesis_state), None, None)]
        );
        assert_eq!(harness.dag.init_calls(), vec![false]);
        assert_eq!(harness.dag.genesis_time(), 100);
        assert_eq!(client.head_info().slot, Slot::new(0));

        // The PID file names this process.
        let pid_path = client.pid_path.clone().expect("pid file should be set");
        let pid = std::fs::read_to_string(&pid_path).expect("pid file should exist");
        assert_eq!(pid, std::process::id().to_string());

        // Router installed once into the substrate.
        assert!(harness.gossip.handler().is_some());

        client.stop();
        assert!(!pid_path.exists());
        assert!(harness.db.closed());
        assert!(harness.gossip.shutdown_called());
    }

    #[tokio::test]
    async fn checkpoint_start_requires_matching_block() {
        let state = state_with_slot(8192);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::Checkpoint {
                state_bytes: state,
                block_bytes: None,
            };
        });

        let err = harness.builder.build().await.expect_err("should fail");
        assert!(err.contains("checkpoint block"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn checkpoint_start_with_block_sets_tail() {
        let state = state_with_slot(8192);
        let block = vec![0xbb; 16];
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::Checkpoint {
                state_bytes: state.clone(),
                block_bytes: Some(block.clone()),
            };
        });
        harness.dag.set_head(Hash256::repeat_byte(7), Slot::new(8192));

        let client = harness.builder.build().await.expect("build should succeed");

        assert_eq!(
            harness.dag.pre_init_calls(),
            vec![(None, Some(state), Some(block))]
        );
        assert_eq!(client.head_info().slot, Slot::new(8192));
    }

    #[tokio::test]
    async fn genesis_state_at_slot_zero_needs_no_block() {
        let state = state_with_slot(0);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::Checkpoint {
                state_bytes: state,
                block_bytes: None,
            };
        });

        harness.builder.build().await.expect("build should succeed");
    }

    #[tokio::test]
    async fn deposit_contract_genesis_awaits_detection() {
        let genesis_state = state_with_slot(0);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::DepositContract;
        });
        let eth1 = Arc::new(MockEth1::with_genesis(genesis_state.clone()));

        let client = harness
            .builder
            .eth1_genesis(eth1)
            .build()
            .await
            .expect("build should succeed");

        assert_eq!(
            harness.dag.pre_init_calls(),
            vec![(Some(genesis_state), None, None)]
        );
        drop(client);
    }

    #[tokio::test]
    async fn deposit_contract_genesis_without_eth1_is_fatal() {
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::DepositContract;
        });

        let err = harness.builder.build().await.expect_err("should fail");
        assert!(err.contains("eth1"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn stale_weak_subjectivity_checkpoint_aborts() {
        let state = state_with_slot(0);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::GenesisState { state_bytes: state };
            config.weak_subjectivity_checkpoint = Some(Checkpoint {
                epoch: Epoch::new(0),
                root: Hash256::repeat_byte(3),
            });
        });

        // A wall clock thousands of epochs past the checkpoint; zero active
        // validators gives the minimum period.
        harness.dag.set_genesis_time(0);
        let err = harness
            .builder
            .slot_clock(clock_at_slot(1_000_000))
            .build()
            .await
            .expect_err("should fail");
        assert!(err.contains("stale"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn validator_pool_attaches_with_genesis_validators_root() {
        let state = state_prefix(0, Hash256::repeat_byte(0x42), 0);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::GenesisState { state_bytes: state };
        });
        let pool = Arc::new(MockValidatorPool::default());

        harness
            .builder
            .validator_pool(pool.clone())
            .build()
            .await
            .expect("build should succeed");

        let (gvr, slashing_dir) = pool.attached().expect("pool should attach");
        assert_eq!(gvr, Hash256::repeat_byte(0x42));
        assert!(slashing_dir.ends_with("slashing_protection"));
    }

    #[tokio::test]
    async fn rpc_enabled_without_handlers_is_fatal() {
        let state = state_with_slot(0);
        let harness = get_harness(|config| {
            config.genesis = ClientGenesis::GenesisState { state_bytes: state };
            config.rpc.enabled = true;
        });

        let err = harness.builder.build().await.expect_err("should fail");
        assert!(err.contains("RPC"), "unexpected error: {}", err);
    }
}
