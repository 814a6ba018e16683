//! The beacon node client: ties the database, the chain DAG, the network
//! services and the timers into one lifecycle.
//!
//! The consensus-heavy collaborators (DAG, processor, sync manager, eth1
//! watcher, RPC handlers) live in their own crates and are reached through
//! the traits defined here; this crate owns the order in which they start
//! and stop.

pub mod builder;
pub mod config;
pub mod notifier;
pub mod weak_subjectivity;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builder::ClientBuilder;
pub use config::{ClientGenesis, Config as ClientConfig};

use async_trait::async_trait;
use network::{GossipNetwork, NodeTypes};
use slog::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use types::{Epoch, Hash256, Slot};

/// A snapshot of the chain head, readable without holding the DAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadInfo {
    pub root: Hash256,
    pub slot: Slot,
}

/// The fork-choice DAG and its backing store of states and blocks.
pub trait ChainDag: Send + Sync + 'static {
    /// One-time database initialization. Exactly one of `genesis_state` or
    /// the `tail_state`/`tail_block` pair is expected, depending on whether
    /// the node starts from genesis or from a checkpoint.
    fn pre_init(
        &self,
        genesis_state: Option<&[u8]>,
        tail_state: Option<&[u8]>,
        tail_block: Option<&[u8]>,
    ) -> Result<(), String>;

    /// Build the in-memory DAG from the initialized database.
    fn init(&self, verify_finalization: bool) -> Result<(), String>;

    /// The slot recorded in an SSZ-encoded state, without a full decode.
    fn decode_state_slot(&self, state: &[u8]) -> Result<Slot, String>;

    fn head(&self) -> HeadInfo;

    fn finalized_epoch(&self) -> Epoch;

    fn genesis_time(&self) -> u64;

    fn genesis_validators_root(&self) -> Hash256;

    fn active_validator_count(&self) -> u64;
}

/// The on-disk database. Owned by the DAG conceptually; closed last.
pub trait Database: Send + Sync + 'static {
    fn close(&self) -> Result<(), String>;
}

/// Watches the deposit contract for genesis, and afterwards for deposits.
#[async_trait]
pub trait Eth1GenesisProvider: Send + Sync + 'static {
    /// Poll the deposit contract until a viable genesis state is detected,
    /// returning it as SSZ bytes.
    async fn wait_for_genesis_state(&self) -> Result<Vec<u8>, String>;

    /// Start the long-running deposit monitor for block production.
    fn spawn_monitor(&self, executor: &task_executor::TaskExecutor);
}

/// The attached validator keys and their slashing protection.
pub trait ValidatorPool: Send + Sync + 'static {
    /// Bind the pool to a chain, keyed by `genesis_validators_root` so the
    /// slashing protection records can never be replayed across chains.
    fn attach(
        &self,
        genesis_validators_root: Hash256,
        slashing_protection_dir: &Path,
    ) -> Result<(), String>;

    fn has_validators(&self) -> bool;

    /// Stop the pool, including any out-of-process signer.
    fn stop(&self);
}

/// The HTTP/JSON-RPC surface. Handler bodies are external; the client only
/// starts and stops the server.
pub trait RpcServer: Send + Sync + 'static {
    fn start(&self, address: &str, port: u16) -> Result<(), String>;

    fn stop(&self);
}

/// The core "beacon node" client.
///
/// Holds references to the running services, to tear them down in reverse
/// start order on `stop`. All long-running work happens in tasks spawned on
/// the executor during build.
impl<T: NodeTypes> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

pub struct Client<T: NodeTypes> {
    pub(crate) db: Arc<dyn Database>,
    pub(crate) dag: Arc<dyn ChainDag>,
    pub(crate) gossip: Arc<T::Gossip>,
    pub(crate) validator_pool: Option<Arc<dyn ValidatorPool>>,
    pub(crate) rpc: Option<Arc<dyn RpcServer>>,
    pub(crate) pid_path: Option<PathBuf>,
    pub(crate) log: slog::Logger,
}

impl<T: NodeTypes> Client<T> {
    /// A snapshot of the current chain head.
    pub fn head_info(&self) -> HeadInfo {
        self.dag.head()
    }

    /// Tear the node down, in reverse order of initialization: RPC, the
    /// validator sidecar, network listeners, then the database.
    pub fn stop(&self) {
        info!(self.log, "Shutting down beacon node");

        if let Some(rpc) = &self.rpc {
            rpc.stop();
        }

        if let Some(pool) = &self.validator_pool {
            pool.stop();
        }

        self.gossip.shutdown();

        match self.db.close() {
            Ok(()) => info!(self.log, "Databases closed"),
            Err(e) => warn!(self.log, "Failed to close database"; "error" => e),
        }

        if let Some(pid_path) = &self.pid_path {
            if let Err(e) = std::fs::remove_file(pid_path) {
                warn!(
                    self.log, "Failed to remove PID file";
                    "file" => %pid_path.display(),
                    "error" => %e,
                );
            }
        }
    }
}
