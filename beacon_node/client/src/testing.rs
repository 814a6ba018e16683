//! In-memory collaborators for tests and interop runs.
//!
//! The mock chain DAG reads only the fixed-offset prefix a real SSZ
//! `BeaconState` starts with (`genesis_time` at 0, `genesis_validators_root`
//! at 8, `slot` at 40); full state decoding stays in the consensus layer
//! where it belongs, while lifecycle tests can still exercise the
//! slot-dependent branches.

use crate::{ChainDag, Database, Eth1GenesisProvider, HeadInfo, RpcServer, ValidatorPool};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use task_executor::TaskExecutor;
use types::{Epoch, Hash256, Slot};

/// Encode the fixed-offset prefix of a state whose slot is `slot`.
pub fn state_with_slot(slot: u64) -> Vec<u8> {
    state_prefix(0, Hash256::zero(), slot)
}

/// Encode a state prefix field by field.
pub fn state_prefix(genesis_time: u64, genesis_validators_root: Hash256, slot: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(48);
    bytes.extend_from_slice(&genesis_time.to_le_bytes());
    bytes.extend_from_slice(genesis_validators_root.as_bytes());
    bytes.extend_from_slice(&slot.to_le_bytes());
    bytes
}

/// A `ManualSlotClock` already advanced to `slot`, with genesis at the UNIX
/// epoch and 12 second slots.
pub fn clock_at_slot(slot: u64) -> slot_clock::ManualSlotClock {
    use slot_clock::SlotClock;
    let clock = slot_clock::ManualSlotClock::new(
        Slot::new(0),
        Duration::from_secs(0),
        Duration::from_secs(12),
    );
    clock.set_slot(slot);
    clock
}

/// A `TaskExecutor` bound to the current tokio runtime.
///
/// The returned `Signal` must be kept alive: dropping it fires the exit
/// future and cancels everything spawned on the executor.
pub fn test_executor() -> (TaskExecutor, exit_future::Signal) {
    use sloggers::Build;
    let log = sloggers::null::NullLoggerBuilder
        .build()
        .expect("logger should build");
    let (signal, exit) = exit_future::signal();
    let (signal_tx, _signal_rx) = futures::channel::mpsc::channel(1);
    let executor = TaskExecutor::new(tokio::runtime::Handle::current(), exit, signal_tx, log);
    (executor, signal)
}

type PreInitCall = (Option<Vec<u8>>, Option<Vec<u8>>, Option<Vec<u8>>);

/// Records lifecycle calls; serves canned chain facts.
pub struct MockChainDag {
    pre_init_calls: Mutex<Vec<PreInitCall>>,
    init_calls: Mutex<Vec<bool>>,
    head: Mutex<HeadInfo>,
    finalized_epoch: Mutex<Epoch>,
    genesis_time: AtomicU64,
    genesis_validators_root: Mutex<Hash256>,
    active_validators: AtomicU64,
}

impl Default for MockChainDag {
    fn default() -> Self {
        Self {
            pre_init_calls: Mutex::new(Vec::new()),
            init_calls: Mutex::new(Vec::new()),
            head: Mutex::new(HeadInfo {
                root: Hash256::zero(),
                slot: Slot::new(0),
            }),
            finalized_epoch: Mutex::new(Epoch::new(0)),
            genesis_time: AtomicU64::new(0),
            genesis_validators_root: Mutex::new(Hash256::zero()),
            active_validators: AtomicU64::new(0),
        }
    }
}

impl MockChainDag {
    pub fn pre_init_calls(&self) -> Vec<PreInitCall> {
        self.pre_init_calls.lock().clone()
    }

    pub fn init_calls(&self) -> Vec<bool> {
        self.init_calls.lock().clone()
    }

    pub fn set_head(&self, root: Hash256, slot: Slot) {
        *self.head.lock() = HeadInfo { root, slot };
    }

    pub fn set_finalized_epoch(&self, epoch: Epoch) {
        *self.finalized_epoch.lock() = epoch;
    }

    pub fn set_genesis_time(&self, genesis_time: u64) {
        self.genesis_time.store(genesis_time, Ordering::SeqCst);
    }

    pub fn set_genesis_validators_root(&self, root: Hash256) {
        *self.genesis_validators_root.lock() = root;
    }

    pub fn set_active_validator_count(&self, count: u64) {
        self.active_validators.store(count, Ordering::SeqCst);
    }
}

impl ChainDag for MockChainDag {
    fn pre_init(
        &self,
        genesis_state: Option<&[u8]>,
        tail_state: Option<&[u8]>,
        tail_block: Option<&[u8]>,
    ) -> Result<(), String> {
        self.pre_init_calls.lock().push((
            genesis_state.map(<[u8]>::to_vec),
            tail_state.map(<[u8]>::to_vec),
            tail_block.map(<[u8]>::to_vec),
        ));

        if let Some(state) = genesis_state {
            let time_bytes: [u8; 8] = state
                .get(..8)
                .and_then(|slice| slice.try_into().ok())
                .ok_or("genesis state too short")?;
            self.genesis_time
                .store(u64::from_le_bytes(time_bytes), Ordering::SeqCst);
            if let Some(root) = state.get(8..40) {
                *self.genesis_validators_root.lock() = Hash256::from_slice(root);
            }
        }

        // Starting from a checkpoint also moves the head there.
        if let Some(state) = tail_state {
            let slot = self.decode_state_slot(state)?;
            self.head.lock().slot = slot;
        }
        Ok(())
    }

    fn init(&self, verify_finalization: bool) -> Result<(), String> {
        if self.pre_init_calls.lock().is_empty() {
            return Err("init called before pre_init".to_string());
        }
        self.init_calls.lock().push(verify_finalization);
        Ok(())
    }

    fn decode_state_slot(&self, state: &[u8]) -> Result<Slot, String> {
        let bytes: [u8; 8] = state
            .get(40..48)
            .and_then(|slice| slice.try_into().ok())
            .ok_or("state too short")?;
        Ok(Slot::new(u64::from_le_bytes(bytes)))
    }

    fn head(&self) -> HeadInfo {
        *self.head.lock()
    }

    fn finalized_epoch(&self) -> Epoch {
        *self.finalized_epoch.lock()
    }

    fn genesis_time(&self) -> u64 {
        self.genesis_time.load(Ordering::SeqCst)
    }

    fn genesis_validators_root(&self) -> Hash256 {
        *self.genesis_validators_root.lock()
    }

    fn active_validator_count(&self) -> u64 {
        self.active_validators.load(Ordering::SeqCst)
    }
}

/// A database that only remembers whether it has been closed.
#[derive(Default)]
pub struct MemoryDatabase {
    closed: AtomicBool,
}

impl MemoryDatabase {
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Database for MemoryDatabase {
    fn close(&self) -> Result<(), String> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err("database already closed".to_string());
        }
        Ok(())
    }
}

/// Serves a pre-baked genesis state, or fails if none was provided.
#[derive(Default)]
pub struct MockEth1 {
    genesis: Mutex<Option<Vec<u8>>>,
    monitor_started: AtomicBool,
}

impl MockEth1 {
    pub fn with_genesis(state_bytes: Vec<u8>) -> Self {
        Self {
            genesis: Mutex::new(Some(state_bytes)),
            monitor_started: AtomicBool::new(false),
        }
    }

    pub fn monitor_started(&self) -> bool {
        self.monitor_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Eth1GenesisProvider for MockEth1 {
    async fn wait_for_genesis_state(&self) -> Result<Vec<u8>, String> {
        self.genesis
            .lock()
            .clone()
            .ok_or_else(|| "eth1 monitor failed before genesis".to_string())
    }

    fn spawn_monitor(&self, _executor: &TaskExecutor) {
        self.monitor_started.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockValidatorPool {
    attached: Mutex<Option<(Hash256, PathBuf)>>,
    has_validators: AtomicBool,
    stopped: AtomicBool,
}

impl MockValidatorPool {
    pub fn with_validators() -> Self {
        Self {
            has_validators: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn attached(&self) -> Option<(Hash256, PathBuf)> {
        self.attached.lock().clone()
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ValidatorPool for MockValidatorPool {
    fn attach(
        &self,
        genesis_validators_root: Hash256,
        slashing_protection_dir: &Path,
    ) -> Result<(), String> {
        *self.attached.lock() = Some((
            genesis_validators_root,
            slashing_protection_dir.to_path_buf(),
        ));
        Ok(())
    }

    fn has_validators(&self) -> bool {
        self.has_validators.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockRpcServer {
    started: Mutex<Option<(String, u16)>>,
    stopped: AtomicBool,
}

impl MockRpcServer {
    pub fn started(&self) -> Option<(String, u16)> {
        self.started.lock().clone()
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl RpcServer for MockRpcServer {
    fn start(&self, address: &str, port: u16) -> Result<(), String> {
        *self.started.lock() = Some((address.to_string(), port));
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
