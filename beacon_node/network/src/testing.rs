//! Mock collaborators for tests and interop runs.
//!
//! Every mock records the calls made against it so tests can assert on
//! ordering and payloads; none of them touch the real network.

use crate::processor::{Processor, ValidationResult, ValidatorDuties};
use crate::service::{GossipHandler, GossipNetwork};
use crate::sync::{BlockFetcher, SyncReader};
use crate::types::{EnrAttestationBitfield, GossipTopic};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use types::{EnrForkId, Epoch, EthSpec, Hash256, Slot, SubnetId};

/// A single recorded interaction with the mock gossip substrate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GossipCall {
    Subscribe(GossipTopic),
    Unsubscribe(GossipTopic),
    EnrAttnets(Vec<bool>),
    EnrForkId(EnrForkId),
}

/// Records subscriptions without any transport underneath.
pub struct MockGossip<E: EthSpec> {
    calls: Mutex<Vec<GossipCall>>,
    handler: Mutex<Option<Arc<dyn GossipHandler>>>,
    fail_subscribes: AtomicBool,
    shutdown_called: AtomicBool,
    peers: AtomicU64,
    _phantom: PhantomData<E>,
}

impl<E: EthSpec> Default for MockGossip<E> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Mutex::new(None),
            fail_subscribes: AtomicBool::new(false),
            shutdown_called: AtomicBool::new(false),
            peers: AtomicU64::new(0),
            _phantom: PhantomData,
        }
    }
}

impl<E: EthSpec> MockGossip<E> {
    pub fn calls(&self) -> Vec<GossipCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribes.store(fail, Ordering::SeqCst);
    }

    pub fn handler(&self) -> Option<Arc<dyn GossipHandler>> {
        self.handler.lock().clone()
    }

    pub fn shutdown_called(&self) -> bool {
        self.shutdown_called.load(Ordering::SeqCst)
    }

    pub fn set_connected_peers(&self, peers: u64) {
        self.peers.store(peers, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: EthSpec> GossipNetwork<E> for MockGossip<E> {
    async fn subscribe(&self, topic: GossipTopic) -> Result<(), String> {
        if self.fail_subscribes.load(Ordering::SeqCst) {
            return Err("mock subscribe failure".to_string());
        }
        self.calls.lock().push(GossipCall::Subscribe(topic));
        Ok(())
    }

    async fn unsubscribe(&self, topic: GossipTopic) -> Result<(), String> {
        self.calls.lock().push(GossipCall::Unsubscribe(topic));
        Ok(())
    }

    fn update_enr_attnets(&self, attnets: &EnrAttestationBitfield<E>) -> Result<(), String> {
        self.calls
            .lock()
            .push(GossipCall::EnrAttnets(attnets.iter().collect()));
        Ok(())
    }

    fn update_enr_fork_id(&self, fork_id: &EnrForkId) -> Result<(), String> {
        self.calls
            .lock()
            .push(GossipCall::EnrForkId(fork_id.clone()));
        Ok(())
    }

    fn install_handler(&self, handler: Arc<dyn GossipHandler>) {
        *self.handler.lock() = Some(handler);
    }

    fn local_enr(&self) -> String {
        "enr:-mock".to_string()
    }

    fn connected_peers(&self) -> usize {
        self.peers.load(Ordering::SeqCst) as usize
    }

    fn shutdown(&self) {
        self.shutdown_called.store(true, Ordering::SeqCst);
    }
}

/// A processor that accepts everything and remembers what it saw.
#[derive(Default)]
pub struct NullProcessor {
    verdict: Mutex<Option<ValidationResult>>,
    gossip_blocks: Mutex<Vec<Vec<u8>>>,
    gossip_aggregates: Mutex<Vec<Vec<u8>>>,
    gossip_attestations: Mutex<Vec<(SubnetId, Vec<u8>)>>,
    gossip_exits: Mutex<Vec<Vec<u8>>>,
    gossip_proposer_slashings: Mutex<Vec<Vec<u8>>>,
    gossip_attester_slashings: Mutex<Vec<Vec<u8>>>,
    ancestor_blocks: Mutex<Vec<Vec<u8>>>,
    head_updates: Mutex<Vec<Slot>>,
    finalized_epoch: Mutex<Epoch>,
}

impl NullProcessor {
    pub fn set_verdict(&self, verdict: ValidationResult) {
        *self.verdict.lock() = Some(verdict);
    }

    pub fn set_finalized_epoch(&self, epoch: Epoch) {
        *self.finalized_epoch.lock() = epoch;
    }

    pub fn gossip_blocks(&self) -> Vec<Vec<u8>> {
        self.gossip_blocks.lock().clone()
    }

    pub fn gossip_aggregates(&self) -> Vec<Vec<u8>> {
        self.gossip_aggregates.lock().clone()
    }

    pub fn gossip_attestations(&self) -> Vec<(SubnetId, Vec<u8>)> {
        self.gossip_attestations.lock().clone()
    }

    pub fn gossip_exits(&self) -> Vec<Vec<u8>> {
        self.gossip_exits.lock().clone()
    }

    pub fn gossip_proposer_slashings(&self) -> Vec<Vec<u8>> {
        self.gossip_proposer_slashings.lock().clone()
    }

    pub fn gossip_attester_slashings(&self) -> Vec<Vec<u8>> {
        self.gossip_attester_slashings.lock().clone()
    }

    pub fn ancestor_blocks(&self) -> Vec<Vec<u8>> {
        self.ancestor_blocks.lock().clone()
    }

    pub fn head_updates(&self) -> Vec<Slot> {
        self.head_updates.lock().clone()
    }

    fn verdict(&self) -> ValidationResult {
        self.verdict.lock().unwrap_or(ValidationResult::Accept)
    }
}

impl Processor for NullProcessor {
    fn on_gossip_block(&self, block: Vec<u8>) -> ValidationResult {
        self.gossip_blocks.lock().push(block);
        self.verdict()
    }

    fn on_gossip_aggregate(&self, aggregate: Vec<u8>) -> ValidationResult {
        self.gossip_aggregates.lock().push(aggregate);
        self.verdict()
    }

    fn on_gossip_attestation(&self, subnet_id: SubnetId, attestation: Vec<u8>) -> ValidationResult {
        self.gossip_attestations.lock().push((subnet_id, attestation));
        self.verdict()
    }

    fn on_gossip_voluntary_exit(&self, exit: Vec<u8>) -> ValidationResult {
        self.gossip_exits.lock().push(exit);
        self.verdict()
    }

    fn on_gossip_proposer_slashing(&self, slashing: Vec<u8>) -> ValidationResult {
        self.gossip_proposer_slashings.lock().push(slashing);
        self.verdict()
    }

    fn on_gossip_attester_slashing(&self, slashing: Vec<u8>) -> ValidationResult {
        self.gossip_attester_slashings.lock().push(slashing);
        self.verdict()
    }

    fn enqueue_ancestor_block(&self, block: Vec<u8>) {
        self.ancestor_blocks.lock().push(block);
    }

    fn update_head(&self, wall_slot: Slot) {
        self.head_updates.lock().push(wall_slot);
    }

    fn finalized_epoch(&self) -> Epoch {
        *self.finalized_epoch.lock()
    }
}

/// Validator duties driven entirely by the test.
#[derive(Default)]
pub struct TestDuties {
    subnets: Mutex<Option<BTreeSet<SubnetId>>>,
    duty_calls: Mutex<Vec<(Slot, Slot)>>,
}

impl TestDuties {
    /// Set the target subnets returned for every epoch; `None` models a node
    /// with no validators attached.
    pub fn set_subnets(&self, subnets: Option<BTreeSet<SubnetId>>) {
        *self.subnets.lock() = subnets;
    }

    pub fn duty_calls(&self) -> Vec<(Slot, Slot)> {
        self.duty_calls.lock().clone()
    }
}

#[async_trait]
impl ValidatorDuties for TestDuties {
    async fn handle_duties(&self, last_slot: Slot, wall_slot: Slot) {
        self.duty_calls.lock().push((last_slot, wall_slot));
    }

    fn subnets_for_epoch(&self, _epoch: Epoch) -> Option<BTreeSet<SubnetId>> {
        self.subnets.lock().clone()
    }
}

/// Sync-manager state settable by tests.
#[derive(Default)]
pub struct MockSync {
    queue_len: AtomicU64,
    syncing: AtomicBool,
}

impl MockSync {
    pub fn set_queue_len(&self, len: u64) {
        self.queue_len.store(len, Ordering::SeqCst);
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::SeqCst);
    }
}

impl SyncReader for MockSync {
    fn sync_queue_len(&self) -> u64 {
        self.queue_len.load(Ordering::SeqCst)
    }

    fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }
}

/// A fetcher that serves blocks from an in-memory map.
#[derive(Default)]
pub struct MockFetcher {
    blocks: Mutex<HashMap<Hash256, Vec<u8>>>,
    requests: Mutex<Vec<Vec<Hash256>>>,
    fail: AtomicBool,
}

impl MockFetcher {
    pub fn insert_block(&self, root: Hash256, block: Vec<u8>) {
        self.blocks.lock().insert(root, block);
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Vec<Hash256>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl BlockFetcher for MockFetcher {
    async fn blocks_by_root(&self, roots: &[Hash256]) -> Result<Vec<Vec<u8>>, String> {
        self.requests.lock().push(roots.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err("mock fetch failure".to_string());
        }
        let blocks = self.blocks.lock();
        Ok(roots
            .iter()
            .filter_map(|root| blocks.get(root).cloned())
            .collect())
    }
}

/// A fetcher for wiring paths where backfill never happens.
#[derive(Default)]
pub struct NullFetcher;

#[async_trait]
impl BlockFetcher for NullFetcher {
    async fn blocks_by_root(&self, _roots: &[Hash256]) -> Result<Vec<Vec<u8>>, String> {
        Ok(Vec::new())
    }
}
