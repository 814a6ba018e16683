//! Interfaces to the block/attestation processor and the validator client.
//!
//! The processor owns the fork-choice store and the verification queues; the
//! orchestration layer only feeds it payloads and pokes it once per slot.

use async_trait::async_trait;
use std::collections::BTreeSet;
use types::{Epoch, Slot, SubnetId};

/// The verdict returned to the gossip substrate for a received payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    /// The payload is valid and should be propagated to peers.
    Accept,
    /// The payload is invalid; the sender should be penalised.
    Reject,
    /// The payload is not (or not yet) relevant; drop without penalty.
    Ignore,
}

/// The block/attestation processor.
pub trait Processor: Send + Sync + 'static {
    fn on_gossip_block(&self, block: Vec<u8>) -> ValidationResult;

    fn on_gossip_aggregate(&self, aggregate: Vec<u8>) -> ValidationResult;

    fn on_gossip_attestation(&self, subnet_id: SubnetId, attestation: Vec<u8>) -> ValidationResult;

    fn on_gossip_voluntary_exit(&self, exit: Vec<u8>) -> ValidationResult;

    fn on_gossip_proposer_slashing(&self, slashing: Vec<u8>) -> ValidationResult;

    fn on_gossip_attester_slashing(&self, slashing: Vec<u8>) -> ValidationResult;

    /// Queue a block fetched during ancestor backfill. The processor applies
    /// it through the same verification pipeline as gossip blocks.
    fn enqueue_ancestor_block(&self, block: Vec<u8>);

    /// Recompute fork choice for the given wall slot, possibly moving the
    /// chain head.
    fn update_head(&self, wall_slot: Slot);

    /// The most recently finalized epoch.
    fn finalized_epoch(&self) -> Epoch;
}

/// The validator-duty side of the node.
#[async_trait]
pub trait ValidatorDuties: Send + Sync + 'static {
    /// Perform the duties falling between `last_slot` (exclusive) and
    /// `wall_slot` (inclusive). May suspend internally, e.g. while waiting
    /// for the aggregation point within the slot, but completes before the
    /// caller proceeds.
    async fn handle_duties(&self, last_slot: Slot, wall_slot: Slot);

    /// The attestation subnets the attached validators need during `epoch`,
    /// or `None` when no validators are attached.
    fn subnets_for_epoch(&self, epoch: Epoch) -> Option<BTreeSet<SubnetId>>;
}
