//! Periodic progress logging, so an operator can see at a glance whether
//! the node is keeping up with the chain.

use crate::ChainDag;
use network::{GossipNetwork, NodeTypes, SyncReader};
use slog::{info, o};
use slot_clock::SlotClock;
use std::sync::Arc;
use task_executor::TaskExecutor;

/// Spawns a task that logs the node's status once per slot.
pub fn spawn_notifier<T: NodeTypes>(
    executor: &TaskExecutor,
    clock: T::SlotClock,
    dag: Arc<dyn ChainDag>,
    gossip: Arc<T::Gossip>,
    sync: Arc<T::Sync>,
) -> Result<(), &'static str> {
    let log = executor.log().new(o!("service" => "notifier"));
    let interval = clock.slot_duration();

    let notifier = async move {
        loop {
            tokio::time::sleep(interval).await;

            let wall_slot = clock.now_or_genesis();
            let head = dag.head();
            let distance = wall_slot.saturating_sub(head.slot);

            if sync.is_syncing() {
                info!(
                    log, "Syncing";
                    "slot" => %wall_slot,
                    "distance" => %distance,
                    "sync_queue_len" => sync.sync_queue_len(),
                    "peers" => gossip.connected_peers(),
                );
            } else {
                info!(
                    log, "Synced";
                    "slot" => %wall_slot,
                    "head" => %head.root,
                    "finalized_epoch" => %dag.finalized_epoch(),
                    "peers" => gossip.connected_peers(),
                );
            }
        }
    };

    executor.spawn(notifier, "notifier");
    Ok(())
}
