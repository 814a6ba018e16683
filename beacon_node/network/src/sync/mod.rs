//! The coupling between the quarantine of parent-less blocks and the
//! by-root backfill requests that resolve them.
//!
//! Range sync itself is driven by the external sync manager; this module
//! only reads its state.

pub mod quarantine;
pub mod request_manager;

pub use quarantine::Quarantine;
pub use request_manager::RequestManager;

use async_trait::async_trait;
use types::Hash256;

/// Read-only view of the external sync manager.
pub trait SyncReader: Send + Sync + 'static {
    /// The number of slots of queued work in the sync manager.
    ///
    /// May report pathological values when the queue underflows; consumers
    /// are expected to filter.
    fn sync_queue_len(&self) -> u64;

    /// Whether a forward sync is in progress.
    fn is_syncing(&self) -> bool;
}

/// Issues by-root block requests to peers.
#[async_trait]
pub trait BlockFetcher: Send + Sync + 'static {
    /// Request the given blocks from a suitable peer, returning whichever
    /// could be fetched as opaque SSZ bytes.
    async fn blocks_by_root(&self, roots: &[Hash256]) -> Result<Vec<Vec<u8>>, String>;
}
