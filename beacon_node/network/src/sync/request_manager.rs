//! Fetches missing ancestor blocks by root and feeds them to the processor.

use crate::metrics;
use crate::processor::Processor;
use crate::sync::BlockFetcher;
use crate::NodeTypes;
use beacon_metrics::inc_counter_by;
use futures::future::join_all;
use slog::{debug, o, warn};
use std::sync::Arc;
use types::Hash256;

/// The number of peers a batch of missing roots is spread across.
pub const PARALLEL_REQUESTS: usize = 2;

pub struct RequestManager<T: NodeTypes> {
    fetcher: Arc<T::Fetcher>,
    processor: Arc<T::Processor>,
    log: slog::Logger,
}

impl<T: NodeTypes> RequestManager<T> {
    pub fn new(
        fetcher: Arc<T::Fetcher>,
        processor: Arc<T::Processor>,
        log: &slog::Logger,
    ) -> Self {
        Self {
            fetcher,
            processor,
            log: log.new(o!("service" => "request_manager")),
        }
    }

    /// Issue peer-parallel by-root requests for the given roots.
    ///
    /// Fetched blocks are queued with the processor, which imports them
    /// through the same verification pipeline as every other block; nothing
    /// is written to the chain from here. Failures are transient: the
    /// quarantine will surface unresolved roots again.
    pub async fn fetch_ancestor_blocks(&self, roots: Vec<Hash256>) {
        if roots.is_empty() {
            return;
        }

        debug!(
            self.log, "Requesting detected missing blocks";
            "roots" => roots.len(),
        );
        inc_counter_by(&metrics::ANCESTOR_BLOCK_REQUESTS, roots.len() as u64);

        let per_request = (roots.len() + PARALLEL_REQUESTS - 1) / PARALLEL_REQUESTS;
        let results = join_all(
            roots
                .chunks(per_request)
                .map(|chunk| self.fetcher.blocks_by_root(chunk)),
        )
        .await;

        for result in results {
            match result {
                Ok(blocks) => {
                    for block in blocks {
                        self.processor.enqueue_ancestor_block(block);
                    }
                }
                Err(e) => {
                    warn!(self.log, "Failed to receive blocks by root"; "error" => e);
                }
            }
        }
    }
}
