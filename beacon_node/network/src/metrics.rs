pub use beacon_metrics::*;
use lazy_static::lazy_static;

lazy_static! {
    /*
     * Gossip
     */
    pub static ref GOSSIP_BLOCKS_RX: Result<IntCounter> = try_create_int_counter(
        "network_gossip_blocks_rx_total",
        "Count of gossip blocks received"
    );
    pub static ref GOSSIP_UNAGGREGATED_ATTESTATIONS_RX: Result<IntCounter> = try_create_int_counter(
        "network_gossip_unaggregated_attestations_rx_total",
        "Count of gossip unaggregated attestations received"
    );
    pub static ref GOSSIP_AGGREGATED_ATTESTATIONS_RX: Result<IntCounter> = try_create_int_counter(
        "network_gossip_aggregated_attestations_rx_total",
        "Count of gossip aggregated attestations received"
    );
    pub static ref GOSSIP_ENABLED: Result<IntGauge> = try_create_int_gauge(
        "network_gossip_enabled",
        "Whether the full gossip topic set is currently subscribed"
    );

    /*
     * Subnets
     */
    pub static ref SUBNET_SUBSCRIPTIONS: Result<IntGauge> = try_create_int_gauge(
        "network_attestation_subnet_subscriptions",
        "Number of attestation subnets the node is subscribed to"
    );
    pub static ref METADATA_SEQ_NUMBER: Result<IntGauge> = try_create_int_gauge(
        "network_metadata_seq_number",
        "Sequence number advertised with the local metadata record"
    );

    /*
     * Sync
     */
    pub static ref SYNC_QUEUE_LENGTH: Result<IntGauge> = try_create_int_gauge(
        "network_sync_queue_length",
        "Slots of queued work reported by the sync manager"
    );
    pub static ref ANCESTOR_BLOCK_REQUESTS: Result<IntCounter> = try_create_int_counter(
        "network_ancestor_block_requests_total",
        "Count of missing-ancestor roots dispatched for fetching"
    );
}
