pub use beacon_metrics::*;
use lazy_static::lazy_static;

lazy_static! {
    pub static ref BEACON_SLOT: Result<IntGauge> =
        try_create_int_gauge("beacon_slot", "Latest slot processed by the slot timer");
    pub static ref FINALIZATION_DELAY: Result<IntGauge> = try_create_int_gauge(
        "beacon_finalization_delay",
        "Epochs between the scheduled slot and the finalized epoch"
    );
    pub static ref TICKS_DELAY: Result<IntGauge> = try_create_int_gauge(
        "ticks_delay",
        "Milliseconds the second ticker woke after its scheduled time"
    );
    pub static ref CLOCK_REGRESSIONS: Result<IntCounter> = try_create_int_counter(
        "slot_clock_regressions_total",
        "Count of slot ticks that observed the wall clock going backwards"
    );
    pub static ref SLOT_TICKS_SKIPPED: Result<IntCounter> = try_create_int_counter(
        "slot_ticks_skipped_total",
        "Count of slot ticks abandoned after falling more than an epoch behind"
    );
}
