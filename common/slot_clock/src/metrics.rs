use crate::SlotClock;
use beacon_metrics::*;
use lazy_static::lazy_static;

lazy_static! {
    pub static ref PRESENT_SLOT: Result<IntGauge> = try_create_int_gauge(
        "slotclock_present_slot",
        "The present wall-clock slot, zero before genesis"
    );
    pub static ref PRESENT_EPOCH: Result<IntGauge> = try_create_int_gauge(
        "slotclock_present_epoch",
        "The present wall-clock epoch, zero before genesis"
    );
}

/// Update the global metrics `DEFAULT_REGISTRY` with the current slot.
pub fn scrape_for_metrics<C: SlotClock>(clock: &C, slots_per_epoch: u64) {
    let present_slot = clock.now_or_genesis();
    set_gauge(&PRESENT_SLOT, present_slot.as_u64() as i64);
    set_gauge(
        &PRESENT_EPOCH,
        present_slot.epoch(slots_per_epoch).as_u64() as i64,
    );
}
