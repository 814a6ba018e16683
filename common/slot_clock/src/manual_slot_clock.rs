use super::SlotClock;
use parking_lot::RwLock;
use std::convert::TryInto;
use std::time::Duration;
use types::Slot;

/// Determines the present slot based upon a manually-set UNIX timestamp.
pub struct ManualSlotClock {
    genesis_slot: Slot,
    /// Duration from UNIX epoch to genesis.
    genesis_duration: Duration,
    /// Duration from UNIX epoch to right now.
    current_time: RwLock<Duration>,
    /// The length of each slot.
    slot_duration: Duration,
}

impl Clone for ManualSlotClock {
    fn clone(&self) -> Self {
        ManualSlotClock {
            genesis_slot: self.genesis_slot,
            genesis_duration: self.genesis_duration,
            current_time: RwLock::new(*self.current_time.read()),
            slot_duration: self.slot_duration,
        }
    }
}

impl ManualSlotClock {
    pub fn set_slot(&self, slot: u64) {
        let slots_since_genesis: u32 = slot
            .checked_sub(self.genesis_slot.as_u64())
            .expect("slot must be post-genesis")
            .try_into()
            .expect("slot must fit within a u32");
        *self.current_time.write() =
            self.genesis_duration + self.slot_duration * slots_since_genesis;
    }

    pub fn advance_slot(&self) {
        self.set_slot(self.now().expect("clock must be post-genesis").as_u64() + 1)
    }

    /// Sets the raw wall time, which may lie before genesis.
    pub fn set_current_time(&self, duration: Duration) {
        *self.current_time.write() = duration;
    }

    /// Rewinds the wall time, for exercising clock-regression handling.
    pub fn rewind(&self, duration: Duration) {
        let current = *self.current_time.read();
        *self.current_time.write() = current.saturating_sub(duration);
    }

    pub fn advance_time(&self, duration: Duration) {
        let current = *self.current_time.read();
        *self.current_time.write() = current + duration;
    }
}

impl SlotClock for ManualSlotClock {
    fn new(genesis_slot: Slot, genesis_duration: Duration, slot_duration: Duration) -> Self {
        if slot_duration.as_millis() == 0 {
            panic!("ManualSlotClock cannot have a < 1ms slot duration");
        }

        Self {
            genesis_slot,
            current_time: RwLock::new(genesis_duration),
            genesis_duration,
            slot_duration,
        }
    }

    fn now(&self) -> Option<Slot> {
        self.slot_of(*self.current_time.read())
    }

    fn now_duration(&self) -> Option<Duration> {
        Some(*self.current_time.read())
    }

    fn slot_of(&self, now: Duration) -> Option<Slot> {
        let genesis = self.genesis_duration;

        if now >= genesis {
            let since_genesis = now
                .checked_sub(genesis)
                .expect("Control flow ensures now is greater than or equal to genesis");
            let slot =
                Slot::new((since_genesis.as_millis() / self.slot_duration.as_millis()) as u64);
            Some(slot + self.genesis_slot)
        } else {
            None
        }
    }

    fn duration_to_next_slot(&self) -> Option<Duration> {
        let now = *self.current_time.read();
        let genesis = self.genesis_duration;

        if now >= genesis {
            let slot = self.slot_of(now)?.saturating_sub(self.genesis_slot);
            let next_start = genesis + self.slot_duration * (slot.as_u64() as u32 + 1);
            Some(
                next_start
                    .checked_sub(now)
                    .expect("The next slot cannot start before now"),
            )
        } else {
            Some(
                genesis
                    .checked_sub(now)
                    .expect("Control flow ensures genesis is greater than or equal to now"),
            )
        }
    }

    fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    fn genesis_slot(&self) -> Slot {
        self.genesis_slot
    }

    fn genesis_duration(&self) -> Duration {
        self.genesis_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_now() {
        let clock = ManualSlotClock::new(
            Slot::new(10),
            Duration::from_secs(0),
            Duration::from_secs(1),
        );
        assert_eq!(clock.now(), Some(Slot::new(10)));
        clock.set_slot(123);
        assert_eq!(clock.now(), Some(Slot::new(123)));
    }

    #[test]
    fn rewound_clock_reports_earlier_slot() {
        let clock = ManualSlotClock::new(
            Slot::new(0),
            Duration::from_secs(100),
            Duration::from_secs(1),
        );
        clock.set_slot(50);
        assert_eq!(clock.now(), Some(Slot::new(50)));

        clock.rewind(Duration::from_secs(3));
        assert_eq!(clock.now(), Some(Slot::new(47)));

        // Rewinding past genesis leaves the clock pre-genesis.
        clock.rewind(Duration::from_secs(1_000));
        assert_eq!(clock.now(), None);
        assert_eq!(clock.now_or_genesis(), Slot::new(0));
    }

    #[test]
    fn time_until_is_signed() {
        let clock = ManualSlotClock::new(
            Slot::new(0),
            Duration::from_secs(0),
            Duration::from_secs(12),
        );
        clock.set_slot(10);

        assert_eq!(clock.time_until(Slot::new(11)).millis(), 12_000);
        assert_eq!(clock.time_until(Slot::new(10)).millis(), 0);
        assert!(clock.time_until(Slot::new(9)).millis() < 0);
    }
}
