use types::Slot;
use std::fmt;
use std::ops::Sub;
use std::time::Duration;

/// A signed offset from genesis with millisecond precision.
///
/// Negative values lie before genesis. Construction clamps rather than
/// overflows, so arithmetic on wildly wrong wall clocks stays defined.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BeaconTime(i64);

impl BeaconTime {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Offset of `now` from `genesis`, both measured from the UNIX epoch.
    pub fn from_durations(now: Duration, genesis: Duration) -> Self {
        let now = now.as_millis() as i128;
        let genesis = genesis.as_millis() as i128;
        Self((now - genesis).clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// The offset of the first instant of `slot`.
    pub fn at_slot_start(slot: Slot, genesis_slot: Slot, slot_duration: Duration) -> Self {
        let slots_since_genesis =
            slot.as_u64().saturating_sub(genesis_slot.as_u64()) as i128;
        let millis = slots_since_genesis * slot_duration.as_millis() as i128;
        Self(millis.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    pub fn min_value() -> Self {
        Self(i64::MIN)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    /// `true` once genesis has occurred.
    pub fn is_after_genesis(&self) -> bool {
        self.0 >= 0
    }

    /// The slot this offset falls in, together with whether genesis has
    /// occurred. Before genesis the slot reported is the genesis slot.
    pub fn to_slot(&self, slot_duration: Duration) -> (bool, Slot) {
        if self.0 < 0 {
            (false, Slot::new(0))
        } else {
            let slot = self.0 as u64 / slot_duration.as_millis() as u64;
            (true, Slot::new(slot))
        }
    }

    /// Converts to a wait duration, saturating at zero for offsets that are
    /// already in the past.
    pub fn saturating_wait(&self) -> Duration {
        if self.0 <= 0 {
            Duration::from_secs(0)
        } else {
            Duration::from_millis(self.0 as u64)
        }
    }
}

impl Sub for BeaconTime {
    type Output = BeaconTime;

    fn sub(self, rhs: BeaconTime) -> Self::Output {
        BeaconTime(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Debug for BeaconTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BeaconTime({}ms)", self.0)
    }
}
