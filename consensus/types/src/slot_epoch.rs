//! `Slot` and `Epoch` are newtypes over `u64` to enforce type-safety between
//! the two units of protocol time.
//!
//! All math operations are saturating; slot arithmetic never wraps.

use serde_derive::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(u64);

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Slot {
    pub const fn new(slot: u64) -> Slot {
        Slot(slot)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    pub fn epoch(self, slots_per_epoch: u64) -> Epoch {
        Epoch::new(self.0 / slots_per_epoch)
    }

    pub fn saturating_sub(self, other: Slot) -> Slot {
        Slot(self.0.saturating_sub(other.0))
    }

    pub fn max_value() -> Slot {
        Slot(u64::MAX)
    }
}

impl Epoch {
    pub const fn new(epoch: u64) -> Epoch {
        Epoch(epoch)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The first slot in the epoch.
    pub fn start_slot(self, slots_per_epoch: u64) -> Slot {
        Slot(self.0.saturating_mul(slots_per_epoch))
    }

    /// The last slot in the epoch.
    pub fn end_slot(self, slots_per_epoch: u64) -> Slot {
        Slot(
            self.0
                .saturating_mul(slots_per_epoch)
                .saturating_add(slots_per_epoch.saturating_sub(1)),
        )
    }

    pub fn saturating_sub(self, other: Epoch) -> Epoch {
        Epoch(self.0.saturating_sub(other.0))
    }

    pub fn max_value() -> Epoch {
        Epoch(u64::MAX)
    }
}

macro_rules! impl_common {
    ($type: ident) => {
        impl From<u64> for $type {
            fn from(x: u64) -> Self {
                $type(x)
            }
        }

        impl From<$type> for u64 {
            fn from(x: $type) -> u64 {
                x.0
            }
        }

        impl Add<u64> for $type {
            type Output = $type;

            fn add(self, rhs: u64) -> Self::Output {
                $type(self.0.saturating_add(rhs))
            }
        }

        impl AddAssign<u64> for $type {
            fn add_assign(&mut self, rhs: u64) {
                self.0 = self.0.saturating_add(rhs);
            }
        }

        impl Add<$type> for $type {
            type Output = $type;

            fn add(self, rhs: $type) -> Self::Output {
                $type(self.0.saturating_add(rhs.0))
            }
        }

        impl Sub<u64> for $type {
            type Output = $type;

            fn sub(self, rhs: u64) -> Self::Output {
                $type(self.0.saturating_sub(rhs))
            }
        }

        impl PartialEq<u64> for $type {
            fn eq(&self, other: &u64) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $type {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($type), self.0)
            }
        }

        impl Encode for $type {
            fn is_ssz_fixed_len() -> bool {
                <u64 as Encode>::is_ssz_fixed_len()
            }

            fn ssz_fixed_len() -> usize {
                <u64 as Encode>::ssz_fixed_len()
            }

            fn ssz_bytes_len(&self) -> usize {
                self.0.ssz_bytes_len()
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                self.0.ssz_append(buf)
            }
        }

        impl Decode for $type {
            fn is_ssz_fixed_len() -> bool {
                <u64 as Decode>::is_ssz_fixed_len()
            }

            fn ssz_fixed_len() -> usize {
                <u64 as Decode>::ssz_fixed_len()
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                u64::from_ssz_bytes(bytes).map($type)
            }
        }
    };
}

impl_common!(Slot);
impl_common!(Epoch);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_to_epoch() {
        let slots_per_epoch = 32;

        assert_eq!(Slot::new(0).epoch(slots_per_epoch), Epoch::new(0));
        assert_eq!(Slot::new(31).epoch(slots_per_epoch), Epoch::new(0));
        assert_eq!(Slot::new(32).epoch(slots_per_epoch), Epoch::new(1));
        assert_eq!(Slot::new(12_000).epoch(slots_per_epoch), Epoch::new(375));
    }

    #[test]
    fn epoch_start_end() {
        let slots_per_epoch = 8;

        let epoch = Epoch::new(0);
        assert_eq!(epoch.start_slot(slots_per_epoch), Slot::new(0));
        assert_eq!(epoch.end_slot(slots_per_epoch), Slot::new(7));

        let epoch = Epoch::new(3);
        assert_eq!(epoch.start_slot(slots_per_epoch), Slot::new(24));
        assert_eq!(epoch.end_slot(slots_per_epoch), Slot::new(31));
    }

    #[test]
    fn saturating_math() {
        assert_eq!(Slot::new(1).saturating_sub(Slot::new(5)), Slot::new(0));
        assert_eq!(Slot::max_value() + 1, Slot::max_value());
        assert_eq!(Epoch::new(2) - 7, Epoch::new(0));
    }

    #[test]
    fn ssz_round_trip() {
        let slot = Slot::new(u64::MAX);
        assert_eq!(slot.as_ssz_bytes(), vec![255; 8]);
        assert_eq!(Slot::from_ssz_bytes(&slot.as_ssz_bytes()).unwrap(), slot);
    }
}
