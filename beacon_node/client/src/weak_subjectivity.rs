//! The weak-subjectivity safety window.
//!
//! A freshly-synced node can only trust a user-supplied checkpoint while the
//! validator set that signed it is still largely bonded; past that window,
//! equivocations become costless and the checkpoint must be refreshed.

use types::{ChainSpec, Checkpoint, Slot};

/// The weak-subjectivity period in epochs for a chain with the given number
/// of active validators.
///
/// All arithmetic is integer with truncation:
///
/// `wsp = MIN_VALIDATOR_WITHDRAWABILITY_DELAY + SAFETY_DECAY * Q / 200`
///
/// where `Q` saturates at the churn-limit quotient once the validator set is
/// large enough to churn at the cap.
pub fn weak_subjectivity_period(active_validators: u64, spec: &ChainSpec) -> u64 {
    let churn_saturation_count = spec
        .min_per_epoch_churn_limit
        .saturating_mul(spec.churn_limit_quotient);

    let quotient = if active_validators >= churn_saturation_count {
        spec.churn_limit_quotient
    } else {
        active_validators / spec.min_per_epoch_churn_limit
    };

    spec.min_validator_withdrawability_delay
        .saturating_add(spec.safety_decay.saturating_mul(quotient) / 200)
}

/// Whether `checkpoint` is still recent enough to anchor a sync at
/// `current_slot`.
pub fn is_within_weak_subjectivity_period(
    current_slot: Slot,
    active_validators: u64,
    checkpoint: &Checkpoint,
    slots_per_epoch: u64,
    spec: &ChainSpec,
) -> bool {
    let period = weak_subjectivity_period(active_validators, spec);
    let current_epoch = current_slot.epoch(slots_per_epoch);

    current_epoch.as_u64() <= checkpoint.epoch.as_u64().saturating_add(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Epoch, Hash256};

    #[test]
    fn zero_validators_degenerates_to_withdrawability_delay() {
        let spec = ChainSpec::mainnet();
        assert_eq!(
            weak_subjectivity_period(0, &spec),
            spec.min_validator_withdrawability_delay
        );
    }

    #[test]
    fn small_validator_sets_truncate() {
        let spec = ChainSpec::mainnet();
        // 7 / 4 = 1 with truncation; 10 * 1 / 200 = 0.
        assert_eq!(weak_subjectivity_period(7, &spec), 256);
        // 8192 / 4 = 2048; 10 * 2048 / 200 = 102.
        assert_eq!(weak_subjectivity_period(8_192, &spec), 256 + 102);
    }

    #[test]
    fn saturated_churn_uses_the_quotient() {
        let spec = ChainSpec::mainnet();
        let saturated = spec.min_per_epoch_churn_limit * spec.churn_limit_quotient;
        // 10 * 65536 / 200 = 3276.
        assert_eq!(weak_subjectivity_period(saturated, &spec), 256 + 3_276);
        assert_eq!(
            weak_subjectivity_period(saturated * 10, &spec),
            256 + 3_276
        );
    }

    #[test]
    fn staleness_boundary() {
        let spec = ChainSpec::mainnet();
        let checkpoint = Checkpoint {
            epoch: Epoch::new(100),
            root: Hash256::repeat_byte(1),
        };
        let period = weak_subjectivity_period(0, &spec);
        let last_good_epoch = 100 + period;

        let slot_at = |epoch: u64| Epoch::new(epoch).start_slot(32);

        assert!(is_within_weak_subjectivity_period(
            slot_at(last_good_epoch),
            0,
            &checkpoint,
            32,
            &spec,
        ));
        assert!(!is_within_weak_subjectivity_period(
            slot_at(last_good_epoch + 1),
            0,
            &checkpoint,
            32,
            &spec,
        ));
    }
}
