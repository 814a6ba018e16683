use ssz_derive::{Decode, Encode};
use ssz_types::BitVector;
use types::{EthSpec, SubnetId};

/// The attestation subnet bitfield advertised in the ENR and metadata record.
pub type EnrAttestationBitfield<E> = BitVector<<E as EthSpec>::SubnetBitfieldLength>;

/// The node metadata record exchanged with peers.
///
/// `seq_number` must strictly increase every time `attnets` changes, so
/// peers can order competing copies of the record.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct MetaData<E: EthSpec> {
    pub seq_number: u64,
    pub attnets: EnrAttestationBitfield<E>,
}

impl<E: EthSpec> Default for MetaData<E> {
    fn default() -> Self {
        Self {
            seq_number: 0,
            attnets: EnrAttestationBitfield::<E>::default(),
        }
    }
}

impl<E: EthSpec> MetaData<E> {
    /// Whether the bit for `subnet_id` is set.
    ///
    /// Out-of-range ids read as unset.
    pub fn attnet(&self, subnet_id: SubnetId) -> bool {
        self.attnets.get(*subnet_id as usize).unwrap_or(false)
    }

    /// Sets or clears the bit for `subnet_id`, returning `true` if the
    /// bitfield changed. Out-of-range ids are ignored.
    pub fn set_attnet(&mut self, subnet_id: SubnetId, value: bool) -> bool {
        let index = *subnet_id as usize;
        let previous = self.attnets.get(index).unwrap_or(value);
        if previous != value && self.attnets.set(index, value).is_ok() {
            return true;
        }
        false
    }

    /// The number of set bits.
    pub fn attnets_count(&self) -> usize {
        self.attnets.iter().filter(|bit| *bit).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::MainnetEthSpec;

    #[test]
    fn set_attnet_reports_changes() {
        let mut meta = MetaData::<MainnetEthSpec>::default();

        assert!(meta.set_attnet(SubnetId::new(3), true));
        // Setting an already-set bit is not a change.
        assert!(!meta.set_attnet(SubnetId::new(3), true));
        assert!(meta.attnet(SubnetId::new(3)));
        assert_eq!(meta.attnets_count(), 1);

        assert!(meta.set_attnet(SubnetId::new(3), false));
        assert_eq!(meta.attnets_count(), 0);
    }

    #[test]
    fn out_of_range_bits_are_ignored() {
        let mut meta = MetaData::<MainnetEthSpec>::default();
        assert!(!meta.set_attnet(SubnetId::new(64), true));
        assert!(!meta.attnet(SubnetId::new(64)));
    }
}
