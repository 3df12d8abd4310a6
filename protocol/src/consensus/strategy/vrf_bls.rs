//! Grounded on `friday_vrf.go`: the producer is elected via VRF
//! (`consensus::election::elect_producer`), and every prepare/commit vote
//! carries an individually-verified BLS signature over the block hash —
//! `collectSignatures` rejects the whole round if any one signature fails to
//! verify. Quorum is every validator; there is no leader aggregation step.

use super::{ConsensusKind, VotingStrategy};

pub struct VrfBlsStrategy;

impl VotingStrategy for VrfBlsStrategy {
    fn kind(&self) -> ConsensusKind {
        ConsensusKind::VrfBls
    }

    fn quorum(&self, num_validators: u32) -> usize {
        num_validators as usize
    }

    fn requires_bls(&self) -> bool {
        true
    }
}
