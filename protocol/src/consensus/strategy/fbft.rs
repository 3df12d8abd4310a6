//! Grounded on `friday_fbft.go`: the same VRF-based election as `VrfBls`,
//! but the elected producer also acts as round leader — after collecting
//! `Prepare`/`Commit` votes it aggregates them into single BLS signatures
//! and broadcasts `Prepared`/`Committed`, so followers verify one aggregate
//! instead of `N` individual signatures. Quorum is the standard BFT
//! threshold, `quorum() = numValidators*2/3 + 1`.

use super::{ConsensusKind, VotingStrategy};

pub struct FbftStrategy;

impl VotingStrategy for FbftStrategy {
    fn kind(&self) -> ConsensusKind {
        ConsensusKind::Fbft
    }

    fn quorum(&self, num_validators: u32) -> usize {
        (num_validators as usize * 2) / 3 + 1
    }

    fn requires_bls(&self) -> bool {
        true
    }
}
