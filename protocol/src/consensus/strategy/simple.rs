//! Grounded on `friday_bls.go`: despite its filename, this strategy never
//! touches BLS — `produce` elects via `getRandomNumberFromSignatures`, a sum
//! of the confirmed round's per-validator RNG draws mod `numValidators`, and
//! `prepare`/`finalize` carry a signed integer payload (`prepare` sends a
//! dummy `-1`, `finalize` sends a real draw from `status.GetRandom()`).

use super::{ConsensusKind, VotingStrategy};

pub struct SimpleStrategy;

impl VotingStrategy for SimpleStrategy {
    fn kind(&self) -> ConsensusKind {
        ConsensusKind::Simple
    }

    fn quorum(&self, num_validators: u32) -> usize {
        num_validators as usize
    }

    fn requires_bls(&self) -> bool {
        false
    }
}
