//! # Producer Election
//!
//! Mirrors `getBlockProducerIDByHeight` from the original source: the
//! producer for `height` is derived from the VRF message embedded in the
//! block at `height - 1`, verified against the hash of whatever earlier
//! block that VRF message was computed over. Height 0 (genesis) has no
//! predecessor to elect from, so the bootstrap validator — ID 1 — produces
//! it unconditionally, matching the Go source's `chosenNumber =
//! fridaytypes.ID(1)` special case.

use thiserror::Error;

use crate::crypto::proof_to_hash;

use super::block::VrfMessage;
use super::ValidatorId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElectionError {
    #[error("VRF proof does not verify against the referenced block's hash")]
    InvalidVrf,
    #[error("VRF message references block {0} but its hash was not supplied")]
    MissingReferencedBlock(u64),
}

/// Elects the producer for `height`, given the VRF message carried by the
/// block at `height - 1` and, if that message references an earlier block
/// (anything past the genesis bootstrap), that referenced block's hash.
pub fn elect_producer(
    height: u64,
    vrf_message: &VrfMessage,
    referenced_hash: Option<[u8; 32]>,
    num_validators: u32,
) -> Result<ValidatorId, ElectionError> {
    if height == 0 {
        return Ok(1);
    }

    if vrf_message.previous_block_height != 0 {
        let hash = referenced_hash
            .ok_or(ElectionError::MissingReferencedBlock(vrf_message.previous_block_height))?;
        let recomputed = proof_to_hash(
            &vrf_message.previous_proposer_pubkey,
            &hash,
            &vrf_message.proof,
        )
        .map_err(|_| ElectionError::InvalidVrf)?;
        if recomputed != vrf_message.rand {
            return Err(ElectionError::InvalidVrf);
        }
    }

    let chosen = u32::from_le_bytes(vrf_message.rand[0..4].try_into().unwrap());
    Ok(chosen % num_validators + 1)
}
