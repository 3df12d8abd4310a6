//! # Block and VRF Message
//!
//! A block carries just enough to drive the next round's election and to be
//! checked against a SHA-256 digest of its own header: height, timestamp,
//! the producer that was elected to build it, and the VRF message that both
//! proves the election was fair and seeds the election for `height + 1`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::VrfPublicKey;

use super::ValidatorId;

/// The randomness and proof that ties a block to the VRF-based election that
/// chose its producer. Embedded in every block so the next round can verify
/// and re-derive a new election value from it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct VrfMessage {
    /// 32-byte VRF output. Its low 4 bytes (little-endian) select the next producer.
    pub rand: [u8; 32],
    /// Proof that `rand` was honestly derived from `previous_proposer_pubkey`
    /// and the referenced block's hash.
    pub proof: Vec<u8>,
    pub previous_proposer_id: ValidatorId,
    pub previous_proposer_pubkey: VrfPublicKey,
    /// Height of the block whose hash was the VRF input. Zero for the
    /// bootstrap message embedded in the genesis block, which is never verified.
    pub previous_block_height: u64,
}

impl VrfMessage {
    /// The sentinel VRF message embedded in the genesis block. Carries no
    /// real randomness — genesis producer selection is not elected, it is
    /// the fixed bootstrap validator (§4.5).
    pub fn genesis() -> Self {
        Self {
            rand: [0u8; 32],
            proof: Vec::new(),
            previous_proposer_id: 0,
            previous_proposer_pubkey: VrfPublicKey::from_bytes([0u8; 32]),
            previous_block_height: 0,
        }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.rand);
        buf.extend_from_slice(&(self.proof.len() as u64).to_le_bytes());
        buf.extend_from_slice(&self.proof);
        buf.extend_from_slice(&self.previous_proposer_id.to_le_bytes());
        buf.extend_from_slice(self.previous_proposer_pubkey.as_bytes());
        buf.extend_from_slice(&self.previous_block_height.to_le_bytes());
    }
}

/// An immutable consensus block. Once `hash` is assigned at construction, no
/// field is ever mutated again.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    /// Nanoseconds since the Unix epoch; equals the scheduled round boundary.
    pub timestamp: i64,
    pub producer: ValidatorId,
    pub vrf_message: VrfMessage,
    pub hash: [u8; 32],
}

impl Block {
    /// Builds a new block and computes its header hash. `height` is the
    /// caller's responsibility to set to `parent_height + 1`.
    pub fn new(height: u64, timestamp: i64, producer: ValidatorId, vrf_message: VrfMessage) -> Self {
        let hash = Self::digest(height, timestamp, producer, &vrf_message);
        Self {
            height,
            timestamp,
            producer,
            vrf_message,
            hash,
        }
    }

    /// The genesis block: height 0, producer 0 (nobody), a sentinel VRF message.
    pub fn genesis(timestamp: i64) -> Self {
        Self::new(0, timestamp, 0, VrfMessage::genesis())
    }

    /// SHA-256 over the canonical header encoding, per §6: fixed-order
    /// concatenation of height, timestamp, producer, and the VRF message.
    pub fn digest(height: u64, timestamp: i64, producer: ValidatorId, vrf: &VrfMessage) -> [u8; 32] {
        let mut preimage = Vec::with_capacity(96 + vrf.proof.len());
        preimage.extend_from_slice(&height.to_le_bytes());
        preimage.extend_from_slice(&timestamp.to_le_bytes());
        preimage.extend_from_slice(&producer.to_le_bytes());
        vrf.encode(&mut preimage);

        let digest = Sha256::digest(&preimage);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    /// Recomputes the header hash from the block's current fields. Used by
    /// `validate_block` to reject tampered blocks (S6).
    pub fn recompute_hash(&self) -> [u8; 32] {
        Self::digest(self.height, self.timestamp, self.producer, &self.vrf_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_height_zero_and_producer_zero() {
        let g = Block::genesis(0);
        assert_eq!(g.height, 0);
        assert_eq!(g.producer, 0);
    }

    #[test]
    fn hash_matches_digest_of_fields() {
        let b = Block::new(1, 1_000, 3, VrfMessage::genesis());
        assert_eq!(b.hash, b.recompute_hash());
    }

    #[test]
    fn hash_is_deterministic() {
        let b1 = Block::new(5, 42, 2, VrfMessage::genesis());
        let b2 = Block::new(5, 42, 2, VrfMessage::genesis());
        assert_eq!(b1.hash, b2.hash);
    }

    #[test]
    fn different_producer_changes_hash() {
        let b1 = Block::new(5, 42, 1, VrfMessage::genesis());
        let b2 = Block::new(5, 42, 2, VrfMessage::genesis());
        assert_ne!(b1.hash, b2.hash);
    }

    #[test]
    fn tampering_with_timestamp_breaks_hash_check() {
        let mut b = Block::new(1, 1_000, 1, VrfMessage::genesis());
        b.timestamp += 1;
        assert_ne!(b.hash, b.recompute_hash());
    }
}
