//! # Votes
//!
//! The original source's signature carried an `interface{}` payload keyed
//! on a two-variant `Kind`. Per the REDESIGN FLAGS, both are closed sum
//! types here: `VoteKind` enumerates the four phases a vote can belong to,
//! and `VotePayload` enumerates the three concrete payload shapes the three
//! voting strategies produce.

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use super::ValidatorId;

/// Which phase a vote belongs to. `Prepare`/`Commit` are per-validator votes;
/// `Prepared`/`Committed` are leader-broadcast aggregates (FBFT only).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum VoteKind {
    Prepare,
    Prepared,
    Commit,
    Committed,
}

impl VoteKind {
    /// Fixed cardinality, used to size the outer dimension of the
    /// `SignaturePool`'s bucket map.
    pub const ALL: [VoteKind; 4] = [
        VoteKind::Prepare,
        VoteKind::Prepared,
        VoteKind::Commit,
        VoteKind::Committed,
    ];
}

/// The payload a vote carries, opaque to the `SignaturePool` and interpreted
/// only by the active voting strategy.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum VotePayload {
    /// Simple strategy: a signed integer drawn from a per-validator RNG.
    RngNumber(i32),
    /// VRF+per-vote-BLS and FBFT per-validator votes: a BLS signature.
    BlsSig(#[serde(with = "BigArray")] [u8; 48]),
    /// FBFT leader aggregate: summed signature and summed public key.
    Aggregate {
        #[serde(with = "BigArray")]
        sig: [u8; 48],
        #[serde(with = "BigArray")]
        pubkey: [u8; 96],
    },
}

/// A single vote: who cast it, what phase it belongs to, at what height,
/// carrying what payload.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Vote {
    pub id: ValidatorId,
    pub kind: VoteKind,
    pub block_height: u64,
    pub payload: VotePayload,
}

impl Vote {
    pub fn new(id: ValidatorId, kind: VoteKind, block_height: u64, payload: VotePayload) -> Self {
        Self {
            id,
            kind,
            block_height,
            payload,
        }
    }
}
