//! # Persistent Store
//!
//! A direct translation of the original source's `persistent.Persistent`: an
//! in-memory, append-only record of finalized blocks and the votes that
//! finalized them. Real persistence media (sled, a file format, replication)
//! are out of scope here (§1) — this is the narrow interface `Status`
//! finalizes through, nothing more.

use parking_lot::RwLock;
use thiserror::Error;

use super::{Block, Vote};

/// Errors raised while appending to the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersistentStoreError {
    #[error("expected block at height {expected}, got height {actual}")]
    OutOfOrder { expected: u64, actual: u64 },
}

#[derive(Debug)]
struct Inner {
    blocks: Vec<Block>,
    votes: Vec<Vec<Vote>>,
}

/// Append-only store of finalized blocks and their finalizing votes, indexed
/// by height starting at 0 (the genesis block).
#[derive(Debug)]
pub struct PersistentStore {
    inner: RwLock<Inner>,
}

impl PersistentStore {
    pub fn new(genesis: Block) -> Self {
        Self {
            inner: RwLock::new(Inner {
                blocks: vec![genesis],
                votes: vec![Vec::new()],
            }),
        }
    }

    /// Appends a finalized block and its votes. `block.height` must equal
    /// `self.len()`, i.e. one past the last stored height — mirroring the
    /// original source's `len(p.blocks) != block.Height-1` panic, but
    /// surfaced as an error instead of a crash.
    pub fn add_block(&self, block: Block, votes: Vec<Vote>) -> Result<(), PersistentStoreError> {
        let mut inner = self.inner.write();
        let expected = inner.blocks.len() as u64;
        if block.height != expected {
            return Err(PersistentStoreError::OutOfOrder {
                expected,
                actual: block.height,
            });
        }
        inner.blocks.push(block);
        inner.votes.push(votes);
        Ok(())
    }

    /// Returns the block stored at `height`, if any.
    pub fn get_block(&self, height: u64) -> Option<Block> {
        self.inner.read().blocks.get(height as usize).cloned()
    }

    /// Returns the votes that finalized the block at `height`, or an empty
    /// vector if nothing is stored there yet.
    pub fn get_votes(&self, height: u64) -> Vec<Vote> {
        self.inner
            .read()
            .votes
            .get(height as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of blocks stored, including genesis.
    pub fn len(&self) -> u64 {
        self.inner.read().blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::block::VrfMessage;
    use crate::consensus::vote::VotePayload;
    use crate::consensus::VoteKind;

    fn block_at(height: u64) -> Block {
        Block::new(height, height as i64, 1, VrfMessage::genesis())
    }

    #[test]
    fn genesis_is_present_at_construction() {
        let store = PersistentStore::new(Block::genesis(0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_block(0).unwrap().height, 0);
    }

    #[test]
    fn appends_in_order_succeed() {
        let store = PersistentStore::new(Block::genesis(0));
        store.add_block(block_at(1), Vec::new()).unwrap();
        store.add_block(block_at(2), Vec::new()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_block(2).unwrap().height, 2);
    }

    #[test]
    fn out_of_order_append_is_rejected() {
        let store = PersistentStore::new(Block::genesis(0));
        let err = store.add_block(block_at(5), Vec::new()).unwrap_err();
        assert_eq!(err, PersistentStoreError::OutOfOrder { expected: 1, actual: 5 });
    }

    #[test]
    fn votes_round_trip_with_their_block() {
        let store = PersistentStore::new(Block::genesis(0));
        let votes = vec![Vote::new(1, VoteKind::Commit, 1, VotePayload::RngNumber(7))];
        store.add_block(block_at(1), votes.clone()).unwrap();
        assert_eq!(store.get_votes(1), votes);
        assert!(store.get_votes(2).is_empty());
    }
}
