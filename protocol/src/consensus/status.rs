//! # Status
//!
//! Direct translation of the original source's `status.Status`: per-validator
//! bookkeeping of the local chain tip, the finalized tip, and the confirmed
//! tip trailing `lenULB + 1` blocks behind it (§3, §4.3). `finalize` blocks
//! the caller in height order exactly as the Go `sync.Cond`-based version
//! did, via `parking_lot`'s `Condvar` instead.

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use super::persistent_store::{PersistentStore, PersistentStoreError};
use super::{Block, Vote};

/// Errors raised by `Status`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("expected block at height {expected}, got height {actual}")]
    HeightMismatch { expected: u64, actual: u64 },
    #[error(transparent)]
    Persist(#[from] PersistentStoreError),
}

#[derive(Debug)]
struct Inner {
    height: u64,
    finalized_height: u64,
    /// Signed so it can legitimately be negative before the first block is
    /// confirmed, mirroring the original source's "negative or zero means no
    /// confirmed block yet" convention.
    confirmed_height: i64,
    /// Appended-but-not-yet-finalized blocks, oldest first. Index 0 is
    /// always the most recently finalized block (kept for `get_recent_block`
    /// parity with the original source, which never drops below one entry).
    blocks: Vec<Block>,
    wait_finalize: bool,
}

/// Tracks this validator's view of the chain: the tip it has appended,
/// the tip it has finalized, and the tip it considers confirmed.
#[derive(Debug)]
pub struct Status {
    inner: Mutex<Inner>,
    condvar: Condvar,
    persistent: PersistentStore,
    len_ulb: u64,
}

impl Status {
    /// Constructs a fresh `Status` seeded with the genesis block and the
    /// configured unconfirmed-leading-blocks window.
    pub fn new(genesis: Block, len_ulb: u64) -> Self {
        let persistent = PersistentStore::new(genesis.clone());
        Self {
            inner: Mutex::new(Inner {
                height: genesis.height,
                finalized_height: genesis.height,
                confirmed_height: 0 - (len_ulb as i64 + 1),
                blocks: vec![genesis],
                wait_finalize: false,
            }),
            condvar: Condvar::new(),
            persistent,
            len_ulb,
        }
    }

    /// Returns the highest height appended so far.
    pub fn height(&self) -> u64 {
        self.inner.lock().height
    }

    /// The configured unconfirmed-leading-blocks window. A validator loop
    /// uses this to decide whether rounds may overlap: `0` means process
    /// blocks strictly in sequence, anything higher means up to `len_ulb + 1`
    /// heights may be mid-validation at once.
    pub fn len_ulb(&self) -> u64 {
        self.len_ulb
    }

    /// Appends a newly-validated block to the local view, before it's
    /// finalized. `block.height` must be exactly one past the current tip.
    pub fn append_block(&self, block: Block) -> Result<(), StatusError> {
        let mut inner = self.inner.lock();
        let expected = inner.height + 1;
        if block.height != expected {
            return Err(StatusError::HeightMismatch {
                expected,
                actual: block.height,
            });
        }
        inner.height = block.height;
        inner.confirmed_height = inner.height as i64 - (self.len_ulb as i64 + 1);
        inner.blocks.push(block);
        Ok(())
    }

    /// Finalizes `block`, blocking until every lower height has finalized
    /// first so finalization always commits in strict height order even
    /// when several heights' votes complete out of order (§5, S3).
    pub fn finalize(&self, block: Block, votes: Vec<Vote>) -> Result<(), StatusError> {
        let mut inner = self.inner.lock();
        while block.height > inner.finalized_height + 1 {
            inner.wait_finalize = true;
            self.condvar.wait(&mut inner);
        }

        inner.finalized_height = block.height;
        if !inner.blocks.is_empty() {
            inner.blocks.remove(0);
        }
        self.persistent.add_block(block, votes)?;

        if inner.wait_finalize {
            self.condvar.notify_all();
            inner.wait_finalize = false;
        }
        Ok(())
    }

    /// Most recently appended block, or the most recently finalized one if
    /// nothing is in flight.
    pub fn get_recent_block(&self) -> Option<Block> {
        let inner = self.inner.lock();
        inner
            .blocks
            .last()
            .cloned()
            .or_else(|| self.persistent.get_block(inner.finalized_height))
    }

    /// Looks up the block at a specific height, whether it's still in flight
    /// (appended but not finalized) or already finalized into the persistent
    /// store. Used to resolve the block a VRF message references, which is
    /// always the tip's immediate parent and may or may not have finalized
    /// yet by the time the next round elects off of it.
    pub fn get_block_at(&self, height: u64) -> Option<Block> {
        let inner = self.inner.lock();
        if let Some(block) = inner.blocks.iter().find(|b| b.height == height) {
            return Some(block.clone());
        }
        self.persistent.get_block(height)
    }

    pub fn get_recent_finalized_block(&self) -> Option<Block> {
        let height = self.inner.lock().finalized_height;
        self.persistent.get_block(height)
    }

    pub fn get_recent_confirmed_block(&self) -> Option<Block> {
        let height = self.inner.lock().confirmed_height;
        if height < 0 {
            return None;
        }
        self.persistent.get_block(height as u64)
    }

    pub fn get_recent_confirmed_votes(&self) -> Vec<Vote> {
        let height = self.inner.lock().confirmed_height;
        if height < 0 {
            return Vec::new();
        }
        self.persistent.get_votes(height as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::block::VrfMessage;
    use crate::consensus::vote::VotePayload;
    use crate::consensus::VoteKind;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn block_at(height: u64) -> Block {
        Block::new(height, height as i64, 1, VrfMessage::genesis())
    }

    #[test]
    fn append_then_finalize_advances_height() {
        let status = Status::new(Block::genesis(0), 0);
        status.append_block(block_at(1)).unwrap();
        status.finalize(block_at(1), Vec::new()).unwrap();
        assert_eq!(status.height(), 1);
        assert_eq!(status.get_recent_finalized_block().unwrap().height, 1);
    }

    #[test]
    fn append_out_of_order_is_rejected() {
        let status = Status::new(Block::genesis(0), 0);
        let err = status.append_block(block_at(5)).unwrap_err();
        assert_eq!(err, StatusError::HeightMismatch { expected: 1, actual: 5 });
    }

    #[test]
    fn confirmed_height_trails_by_len_ulb_plus_one() {
        let status = Status::new(Block::genesis(0), 1);
        assert!(status.get_recent_confirmed_block().is_none());
        for h in 1..=3 {
            status.append_block(block_at(h)).unwrap();
            status.finalize(block_at(h), Vec::new()).unwrap();
        }
        // height 3, lenULB 1 -> confirmed height 3 - 2 = 1
        assert_eq!(status.get_recent_confirmed_block().unwrap().height, 1);
    }

    #[test]
    fn finalize_blocks_until_lower_heights_settle() {
        let status = Arc::new(Status::new(Block::genesis(0), 0));
        status.append_block(block_at(1)).unwrap();
        status.append_block(block_at(2)).unwrap();

        let later = {
            let status = status.clone();
            thread::spawn(move || status.finalize(block_at(2), Vec::new()).unwrap())
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(status.get_recent_finalized_block().unwrap().height, 0);

        status.finalize(block_at(1), Vec::new()).unwrap();
        later.join().unwrap();
        assert_eq!(status.get_recent_finalized_block().unwrap().height, 2);
    }

    #[test]
    fn get_block_at_resolves_in_flight_and_finalized_heights() {
        let status = Status::new(Block::genesis(0), 0);
        status.append_block(block_at(1)).unwrap();
        status.append_block(block_at(2)).unwrap();
        // height 2 is still in flight (not finalized yet)
        assert_eq!(status.get_block_at(2).unwrap().height, 2);

        status.finalize(block_at(1), Vec::new()).unwrap();
        // height 1 is now finalized, height 2 still in flight
        assert_eq!(status.get_block_at(1).unwrap().height, 1);
        assert_eq!(status.get_block_at(2).unwrap().height, 2);
        assert!(status.get_block_at(99).is_none());
    }

    #[test]
    fn recent_confirmed_votes_match_the_finalizing_votes() {
        let status = Status::new(Block::genesis(0), 0);
        status.append_block(block_at(1)).unwrap();
        let votes = vec![Vote::new(1, VoteKind::Commit, 1, VotePayload::RngNumber(2))];
        status.finalize(block_at(1), votes.clone()).unwrap();
        assert_eq!(status.get_recent_confirmed_votes(), votes);
    }
}
