//! # Signature Pool
//!
//! The original source's `signaturepool` was a bare `map[int][]signature`
//! with `add`/`remove`: callers polled it from a spin loop (`friday_vrf.go`'s
//! `validate`). Here the pool itself blocks: `wait_and_remove` parks the
//! calling thread on a condvar until a bucket reaches `quorum` votes, then
//! drains and returns them. Each `(VoteKind, height)` bucket may have at
//! most one waiter at a time — a second concurrent wait on the same bucket
//! is a caller bug, not a race to resolve, so it's rejected outright.

use std::collections::HashMap;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use super::vote::{Vote, VoteKind};

/// Errors raised by the signature pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignaturePoolError {
    #[error("bucket ({0:?}, height {1}) already has a waiter")]
    DoubleWaiter(VoteKind, u64),
}

#[derive(Default, Debug)]
struct Bucket {
    votes: Vec<Vote>,
    has_waiter: bool,
}

/// Blocking collection point for votes, keyed by phase and height.
#[derive(Debug)]
pub struct SignaturePool {
    buckets: Mutex<HashMap<(VoteKind, u64), Bucket>>,
    condvar: Condvar,
}

impl SignaturePool {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            condvar: Condvar::new(),
        }
    }

    /// Adds a vote to its `(kind, block_height)` bucket and wakes any waiter.
    pub fn add(&self, vote: Vote) {
        let key = (vote.kind, vote.block_height);
        let mut buckets = self.buckets.lock();
        buckets.entry(key).or_default().votes.push(vote);
        self.condvar.notify_all();
    }

    /// Blocks the calling thread until the `(kind, height)` bucket holds at
    /// least `quorum` votes, then drains and returns them. Only one thread
    /// may wait on a given bucket at a time.
    pub fn wait_and_remove(
        &self,
        kind: VoteKind,
        height: u64,
        quorum: usize,
    ) -> Result<Vec<Vote>, SignaturePoolError> {
        let key = (kind, height);
        let mut buckets = self.buckets.lock();

        {
            let bucket = buckets.entry(key).or_default();
            if bucket.has_waiter {
                return Err(SignaturePoolError::DoubleWaiter(kind, height));
            }
            bucket.has_waiter = true;
        }

        loop {
            let len = buckets.get(&key).map(|b| b.votes.len()).unwrap_or(0);
            if len >= quorum {
                break;
            }
            self.condvar.wait(&mut buckets);
        }

        let bucket = buckets.remove(&key).expect("bucket present after wait");
        Ok(bucket.votes)
    }
}

impl Default for SignaturePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::vote::VotePayload;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn vote(id: u32, kind: VoteKind, height: u64) -> Vote {
        Vote::new(id, kind, height, VotePayload::RngNumber(id as i32))
    }

    #[test]
    fn wait_and_remove_blocks_until_quorum_then_drains() {
        let pool = Arc::new(SignaturePool::new());
        let waiter_pool = pool.clone();
        let waiter = thread::spawn(move || {
            waiter_pool
                .wait_and_remove(VoteKind::Prepare, 1, 3)
                .unwrap()
        });

        thread::sleep(Duration::from_millis(20));
        pool.add(vote(1, VoteKind::Prepare, 1));
        pool.add(vote(2, VoteKind::Prepare, 1));
        thread::sleep(Duration::from_millis(20));
        pool.add(vote(3, VoteKind::Prepare, 1));

        let votes = waiter.join().unwrap();
        assert_eq!(votes.len(), 3);

        // bucket was drained
        let waiter2 = {
            let pool2 = pool.clone();
            thread::spawn(move || pool2.wait_and_remove(VoteKind::Prepare, 1, 1).unwrap())
        };
        pool.add(vote(9, VoteKind::Prepare, 1));
        assert_eq!(waiter2.join().unwrap().len(), 1);
    }

    #[test]
    fn second_concurrent_waiter_on_same_bucket_is_rejected() {
        let pool = Arc::new(SignaturePool::new());
        let waiter_pool = pool.clone();
        let _waiter = thread::spawn(move || {
            let _ = waiter_pool.wait_and_remove(VoteKind::Commit, 4, 10);
        });
        thread::sleep(Duration::from_millis(20));

        assert_eq!(
            pool.wait_and_remove(VoteKind::Commit, 4, 10),
            Err(SignaturePoolError::DoubleWaiter(VoteKind::Commit, 4))
        );
    }

    #[test]
    fn distinct_heights_and_kinds_do_not_interfere() {
        let pool = SignaturePool::new();
        pool.add(vote(1, VoteKind::Prepare, 1));
        pool.add(vote(1, VoteKind::Commit, 1));
        pool.add(vote(1, VoteKind::Prepare, 2));

        let prepare_1 = pool.wait_and_remove(VoteKind::Prepare, 1, 1).unwrap();
        assert_eq!(prepare_1.len(), 1);
        assert_eq!(prepare_1[0].kind, VoteKind::Prepare);
        assert_eq!(prepare_1[0].block_height, 1);
    }
}
