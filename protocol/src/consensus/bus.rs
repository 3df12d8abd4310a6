//! # Message Bus
//!
//! The original source's `channel` fanned block/signature traffic out to
//! peer connections through a network-layer type switch (`block.go` is read
//! into `c.block`, `signature.go` into `c.signature`). This crate is a
//! single-process simulation, so the network hop collapses to a bounded
//! in-memory queue per validator with injected per-message delay — the
//! "every hop costs something observable" property from §5 still holds.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;

use super::{Block, Vote};

/// Errors raised while publishing to the bus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("peer inbox is full, message dropped")]
    TransportOverflow,
}

/// The unit of traffic carried over the bus.
#[derive(Clone, Debug)]
pub enum BusMessage {
    Block(Block),
    Vote(Vote),
}

/// Queue capacity per validator inbox, matching the original source's
/// per-channel buffer size.
const INBOX_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Inbox {
    id: super::ValidatorId,
    blocks: mpsc::Sender<Block>,
    votes: mpsc::Sender<Vote>,
}

/// A fully-connected broadcast bus: every validator sees every block and
/// every vote, after a random delay standing in for network latency.
#[derive(Debug)]
pub struct MessageBus {
    inboxes: Vec<Inbox>,
    delay_min_ms: u64,
    delay_max_ms: u64,
}

/// The receiving half handed to a single validator's runtime.
pub struct InboxReceiver {
    pub blocks: mpsc::Receiver<Block>,
    pub votes: mpsc::Receiver<Vote>,
}

impl MessageBus {
    /// Builds a bus wired for `validator_count` validators, returning the
    /// bus (kept by whoever broadcasts) and one `InboxReceiver` per
    /// validator in ascending ID order, starting at 1.
    pub fn new(validator_count: u32, delay_min_ms: u64, delay_max_ms: u64) -> (Self, Vec<InboxReceiver>) {
        let mut inboxes = Vec::with_capacity(validator_count as usize);
        let mut receivers = Vec::with_capacity(validator_count as usize);
        for id in 1..=validator_count {
            let (block_tx, block_rx) = mpsc::channel(INBOX_CAPACITY);
            let (vote_tx, vote_rx) = mpsc::channel(INBOX_CAPACITY);
            inboxes.push(Inbox {
                id,
                blocks: block_tx,
                votes: vote_tx,
            });
            receivers.push(InboxReceiver {
                blocks: block_rx,
                votes: vote_rx,
            });
        }
        (
            Self {
                inboxes,
                delay_min_ms,
                delay_max_ms,
            },
            receivers,
        )
    }

    fn random_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.delay_min_ms..=self.delay_max_ms);
        Duration::from_millis(ms)
    }

    /// Broadcasts a block to every validator, including the sender, after an
    /// independent random delay per recipient.
    ///
    /// Capacity for every recipient is reserved up front, synchronously, via
    /// `try_reserve_owned` — a full inbox means a validator has fallen behind
    /// its peers, which is the fatal configuration error `TransportOverflow`
    /// signals (§4.1, §7), not something to silently backpressure on.
    pub async fn broadcast_block(&self, block: Block) -> Result<(), BusError> {
        let mut permits = Vec::with_capacity(self.inboxes.len());
        for inbox in &self.inboxes {
            let permit = inbox
                .blocks
                .clone()
                .try_reserve_owned()
                .map_err(|_| BusError::TransportOverflow)?;
            permits.push(permit);
        }
        for permit in permits {
            let b = block.clone();
            let delay = self.random_delay();
            tokio::spawn(async move {
                sleep(delay).await;
                permit.send(b);
            });
        }
        Ok(())
    }

    /// Broadcasts a vote to every validator, including the sender. See
    /// `broadcast_block` for the reservation-based overflow handling.
    pub async fn broadcast_vote(&self, vote: Vote) -> Result<(), BusError> {
        let mut permits = Vec::with_capacity(self.inboxes.len());
        for inbox in &self.inboxes {
            let permit = inbox
                .votes
                .clone()
                .try_reserve_owned()
                .map_err(|_| BusError::TransportOverflow)?;
            permits.push(permit);
        }
        for permit in permits {
            let v = vote.clone();
            let delay = self.random_delay();
            tokio::spawn(async move {
                sleep(delay).await;
                permit.send(v);
            });
        }
        Ok(())
    }

    pub fn validator_ids(&self) -> impl Iterator<Item = super::ValidatorId> + '_ {
        self.inboxes.iter().map(|i| i.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::vote::{VoteKind, VotePayload};

    #[tokio::test]
    async fn broadcast_block_reaches_every_receiver() {
        let (bus, mut receivers) = MessageBus::new(3, 0, 1);
        let block = Block::genesis(0);
        bus.broadcast_block(block.clone()).await.unwrap();

        for rx in receivers.iter_mut() {
            let received = rx.blocks.recv().await.expect("block delivered");
            assert_eq!(received, block);
        }
    }

    #[tokio::test]
    async fn broadcast_vote_reaches_every_receiver() {
        let (bus, mut receivers) = MessageBus::new(2, 0, 1);
        let vote = Vote::new(1, VoteKind::Prepare, 5, VotePayload::RngNumber(3));
        bus.broadcast_vote(vote.clone()).await.unwrap();

        for rx in receivers.iter_mut() {
            let received = rx.votes.recv().await.expect("vote delivered");
            assert_eq!(received, vote);
        }
    }

    #[tokio::test]
    async fn broadcast_overflows_when_inbox_is_full() {
        let (bus, _receivers) = MessageBus::new(1, 50, 100);
        for _ in 0..INBOX_CAPACITY {
            bus.broadcast_block(Block::genesis(0)).await.unwrap();
        }
        let err = bus.broadcast_block(Block::genesis(0)).await.unwrap_err();
        assert_eq!(err, BusError::TransportOverflow);
    }

    #[test]
    fn validator_ids_start_at_one() {
        let (bus, _receivers) = MessageBus::new(4, 0, 0);
        let ids: Vec<_> = bus.validator_ids().collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
