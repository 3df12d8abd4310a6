//! # Consensus Runtime
//!
//! The one authoritative produce/validate/prepare/finalize loop, replacing
//! the original source's three independently-evolved `friday_{bls,vrf,fbft}.go`
//! files. Which producer-election rule, vote payload, and quorum apply is
//! decided by the configured [`ConsensusKind`]; the loop shape itself —
//! sleep until the next round boundary, produce if elected, otherwise wait
//! for the network to deliver a block, validate it, vote it through
//! prepare/commit, finalize — is shared.
//!
//! The original source's `validate` spin-waited on `node.next == 0` in a
//! 10ms-polling loop (REDESIGN FLAGS). Here the producer a validator expects
//! next round is published once, by `produce`, over a `tokio::sync::watch`
//! channel that `validate` awaits instead of polling.
//!
//! Three tasks run per validator (see `spawn`): `produce_loop` proposes
//! blocks on the round clock, `receive_loop` drains the vote inbox into the
//! `SignaturePool` continuously, and `validate_loop` consumes incoming
//! blocks and drives each through prepare/commit. Splitting the receiver out
//! of `validate_loop` means a validator doesn't need to be parked inside its
//! own `wait_and_remove` to see a peer's vote arrive.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::crypto::{BlsPublicKey, BlsSecretKey, BlsSignature, VrfKeypair};

use super::bus::{BusError, InboxReceiver, MessageBus};
use super::election::{elect_producer, ElectionError};
use super::persistent_store::PersistentStoreError;
use super::signature_pool::{SignaturePool, SignaturePoolError};
use super::status::{Status, StatusError};
use super::strategy::ConsensusKind;
use super::vote::{Vote, VoteKind, VotePayload};
use super::{Block, ValidatorId, VrfMessage};

/// Errors raised while driving a round. A byzantine or misconfigured peer
/// surfaces here rather than the hard panics the original source used
/// ("There should be no Byzantine nodes!") — the caller decides whether to
/// abort the runtime or merely log and carry on.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("block {height} has producer {actual}, expected {expected}")]
    WrongProducer {
        height: u64,
        expected: ValidatorId,
        actual: ValidatorId,
    },
    #[error("block {0} hash does not match its header fields")]
    InvalidHash(u64),
    #[error(transparent)]
    Election(#[from] ElectionError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    SignaturePool(#[from] SignaturePoolError),
    #[error(transparent)]
    Persist(#[from] PersistentStoreError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("vote payload {0:?} is not valid under the active strategy")]
    BadPayload(VoteKind),
    #[error("BLS signature from validator {0} does not verify")]
    BadSignature(ValidatorId),
}

/// Shared, long-lived state one validator's runtime is built from.
#[derive(Debug)]
pub struct ConsensusRuntime {
    pub id: ValidatorId,
    pub kind: ConsensusKind,
    pub num_validators: u32,
    pub block_time: Duration,
    pub status: Arc<Status>,
    pub pool: Arc<SignaturePool>,
    pub bus: Arc<MessageBus>,
    pub vrf_keypair: VrfKeypair,
    pub bls_secret_key: Option<BlsSecretKey>,
    pub bls_public_keys: Vec<(ValidatorId, crate::crypto::BlsPublicKey)>,
    next_producer: watch::Sender<Option<ValidatorId>>,
}

impl ConsensusRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ValidatorId,
        kind: ConsensusKind,
        num_validators: u32,
        block_time: Duration,
        status: Arc<Status>,
        pool: Arc<SignaturePool>,
        bus: Arc<MessageBus>,
        vrf_keypair: VrfKeypair,
        bls_secret_key: Option<BlsSecretKey>,
        bls_public_keys: Vec<(ValidatorId, crate::crypto::BlsPublicKey)>,
    ) -> Self {
        let (next_producer, _) = watch::channel(None);
        Self {
            id,
            kind,
            num_validators,
            block_time,
            status,
            pool,
            bus,
            vrf_keypair,
            bls_secret_key,
            bls_public_keys,
            next_producer,
        }
    }

    fn quorum(&self) -> usize {
        super::strategy::strategy_for(self.kind).quorum(self.num_validators)
    }

    fn bls_public_key_of(&self, id: ValidatorId) -> Option<&crate::crypto::BlsPublicKey> {
        self.bls_public_keys
            .iter()
            .find(|(vid, _)| *vid == id)
            .map(|(_, key)| key)
    }

    /// Spawns the producer, validator, and receiver loops and returns
    /// immediately. The returned handles can be awaited by the caller
    /// (typically `Node`) to detect any of the three exiting.
    pub fn spawn(
        self: Arc<Self>,
        genesis_time: tokio::time::Instant,
        inbox: InboxReceiver,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let InboxReceiver { blocks, votes } = inbox;

        let producer = {
            let runtime = self.clone();
            tokio::spawn(async move { runtime.produce_loop(genesis_time).await })
        };
        let validator = {
            let runtime = self.clone();
            tokio::spawn(async move { runtime.validate_loop(blocks).await })
        };
        let receiver = {
            let runtime = self.clone();
            tokio::spawn(async move { runtime.receive_loop(votes).await })
        };
        vec![producer, validator, receiver]
    }

    async fn produce_loop(&self, genesis_time: tokio::time::Instant) {
        let mut next_block_time = genesis_time;
        loop {
            tokio::time::sleep_until(next_block_time).await;
            match self.produce().await {
                Ok(()) => {}
                Err(err) => warn!(validator = self.id, %err, "produce round failed"),
            }
            next_block_time += self.block_time;
        }
    }

    /// Drains the vote inbox into the `SignaturePool` for as long as the
    /// validator runs. This is the only place votes ever reach the pool —
    /// `run_phase`'s blocking wait relies entirely on this loop running
    /// concurrently with it.
    async fn receive_loop(&self, mut votes: mpsc::Receiver<Vote>) {
        while let Some(vote) = votes.recv().await {
            self.pool.add(vote);
        }
    }

    /// Consumes incoming blocks and drives each through prepare/commit. When
    /// `len_ulb > 0` the committee tolerates overlapping in-flight rounds, so
    /// each block is handed to its own task; `Status::finalize` itself
    /// enforces that finalization still commits in height order regardless
    /// of which task gets there first.
    async fn validate_loop(self: Arc<Self>, mut blocks: mpsc::Receiver<Block>) {
        let overlapping = self.status.len_ulb() > 0;
        while let Some(block) = blocks.recv().await {
            if overlapping {
                let runtime = self.clone();
                tokio::spawn(async move {
                    if let Err(err) = runtime.validate_block(block).await {
                        warn!(validator = runtime.id, %err, "block rejected");
                    }
                });
            } else if let Err(err) = self.validate_block(block).await {
                warn!(validator = self.id, %err, "block rejected");
            }
        }
    }

    /// Elects the producer for the next height and, if it's this validator,
    /// builds and broadcasts a new block. Mirrors `produce` in
    /// `friday_vrf.go`/`friday_fbft.go`/`friday_bls.go`.
    async fn produce(&self) -> Result<(), RuntimeError> {
        let height = self.status.height();
        let next_height = height + 1;

        let producer = if self.kind == ConsensusKind::Simple {
            let confirmed_votes = self.status.get_recent_confirmed_votes();
            simple_random_producer(&confirmed_votes, self.num_validators)?
        } else {
            let tip = self
                .status
                .get_recent_block()
                .unwrap_or_else(|| Block::genesis(0));
            let referenced_hash = if tip.vrf_message.previous_block_height != 0 {
                self.status
                    .get_block_at(tip.vrf_message.previous_block_height)
                    .map(|b| b.hash)
            } else {
                None
            };
            elect_producer(height, &tip.vrf_message, referenced_hash, self.num_validators)?
        };

        let _ = self.next_producer.send(Some(producer));

        if producer != self.id {
            return Ok(());
        }

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        let vrf_message = if self.kind == ConsensusKind::Simple || height == 0 {
            VrfMessage::genesis()
        } else {
            let tip_hash = self
                .status
                .get_recent_block()
                .map(|b| b.hash)
                .unwrap_or([0u8; 32]);
            let (rand, proof) = self.vrf_keypair.evaluate(&tip_hash);
            VrfMessage {
                rand,
                proof,
                previous_proposer_id: self.id,
                previous_proposer_pubkey: self.vrf_keypair.public_key(),
                previous_block_height: height,
            }
        };

        let new_block = Block::new(next_height, timestamp, self.id, vrf_message);
        info!(validator = self.id, height = next_height, "block produced");
        self.bus.broadcast_block(new_block).await?;
        Ok(())
    }

    /// Validates an incoming block, appends it, then drives it through
    /// prepare and commit. Mirrors `validateBlock` across all three
    /// original strategies, which share this exact three-step shape; under
    /// FBFT, each phase is followed by the block's producer aggregating the
    /// phase's votes and broadcasting it as a single `Prepared`/`Committed`
    /// message that followers verify instead of re-checking every signature.
    async fn validate_block(&self, block: Block) -> Result<(), RuntimeError> {
        self.validate(&block).await?;
        self.status.append_block(block.clone())?;

        let prepare_votes = self
            .run_phase(VoteKind::Prepare, &block, &block.hash)
            .await?;

        let commit_message = if self.kind == ConsensusKind::Fbft {
            self.aggregate_phase(VoteKind::Prepared, &prepare_votes, &block.hash, &block)
                .await?
        } else {
            block.hash
        };

        let commit_votes = self
            .run_phase(VoteKind::Commit, &block, &commit_message)
            .await?;

        if self.kind == ConsensusKind::Fbft {
            self.aggregate_phase(VoteKind::Committed, &commit_votes, &commit_message, &block)
                .await?;
        }

        self.status.finalize(block, commit_votes)?;
        Ok(())
    }

    /// Checks the producer and hash of an incoming block. Replaces the
    /// original source's spin loop on `node.next == 0` with a single await
    /// on the watch channel `produce` publishes to.
    async fn validate(&self, block: &Block) -> Result<(), RuntimeError> {
        let mut rx = self.next_producer.subscribe();
        if rx.borrow().is_none() {
            rx.changed().await.ok();
        }
        let expected = rx.borrow().unwrap_or(block.producer);

        if expected != block.producer {
            return Err(RuntimeError::WrongProducer {
                height: block.height,
                expected,
                actual: block.producer,
            });
        }
        if block.hash != block.recompute_hash() {
            return Err(RuntimeError::InvalidHash(block.height));
        }
        Ok(())
    }

    /// Casts this validator's vote for `kind` at `block`'s height over
    /// `message`, then blocks (off the async executor) until quorum is
    /// reached, verifying every vote under VRF-backed strategies.
    async fn run_phase(
        &self,
        kind: VoteKind,
        block: &Block,
        message: &[u8; 32],
    ) -> Result<Vec<Vote>, RuntimeError> {
        let payload = self.payload_for(kind, message)?;
        let vote = Vote::new(self.id, kind, block.height, payload);
        self.bus.broadcast_vote(vote).await?;

        let pool = self.pool.clone();
        let quorum = self.quorum();
        let height = block.height;
        let votes = tokio::task::spawn_blocking(move || pool.wait_and_remove(kind, height, quorum))
            .await
            .expect("blocking wait task did not panic")?;

        if self.kind != ConsensusKind::Simple {
            self.verify_votes(&votes, message)?;
        }
        Ok(votes)
    }

    /// FBFT leader-aggregation round (§4.7 steps 2 and 3). `votes` are the
    /// per-validator votes this phase's `run_phase` just collected, signed
    /// over `message`. The block's producer sums them into one
    /// `VotePayload::Aggregate` and broadcasts it under `aggregate_kind`;
    /// every other validator instead waits for that single broadcast and
    /// verifies it. Either way, the return value is the 32-byte digest of
    /// the aggregate signature, which becomes the message the next phase
    /// signs — binding the commit phase to the exact set of prepare votes
    /// the leader aggregated.
    async fn aggregate_phase(
        &self,
        aggregate_kind: VoteKind,
        votes: &[Vote],
        message: &[u8; 32],
        block: &Block,
    ) -> Result<[u8; 32], RuntimeError> {
        if block.producer == self.id {
            let sigs = votes
                .iter()
                .map(|v| match &v.payload {
                    VotePayload::BlsSig(bytes) => Ok(BlsSignature::from_bytes(*bytes)),
                    _ => Err(RuntimeError::BadPayload(v.kind)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let pubkeys = votes
                .iter()
                .map(|v| {
                    self.bls_public_key_of(v.id)
                        .cloned()
                        .ok_or(RuntimeError::BadSignature(v.id))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let agg_sig = crate::crypto::aggregate_signatures(&sigs)
                .map_err(|_| RuntimeError::BadSignature(self.id))?;
            let agg_pubkey = crate::crypto::aggregate_public_keys(&pubkeys)
                .map_err(|_| RuntimeError::BadSignature(self.id))?;

            let aggregate_vote = Vote::new(
                self.id,
                aggregate_kind,
                block.height,
                VotePayload::Aggregate {
                    sig: *agg_sig.as_bytes(),
                    pubkey: *agg_pubkey.as_bytes(),
                },
            );
            self.bus.broadcast_vote(aggregate_vote).await?;
            Ok(aggregate_message_hash(&agg_sig))
        } else {
            let pool = self.pool.clone();
            let height = block.height;
            let collected =
                tokio::task::spawn_blocking(move || pool.wait_and_remove(aggregate_kind, height, 1))
                    .await
                    .expect("blocking wait task did not panic")?;
            let vote = collected
                .into_iter()
                .next()
                .ok_or(RuntimeError::BadPayload(aggregate_kind))?;
            match vote.payload {
                VotePayload::Aggregate { sig, pubkey } => {
                    let sig = BlsSignature::from_bytes(sig);
                    let pubkey = BlsPublicKey::from_bytes(pubkey);
                    sig.verify_hash(&pubkey, message)
                        .map_err(|_| RuntimeError::BadSignature(vote.id))?;
                    Ok(aggregate_message_hash(&sig))
                }
                _ => Err(RuntimeError::BadPayload(aggregate_kind)),
            }
        }
    }

    fn payload_for(&self, kind: VoteKind, message: &[u8; 32]) -> Result<VotePayload, RuntimeError> {
        match self.kind {
            ConsensusKind::Simple => {
                let n = match kind {
                    VoteKind::Prepare => -1,
                    VoteKind::Commit => {
                        rand::thread_rng().gen_range(0..self.num_validators as i32)
                    }
                    other => return Err(RuntimeError::BadPayload(other)),
                };
                Ok(VotePayload::RngNumber(n))
            }
            ConsensusKind::VrfBls | ConsensusKind::Fbft => {
                let sk = self
                    .bls_secret_key
                    .as_ref()
                    .expect("VRF-backed strategies always carry a BLS key");
                Ok(VotePayload::BlsSig(*sk.sign_hash(message).as_bytes()))
            }
        }
    }

    fn verify_votes(&self, votes: &[Vote], message: &[u8; 32]) -> Result<(), RuntimeError> {
        for vote in votes {
            match &vote.payload {
                VotePayload::BlsSig(bytes) => {
                    let sig = BlsSignature::from_bytes(*bytes);
                    let pubkey = self
                        .bls_public_key_of(vote.id)
                        .ok_or(RuntimeError::BadSignature(vote.id))?;
                    sig.verify_hash(pubkey, message)
                        .map_err(|_| RuntimeError::BadSignature(vote.id))?;
                }
                VotePayload::Aggregate { sig, pubkey } => {
                    let sig = BlsSignature::from_bytes(*sig);
                    let pubkey = BlsPublicKey::from_bytes(*pubkey);
                    sig.verify_hash(&pubkey, message)
                        .map_err(|_| RuntimeError::BadSignature(vote.id))?;
                }
                VotePayload::RngNumber(_) => {}
            }
        }
        Ok(())
    }
}

/// Digests an FBFT aggregate signature down to the 32-byte message the next
/// phase signs, binding that phase's votes to this exact aggregate rather
/// than to the block hash directly.
fn aggregate_message_hash(sig: &BlsSignature) -> [u8; 32] {
    let digest = Sha256::digest(sig.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Grounded on `getRandomNumberFromSignatures`: sums the confirmed round's
/// per-validator RNG payloads and reduces mod `num_validators`, shifted by
/// one since validator IDs start at 1 rather than 0.
fn simple_random_producer(votes: &[Vote], num_validators: u32) -> Result<ValidatorId, RuntimeError> {
    let mut sum: i64 = 0;
    for vote in votes {
        match vote.payload {
            VotePayload::RngNumber(n) if n >= 0 => sum += n as i64,
            VotePayload::RngNumber(_) => return Err(RuntimeError::BadPayload(vote.kind)),
            _ => return Err(RuntimeError::BadPayload(vote.kind)),
        }
    }
    let chosen = (sum.rem_euclid(num_validators as i64)) as u32;
    Ok(chosen + 1)
}
