//! # Node / Committee
//!
//! Grounded on the original source's `node.New`/`node.NewValidator`: builds
//! one validator's key material and wires it to the shared `Status`,
//! `SignaturePool`, and `MessageBus` its runtime needs. Where the original
//! spun up a `Node` per OS process talking over real sockets, this crate
//! runs the whole committee in one process, so `Committee` owns every
//! validator's `Node` and the bus they share — see §5's "single process,
//! many concurrent validator tasks" framing.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::crypto::{BlsPublicKey, BlsSecretKey, VrfKeypair};

use super::bus::MessageBus;
use super::signature_pool::SignaturePool;
use super::status::Status;
use super::strategy::ConsensusKind;
use super::runtime::ConsensusRuntime;
use super::{Block, ValidatorId};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("num_validators must be at least 1, got {0}")]
    EmptyCommittee(u32),
}

/// A single validator: its identity, key material, and the runtime driving
/// its produce/validate/receive loops. Constructed by [`Committee::spawn`], never
/// directly — a validator cannot exist without the shared bus and status
/// store its runtime depends on.
#[derive(Debug)]
pub struct Node {
    pub id: ValidatorId,
    pub status: Arc<Status>,
    runtime: Arc<ConsensusRuntime>,
}

impl Node {
    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn runtime(&self) -> &Arc<ConsensusRuntime> {
        &self.runtime
    }
}

/// Everything needed to stand up a committee and start producing blocks.
pub struct CommitteeConfig {
    pub num_validators: u32,
    pub len_ulb: u64,
    pub block_time: Duration,
    pub kind: ConsensusKind,
    pub net_delay_min_ms: u64,
    pub net_delay_max_ms: u64,
}

/// The running committee: every validator's `Node`, plus the join handles
/// of their produce/validate/receive loops.
#[derive(Debug)]
pub struct Committee {
    pub nodes: Vec<Arc<Node>>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Committee {
    /// Builds a committee of `config.num_validators` validators sharing one
    /// `MessageBus`, and spawns every validator's produce, validate, and
    /// receive loops starting at `genesis_time`.
    pub async fn spawn(
        config: CommitteeConfig,
        genesis_time: tokio::time::Instant,
    ) -> Result<Self, NodeError> {
        if config.num_validators == 0 {
            return Err(NodeError::EmptyCommittee(config.num_validators));
        }

        let genesis = Block::genesis(0);
        let (bus, inboxes) = MessageBus::new(
            config.num_validators,
            config.net_delay_min_ms,
            config.net_delay_max_ms,
        );
        let bus = Arc::new(bus);

        let requires_bls = super::strategy::strategy_for(config.kind).requires_bls();
        let bls_keys: Vec<(ValidatorId, BlsSecretKey)> = (1..=config.num_validators)
            .map(|id| (id, BlsSecretKey::generate()))
            .collect();
        let bls_public_keys: Vec<(ValidatorId, BlsPublicKey)> = bls_keys
            .iter()
            .map(|(id, sk)| (*id, sk.public_key()))
            .collect();

        let mut nodes = Vec::with_capacity(config.num_validators as usize);
        let mut handles = Vec::with_capacity(config.num_validators as usize * 3);

        for (inbox, (id, bls_secret_key)) in inboxes.into_iter().zip(bls_keys.into_iter()) {
            let status = Arc::new(Status::new(genesis.clone(), config.len_ulb));
            let pool = Arc::new(SignaturePool::new());
            let runtime = Arc::new(ConsensusRuntime::new(
                id,
                config.kind,
                config.num_validators,
                config.block_time,
                status.clone(),
                pool,
                bus.clone(),
                VrfKeypair::generate(),
                requires_bls.then(|| bls_secret_key),
                bls_public_keys.clone(),
            ));

            info!(validator = id, strategy = ?config.kind, "validator started");
            handles.extend(runtime.clone().spawn(genesis_time, inbox));

            nodes.push(Arc::new(Node { id, status, runtime }));
        }

        Ok(Self { nodes, handles })
    }

    /// Waits for every validator's loops to exit. Under normal operation
    /// this never returns — a returning handle means a loop panicked or the
    /// process is shutting down.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
