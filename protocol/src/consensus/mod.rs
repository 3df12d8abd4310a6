//! # Consensus
//!
//! The committee-of-validators round loop: a producer is elected per height
//! via VRF (or, under the simple strategy, a summed RNG seed), proposes a
//! block, and the committee carries it through a two-phase prepare/commit
//! vote before it's finalized and handed to the append-only store. See
//! `runtime` for the per-height state machine and `node` for the façade that
//! wires a single validator's pieces together.

pub mod block;
pub mod bus;
pub mod election;
pub mod node;
pub mod persistent_store;
pub mod runtime;
pub mod signature_pool;
pub mod status;
pub mod strategy;
pub mod vote;

/// Validator identity. Zero is reserved as the "no producer elected yet"
/// sentinel used by the genesis block and the pre-election watch channel.
pub type ValidatorId = u32;

pub use block::{Block, VrfMessage};
pub use bus::{BusError, BusMessage, MessageBus};
pub use election::{elect_producer, ElectionError};
pub use node::{Node, NodeError};
pub use persistent_store::{PersistentStore, PersistentStoreError};
pub use runtime::ConsensusRuntime;
pub use signature_pool::{SignaturePool, SignaturePoolError};
pub use status::{Status, StatusError};
pub use strategy::{ConsensusKind, VotingStrategy};
pub use vote::{Vote, VoteKind, VotePayload};
