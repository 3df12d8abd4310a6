//! # Cryptographic Primitives
//!
//! Two capabilities the consensus core treats as collaborator interfaces
//! (never rolled by hand at the call site): block-producer election needs a
//! verifiable random function (`vrf`), and the FBFT voting strategy needs
//! threshold signature aggregation (`bls`). Both are thin, type-safe wrappers
//! around audited implementations — `ed25519-dalek`/`sha2` for the VRF
//! construction, `blst` for BLS12-381.

pub mod bls;
pub mod vrf;

pub use bls::{
    aggregate_public_keys, aggregate_signatures, BlsError, BlsPublicKey, BlsSecretKey,
    BlsSignature,
};
pub use vrf::{proof_to_hash, VrfError, VrfKeypair, VrfPublicKey};
