//! # Verifiable Random Function
//!
//! Block-producer election needs a value that (a) looks random to anyone who
//! doesn't hold the previous round's secret key, and (b) can be checked by
//! everyone else against the previous block's hash once it's published. That's
//! a VRF: `evaluate(priv, msg) -> (rand, proof)` and `proof_to_hash(pub, msg,
//! proof) -> rand`, with the guarantee that forging `proof` without `priv`
//! is infeasible.
//!
//! There's no production-grade VRF crate in our dependency graph, so this
//! builds one out of primitives we already trust: an Ed25519 signature is
//! deterministic and unforgeable without the secret key, so it doubles as the
//! VRF proof; the 32-byte output is `SHA-512(proof)` truncated to 32 bytes.
//! This is the "hash of a deterministic signature" VRF construction — weaker
//! than a purpose-built VRF (e.g. ECVRF) in its formal security proof, but
//! it satisfies exactly the two properties §4.5 needs: determinism and
//! third-party verifiability.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Errors raised while evaluating or verifying a VRF proof.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VrfError {
    #[error("VRF proof does not verify against the claimed public key and message")]
    InvalidProof,
    #[error("malformed VRF public key bytes")]
    InvalidPublicKey,
}

/// A VRF keypair. One per validator, used once per round it produces a block.
#[derive(Debug)]
pub struct VrfKeypair {
    signing_key: SigningKey,
}

/// The public half of a [`VrfKeypair`], shared with every peer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct VrfPublicKey {
    bytes: [u8; 32],
}

impl VrfKeypair {
    /// Generates a fresh VRF keypair using the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Returns the public key peers use to check proofs produced by this keypair.
    pub fn public_key(&self) -> VrfPublicKey {
        VrfPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Evaluates the VRF over `message`, returning the 32-byte random output
    /// and the proof that lets anyone holding the public key recompute it.
    pub fn evaluate(&self, message: &[u8]) -> ([u8; 32], Vec<u8>) {
        let proof = self.signing_key.sign(message);
        let proof_bytes = proof.to_bytes().to_vec();
        (rand_from_proof(&proof_bytes), proof_bytes)
    }
}

/// Recomputes the VRF output from a public key, message, and proof, failing
/// if the proof does not verify — i.e. was not produced by the holder of the
/// matching secret key over this exact message.
pub fn proof_to_hash(
    public_key: &VrfPublicKey,
    message: &[u8],
    proof: &[u8],
) -> Result<[u8; 32], VrfError> {
    let verifying_key =
        VerifyingKey::from_bytes(&public_key.bytes).map_err(|_| VrfError::InvalidPublicKey)?;
    let sig_bytes: [u8; 64] = proof.try_into().map_err(|_| VrfError::InvalidProof)?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| VrfError::InvalidProof)?;
    Ok(rand_from_proof(proof))
}

fn rand_from_proof(proof: &[u8]) -> [u8; 32] {
    let digest = Sha512::digest(proof);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

impl VrfPublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_then_verify_round_trips() {
        let kp = VrfKeypair::generate();
        let msg = b"block hash goes here";
        let (rand, proof) = kp.evaluate(msg);
        let recomputed = proof_to_hash(&kp.public_key(), msg, &proof).unwrap();
        assert_eq!(rand, recomputed);
    }

    #[test]
    fn evaluate_is_deterministic() {
        let kp = VrfKeypair::generate();
        let msg = b"same message twice";
        let (rand1, proof1) = kp.evaluate(msg);
        let (rand2, proof2) = kp.evaluate(msg);
        assert_eq!(rand1, rand2);
        assert_eq!(proof1, proof2);
    }

    #[test]
    fn wrong_public_key_rejected() {
        let kp = VrfKeypair::generate();
        let other = VrfKeypair::generate();
        let msg = b"message";
        let (_, proof) = kp.evaluate(msg);
        assert_eq!(
            proof_to_hash(&other.public_key(), msg, &proof),
            Err(VrfError::InvalidProof)
        );
    }

    #[test]
    fn tampered_message_rejected() {
        let kp = VrfKeypair::generate();
        let (_, proof) = kp.evaluate(b"original");
        assert!(proof_to_hash(&kp.public_key(), b"tampered", &proof).is_err());
    }

    #[test]
    fn tampered_proof_rejected() {
        let kp = VrfKeypair::generate();
        let msg = b"message";
        let (_, mut proof) = kp.evaluate(msg);
        proof[0] ^= 0xFF;
        assert!(proof_to_hash(&kp.public_key(), msg, &proof).is_err());
    }
}
