//! # BLS12-381 Threshold Signatures
//!
//! The FBFT voting strategy (§4.7) has its leader sum up every validator's
//! prepare/commit signature into a single aggregate that verifies in one
//! check instead of N. That's the one thing Ed25519 can't do cheaply, so this
//! module wraps `blst`'s min-signature-size group (48-byte signatures,
//! 96-byte public keys) instead of reusing `crypto::keys`.

use blst::min_sig::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

const DST: &[u8] = b"FRIDAY-CONSENSUS-BLS12381G1_XMD:SHA-256_SSWU_RO_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlsError {
    #[error("BLS signature failed to verify")]
    InvalidSignature,
    #[error("malformed BLS key or signature bytes")]
    Malformed,
    #[error("cannot aggregate an empty signature or public key set")]
    EmptyAggregate,
}

fn map_err(e: BLST_ERROR) -> BlsError {
    match e {
        BLST_ERROR::BLST_SUCCESS => unreachable!("success mapped as error"),
        _ => BlsError::Malformed,
    }
}

/// A validator's BLS secret key, used to sign prepare/commit hashes.
#[derive(Debug)]
pub struct BlsSecretKey {
    inner: SecretKey,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlsPublicKey {
    bytes: [u8; 96],
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlsSignature {
    bytes: [u8; 48],
}

impl BlsSecretKey {
    /// Generates a fresh secret key from 32 bytes of OS randomness.
    pub fn generate() -> Self {
        let mut ikm = [0u8; 32];
        OsRng.fill_bytes(&mut ikm);
        let inner = SecretKey::key_gen(&ikm, &[]).expect("32-byte IKM always key-generates");
        Self { inner }
    }

    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey {
            bytes: self.inner.sk_to_pk().to_bytes(),
        }
    }

    /// Signs a 32-byte block (or aggregate) hash.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> BlsSignature {
        let sig = self.inner.sign(hash, DST, &[]);
        BlsSignature {
            bytes: sig.to_bytes(),
        }
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: [u8; 96]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 96] {
        &self.bytes
    }

    fn to_inner(&self) -> Result<PublicKey, BlsError> {
        PublicKey::from_bytes(&self.bytes).map_err(map_err)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: [u8; 48]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 48] {
        &self.bytes
    }

    fn to_inner(&self) -> Result<Signature, BlsError> {
        Signature::from_bytes(&self.bytes).map_err(map_err)
    }

    /// Verifies this signature over `hash` against `public_key`.
    pub fn verify_hash(&self, public_key: &BlsPublicKey, hash: &[u8; 32]) -> Result<(), BlsError> {
        let sig = self.to_inner()?;
        let pk = public_key.to_inner()?;
        match sig.verify(true, hash, DST, &[], &pk, true) {
            BLST_ERROR::BLST_SUCCESS => Ok(()),
            _ => Err(BlsError::InvalidSignature),
        }
    }
}

/// Sums a set of per-validator signatures over the same message into one
/// aggregate signature, as the FBFT leader does before broadcasting `Prepared`.
pub fn aggregate_signatures(sigs: &[BlsSignature]) -> Result<BlsSignature, BlsError> {
    if sigs.is_empty() {
        return Err(BlsError::EmptyAggregate);
    }
    let inner: Vec<Signature> = sigs
        .iter()
        .map(BlsSignature::to_inner)
        .collect::<Result<_, _>>()?;
    let refs: Vec<&Signature> = inner.iter().collect();
    let agg = AggregateSignature::aggregate(&refs, true).map_err(map_err)?;
    Ok(BlsSignature {
        bytes: agg.to_signature().to_bytes(),
    })
}

/// Sums the matching public keys, so followers can verify the aggregate
/// signature against a single combined key.
pub fn aggregate_public_keys(keys: &[BlsPublicKey]) -> Result<BlsPublicKey, BlsError> {
    if keys.is_empty() {
        return Err(BlsError::EmptyAggregate);
    }
    let inner: Vec<PublicKey> = keys
        .iter()
        .map(BlsPublicKey::to_inner)
        .collect::<Result<_, _>>()?;
    let refs: Vec<&PublicKey> = inner.iter().collect();
    let agg = AggregatePublicKey::aggregate(&refs, true).map_err(map_err)?;
    Ok(BlsPublicKey {
        bytes: agg.to_public_key().to_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let sk = BlsSecretKey::generate();
        let hash = [7u8; 32];
        let sig = sk.sign_hash(&hash);
        assert!(sig.verify_hash(&sk.public_key(), &hash).is_ok());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let sk = BlsSecretKey::generate();
        let other = BlsSecretKey::generate();
        let hash = [1u8; 32];
        let sig = sk.sign_hash(&hash);
        assert!(sig.verify_hash(&other.public_key(), &hash).is_err());
    }

    #[test]
    fn aggregate_signature_verifies_against_aggregate_key() {
        let keys: Vec<BlsSecretKey> = (0..4).map(|_| BlsSecretKey::generate()).collect();
        let hash = [9u8; 32];
        let sigs: Vec<BlsSignature> = keys.iter().map(|k| k.sign_hash(&hash)).collect();
        let pubkeys: Vec<BlsPublicKey> = keys.iter().map(|k| k.public_key()).collect();

        let agg_sig = aggregate_signatures(&sigs).unwrap();
        let agg_pk = aggregate_public_keys(&pubkeys).unwrap();
        assert!(agg_sig.verify_hash(&agg_pk, &hash).is_ok());
    }

    #[test]
    fn empty_aggregate_rejected() {
        assert_eq!(aggregate_signatures(&[]), Err(BlsError::EmptyAggregate));
        assert_eq!(aggregate_public_keys(&[]), Err(BlsError::EmptyAggregate));
    }
}
