// Consensus primitive benchmarks.
//
// Covers block hashing, VRF evaluation/verification, BLS signing/verification
// and aggregation, and the signature pool's collection path — the
// per-round hot paths identified in the consensus runtime.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use nova_protocol::consensus::block::VrfMessage;
use nova_protocol::consensus::signature_pool::SignaturePool;
use nova_protocol::consensus::vote::{Vote, VoteKind, VotePayload};
use nova_protocol::consensus::Block;
use nova_protocol::crypto::{BlsSecretKey, VrfKeypair};

fn bench_block_hash(c: &mut Criterion) {
    c.bench_function("consensus/block_new", |b| {
        b.iter(|| Block::new(1, 1_000, 1, VrfMessage::genesis()));
    });
}

fn bench_vrf_evaluate(c: &mut Criterion) {
    let kp = VrfKeypair::generate();
    let message = [7u8; 32];
    c.bench_function("consensus/vrf_evaluate", |b| {
        b.iter(|| kp.evaluate(&message));
    });
}

fn bench_vrf_verify(c: &mut Criterion) {
    let kp = VrfKeypair::generate();
    let message = [7u8; 32];
    let (_, proof) = kp.evaluate(&message);
    c.bench_function("consensus/vrf_verify", |b| {
        b.iter(|| nova_protocol::crypto::proof_to_hash(&kp.public_key(), &message, &proof));
    });
}

fn bench_bls_sign_and_verify(c: &mut Criterion) {
    let sk = BlsSecretKey::generate();
    let hash = [9u8; 32];
    let sig = sk.sign_hash(&hash);
    let pk = sk.public_key();

    c.bench_function("consensus/bls_sign", |b| {
        b.iter(|| sk.sign_hash(&hash));
    });
    c.bench_function("consensus/bls_verify", |b| {
        b.iter(|| sig.verify_hash(&pk, &hash));
    });
}

fn bench_bls_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus/bls_aggregate");
    for n in [4usize, 16, 64] {
        let keys: Vec<BlsSecretKey> = (0..n).map(|_| BlsSecretKey::generate()).collect();
        let hash = [3u8; 32];
        let sigs: Vec<_> = keys.iter().map(|k| k.sign_hash(&hash)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &sigs, |b, sigs| {
            b.iter(|| nova_protocol::crypto::aggregate_signatures(sigs));
        });
    }
    group.finish();
}

fn bench_signature_pool_round_trip(c: &mut Criterion) {
    c.bench_function("consensus/signature_pool_round_trip", |b| {
        b.iter(|| {
            let pool = SignaturePool::new();
            for id in 1..=4u32 {
                pool.add(Vote::new(
                    id,
                    VoteKind::Commit,
                    1,
                    VotePayload::RngNumber(id as i32),
                ));
            }
            pool.wait_and_remove(VoteKind::Commit, 1, 4).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_block_hash,
    bench_vrf_evaluate,
    bench_vrf_verify,
    bench_bls_sign_and_verify,
    bench_bls_aggregate,
    bench_signature_pool_round_trip,
);
criterion_main!(benches);
