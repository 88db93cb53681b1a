//! Benchmarks for the Poseidon adapter

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use zkcred_prover::field::FieldElement;
use zkcred_prover::hash::{generate_identity_secret, CircomPoseidon, FieldHasher, MAX_ARITY};
use zkcred_prover::identity;

fn bench_hash_single(c: &mut Criterion) {
    let poseidon = CircomPoseidon::initialized().unwrap();
    let x = FieldElement::from(12345u64);

    c.bench_function("poseidon_1", |b| {
        b.iter(|| poseidon.hash_single(black_box(x)).unwrap())
    });
}

fn bench_hash_two(c: &mut Criterion) {
    let poseidon = CircomPoseidon::initialized().unwrap();
    let a = FieldElement::from(1u64);
    let b = FieldElement::from(2u64);

    c.bench_function("poseidon_2", |bench| {
        bench.iter(|| poseidon.hash_two(black_box(a), black_box(b)).unwrap())
    });
}

fn bench_hash_arity(c: &mut Criterion) {
    let poseidon = CircomPoseidon::initialized().unwrap();
    let mut group = c.benchmark_group("poseidon_arity");

    for arity in [3, 6, MAX_ARITY] {
        let inputs: Vec<FieldElement> = (0..arity as u64).map(FieldElement::from).collect();
        group.bench_with_input(BenchmarkId::from_parameter(arity), &inputs, |b, inputs| {
            b.iter(|| poseidon.hash(black_box(inputs)).unwrap())
        });
    }

    group.finish();
}

fn bench_identity(c: &mut Criterion) {
    let poseidon = CircomPoseidon::initialized().unwrap();
    let secret = generate_identity_secret();
    let context = FieldElement::from_label("bench-round");

    c.bench_function("generate_identity_secret", |b| b.iter(generate_identity_secret));

    c.bench_function("nullifier_hash", |b| {
        b.iter(|| identity::nullifier_hash(&poseidon, black_box(secret), black_box(context)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_hash_single,
    bench_hash_two,
    bench_hash_arity,
    bench_identity,
);
criterion_main!(benches);
