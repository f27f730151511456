use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{is_chain_valid, Ledger, ProofOfWork, Transaction};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn bench_pow(c: &mut Criterion) {
    let pow = ProofOfWork::default();

    c.bench_function("solve_difficulty_4", |b| {
        b.iter(|| pow.solve(black_box(1)).unwrap());
    });

    c.bench_function("solve_parallel_difficulty_4", |b| {
        b.iter(|| pow.solve_parallel(black_box(1)).unwrap());
    });

    c.bench_function("validate_chain_16_blocks", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        let mut ledger = Ledger::new(pow);
        while ledger.len() < 16 {
            for i in 0..10 {
                ledger
                    .add_transaction(Transaction::new(
                        format!("alice-{i}"),
                        "bob",
                        rng.gen_range(1..10i64),
                    ))
                    .unwrap();
            }
            let previous = ledger.previous_block().unwrap();
            let proof = pow.solve(previous.proof).unwrap();
            let hash = previous.hash();
            ledger.create_block(proof, hash);
        }
        let chain = ledger.chain().to_vec();
        b.iter(|| assert!(is_chain_valid(black_box(&chain), &pow)));
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
