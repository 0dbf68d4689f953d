use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{mine::mine, BlockTemplate, CancelFlag, Difficulty};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_pow(c: &mut Criterion) {
    c.bench_function("mine_block_target_16", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        let template = BlockTemplate {
            index: 1,
            timestamp: "2024-01-01T00:00:00+00:00".into(),
            payload: rng.gen_range(40..200),
            prev_hash: String::new(),
        };

        b.iter(|| {
            let _mined = mine(&template, Difficulty::default(), &CancelFlag::new());
        });
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
