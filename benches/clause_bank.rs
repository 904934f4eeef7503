//! Microbenchmarks for the hot paths: clause evaluation and Type I
//! feedback, across a spread of feature-count sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ctm_clause_bank::{ClauseBank, ClauseBankConfig};

fn bank_of(num_features: usize, num_clauses: usize, num_patches: usize) -> ClauseBank {
    let config = ClauseBankConfig {
        num_features,
        num_clauses,
        num_patches,
        num_state_bits_ta: 8,
        num_state_bits_ind: 8,
        s: 3.0,
        d: 2.0,
        update_p: 1.0,
        boost_true_positive_feedback: false,
    };
    ClauseBank::new(config).expect("valid config")
}

fn bench_predict_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_eval");
    for &num_features in &[64usize, 512, 4096] {
        let bank = bank_of(num_features, 100, 4);
        let num_chunks = bank.num_chunks();
        let xi = vec![0xFFFF_FFFFu32; 4 * num_chunks];
        let mut out = vec![false; 100];

        group.bench_with_input(BenchmarkId::from_parameter(num_features), &num_features, |b, _| {
            b.iter(|| {
                bank.predict_eval(black_box(&xi), &mut out);
                black_box(&out);
            });
        });
    }
    group.finish();
}

fn bench_feedback_i(c: &mut Criterion) {
    let mut group = c.benchmark_group("feedback_i");
    for &num_features in &[64usize, 512, 4096] {
        let mut bank = bank_of(num_features, 100, 4);
        let num_chunks = bank.num_chunks();
        let xi = vec![0xFFFF_FFFFu32; 4 * num_chunks];
        let literal_active = vec![0xFFFF_FFFFu32; num_chunks];
        let clause_active = vec![true; 100];
        let mut rng = StdRng::seed_from_u64(42);

        group.bench_with_input(BenchmarkId::from_parameter(num_features), &num_features, |b, _| {
            b.iter(|| {
                bank.feedback_i(
                    black_box(&xi),
                    black_box(&literal_active),
                    black_box(&clause_active),
                    &mut rng,
                );
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_predict_eval, bench_feedback_i);
criterion_main!(benches);
