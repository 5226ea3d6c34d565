use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use hippodata::{split_trials, trial_boundaries, Split, TrialFolds};
use ndarray::Array2;

/// ~1 h of 25 ms bins: 240 laps of 600 bins.
fn track(n_laps: usize, lap: usize) -> Array2<f32> {
    Array2::from_shape_fn((n_laps * lap, 2), |(t, c)| {
        let k = t % lap;
        match c {
            0 => k as f32 / lap as f32,
            _ if k < lap / 2 => 1.0,
            _ => -1.0,
        }
    })
}

fn bench_boundaries(c: &mut Criterion) {
    let b = track(240, 600);
    c.bench_function("trial_boundaries [144000×2]", |bch| {
        bch.iter(|| black_box(trial_boundaries(black_box(&b)).unwrap().len()))
    });
}

fn bench_folds(c: &mut Criterion) {
    c.bench_function("TrialFolds::new 240 trials", |bch| {
        bch.iter(|| black_box(TrialFolds::new(black_box(240), 1).unwrap().train.len()))
    });
}

fn bench_split_gather(c: &mut Criterion) {
    let b = track(240, 600);
    let neural = Array2::<f32>::ones((b.nrows(), 120));
    c.bench_function("split + gather train [144000×120]", |bch| {
        bch.iter(|| {
            let sel = split_trials(&b, 0, Split::Train).unwrap();
            black_box(sel.gather(&neural).nrows())
        })
    });
}

criterion_group!(benches, bench_boundaries, bench_folds, bench_split_gather);
criterion_main!(benches);
