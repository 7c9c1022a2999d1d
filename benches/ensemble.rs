use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use marigold_ensemble_rs::depth_pipeline::{
    DepthEnsembler, EnsembleConfig, Reduction,
};
use ndarray::Array4;

fn generate_mock_batch(batch_size: usize, height: usize, width: usize) -> Array4<f32> {
    Array4::from_shape_fn((batch_size, 1, height, width), |(k, _, y, x)| {
        let base = ((x * 7 + y * 13) % 97) as f32 / 97.0 + 0.1;
        let scale = 1.0 + 0.3 * k as f32;
        let shift = 0.05 * k as f32;
        scale * base + shift
    })
}

fn benchmark_ensemble_resolutions(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble_by_resolution");

    let sizes = vec![
        (64, 64, "64x64"),
        (256, 256, "256x256"),
        (480, 640, "480x640"),
    ];

    for (height, width, label) in sizes {
        let batch = generate_mock_batch(5, height, width);

        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &batch,
            |b, batch| {
                let ensembler = DepthEnsembler::new(EnsembleConfig::default());

                b.iter(|| {
                    let _ = ensembler.ensemble(black_box(batch.view().into_dyn()));
                });
            },
        );
    }

    group.finish();
}

fn benchmark_ensemble_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble_by_size");

    for batch_size in [2usize, 5, 10] {
        let batch = generate_mock_batch(batch_size, 128, 128);

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch,
            |b, batch| {
                let ensembler = DepthEnsembler::new(EnsembleConfig::default());

                b.iter(|| {
                    let _ = ensembler.ensemble(black_box(batch.view().into_dyn()));
                });
            },
        );
    }

    group.finish();
}

fn benchmark_reductions(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduction_methods");
    let batch = generate_mock_batch(5, 128, 128);

    let reductions = vec![
        (Reduction::Mean, "mean"),
        (Reduction::Median, "median"),
    ];

    for (reduction, label) in reductions {
        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &batch,
            |b, batch| {
                let config = EnsembleConfig::builder()
                    .reduction(reduction)
                    .output_uncertainty(true)
                    .build();
                let ensembler = DepthEnsembler::new(config);

                b.iter(|| {
                    let _ = ensembler.ensemble(black_box(batch.view().into_dyn()));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_ensemble_resolutions,
    benchmark_ensemble_sizes,
    benchmark_reductions
);
criterion_main!(benches);
