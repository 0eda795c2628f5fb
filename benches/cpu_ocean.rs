use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use ocean_field::fft::{transform_2d, ButterflyTable, Complex32, Direction};
use ocean_field::ocean::cpu_field_operations::surface_point;
use ocean_field::{CpuOceanField, InitialSpectrum, OceanFieldParams};

fn params(resolution: u32) -> OceanFieldParams {
    OceanFieldParams {
        resolution,
        random_seed: 7,
        ..OceanFieldParams::default()
    }
}

fn benchmark_transform_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("ifft2");
    for resolution in [64u32, 128, 256] {
        let table = ButterflyTable::new(resolution).unwrap();
        let n = resolution as usize;
        let input: Vec<Complex32> = (0..n * n)
            .map(|i| Complex32::new((i % 7) as f32, (i % 3) as f32))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(resolution), &input, |b, input| {
            b.iter(|| {
                let mut data = input.clone();
                transform_2d(&table, &mut data, Direction::Inverse);
                black_box(data);
            });
        });
    }
    group.finish();
}

fn benchmark_initial_spectrum(c: &mut Criterion) {
    let params = params(128);
    c.bench_function("initial_spectrum_128", |b| {
        b.iter(|| black_box(InitialSpectrum::generate(&params)));
    });
}

fn benchmark_field_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_field_update");
    group.sample_size(20);
    for resolution in [64u32, 128] {
        let mut field = CpuOceanField::new(params(resolution)).unwrap();
        let mut time = 0.0;
        group.bench_function(BenchmarkId::from_parameter(resolution), |b| {
            b.iter(|| {
                time += 1.0 / 60.0;
                field.update(time).unwrap();
            });
        });
        black_box(surface_point(&field.data_maps(), Vec2::new(1.0, 2.0)));
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_transform_2d,
    benchmark_initial_spectrum,
    benchmark_field_update
);
criterion_main!(benches);
