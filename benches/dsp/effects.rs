//! Benchmarks for the lowpass filter and the feedback delay.

use std::hint::black_box;

use bitstep::dsp::delay::FeedbackDelay;
use bitstep::dsp::filter::SVFilter;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/effects");

    for &size in BLOCK_SIZES {
        let mut buffer: Vec<f32> = (0..size).map(|i| if i % 64 < 32 { 0.5 } else { -0.5 }).collect();

        let mut filter = SVFilter::lowpass(4_000.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                filter.render(black_box(&mut buffer));
            })
        });

        let mut delay = FeedbackDelay::new(0.25, 0.35, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("delay", size), &size, |b, _| {
            b.iter(|| {
                delay.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
