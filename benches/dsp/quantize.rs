//! Benchmarks for amplitude quantization: baked curve against the direct form.

use std::hint::black_box;

use bitstep::dsp::quantize::{quantize, QuantizeCurve};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/quantize");

    for &size in BLOCK_SIZES {
        let source: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32 * std::f32::consts::TAU).sin())
            .collect();
        let mut buffer = source.clone();

        let curve = QuantizeCurve::new(16);
        group.bench_with_input(BenchmarkId::new("curve_16", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&source);
                curve.process(black_box(&mut buffer));
            })
        });

        group.bench_with_input(BenchmarkId::new("direct_16", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&source) {
                    *out = quantize(black_box(x), 16);
                }
            })
        });
    }

    group.finish();
}
