//! Benchmarks for the partitioned reverb convolution.
//!
//! A 2 s impulse at 44.1kHz is ~172 partitions; this is the most expensive
//! stage of the 32-bit chain.

use std::hint::black_box;

use bitstep::dsp::convolver::{synthetic_impulse, PartitionedConvolver};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolver");
    let [left, _] = synthetic_impulse(SAMPLE_RATE, 2.0, 2.0);

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| ((i * 7919) % 13) as f32 / 13.0 - 0.5).collect();
        let mut output = vec![0.0f32; size];

        let mut convolver = PartitionedConvolver::new(&left);
        group.bench_with_input(BenchmarkId::new("reverb_2s", size), &size, |b, _| {
            b.iter(|| {
                convolver.render(black_box(&input), black_box(&mut output));
            })
        });
    }

    group.finish();
}
