//! Benchmarks for the era oscillators.

use std::hint::black_box;

use bitstep::dsp::oscillator::{NoiseBuffer, NoisePlayer, Oscillator, Timbre};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for timbre in Timbre::ALL {
            if timbre == Timbre::Noise {
                continue;
            }
            let mut osc = Oscillator::new();
            group.bench_with_input(BenchmarkId::new(timbre.label(), size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = osc.next_sample(black_box(timbre), 440.0, SAMPLE_RATE);
                    }
                })
            });
        }

        // Noise - resampled read from the shared buffer
        let noise = NoiseBuffer::new(SAMPLE_RATE);
        let mut player = NoisePlayer::start(72);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = player.next_sample(black_box(&noise));
                }
            })
        });
    }

    group.finish();
}
