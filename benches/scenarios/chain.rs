//! Benchmarks for the full signal chain in each era.
//!
//! Each iteration starts a four-voice chord so the pool stays busy, then
//! renders one interleaved stereo block.

use std::hint::black_box;

use bitstep::dsp::Timbre;
use bitstep::engine::SignalChain;
use bitstep::profile::BitMode;
use bitstep::sequencing::{NoteEvent, Voice};
use bitstep::CHANNELS;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn chord(time: f64) -> [NoteEvent; 4] {
    let note = |voice, pitch, timbre| NoteEvent {
        voice,
        pitch,
        timbre,
        gain: 0.4,
        time,
        duration: 0.3,
    };
    [
        note(Voice::Lead, 72, Timbre::Sawtooth),
        note(Voice::Bass, 43, Timbre::Triangle),
        note(Voice::Arp, 67, Timbre::Pulse),
        note(Voice::Percussion, 42, Timbre::Noise),
    ]
}

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");

    for mode in BitMode::ALL {
        for &size in BLOCK_SIZES {
            let mut buffer = vec![0.0f32; size * CHANNELS];
            let mut chain = SignalChain::new(SAMPLE_RATE, mode);

            group.bench_with_input(BenchmarkId::new(mode.label(), size), &size, |b, _| {
                b.iter(|| {
                    for event in chord(chain.now()) {
                        chain.schedule(event);
                    }
                    chain.render(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
