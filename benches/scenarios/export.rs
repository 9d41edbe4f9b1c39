//! Benchmarks for offline export: one loop render plus tiling.
//!
//! Runs at 8kHz so an iteration stays in the tens of milliseconds; the cost
//! scales linearly with the rate.

use std::hint::black_box;
use std::io;

use bitstep::config::Library;
use bitstep::export::Exporter;
use bitstep::generate::{GenerationParams, Generator};
use bitstep::profile::BitMode;
use bitstep::sequencing::Composition;
use bitstep::theory::build_chord_map;
use criterion::{BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn composition(mode: BitMode) -> Composition {
    let library = Library::builtin();
    let preset = library.preset("racing");
    let scale = library.scale(&preset.scale);
    let progression = library.progression(&preset.progression);
    let chords = build_chord_map(&scale.intervals, preset.root, &progression.chords);
    let params = GenerationParams {
        intervals: &scale.intervals,
        root: preset.root,
        density: preset.density,
        chords: &chords,
    };

    let mut composition = Composition {
        bit_mode: mode,
        bpm: preset.tempo,
        ..Composition::default()
    };
    Generator::new(Pcg32::seed_from_u64(3)).generate_all(
        &mut composition.pattern,
        &preset.style,
        &params,
    );
    composition
}

pub fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/export");
    group.sample_size(10);
    let exporter = Exporter::new(8_000);

    for mode in BitMode::ALL {
        let composition = composition(mode);
        group.bench_with_input(BenchmarkId::new("one_loop", mode.label()), &mode, |b, _| {
            b.iter(|| {
                exporter
                    .export(black_box(&composition), None, &mut io::sink())
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("sixty_seconds", mode.label()), &mode, |b, _| {
            b.iter(|| {
                exporter
                    .export(black_box(&composition), Some(60.0), &mut io::sink())
                    .unwrap()
            })
        });
    }

    group.finish();
}
