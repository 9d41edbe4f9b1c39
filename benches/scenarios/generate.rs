//! Benchmarks for composing all four voices from a preset.

use std::hint::black_box;

use bitstep::config::Library;
use bitstep::generate::{GenerationParams, Generator};
use bitstep::sequencing::PatternStore;
use bitstep::theory::build_chord_map;
use criterion::{BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg32;

pub fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/generate");
    let library = Library::builtin();

    for name in ["overworld", "boss", "space"] {
        let preset = library.preset(name);
        let scale = library.scale(&preset.scale);
        let progression = library.progression(&preset.progression);
        let chords = build_chord_map(&scale.intervals, preset.root, &progression.chords);
        let params = GenerationParams {
            intervals: &scale.intervals,
            root: preset.root,
            density: preset.density,
            chords: &chords,
        };
        let mut generator = Generator::new(Pcg32::seed_from_u64(7));
        let mut store = PatternStore::new();

        group.bench_with_input(BenchmarkId::new("all_voices", name), &name, |b, _| {
            b.iter(|| {
                generator.generate_all(black_box(&mut store), &preset.style, &params);
            })
        });
    }

    group.finish();
}
