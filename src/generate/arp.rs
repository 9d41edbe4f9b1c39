//! Arpeggiator: chord tones from the upper register.

use rand::Rng;

use super::style::{ArpDescriptor, ArpStyle};
use super::{passes_gates, GenerationParams, BAR_LEN};
use crate::sequencing::pattern::{empty_row, PatternCell, PatternRow};
use crate::theory::Chord;
use crate::{MAX_NOTE, MIN_NOTE, STEP_COUNT};

/// Used when no register note belongs to the chord.
pub const FALLBACK_TRIAD: [u8; 3] = [60, 64, 67];

const SHIMMER_SKIP: f64 = 0.5;
const SHIMMER_DOUBLE: f64 = 0.3;

/// Order the default style walks the candidates in, fixed per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOrder {
    Up,
    Down,
    PingPong,
}

impl CycleOrder {
    fn index(self, counter: usize, count: usize) -> usize {
        let count = count.max(1);
        match self {
            CycleOrder::Up => counter % count,
            CycleOrder::Down => count - 1 - counter % count,
            CycleOrder::PingPong => {
                let period = (2 * count).saturating_sub(2).max(1);
                let phase = counter % period;
                let index = if phase < count { phase } else { period - phase };
                index.min(count - 1)
            }
        }
    }
}

fn candidates(register: &[u8], chord: &Chord) -> Vec<u8> {
    let tones: Vec<u8> = register
        .iter()
        .copied()
        .filter(|&note| chord.contains(note))
        .collect();
    if tones.is_empty() {
        FALLBACK_TRIAD.to_vec()
    } else {
        tones
    }
}

/// Up to three adjacent candidates from a random starting point.
fn cluster<R: Rng>(rng: &mut R, cell: &mut PatternCell, tones: &[u8]) {
    let start = rng.random_range(0..=tones.len().saturating_sub(3));
    for &note in tones.iter().skip(start).take(3) {
        cell.insert(note);
    }
}

/// Same pitch class an octave up, or down when up leaves the range.
fn octave_partner(note: u8) -> Option<u8> {
    if note + 12 <= MAX_NOTE {
        Some(note + 12)
    } else if note >= MIN_NOTE + 12 {
        Some(note - 12)
    } else {
        None
    }
}

pub(super) fn generate<R: Rng>(
    rng: &mut R,
    desc: &ArpDescriptor,
    params: &GenerationParams<'_>,
) -> PatternRow {
    let mut row = empty_row();
    let register = params.arp_notes();

    let order = match rng.random_range(0..3u8) {
        0 => CycleOrder::Up,
        1 => CycleOrder::Down,
        _ => CycleOrder::PingPong,
    };

    // Positional styles place their own hits; the speed grid would fight them.
    let speed = match desc.style {
        ArpStyle::Comping | ArpStyle::Stab | ArpStyle::Shimmer => 1,
        _ => desc.speed,
    };
    let mut counter = 0usize;

    for step in 0..STEP_COUNT {
        let eligible = match desc.style {
            ArpStyle::Comping => desc.slots.iter().any(|&slot| slot % BAR_LEN == step % BAR_LEN),
            ArpStyle::Stab => step % 4 == 2,
            ArpStyle::Shimmer => step % 4 == 0 && !rng.random_bool(SHIMMER_SKIP),
            _ => true,
        };
        if !eligible || !passes_gates(rng, step, speed, desc.rest, params.density) {
            continue;
        }

        let chord = params.chords.at(step);
        let tones = candidates(&register, chord);
        let cell = &mut row[step];

        match desc.style {
            ArpStyle::Comping | ArpStyle::Stab => cluster(rng, cell, &tones),
            ArpStyle::Power => {
                let root = tones
                    .iter()
                    .copied()
                    .find(|&note| note % 12 == chord.root)
                    .unwrap_or(tones[0]);
                cell.insert(root);
                if root + 7 <= MAX_NOTE {
                    cell.insert(root + 7);
                }
            }
            ArpStyle::Dissonant => {
                let tone = tones[rng.random_range(0..tones.len())];
                let interval = if rng.random_bool(0.5) { 1 } else { 6 };
                cell.insert(tone);
                if tone + interval <= MAX_NOTE {
                    cell.insert(tone + interval);
                }
            }
            ArpStyle::Fanfare => {
                cell.insert(tones[counter % tones.len()]);
            }
            ArpStyle::Shimmer => {
                let upper = &tones[tones.len() / 2..];
                let tone = upper[rng.random_range(0..upper.len())];
                cell.insert(tone);
                if rng.random_bool(SHIMMER_DOUBLE) {
                    if let Some(partner) = octave_partner(tone) {
                        cell.insert(partner);
                    }
                }
            }
            ArpStyle::OctaveArp => {
                let tone = tones[(counter / 2) % tones.len()];
                let note = if counter % 2 == 1 {
                    octave_partner(tone).unwrap_or(tone)
                } else {
                    tone
                };
                cell.insert(note);
            }
            ArpStyle::Cycle => {
                cell.insert(tones[order.index(counter, tones.len())]);
            }
        }
        counter += 1;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::theory::{build_chord_map, ChordMap, ChordSpec};

    const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

    fn c_major() -> ChordMap {
        build_chord_map(&MAJOR, 0, &[ChordSpec::triad(0, 100.0)])
    }

    fn run(desc: ArpDescriptor, chords: &ChordMap, seed: u64) -> PatternRow {
        let params = GenerationParams {
            intervals: &MAJOR,
            root: 0,
            density: 100,
            chords,
        };
        generate(&mut Pcg32::seed_from_u64(seed), &desc, &params)
    }

    fn style(style: ArpStyle) -> ArpDescriptor {
        ArpDescriptor {
            style,
            rest: 0.0,
            ..ArpDescriptor::default()
        }
    }

    #[test]
    fn ping_pong_is_a_clamped_triangle() {
        let order: Vec<usize> = (0..8).map(|c| CycleOrder::PingPong.index(c, 4)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 2, 1, 0, 1]);
        assert_eq!(CycleOrder::PingPong.index(5, 1), 0);
        assert_eq!(CycleOrder::Down.index(0, 3), 2);
    }

    #[test]
    fn every_style_plays_chord_tones_in_range() {
        let chords = c_major();
        for arp in ArpStyle::ALL {
            let row = run(style(arp), &chords, 5);
            let mut played = 0;
            for cell in &row {
                for &pitch in cell.notes() {
                    assert!((MIN_NOTE..=MAX_NOTE).contains(&pitch), "{arp:?}: {pitch}");
                    if arp != ArpStyle::Dissonant {
                        assert!([0, 4, 7].contains(&(pitch % 12)), "{arp:?}: {pitch}");
                    }
                }
                played += cell.len();
            }
            assert!(played > 0, "{arp:?} is silent");
        }
    }

    #[test]
    fn comping_uses_slots() {
        let row = run(style(ArpStyle::Comping), &c_major(), 8);
        for (step, cell) in row.iter().enumerate() {
            let on_slot = [0, 6, 10].contains(&(step % 16));
            assert_eq!(!cell.is_empty(), on_slot, "step {step}");
            if on_slot {
                assert_eq!(cell.len(), 3);
            }
        }
    }

    #[test]
    fn stab_lands_on_off_beats() {
        let row = run(style(ArpStyle::Stab), &c_major(), 8);
        for (step, cell) in row.iter().enumerate() {
            assert_eq!(!cell.is_empty(), step % 4 == 2, "step {step}");
        }
    }

    #[test]
    fn power_stacks_a_fifth() {
        let row = run(style(ArpStyle::Power), &c_major(), 2);
        assert_eq!(row[0].notes(), &[60, 67]);
        assert!(row[1].is_empty());
    }

    #[test]
    fn empty_intersection_falls_back_to_c_triad() {
        let chord = Chord {
            root: 1,
            tones: vec![1, 6, 8],
            degree: 0,
        };
        assert_eq!(candidates(&[60, 62, 64], &chord), FALLBACK_TRIAD.to_vec());
    }

    #[test]
    fn cycle_plays_one_note_per_hit() {
        let row = run(style(ArpStyle::Cycle), &c_major(), 13);
        assert!(row.iter().all(|cell| cell.len() <= 1));
        assert!(row.iter().enumerate().all(|(s, c)| s % 2 == 0 || c.is_empty()));
    }
}
