//! Lead melody.

use rand::Rng;

use super::style::{LeadDescriptor, LeadStyle};
use super::{
    center_toward_phrase, draw_jump, passes_gates, snap_probability, wrap_index,
    GenerationParams, BAR_LEN, PHRASE_LEN,
};
use crate::sequencing::pattern::{empty_row, PatternRow};
use crate::theory::snap_to_chord_tone;
use crate::STEP_COUNT;

const REPEAT_PROBABILITY: f64 = 0.35;
const HOLD_PROBABILITY: f64 = 0.3;
const SYNCOPATED_SKIP: f64 = 0.6;
const SPARSE_SKIP: f64 = 0.6;
const RUN_REVERSE: f64 = 0.15;
const PHRASE_ECHO: f64 = 0.7;
const RESPONSE_DOWN: f64 = 0.7;
const RESPONSE_SKIP: f64 = 0.3;
const TRILL_PERIOD: usize = 8;

const FLOAT_WEIGHTS: [f64; 3] = [0.1, 0.3, 0.6];
const CREEP_WEIGHTS: [f64; 3] = [1.0, 0.0, 0.0];

struct MelodyState {
    index: usize,
    direction: i64,
    phrase: Option<usize>,
    trill_base: usize,
    emitted: usize,
}

/// Style-specific skip rule, checked before the shared gates.
fn skips_step<R: Rng>(rng: &mut R, style: LeadStyle, step: usize) -> bool {
    match style {
        LeadStyle::RepeatHold => rng.random_bool(HOLD_PROBABILITY),
        LeadStyle::Syncopated => step % 4 == 0 && rng.random_bool(SYNCOPATED_SKIP),
        LeadStyle::Swing => !matches!(step % 4, 0 | 3),
        LeadStyle::Creep => step % 2 != 0,
        LeadStyle::Sparse | LeadStyle::Float => step % 8 != 0 && rng.random_bool(SPARSE_SKIP),
        LeadStyle::CallResponse => {
            step % PHRASE_LEN >= PHRASE_LEN / 2 && rng.random_bool(RESPONSE_SKIP)
        }
        _ => false,
    }
}

/// Default index advance with the style's jump shaping.
fn advance<R: Rng>(
    rng: &mut R,
    desc: &LeadDescriptor,
    state: &mut MelodyState,
    step: usize,
    len: usize,
) -> usize {
    let current = state.index as i64;
    let next = match desc.style {
        LeadStyle::RepeatHold if rng.random_bool(REPEAT_PROBABILITY) => current,
        LeadStyle::Creep => current + draw_jump(rng, &CREEP_WEIGHTS),
        LeadStyle::Float => current + draw_jump(rng, &FLOAT_WEIGHTS),
        LeadStyle::Run => {
            let at_edge = (state.direction > 0 && state.index + 1 >= len)
                || (state.direction < 0 && state.index == 0);
            if at_edge || rng.random_bool(RUN_REVERSE) {
                state.direction = -state.direction;
            }
            let magnitude = draw_jump(rng, &desc.jump_weights).abs();
            // Runs bounce off the edges rather than wrapping.
            return (current + state.direction * magnitude).clamp(0, len as i64 - 1) as usize;
        }
        LeadStyle::Heroic if step % BAR_LEN == 0 => current + rng.random_range(4..=5),
        LeadStyle::CallResponse if step % PHRASE_LEN >= PHRASE_LEN / 2 => {
            let magnitude = draw_jump(rng, &desc.jump_weights).abs();
            if rng.random_bool(RESPONSE_DOWN) {
                current - magnitude
            } else {
                current + magnitude
            }
        }
        _ => current + draw_jump(rng, &desc.jump_weights),
    };
    wrap_index(next, len)
}

pub(super) fn generate<R: Rng>(
    rng: &mut R,
    desc: &LeadDescriptor,
    params: &GenerationParams<'_>,
) -> PatternRow {
    let mut row = empty_row();
    let notes = params.lead_notes();
    if notes.is_empty() {
        return row;
    }
    let len = notes.len();

    let mut state = MelodyState {
        index: len / 2,
        direction: 1,
        phrase: None,
        trill_base: len / 2,
        emitted: 0,
    };

    for step in 0..STEP_COUNT {
        if skips_step(rng, desc.style, step) {
            continue;
        }
        if !passes_gates(rng, step, desc.speed, desc.rest, params.density) {
            continue;
        }

        // Phrase echo: replay what sounded half a phrase earlier.
        if desc.style == LeadStyle::Phrase && step % PHRASE_LEN >= PHRASE_LEN / 2 {
            let source = step - PHRASE_LEN / 2;
            if let Some(&pitch) = row[source].notes().first() {
                if rng.random_bool(PHRASE_ECHO) {
                    row[step].insert(pitch);
                    if let Some(index) = notes.iter().position(|&n| n == pitch) {
                        state.index = index;
                    }
                    state.emitted += 1;
                    continue;
                }
            }
        }

        let bypass = matches!(desc.style, LeadStyle::Trill | LeadStyle::Cascade);
        if bypass {
            state.index = match desc.style {
                LeadStyle::Trill => {
                    if step % TRILL_PERIOD == 0 && state.emitted > 0 {
                        let jump = draw_jump(rng, &desc.jump_weights);
                        state.trill_base = wrap_index(state.trill_base as i64 + jump, len);
                    }
                    let upper = state.emitted % 2 == 1;
                    (state.trill_base + upper as usize).min(len - 1)
                }
                _ => {
                    if state.emitted == 0 || state.index == 0 {
                        len - 1
                    } else {
                        state.index - 1
                    }
                }
            };
        } else {
            let next = advance(rng, desc, &mut state, step, len);
            state.index = next;

            let phrase = step / PHRASE_LEN;
            if state.phrase != Some(phrase) {
                state.phrase = Some(phrase);
                state.index = center_toward_phrase(state.index, len, phrase);
            }

            let p = snap_probability(step);
            if p > 0.0 && rng.random_bool(p) {
                state.index = snap_to_chord_tone(state.index, &notes, params.chords.at(step));
            }
        }

        row[step].insert(notes[state.index.min(len - 1)]);
        state.emitted += 1;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::theory::{build_chord_map, ChordSpec};

    const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

    fn run(style: LeadStyle, density: u8, seed: u64) -> PatternRow {
        let chords = build_chord_map(&MAJOR, 0, &[ChordSpec::triad(0, 100.0)]);
        let params = GenerationParams {
            intervals: &MAJOR,
            root: 0,
            density,
            chords: &chords,
        };
        let desc = LeadDescriptor {
            style,
            rest: 0.0,
            ..LeadDescriptor::default()
        };
        generate(&mut Pcg32::seed_from_u64(seed), &desc, &params)
    }

    fn pitches(row: &PatternRow) -> Vec<(usize, u8)> {
        row.iter()
            .enumerate()
            .filter_map(|(step, cell)| cell.notes().first().map(|&p| (step, p)))
            .collect()
    }

    #[test]
    fn every_style_stays_in_the_lead_register() {
        for style in LeadStyle::ALL {
            for seed in 0..8 {
                let row = run(style, 80, seed);
                for (step, pitch) in pitches(&row) {
                    assert!(
                        (57..=84).contains(&pitch),
                        "{style:?} seed {seed} step {step}: {pitch}"
                    );
                    assert!(MAJOR.contains(&(pitch % 12)));
                }
                assert!(row.iter().all(|cell| cell.len() <= 1));
            }
        }
    }

    #[test]
    fn zero_density_is_silent() {
        for style in LeadStyle::ALL {
            assert!(pitches(&run(style, 0, 9)).is_empty(), "{style:?}");
        }
    }

    #[test]
    fn swing_only_plays_long_short_pairs() {
        for (step, _) in pitches(&run(LeadStyle::Swing, 100, 5)) {
            assert!(matches!(step % 4, 0 | 3), "step {step}");
        }
    }

    #[test]
    fn creep_moves_by_single_positions_on_even_steps() {
        let chords = build_chord_map(&MAJOR, 0, &[ChordSpec::triad(0, 100.0)]);
        let params = GenerationParams {
            intervals: &MAJOR,
            root: 0,
            density: 100,
            chords: &chords,
        };
        let notes = params.lead_notes();
        let played = pitches(&run(LeadStyle::Creep, 100, 11));
        assert!(played.iter().all(|(step, _)| step % 2 == 0));

        // Away from snaps and phrase pulls, consecutive notes are neighbours.
        for pair in played.windows(2) {
            let (step, _) = pair[1];
            if step % 4 == 0 {
                continue;
            }
            let a = notes.iter().position(|&n| n == pair[0].1).unwrap() as i64;
            let b = notes.iter().position(|&n| n == pair[1].1).unwrap() as i64;
            let distance = (a - b).abs();
            assert!(distance == 1 || distance == notes.len() as i64 - 1, "{pair:?}");
        }
    }

    #[test]
    fn trill_alternates_neighbours() {
        let played = pitches(&run(LeadStyle::Trill, 100, 3));
        assert_eq!(played.len(), STEP_COUNT);
        for pair in played[..TRILL_PERIOD].windows(2) {
            assert_ne!(pair[0].1, pair[1].1);
        }
        assert_eq!(played[0].1, played[2].1);
    }

    #[test]
    fn cascade_descends_then_resets() {
        let played = pitches(&run(LeadStyle::Cascade, 100, 1));
        assert_eq!(played[0].1, 84);
        let mut resets = 0;
        for pair in played.windows(2) {
            if pair[1].1 > pair[0].1 {
                resets += 1;
                assert_eq!(pair[1].1, 84);
            }
        }
        assert!(resets > 0);
    }

    #[test]
    fn phrase_style_echoes_first_half() {
        let row = run(LeadStyle::Phrase, 100, 21);
        let echoes = (16..32)
            .filter(|&s| row[s].notes() == row[s - 16].notes())
            .count();
        assert!(echoes >= 6, "only {echoes} echoes");
    }

    #[test]
    fn same_seed_same_melody() {
        assert_eq!(run(LeadStyle::Walk, 70, 42), run(LeadStyle::Walk, 70, 42));
    }
}
