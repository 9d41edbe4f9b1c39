//! Bass lines built from the active chord's root and fifth.

use rand::Rng;

use super::style::{BassDescriptor, BassStyle};
use super::{passes_gates, GenerationParams, BASS_SPLIT, BAR_LEN};
use crate::sequencing::pattern::{empty_row, PatternRow};
use crate::theory::{find_bass_note, Chord};
use crate::{MIN_NOTE, STEP_COUNT};

const DRONE_FIFTH: f64 = 0.25;
const PULSE_FIFTH: f64 = 0.5;
const SYNCOPATED_ACCENTS: [usize; 5] = [0, 3, 6, 10, 12];

/// What a step asks for, before the gates decide whether it sounds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Hit {
    Root,
    Fifth,
    /// Root, or the fifth with the given probability.
    MaybeFifth(f64),
    Octave,
    /// Chord tone by position in the chord.
    Tone(usize),
}

fn hit_for(style: BassStyle, step: usize) -> Option<Hit> {
    match style {
        BassStyle::Root => (step % 4 == 0).then_some(Hit::Root),
        BassStyle::RootFifth => match step % 8 {
            0 => Some(Hit::Root),
            4 => Some(Hit::Fifth),
            _ => None,
        },
        BassStyle::Walking => (step % 4 == 0).then_some(Hit::Tone(step / 4)),
        BassStyle::Driving => (step % 2 == 0).then_some(Hit::Root),
        BassStyle::Drone => match (step % 4, step % BAR_LEN) {
            (0, 0) => Some(Hit::Root),
            (0, _) => Some(Hit::MaybeFifth(DRONE_FIFTH)),
            _ => None,
        },
        BassStyle::Syncopated => SYNCOPATED_ACCENTS
            .contains(&(step % BAR_LEN))
            .then_some(Hit::Root),
        BassStyle::March => match step % 8 {
            0 | 4 => Some(Hit::Root),
            3 | 6 => Some(Hit::Fifth),
            _ => None,
        },
        BassStyle::Pulse => match step % BAR_LEN {
            0 => Some(Hit::Root),
            8 => Some(Hit::MaybeFifth(PULSE_FIFTH)),
            _ => None,
        },
        BassStyle::Octave => match step % 4 {
            0 => Some(Hit::Root),
            2 => Some(Hit::Octave),
            _ => None,
        },
        BassStyle::Arpeggio => (step % 2 == 0).then_some(Hit::Tone(step / 2)),
    }
}

/// Half step under the next chord's root, or over it when under would leave
/// the pitch range.
fn approach_tone(notes: &[u8], next: &Chord) -> Option<u8> {
    let target = find_bass_note(notes, next.root)?;
    if target > MIN_NOTE {
        Some(target - 1)
    } else {
        Some(target + 1)
    }
}

/// The root's octave partner, kept below the split.
fn octave_of(root: u8) -> u8 {
    if root + 12 < BASS_SPLIT {
        root + 12
    } else {
        root - 12
    }
}

fn approaches(style: BassStyle, on_grid: bool) -> bool {
    match style {
        BassStyle::Walking => true,
        BassStyle::Driving => !on_grid,
        _ => false,
    }
}

fn chord_pitch<R: Rng>(rng: &mut R, hit: Hit, notes: &[u8], chord: &Chord) -> Option<u8> {
    let pitch_class = match hit {
        Hit::Root | Hit::Octave => chord.root,
        Hit::Fifth => chord.fifth(),
        Hit::MaybeFifth(p) => {
            if rng.random_bool(p) {
                chord.fifth()
            } else {
                chord.root
            }
        }
        Hit::Tone(position) => chord.tones[position % chord.tones.len().max(1)],
    };
    let pitch = find_bass_note(notes, pitch_class)?;
    Some(if hit == Hit::Octave { octave_of(pitch) } else { pitch })
}

pub(super) fn generate<R: Rng>(
    rng: &mut R,
    desc: &BassDescriptor,
    params: &GenerationParams<'_>,
) -> PatternRow {
    let mut row = empty_row();
    let notes = params.bass_notes();
    if notes.is_empty() {
        return row;
    }

    for step in 0..STEP_COUNT {
        let hit = hit_for(desc.style, step);
        let pitch = match hit {
            Some(hit) if passes_gates(rng, step, desc.speed, desc.rest, params.density) => {
                chord_pitch(rng, hit, &notes, params.chords.at(step))
            }
            _ => None,
        };

        // Approach tones fill silent steps and skip the gates. Walking takes
        // any silent step, gated beats included; Driving only its off-steps.
        let approach = pitch.is_none()
            && approaches(desc.style, hit.is_some())
            && params.chords.root_changes_after(step);
        let pitch = if approach {
            approach_tone(&notes, params.chords.at(step + 1))
        } else {
            pitch
        };
        if let Some(pitch) = pitch {
            row[step].insert(pitch);
        }
    }
    row
}
