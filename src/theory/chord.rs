//! Diatonic chords, the per-step chord map, and chord-tone search.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pitch_class;
use crate::STEP_COUNT;

/// Widest offset (in note-list positions) a melody note may move when snapping.
const SNAP_RADIUS: usize = 6;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordType {
    /// Root, third, fifth.
    Triad,
    /// Root, third, fifth, seventh.
    Seventh,
}

/// One entry of a chord progression.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChordSpec {
    /// Zero-based scale degree of the chord root.
    pub degree: usize,
    pub chord_type: ChordType,
    /// Steps (out of STEP_COUNT) this chord spans.
    pub relative_steps: f64,
}

impl ChordSpec {
    pub fn triad(degree: usize, relative_steps: f64) -> Self {
        Self {
            degree,
            chord_type: ChordType::Triad,
            relative_steps,
        }
    }

    pub fn seventh(degree: usize, relative_steps: f64) -> Self {
        Self {
            degree,
            chord_type: ChordType::Seventh,
            relative_steps,
        }
    }
}

/// Harmonic context for one step, reduced to pitch classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub root: u8,
    /// Root first, then third, fifth and (for sevenths) seventh.
    pub tones: Vec<u8>,
    pub degree: usize,
}

impl Chord {
    /// Whether the pitch's class is one of this chord's tones.
    pub fn contains(&self, pitch: u8) -> bool {
        self.tones.contains(&pitch_class(pitch))
    }

    /// Pitch class of the fifth (falls back to the root for degenerate chords).
    pub fn fifth(&self) -> u8 {
        self.tones.get(2).copied().unwrap_or(self.root)
    }
}

/// Exactly one chord per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordMap {
    chords: Vec<Chord>,
}

impl ChordMap {
    /// Chord active at `step`; steps wrap around the loop.
    pub fn at(&self, step: usize) -> &Chord {
        &self.chords[step % self.chords.len()]
    }

    /// Whether the chord root changes between `step` and the step after it.
    pub fn root_changes_after(&self, step: usize) -> bool {
        self.at(step).root != self.at(step + 1).root
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chord> {
        self.chords.iter()
    }
}

/// Pitch class of scale degree `degree`, walking the interval table with
/// octave wraparound.
fn degree_pitch_class(intervals: &[u8], root: u8, degree: usize) -> u8 {
    if intervals.is_empty() {
        return pitch_class(root);
    }
    let len = intervals.len();
    let octave = 12 * (degree / len) as u32;
    let absolute = root as u32 + intervals[degree % len] as u32 + octave;
    (absolute % 12) as u8
}

/// Stack thirds diatonically on a scale degree.
fn diatonic_chord(intervals: &[u8], root: u8, spec: &ChordSpec) -> Chord {
    let stack: &[usize] = match spec.chord_type {
        ChordType::Triad => &[0, 2, 4],
        ChordType::Seventh => &[0, 2, 4, 6],
    };
    // Whole octaves of degrees vanish in the pitch-class reduction.
    let base = spec.degree % intervals.len().max(1);
    let tones: Vec<u8> = stack
        .iter()
        .map(|offset| degree_pitch_class(intervals, root, base + offset))
        .collect();

    Chord {
        root: tones[0],
        tones,
        degree: spec.degree,
    }
}

/// Build the per-step chord map for a progression.
///
/// Each chord spans `round(relative_steps)` steps; once the list runs out,
/// the last chord repeats until every step has a chord. An empty progression
/// yields a tonic triad everywhere.
pub fn build_chord_map(intervals: &[u8], root: u8, progression: &[ChordSpec]) -> ChordMap {
    let mut chords = Vec::with_capacity(STEP_COUNT);

    for spec in progression {
        let remaining = STEP_COUNT - chords.len();
        if remaining == 0 {
            break;
        }
        let span = (spec.relative_steps.max(0.0).round() as usize).min(remaining);
        let chord = diatonic_chord(intervals, root, spec);
        chords.extend(std::iter::repeat(chord).take(span));
    }

    let tail = match progression.last() {
        Some(spec) => diatonic_chord(intervals, root, spec),
        None => diatonic_chord(intervals, root, &ChordSpec::triad(0, STEP_COUNT as f64)),
    };
    chords.resize(STEP_COUNT, tail);

    debug!(chords = progression.len(), "built chord map");
    ChordMap { chords }
}

/// Move `index` to the nearest position in `notes` that is a chord tone.
///
/// Offsets are tried by magnitude (0, -1, +1, -2, +2, ... up to 6). Positions
/// outside the list are skipped. Returns the original index when nothing in
/// range matches.
pub fn snap_to_chord_tone(index: usize, notes: &[u8], chord: &Chord) -> usize {
    let is_tone = |i: usize| notes.get(i).is_some_and(|&note| chord.contains(note));

    if is_tone(index) {
        return index;
    }
    for magnitude in 1..=SNAP_RADIUS {
        if let Some(below) = index.checked_sub(magnitude) {
            if is_tone(below) {
                return below;
            }
        }
        if is_tone(index + magnitude) {
            return index + magnitude;
        }
    }
    index
}

/// First (lowest) note in an ascending list with the given pitch class,
/// falling back to the list's first note. `None` only for an empty list.
pub fn find_bass_note(notes: &[u8], pc: u8) -> Option<u8> {
    notes
        .iter()
        .copied()
        .find(|&note| pitch_class(note) == pc % 12)
        .or_else(|| notes.first().copied())
}
