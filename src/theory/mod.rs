/*
Music Theory Core
=================

Pure functions over pitches, scales and diatonic chords. Nothing here keeps
state; the generator calls into it with whatever scale and root the active
style asks for.

Vocabulary
----------

  pitch        An absolute MIDI note number (60 = middle C).

  pitch class  pitch % 12. C = 0, C# = 1, ... B = 11. Octave is ignored.

  scale        An ordered set of pitch-class offsets from a root, e.g. the
               major scale is [0, 2, 4, 5, 7, 9, 11].

  note list    Every pitch in a register whose pitch class belongs to the
               scale, ascending. Generators walk an index over this list
               rather than over raw pitches, so every jump stays in key.
*/

pub mod chord;

pub use chord::{
    build_chord_map, find_bass_note, snap_to_chord_tone, Chord, ChordMap, ChordSpec, ChordType,
};

use crate::{MAX_NOTE, MIN_NOTE};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch class of an absolute pitch.
#[inline]
pub fn pitch_class(pitch: u8) -> u8 {
    pitch % 12
}

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Readable name for a pitch, e.g. `C4` for 60.
pub fn note_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[pitch_class(pitch) as usize], octave)
}

/// Ascending list of pitches in [MIN_NOTE, MAX_NOTE] that belong to the scale.
pub fn scale_notes(intervals: &[u8], root: u8) -> Vec<u8> {
    notes_in_range(intervals, root, MIN_NOTE, MAX_NOTE)
}

/// Ascending list of pitches in `low..=high` that belong to the scale.
pub fn notes_in_range(intervals: &[u8], root: u8, low: u8, high: u8) -> Vec<u8> {
    let root_pc = pitch_class(root);
    let mut in_scale = [false; 12];
    for &interval in intervals {
        in_scale[(interval % 12) as usize] = true;
    }

    (low..=high)
        .filter(|&pitch| {
            let offset = (pitch_class(pitch) + 12 - root_pc) % 12;
            in_scale[offset as usize]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

    #[test]
    fn c_major_notes_are_white_keys() {
        let notes = scale_notes(&MAJOR, 0);
        assert_eq!(notes.first(), Some(&36));
        assert_eq!(notes.last(), Some(&84));
        assert!(notes.windows(2).all(|w| w[0] < w[1]));
        for note in notes {
            assert!(!matches!(pitch_class(note), 1 | 3 | 6 | 8 | 10));
        }
    }

    #[test]
    fn root_offsets_pitch_classes() {
        // D major: D E F# G A B C#
        let notes = notes_in_range(&MAJOR, 62, 60, 72);
        assert_eq!(notes, vec![61, 62, 64, 66, 67, 69, 71]);
    }

    #[test]
    fn root_given_as_pitch_or_pitch_class_is_equivalent() {
        assert_eq!(scale_notes(&MAJOR, 2), scale_notes(&MAJOR, 74));
    }

    #[test]
    fn a440_is_69() {
        assert!((midi_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_freq(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn names_use_scientific_octaves() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(37), "C#2");
    }
}
