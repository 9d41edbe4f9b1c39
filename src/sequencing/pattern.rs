/*
Pattern Store
=============

Four voices by STEP_COUNT steps. Each (voice, step) cell holds the pitches
that start on that step.

  cell     An insertion-ordered list of distinct pitches. Order is not
           cosmetic: when an era allows only N notes per voice per step,
           playback keeps the first N in the order they were added. The
           store itself never caps, so raising polyphony later brings the
           extra notes back.

  row      One voice's STEP_COUNT cells. The generator rewrites whole rows;
           user edits toggle single pitches in single cells.

Every stored pitch is inside [MIN_NOTE, MAX_NOTE]; edits outside that range
are rejected rather than clamped.
*/

use tracing::warn;

use crate::error::PatternError;
use crate::sequencing::composition::Voice;
use crate::{MAX_NOTE, MIN_NOTE, STEP_COUNT, VOICE_COUNT};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternCell {
    notes: Vec<u8>,
}

impl PatternCell {
    pub fn new() -> Self {
        Self { notes: Vec::new() }
    }

    /// Append `pitch` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, pitch: u8) -> bool {
        if self.notes.contains(&pitch) {
            return false;
        }
        self.notes.push(pitch);
        true
    }

    /// Remove `pitch`, keeping the order of the rest. Returns whether it was present.
    pub fn remove(&mut self, pitch: u8) -> bool {
        match self.notes.iter().position(|&n| n == pitch) {
            Some(index) => {
                self.notes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.notes.contains(&pitch)
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

impl<const N: usize> From<[u8; N]> for PatternCell {
    fn from(pitches: [u8; N]) -> Self {
        let mut cell = PatternCell::new();
        for pitch in pitches {
            cell.insert(pitch);
        }
        cell
    }
}

/// One voice's worth of cells, indexed by step.
pub type PatternRow = Vec<PatternCell>;

/// An empty row of STEP_COUNT cells.
pub fn empty_row() -> PatternRow {
    vec![PatternCell::new(); STEP_COUNT]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStore {
    rows: [PatternRow; VOICE_COUNT],
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternStore {
    pub fn new() -> Self {
        Self {
            rows: std::array::from_fn(|_| empty_row()),
        }
    }

    pub fn cell(&self, voice: Voice, step: usize) -> &PatternCell {
        &self.rows[voice.index()][step % STEP_COUNT]
    }

    pub fn row(&self, voice: Voice) -> &[PatternCell] {
        &self.rows[voice.index()]
    }

    /// Toggle a single pitch in a single cell.
    pub fn set_cell(
        &mut self,
        voice: Voice,
        pitch: u8,
        step: usize,
        active: bool,
    ) -> Result<(), PatternError> {
        if !(MIN_NOTE..=MAX_NOTE).contains(&pitch) {
            return Err(PatternError::PitchOutOfRange {
                pitch,
                min: MIN_NOTE,
                max: MAX_NOTE,
            });
        }
        if step >= STEP_COUNT {
            return Err(PatternError::StepOutOfRange {
                step,
                count: STEP_COUNT,
            });
        }

        let cell = &mut self.rows[voice.index()][step];
        if active {
            cell.insert(pitch);
        } else {
            cell.remove(pitch);
        }
        Ok(())
    }

    /// Replace a voice's row wholesale. Missing steps are left empty, extra
    /// steps are ignored, and pitches outside the note range are dropped.
    pub fn replace_row(&mut self, voice: Voice, row: PatternRow) {
        let mut dropped = 0usize;
        let target = &mut self.rows[voice.index()];
        for (step, slot) in target.iter_mut().enumerate() {
            slot.clear();
            if let Some(cell) = row.get(step) {
                for &pitch in cell.notes() {
                    if (MIN_NOTE..=MAX_NOTE).contains(&pitch) {
                        slot.insert(pitch);
                    } else {
                        dropped += 1;
                    }
                }
            }
        }
        if dropped > 0 {
            warn!(voice = voice.label(), dropped, "dropped out-of-range pitches");
        }
    }

    pub fn clear_voice(&mut self, voice: Voice) {
        for cell in &mut self.rows[voice.index()] {
            cell.clear();
        }
    }

    pub fn clear(&mut self) {
        for voice in Voice::ALL {
            self.clear_voice(voice);
        }
    }

    pub fn note_count(&self, voice: Voice) -> usize {
        self.rows[voice.index()].iter().map(PatternCell::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(PatternCell::is_empty)
    }

    /// Every stored pitch with its voice and step.
    pub fn iter_notes(&self) -> impl Iterator<Item = (Voice, usize, u8)> + '_ {
        Voice::ALL.into_iter().flat_map(move |voice| {
            self.row(voice)
                .iter()
                .enumerate()
                .flat_map(move |(step, cell)| cell.notes().iter().map(move |&p| (voice, step, p)))
        })
    }
}
