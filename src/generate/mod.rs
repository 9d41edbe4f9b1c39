/*
Procedural Composition
======================

Each voice has its own algorithm, but they share one skeleton. For every
step of the loop:

  1. eligibility   The step must be on the style's grid (step % speed == 0)
                   and pass whatever style-specific skip rule applies.
  2. rest draw     With the style's rest probability, stay silent.
  3. density draw  With probability density/100, continue; otherwise silent.
  4. choose notes  Voice specific. Melodic voices walk an index over a
                   register note list (so every note is in key), pulled
                   toward chord tones and toward alternating phrase centres.

The rest draw always happens before the density draw, and both use their own
random number, so the two probabilities compose independently.

Every voice rewrites its whole row: cells are cleared first, nothing is
merged with what was there before.

Registers
---------

  lead        scale notes in [57, 84]
  bass        scale notes in [36, 60)
  arp         scale notes in [60, 84], filtered to chord tones per step
  percussion  fixed pitches: kick 36, snare 38, hat 42, tom 45
*/

mod arp;
mod bass;
mod drums;
mod lead;
pub mod style;

use rand::Rng;
use tracing::debug;

use crate::sequencing::composition::Voice;
use crate::sequencing::pattern::{PatternRow, PatternStore};
use crate::theory::{notes_in_range, ChordMap};
use crate::MAX_NOTE;

pub use style::{
    ArpDescriptor, ArpStyle, BassDescriptor, BassStyle, DrumDescriptor, HatPattern, JumpWeights,
    LeadDescriptor, LeadStyle, StyleDescriptor,
};

pub const LEAD_LOW: u8 = 57;
/// Bass notes stay strictly below this pitch.
pub const BASS_SPLIT: u8 = 60;
pub const ARP_LOW: u8 = 60;

/// Steps per phrase for the A/B centering pull.
pub const PHRASE_LEN: usize = 32;
/// Steps per bar; phrase boundaries for the chord snap.
pub const BAR_LEN: usize = 16;

pub const SNAP_BAR_PROBABILITY: f64 = 0.9;
pub const SNAP_BEAT_PROBABILITY: f64 = 0.6;

/// Everything the generator reads besides the style.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams<'a> {
    pub intervals: &'a [u8],
    pub root: u8,
    /// 0..=100 chance that an eligible step sounds.
    pub density: u8,
    pub chords: &'a ChordMap,
}

impl GenerationParams<'_> {
    pub fn lead_notes(&self) -> Vec<u8> {
        notes_in_range(self.intervals, self.root, LEAD_LOW, MAX_NOTE)
    }

    pub fn bass_notes(&self) -> Vec<u8> {
        notes_in_range(self.intervals, self.root, crate::MIN_NOTE, BASS_SPLIT - 1)
    }

    pub fn arp_notes(&self) -> Vec<u8> {
        notes_in_range(self.intervals, self.root, ARP_LOW, MAX_NOTE)
    }
}

/// Composer with an injectable random source.
pub struct Generator<R: Rng> {
    rng: R,
}

impl<R: Rng> Generator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Compose one voice's row from scratch.
    pub fn generate_voice(
        &mut self,
        voice: Voice,
        style: &StyleDescriptor,
        params: &GenerationParams<'_>,
    ) -> PatternRow {
        let row = match voice {
            Voice::Lead => lead::generate(&mut self.rng, &style.lead, params),
            Voice::Bass => bass::generate(&mut self.rng, &style.bass, params),
            Voice::Arp => arp::generate(&mut self.rng, &style.arp, params),
            Voice::Percussion => drums::generate(&mut self.rng, &style.drums, params),
        };
        let notes: usize = row.iter().map(|cell| cell.len()).sum();
        debug!(voice = voice.label(), notes, "voice generated");
        row
    }

    /// Rewrite every voice's row in the store.
    pub fn generate_all(
        &mut self,
        store: &mut PatternStore,
        style: &StyleDescriptor,
        params: &GenerationParams<'_>,
    ) {
        for voice in Voice::ALL {
            let row = self.generate_voice(voice, style, params);
            store.replace_row(voice, row);
        }
    }
}

/// Shared eligibility, rest and density gates.
pub(crate) fn passes_gates<R: Rng>(
    rng: &mut R,
    step: usize,
    speed: usize,
    rest: f64,
    density: u8,
) -> bool {
    if step % speed.max(1) != 0 {
        return false;
    }
    if rng.random_bool(rest.clamp(0.0, 1.0)) {
        return false;
    }
    rng.random_range(0..100u32) < density.min(100) as u32
}

/// Signed jump drawn from the three weighted buckets, direction by fair coin.
pub(crate) fn draw_jump<R: Rng>(rng: &mut R, weights: &JumpWeights) -> i64 {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    let bucket = if total > 0.0 {
        let mut r: f64 = rng.random::<f64>() * total;
        let mut chosen = weights.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            let w = w.max(0.0);
            if r < w {
                chosen = i;
                break;
            }
            r -= w;
        }
        chosen
    } else {
        0
    };

    let magnitude = match bucket {
        0 => 1,
        1 => rng.random_range(2..=3),
        _ => rng.random_range(4..=7),
    };
    if rng.random_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Index arithmetic modulo the register length.
#[inline]
pub(crate) fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len.max(1) as i64) as usize
}

/// Chance of snapping to a chord tone on `step`.
pub(crate) fn snap_probability(step: usize) -> f64 {
    if step % BAR_LEN == 0 {
        SNAP_BAR_PROBABILITY
    } else if step % 4 == 0 {
        SNAP_BEAT_PROBABILITY
    } else {
        0.0
    }
}

/// Halfway pull toward the low (even phrase) or high (odd phrase) centre.
pub(crate) fn center_toward_phrase(index: usize, len: usize, phrase: usize) -> usize {
    let target = if phrase % 2 == 0 { len / 3 } else { 2 * len / 3 };
    (index + target) / 2
}
