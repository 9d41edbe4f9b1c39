//! Percussion layers: fixed kick/snare skeleton, gated hats and fills.

use rand::Rng;

use super::style::{DrumDescriptor, HatPattern};
use super::{passes_gates, GenerationParams, BAR_LEN};
use crate::sequencing::pattern::{empty_row, PatternRow};
use crate::STEP_COUNT;

pub const KICK: u8 = 36;
pub const SNARE: u8 = 38;
pub const HAT: u8 = 42;
pub const TOM: u8 = 45;

fn hat_candidate(pattern: HatPattern, step: usize) -> bool {
    match pattern {
        HatPattern::Sixteenth => true,
        HatPattern::Swing => matches!(step % 4, 0 | 3),
        HatPattern::Sparse => step % 4 == 0,
        HatPattern::Eighth => step % 2 == 0,
    }
}

/// Fill multiplier by position in the bar: held back early, pushed at the end.
pub(crate) fn fill_multiplier(step: usize) -> f64 {
    match step % BAR_LEN {
        0..=11 => 0.2,
        12..=13 => 1.0,
        _ => 5.0,
    }
}

pub(super) fn generate<R: Rng>(
    rng: &mut R,
    desc: &DrumDescriptor,
    params: &GenerationParams<'_>,
) -> PatternRow {
    let mut row = empty_row();

    for (step, cell) in row.iter_mut().enumerate().take(STEP_COUNT) {
        let pos = step % 8;
        if desc.kick.iter().any(|&k| k % 8 == pos) {
            cell.insert(KICK);
        }
        if desc.snare.iter().any(|&s| s % 8 == pos) {
            cell.insert(SNARE);
        }

        if hat_candidate(desc.hat, step) && passes_gates(rng, step, 1, desc.rest, params.density)
        {
            cell.insert(HAT);
        }

        if desc.fill > 0.0 && passes_gates(rng, step, 1, desc.rest, params.density) {
            let p = (desc.fill * fill_multiplier(step)).clamp(0.0, 1.0);
            if rng.random_bool(p) {
                cell.insert(TOM);
            }
        }
    }
    row
}
