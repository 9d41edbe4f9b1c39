//! Offline render of one pattern loop through a private signal chain.

use tracing::debug;

use crate::engine::chain::SignalChain;
use crate::error::ExportError;
use crate::sequencing::composition::Composition;
use crate::{CHANNELS, STEP_COUNT};

/// Seconds rendered past the loop end so the sends can ring out.
pub const TAIL_SECONDS: f64 = 2.0;

/// One loop of interleaved stereo, in both of the forms the encoder tiles.
#[derive(Debug, Clone)]
pub struct RenderedLoop {
    pub loop_frames: usize,
    /// As rendered from silence; nothing precedes the first pass.
    pub first: Vec<f32>,
    /// With the tail folded back onto the start, for every later pass.
    pub folded: Vec<f32>,
}

/// Frames in one loop at the given step duration. Saturates at `usize::MAX`
/// for absurdly slow tempos; the size checks downstream reject those.
pub fn loop_frames(step_duration: f64, sample_rate: u32) -> usize {
    let frames = (STEP_COUNT as f64 * step_duration * sample_rate as f64).round();
    (frames as usize).max(1)
}

fn alloc_samples(len: usize) -> Result<Vec<f32>, ExportError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|err| ExportError::Render(format!("cannot allocate {len} samples: {err}")))?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}

/// Render `composition` for one loop plus the tail.
///
/// Every step's notes are scheduled up front at their exact time, with the
/// same mute/solo, timbre fallback and polyphony cap as live playback.
pub fn render_loop(composition: &Composition, sample_rate: u32) -> Result<RenderedLoop, ExportError> {
    let step_duration = composition.step_duration()?;
    let loop_frames = loop_frames(step_duration, sample_rate);
    let tail_frames = (TAIL_SECONDS * sample_rate as f64).round() as usize;
    let too_long = || ExportError::TooLong {
        frames: loop_frames as u64,
    };
    let loop_len = loop_frames.checked_mul(CHANNELS).ok_or_else(too_long)?;
    let total_len = loop_frames
        .checked_add(tail_frames)
        .and_then(|frames| frames.checked_mul(CHANNELS))
        .ok_or_else(too_long)?;

    let mut buffer = alloc_samples(total_len)?;
    let mut chain = SignalChain::new(sample_rate as f32, composition.bit_mode);

    let mut notes = 0usize;
    for step in 0..STEP_COUNT {
        let time = step as f64 * step_duration;
        for event in composition.step_events(step, time, step_duration) {
            chain.schedule(event);
            notes += 1;
        }
    }
    chain.render(&mut buffer);

    let mut folded = alloc_samples(loop_len)?;
    folded.copy_from_slice(&buffer[..loop_len]);
    // A tail longer than the loop wraps more than once.
    for (i, &sample) in buffer[loop_len..].iter().enumerate() {
        folded[i % loop_len] += sample;
    }
    buffer.truncate(loop_len);

    debug!(
        loop_frames,
        tail_frames,
        notes,
        mode = composition.bit_mode.label(),
        "loop rendered"
    );
    Ok(RenderedLoop {
        loop_frames,
        first: buffer,
        folded,
    })
}
