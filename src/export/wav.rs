//! Canonical 44-byte PCM16 WAV and loop tiling.

use std::io::Write;

use crate::error::ExportError;
use crate::CHANNELS;

pub const HEADER_LEN: usize = 44;
const BYTES_PER_SAMPLE: usize = 2;
/// RIFF sizes are u32; the RIFF chunk also counts 36 header bytes.
const MAX_DATA_BYTES: u64 = u32::MAX as u64 - 36;

/// Bytes of PCM data for `frames` interleaved frames, if a WAV can hold them.
pub fn data_len(frames: u64) -> Result<u64, ExportError> {
    frames
        .checked_mul((CHANNELS * BYTES_PER_SAMPLE) as u64)
        .filter(|&bytes| bytes <= MAX_DATA_BYTES)
        .ok_or(ExportError::TooLong { frames })
}

pub fn header(sample_rate: u32, frames: u64) -> Result<[u8; HEADER_LEN], ExportError> {
    let data = data_len(frames)? as u32;
    let block_align = (CHANNELS * BYTES_PER_SAMPLE) as u16;
    let byte_rate = sample_rate * block_align as u32;

    let mut out = [0u8; HEADER_LEN];
    out[0..4].copy_from_slice(b"RIFF");
    out[4..8].copy_from_slice(&(36 + data).to_le_bytes());
    out[8..12].copy_from_slice(b"WAVE");
    out[12..16].copy_from_slice(b"fmt ");
    out[16..20].copy_from_slice(&16u32.to_le_bytes());
    out[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    out[22..24].copy_from_slice(&(CHANNELS as u16).to_le_bytes());
    out[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    out[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    out[32..34].copy_from_slice(&block_align.to_le_bytes());
    out[34..36].copy_from_slice(&16u16.to_le_bytes());
    out[36..40].copy_from_slice(b"data");
    out[40..44].copy_from_slice(&data.to_le_bytes());
    Ok(out)
}

/// One float sample to PCM16: clamped, asymmetric scale, truncated.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

/// Interleaved float samples to little-endian PCM16 bytes.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for &sample in samples {
        out.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    out
}

/// Write a header plus `total_frames` of audio built by repeating a loop.
///
/// `first` is played once at the start, `repeat` for every later repetition
/// and for the final partial one. Both hold the same number of frames.
/// Returns the bytes written.
pub fn encode_tiled<W: Write>(
    writer: &mut W,
    sample_rate: u32,
    first: &[u8],
    repeat: &[u8],
    total_frames: u64,
) -> Result<u64, ExportError> {
    let loop_bytes = repeat.len() as u64;
    if loop_bytes == 0 || first.len() as u64 != loop_bytes {
        return Err(ExportError::Render("loop buffers are empty or mismatched".into()));
    }
    writer.write_all(&header(sample_rate, total_frames)?)?;

    let data = data_len(total_frames)?;
    let mut remaining = data;

    let mut pass = 0usize;
    while remaining > 0 {
        let source = if pass == 0 { first } else { repeat };
        let take = remaining.min(loop_bytes) as usize;
        writer.write_all(&source[..take])?;
        remaining -= take as u64;
        pass += 1;
    }
    writer.flush()?;
    Ok(HEADER_LEN as u64 + data)
}
