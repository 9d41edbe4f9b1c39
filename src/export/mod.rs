/*
Offline Export
==============

An export never touches the live chain or the transport. It takes a snapshot
of the composition, renders exactly one loop (plus a reverb-length tail)
through its own SignalChain, and tiles that loop out to the requested length:

   header │ loop (as rendered) │ loop + folded tail │ loop + folded tail │ partial

Only two loop-sized buffers exist at any time, whatever the duration. The
data chunk always holds exactly round(duration × rate) frames.
*/

pub mod render;
pub mod wav;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::sequencing::composition::Composition;
use crate::SAMPLE_RATE;

pub use render::{render_loop, RenderedLoop, TAIL_SECONDS};

/// What an export produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub frames: u64,
    pub loop_frames: u64,
    pub bytes: u64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    sample_rate: u32,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

impl Exporter {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames to write: one loop when no duration is given.
    pub fn total_frames(
        &self,
        duration: Option<f64>,
        loop_frames: u64,
    ) -> Result<u64, ExportError> {
        match duration {
            None => Ok(loop_frames),
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => {
                Ok(((seconds * self.sample_rate as f64).round() as u64).max(1))
            }
            Some(seconds) => Err(ExportError::InvalidDuration(seconds)),
        }
    }

    /// Render and encode `composition` into `writer`.
    pub fn export<W: Write>(
        &self,
        composition: &Composition,
        duration: Option<f64>,
        writer: &mut W,
    ) -> Result<ExportSummary, ExportError> {
        // Validate everything cheap before the render.
        let step_duration = composition.step_duration()?;
        let loop_frames = render::loop_frames(step_duration, self.sample_rate) as u64;
        let frames = self.total_frames(duration, loop_frames)?;
        wav::header(self.sample_rate, frames)?;

        let rendered = render_loop(composition, self.sample_rate)?;
        let first = wav::encode_pcm16(&rendered.first);
        let repeat = wav::encode_pcm16(&rendered.folded);
        drop(rendered);

        let bytes = wav::encode_tiled(writer, self.sample_rate, &first, &repeat, frames)?;
        let summary = ExportSummary {
            frames,
            loop_frames,
            bytes,
            seconds: frames as f64 / self.sample_rate as f64,
        };
        info!(
            frames,
            loops = frames as f64 / loop_frames as f64,
            bytes,
            "export encoded"
        );
        Ok(summary)
    }

    /// Export to a file, created or truncated.
    pub fn export_to_path(
        &self,
        composition: &Composition,
        duration: Option<f64>,
        path: &Path,
    ) -> Result<ExportSummary, ExportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        let summary = self.export(composition, duration, &mut writer)?;
        writer.flush()?;
        info!(path = %path.display(), seconds = summary.seconds, "export written");
        Ok(summary)
    }
}
