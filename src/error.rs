//! Error types surfaced to callers of the library.
//!
//! Validation failures are returned synchronously from the call that was
//! rejected. Failures that happen while an export renders in the background
//! travel through [`crate::session::Notification::ExportFailed`].

use std::io;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TempoError {
    #[error("invalid tempo {0} bpm: must be finite and greater than zero")]
    Invalid(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pitch {pitch} outside {min}..={max}")]
    PitchOutOfRange { pitch: u8, min: u8, max: u8 },
    #[error("step {step} outside 0..{count}")]
    StepOutOfRange { step: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("playback refused: {0}")]
    InvalidTempo(#[from] TempoError),
    #[error("note output was lost when the tick thread panicked")]
    OutputLost,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export refused: {0}")]
    InvalidTempo(#[from] TempoError),
    #[error("invalid export duration {0} s")]
    InvalidDuration(f64),
    #[error("export of {frames} frames exceeds the WAV size limit")]
    TooLong { frames: u64 },
    #[error("offline render failed: {0}")]
    Render(String),
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("table `{0}` is empty; the first entry is the fallback and must exist")]
    EmptyTable(&'static str),
    #[cfg(feature = "serde")]
    #[error("invalid library JSON: {0}")]
    Json(#[from] serde_json::Error),
}
