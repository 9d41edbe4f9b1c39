pub mod config; // Lookup tables: scales, progressions, style presets
pub mod dsp;
pub mod engine; // Lookahead scheduling, signal chain and live output
pub mod error;
pub mod export; // Offline render and tiled WAV encoding
pub mod generate; // Procedural composition per voice
pub mod graph; // Per-note graph nodes
pub mod profile; // Era (bit-mode) policy
pub mod sequencing; // Pattern store and shared composition state
pub mod session;
pub mod synth; // Voice pool and chain commands
pub mod theory; // Scales and diatonic chords

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Number of steps in one pattern loop (16th-note resolution).
pub const STEP_COUNT: usize = 100;
/// Lead, bass, arp, percussion.
pub const VOICE_COUNT: usize = 4;

/// Lowest pitch the generator or an edit may store.
pub const MIN_NOTE: u8 = 36;
/// Highest pitch the generator or an edit may store.
pub const MAX_NOTE: u8 = 84;

/// Export sample rate.
pub const SAMPLE_RATE: u32 = 44_100;
/// Export channel count (interleaved stereo).
pub const CHANNELS: usize = 2;
