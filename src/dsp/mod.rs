//! Low-level DSP primitives used by the note voices and the signal chain.
//!
//! These components allocate only at construction and are realtime-safe
//! afterwards, so they can be embedded directly inside voices and the chain.
//! They stay focused on the signal-processing math; the chain in
//! [`crate::engine::chain`] wires them into the era topology.

/// Uniformly partitioned FFT convolution for the reverb send.
pub mod convolver;
/// Feedback delay line for the echo send.
pub mod delay;
/// Per-note exponential decay envelope.
pub mod envelope;
/// Topology-preserving lowpass filter.
pub mod filter;
/// Bus summing and gain helpers.
pub mod mix;
/// Era oscillators and the shared noise buffer.
pub mod oscillator;
/// Amplitude quantization curves.
pub mod quantize;

pub use envelope::DecayEnvelope;
pub use oscillator::Timbre;
