//! Per-note audio graphs.
//!
//! Graph nodes wrap the low-level DSP primitives with the note-event
//! interface the voice pool drives. Every sequenced note renders through one
//! [`note::NoteGraph`].

/// Core traits shared by all graph nodes.
pub mod node;
/// Oscillator or noise source shaped by a decay envelope.
pub mod note;
