//! Shared note data: the pattern store and the composition that wraps it.

pub mod composition;
pub mod pattern;

pub use composition::{step_duration, Composition, NoteEvent, SharedComposition, Voice, VoiceSettings};
pub use pattern::{PatternCell, PatternRow, PatternStore};
