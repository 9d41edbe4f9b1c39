use crate::dsp::oscillator::Timbre;
use crate::theory::midi_to_freq;

/// Context passed to graph nodes when a note starts and while it renders
///
/// Contains everything a note needs to know about itself:
/// - sample_rate: Audio sample rate (e.g., 44100.0)
/// - note: MIDI pitch (noise notes derive their playback rate from it)
/// - frequency: Pitch to render (Hz)
/// - timbre: Waveform after the era fallback has been applied
/// - gain: Peak level of the decay envelope (the voice's gain)
/// - duration: Seconds until the envelope reaches the floor (one step)
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub note: u8,
    pub frequency: f32,
    pub timbre: Timbre,
    pub gain: f32,
    pub duration: f32,
}

impl RenderCtx {
    /// Create context from MIDI note (sequencer use case)
    pub fn from_note(sample_rate: f32, note: u8, timbre: Timbre, gain: f32, duration: f32) -> Self {
        Self {
            sample_rate,
            note,
            frequency: midi_to_freq(note),
            timbre,
            gain,
            duration,
        }
    }
}

/// Core trait for per-note audio graphs
///
/// Nodes render audio blocks and respond to note starts.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a note starts
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Default: do nothing
    }

    fn get_envelope_level(&self) -> Option<f32> {
        None
    }

    /// Check if this node is still producing sound
    ///
    /// Used by voice management to know when a voice can be freed.
    fn is_active(&self) -> bool {
        true
    }
}
