use tracing::trace;

use crate::{
    dsp::mix::sum_in_place,
    graph::node::{GraphNode, RenderCtx},
    synth::voice::SynthVoice,
    MAX_BLOCK_SIZE,
};

/// Fixed-capacity pool of note voices.
///
/// All voices are built up front so starting a note on the audio thread never
/// allocates. When every voice is busy the oldest one is stolen.
pub struct VoicePool<T: GraphNode> {
    voices: Vec<SynthVoice<T>>,
    temp_buffer: Vec<f32>,
    next_age: u64,
}

impl<T: GraphNode> VoicePool<T> {
    pub fn new(capacity: usize, mut factory: impl FnMut() -> T) -> Self {
        let voices = (0..capacity.max(1))
            .map(|_| SynthVoice::new(factory()))
            .collect();

        Self {
            voices,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
            next_age: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Start a note `offset` frames into the next rendered block.
    pub fn trigger(&mut self, ctx: RenderCtx, offset: usize) {
        let age = self.next_age;
        self.next_age += 1;
        let voice = self.allocate_voice();
        voice.start(ctx, offset, age);
    }

    /// Sum every sounding voice into `out` (which is overwritten).
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        out.fill(0.0);
        for voice in &mut self.voices {
            if voice.is_active() {
                let temp = &mut self.temp_buffer[..out.len()];
                voice.render(temp);
                sum_in_place(out, temp);
            }
        }
    }

    pub fn clear(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
    }

    fn allocate_voice(&mut self) -> &mut SynthVoice<T> {
        // First pass: find free voice index
        let idx = match self.voices.iter().position(|v| v.is_free()) {
            Some(idx) => idx,
            None => {
                // Second pass: steal the oldest voice
                let idx = self
                    .voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.age())
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                trace!(voice = idx, "voice pool exhausted, stealing oldest");
                idx
            }
        };
        &mut self.voices[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{NoiseBuffer, Timbre};
    use crate::graph::note::NoteGraph;

    fn pool(capacity: usize) -> VoicePool<NoteGraph> {
        let noise = NoiseBuffer::new(8_000.0);
        VoicePool::new(capacity, || NoteGraph::new(noise.clone()))
    }

    fn ctx(note: u8) -> RenderCtx {
        RenderCtx::from_note(8_000.0, note, Timbre::Square, 0.5, 0.1)
    }

    #[test]
    fn note_starts_at_its_offset() {
        let mut pool = pool(4);
        pool.trigger(ctx(60), 10);

        let mut out = vec![0.0; 64];
        pool.render_block(&mut out);
        assert!(out[..10].iter().all(|&s| s == 0.0));
        assert!((out[10] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn offset_beyond_block_carries_over() {
        let mut pool = pool(4);
        pool.trigger(ctx(60), 70);

        let mut out = vec![0.0; 64];
        pool.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        pool.render_block(&mut out);
        assert!(out[..6].iter().all(|&s| s == 0.0));
        assert!((out[6] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn exhausted_pool_steals_oldest() {
        let mut pool = pool(2);
        pool.trigger(ctx(60), 0);
        pool.trigger(ctx(62), 0);
        pool.trigger(ctx(64), 0);

        assert_eq!(pool.active_count(), 2);
        let notes: Vec<u8> = pool.voices.iter().filter_map(|v| v.note()).collect();
        assert!(notes.contains(&62) && notes.contains(&64));
    }

    #[test]
    fn finished_voices_are_freed() {
        let mut pool = pool(2);
        pool.trigger(ctx(60), 0);
        // 0.1 s at 8 kHz is 800 frames.
        let mut out = vec![0.0; 512];
        pool.render_block(&mut out);
        pool.render_block(&mut out);
        assert_eq!(pool.active_count(), 0);
    }
}
