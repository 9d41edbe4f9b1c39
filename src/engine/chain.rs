/*
Era Signal Chain
================

One instance per consumer: the live output owns one, every export renders
through a private one. Both are built from the same code and the same
profile table, so a pattern sounds the same live and on disk.

  notes ─> voice pool ─> bus ×0.5 ─> lowpass ─> quantize ─> ×out gain ─┬─────────> dry
                                                                       ├─> delay ──> ×0.30
                                                                       └─> reverb ─> ×0.35

Voices and the dry path are mono; the reverb's impulse is stereo, which is
where the width comes from. Output is interleaved stereo.

Notes are scheduled against the chain's own sample clock (seconds since the
chain was created). A note whose start falls inside a block begins on its
exact frame; a note scheduled in the past starts on the next frame rendered.

Changing era swaps the cutoff and the quantize curve (all curves are baked
at construction) and toggles the sends. A send that switches off is reset so
its old tail cannot reappear when it switches back on.
*/

use tracing::{debug, trace};

use crate::dsp::convolver::{synthetic_impulse, PartitionedConvolver};
use crate::dsp::delay::FeedbackDelay;
use crate::dsp::filter::SVFilter;
use crate::dsp::mix::{add_scaled, apply_gain, interleave_mono};
use crate::dsp::oscillator::NoiseBuffer;
use crate::dsp::quantize::QuantizeCurve;
use crate::graph::node::RenderCtx;
use crate::graph::note::NoteGraph;
use crate::profile::BitMode;
use crate::sequencing::composition::NoteEvent;
use crate::synth::poly::VoicePool;
use crate::{CHANNELS, MAX_BLOCK_SIZE};

pub const MASTER_GAIN: f32 = 0.5;
pub const VOICE_CAPACITY: usize = 64;

pub const DELAY_SECONDS: f32 = 0.25;
pub const DELAY_FEEDBACK: f32 = 0.35;
pub const DELAY_WET: f32 = 0.3;

pub const REVERB_SECONDS: f32 = 2.0;
pub const REVERB_DECAY_EXPONENT: f32 = 2.0;
pub const REVERB_WET: f32 = 0.35;

/// Pending-note capacity reserved up front so scheduling stays allocation-free
/// in normal use.
const PENDING_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct PendingNote {
    start_frame: u64,
    event: NoteEvent,
}

pub struct SignalChain {
    sample_rate: f32,
    mode: BitMode,
    curves: [QuantizeCurve; 3],
    filter: SVFilter,
    delay: FeedbackDelay,
    reverb: [PartitionedConvolver; CHANNELS],
    pool: VoicePool<NoteGraph>,
    /// Sorted by start frame.
    pending: Vec<PendingNote>,
    frame: u64,
    bus: Vec<f32>,
    delay_wet: Vec<f32>,
    reverb_wet: [Vec<f32>; CHANNELS],
}

impl SignalChain {
    pub fn new(sample_rate: f32, mode: BitMode) -> Self {
        let noise = NoiseBuffer::new(sample_rate);
        let curves = BitMode::ALL.map(|m| QuantizeCurve::new(m.profile().quantize_levels));
        let [left, right] = synthetic_impulse(sample_rate, REVERB_SECONDS, REVERB_DECAY_EXPONENT);

        debug!(sample_rate, mode = mode.label(), "signal chain built");
        Self {
            sample_rate,
            mode,
            curves,
            filter: SVFilter::lowpass(mode.profile().cutoff_hz, sample_rate),
            delay: FeedbackDelay::new(DELAY_SECONDS, DELAY_FEEDBACK, sample_rate),
            reverb: [
                PartitionedConvolver::new(&left),
                PartitionedConvolver::new(&right),
            ],
            pool: VoicePool::new(VOICE_CAPACITY, || NoteGraph::new(noise.clone())),
            pending: Vec::with_capacity(PENDING_CAPACITY),
            frame: 0,
            bus: vec![0.0; MAX_BLOCK_SIZE],
            delay_wet: vec![0.0; MAX_BLOCK_SIZE],
            reverb_wet: [vec![0.0; MAX_BLOCK_SIZE], vec![0.0; MAX_BLOCK_SIZE]],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn bit_mode(&self) -> BitMode {
        self.mode
    }

    /// Frames rendered since construction; the chain's clock.
    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    pub fn set_bit_mode(&mut self, mode: BitMode) {
        if mode == self.mode {
            return;
        }
        let profile = mode.profile();
        self.filter.set_cutoff(profile.cutoff_hz, self.sample_rate);
        if !profile.delay {
            self.delay.reset();
        }
        if !profile.reverb {
            self.reverb.iter_mut().for_each(PartitionedConvolver::reset);
        }
        debug!(from = self.mode.label(), to = mode.label(), "chain bit mode changed");
        self.mode = mode;
    }

    pub fn schedule(&mut self, event: NoteEvent) {
        let start = (event.time.max(0.0) * self.sample_rate as f64).round() as u64;
        let start_frame = start.max(self.frame);
        let index = self.pending.partition_point(|p| p.start_frame <= start_frame);
        self.pending.insert(index, PendingNote { start_frame, event });
    }

    pub fn silence(&mut self) {
        self.pending.clear();
        self.pool.clear();
        self.filter.reset();
        self.delay.reset();
        self.reverb.iter_mut().for_each(PartitionedConvolver::reset);
        trace!("chain silenced");
    }

    /// Fill an interleaved stereo buffer.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE * CHANNELS) {
            let frames = chunk.len() / CHANNELS;
            self.render_block(&mut chunk[..frames * CHANNELS], frames);
        }
    }

    fn start_due_notes(&mut self, frames: usize) {
        let block_end = self.frame + frames as u64;
        let due = self.pending.partition_point(|p| p.start_frame < block_end);
        for note in self.pending.drain(..due) {
            let offset = (note.start_frame - self.frame) as usize;
            let ctx = RenderCtx::from_note(
                self.sample_rate,
                note.event.pitch,
                note.event.timbre,
                note.event.gain,
                note.event.duration as f32,
            );
            self.pool.trigger(ctx, offset);
        }
    }

    fn render_block(&mut self, out: &mut [f32], frames: usize) {
        self.start_due_notes(frames);

        let profile = self.mode.profile();
        let bus = &mut self.bus[..frames];
        self.pool.render_block(bus);
        apply_gain(bus, MASTER_GAIN);
        self.filter.render(bus);
        self.curves[self.mode.index()].process(bus);
        apply_gain(bus, profile.output_gain);

        if profile.reverb {
            for (convolver, wet) in self.reverb.iter_mut().zip(self.reverb_wet.iter_mut()) {
                convolver.render(bus, &mut wet[..frames]);
            }
        }

        if profile.delay {
            let echo = &mut self.delay_wet[..frames];
            echo.copy_from_slice(bus);
            self.delay.render(echo);
            add_scaled(bus, echo, DELAY_WET);
        }

        interleave_mono(bus, out);

        if profile.reverb {
            for (channel, wet) in self.reverb_wet.iter().enumerate() {
                for (frame, &tail) in out.chunks_exact_mut(CHANNELS).zip(&wet[..frames]) {
                    frame[channel] += tail * REVERB_WET;
                }
            }
        }

        self.frame += frames as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Timbre;
    use crate::sequencing::composition::Voice;

    fn note(time: f64) -> NoteEvent {
        NoteEvent {
            voice: Voice::Lead,
            pitch: 69,
            timbre: Timbre::Square,
            gain: 0.5,
            time,
            duration: 0.1,
        }
    }

    fn first_nonzero_frame(buffer: &[f32]) -> Option<usize> {
        buffer.chunks_exact(CHANNELS).position(|f| f[0] != 0.0)
    }

    #[test]
    fn silent_chain_renders_silence() {
        let mut chain = SignalChain::new(8_000.0, BitMode::Bit32);
        let mut out = vec![1.0; 1024];
        chain.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(chain.frames_rendered(), 512);
    }

    #[test]
    fn note_starts_on_its_exact_frame() {
        let mut chain = SignalChain::new(8_000.0, BitMode::Bit16);
        // 0.05 s at 8 kHz is frame 400.
        chain.schedule(note(0.05));
        let mut out = vec![0.0; 2 * 1000];
        chain.render(&mut out);
        assert_eq!(first_nonzero_frame(&out), Some(400));
    }

    #[test]
    fn late_note_starts_immediately() {
        let mut chain = SignalChain::new(8_000.0, BitMode::Bit8);
        let mut out = vec![0.0; 2 * 256];
        chain.render(&mut out);
        chain.schedule(note(0.0));
        chain.render(&mut out);
        assert_eq!(first_nonzero_frame(&out), Some(0));
    }

    #[test]
    fn eight_bit_output_sits_on_quantize_levels() {
        let mut chain = SignalChain::new(8_000.0, BitMode::Bit8);
        chain.schedule(note(0.0));
        let mut out = vec![0.0; 2 * 800];
        chain.render(&mut out);

        let gain = BitMode::Bit8.profile().output_gain;
        for &s in &out {
            let level = s / gain * 16.0;
            assert!((level - level.round()).abs() < 1e-3, "{s} is off the staircase");
        }
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn reverb_adds_stereo_width_on_32_bit() {
        let mut chain = SignalChain::new(8_000.0, BitMode::Bit32);
        chain.schedule(note(0.0));
        let mut out = vec![0.0; 2 * 4000];
        chain.render(&mut out);
        let differs = out.chunks_exact(2).any(|f| (f[0] - f[1]).abs() > 1e-6);
        assert!(differs);

        let mut mono = SignalChain::new(8_000.0, BitMode::Bit16);
        mono.schedule(note(0.0));
        let mut out = vec![0.0; 2 * 4000];
        mono.render(&mut out);
        assert!(out.chunks_exact(2).all(|f| f[0] == f[1]));
    }

    #[test]
    fn silence_drops_pending_and_sounding_notes() {
        let mut chain = SignalChain::new(8_000.0, BitMode::Bit16);
        chain.schedule(note(0.0));
        chain.schedule(note(1.0));
        let mut out = vec![0.0; 2 * 64];
        chain.render(&mut out);
        assert_eq!(chain.pending_count(), 1);
        assert_eq!(chain.active_voices(), 1);

        chain.silence();
        assert_eq!(chain.pending_count(), 0);
        assert_eq!(chain.active_voices(), 0);
        chain.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn bit_mode_change_moves_cutoff() {
        let mut chain = SignalChain::new(44_100.0, BitMode::Bit32);
        chain.set_bit_mode(BitMode::Bit8);
        assert_eq!(chain.bit_mode(), BitMode::Bit8);
        assert_eq!(chain.filter.cutoff_hz(), 3_500.0);
    }
}
