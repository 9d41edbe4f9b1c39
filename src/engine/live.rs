//! Live output: the audio-thread side of playback.
//!
//! [`LiveChain`] lives inside the device callback. It drains chain commands,
//! renders, and publishes how many frames it has produced. [`FrameClock`]
//! reads that counter back on the tick thread, so the scheduler plans against
//! exactly the clock the chain starts notes on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::Producer;
#[cfg(feature = "rtrb")]
use tracing::warn;

use crate::engine::chain::SignalChain;
use crate::engine::transport::AudioClock;
#[cfg(feature = "rtrb")]
use crate::engine::transport::NoteSink;
use crate::profile::BitMode;
#[cfg(feature = "rtrb")]
use crate::sequencing::composition::NoteEvent;
use crate::synth::message::{ChainCommand, CommandReceiver};

pub struct LiveChain<R: CommandReceiver> {
    chain: SignalChain,
    rx: R,
    frames: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl<R: CommandReceiver> LiveChain<R> {
    pub fn new(sample_rate: f32, mode: BitMode, rx: R) -> Self {
        Self {
            chain: SignalChain::new(sample_rate, mode),
            rx,
            frames: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Clock for the scheduler, reading this chain's frame counter.
    pub fn clock(&self) -> FrameClock {
        FrameClock {
            frames: Arc::clone(&self.frames),
            running: Arc::clone(&self.running),
            sample_rate: self.chain.sample_rate() as f64,
        }
    }

    pub fn chain(&self) -> &SignalChain {
        &self.chain
    }

    /// Fill an interleaved stereo buffer. Called from the device callback.
    pub fn render(&mut self, out: &mut [f32]) {
        while let Some(command) = self.rx.pop() {
            match command {
                ChainCommand::Note(event) => self.chain.schedule(event),
                ChainCommand::SetBitMode(mode) => self.chain.set_bit_mode(mode),
                ChainCommand::Silence => self.chain.silence(),
            }
        }

        if self.running.load(Ordering::Relaxed) {
            self.chain.render(out);
        } else {
            out.fill(0.0);
        }
        self.frames
            .store(self.chain.frames_rendered(), Ordering::Release);
    }
}

/// Seconds of audio the live chain has rendered.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frames: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    sample_rate: f64,
}

impl FrameClock {
    /// Hold the chain (output silence, clock frozen) until resumed.
    pub fn suspend(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl AudioClock for FrameClock {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate
    }

    fn resume(&self) {
        self.running.store(true, Ordering::Relaxed);
    }
}

#[cfg(feature = "rtrb")]
impl NoteSink for Producer<ChainCommand> {
    fn schedule(&mut self, event: NoteEvent) {
        if self.push(ChainCommand::Note(event)).is_err() {
            warn!(pitch = event.pitch, "chain command queue full, note dropped");
        }
    }

    fn set_bit_mode(&mut self, mode: BitMode) {
        if self.push(ChainCommand::SetBitMode(mode)).is_err() {
            warn!(mode = mode.label(), "chain command queue full, bit mode change dropped");
        }
    }

    fn silence(&mut self) {
        if self.push(ChainCommand::Silence).is_err() {
            warn!("chain command queue full, silence dropped");
        }
    }
}
