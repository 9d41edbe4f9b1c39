use std::f32::consts::TAU;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::theory::midi_to_freq;

/*
Era Oscillators
===============

Every note in the sequencer is a single naive oscillator or a slice of
recorded noise. No band-limiting: the aliasing is part of the sound of the
older tiers, and the output lowpass tames it on the newer ones.

  Square    50% duty. The default and the last-resort fallback.
  Pulse     25% duty, nasal. Degrades to square.
  Triangle  Soft, flute-like. What sine degrades to.
  Sawtooth  Bright, buzzy. Degrades to square.
  Sine      Pure tone. Only on the highest tier.
  Noise     Not synthesized per note: every noise note reads the same
            pre-generated buffer, at a playback rate proportional to the
            note's frequency relative to middle C. Low pitches rumble, high
            pitches hiss.
*/

/// Pitch at which the shared noise buffer plays back at its recorded rate.
pub const NOISE_REFERENCE_PITCH: u8 = 60;
/// Length of the shared noise buffer.
const NOISE_SECONDS: f32 = 1.0;
/// Fixed seed so every chain instance (live or offline) hears the same noise.
const NOISE_SEED: u64 = 0x6e6f_6973_6521;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timbre {
    Square,
    Pulse,
    Triangle,
    Sawtooth,
    Sine,
    Noise,
}

impl Timbre {
    pub const ALL: [Timbre; 6] = [
        Timbre::Square,
        Timbre::Pulse,
        Timbre::Triangle,
        Timbre::Sawtooth,
        Timbre::Sine,
        Timbre::Noise,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Timbre::Square => "square",
            Timbre::Pulse => "pulse",
            Timbre::Triangle => "triangle",
            Timbre::Sawtooth => "saw",
            Timbre::Sine => "sine",
            Timbre::Noise => "noise",
        }
    }

    /// Next timbre in `ALL`, wrapping.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Phase-accumulating oscillator for the pitched timbres.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oscillator {
    /// Normalized phase in [0, 1).
    phase: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self, timbre: Timbre, frequency: f32, sample_rate: f32) -> f32 {
        let p = self.phase;
        let out = match timbre {
            Timbre::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Timbre::Pulse => {
                if p < 0.25 {
                    1.0
                } else {
                    -1.0
                }
            }
            Timbre::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Timbre::Sawtooth => 2.0 * p - 1.0,
            Timbre::Sine => (TAU * p).sin(),
            Timbre::Noise => 0.0,
        };

        self.phase = (self.phase + frequency / sample_rate).fract();
        out
    }
}

/// Shared, immutable white-noise buffer.
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    samples: Arc<[f32]>,
}

impl NoiseBuffer {
    pub fn new(sample_rate: f32) -> Self {
        let len = ((sample_rate * NOISE_SECONDS) as usize).max(1);
        let mut rng = Pcg32::seed_from_u64(NOISE_SEED);
        let samples: Arc<[f32]> = (0..len)
            .map(|_| rng.random_range(-1.0f32..=1.0))
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Read head into a [`NoiseBuffer`] at a pitch-dependent rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoisePlayer {
    position: f64,
    rate: f64,
}

impl NoisePlayer {
    /// Start reading from the top of the buffer at the rate for `pitch`.
    pub fn start(pitch: u8) -> Self {
        let rate = midi_to_freq(pitch) as f64 / midi_to_freq(NOISE_REFERENCE_PITCH) as f64;
        Self {
            position: 0.0,
            rate,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Linear interpolation between neighbouring noise samples, wrapping.
    #[inline]
    pub fn next_sample(&mut self, noise: &NoiseBuffer) -> f32 {
        let len = noise.samples.len();
        let index = self.position as usize % len;
        let frac = self.position.fract() as f32;
        let a = noise.samples[index];
        let b = noise.samples[(index + 1) % len];

        self.position += self.rate;
        if self.position >= len as f64 {
            self.position -= len as f64;
        }
        a + (b - a) * frac
    }
}
