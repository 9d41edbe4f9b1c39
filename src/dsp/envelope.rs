/*
Note Decay Envelope
===================

Every sequenced note is a blip: it starts at full level with no attack and
decays exponentially to near-silence over exactly one step.

  Level
   peak ┐╲
        │ ╲
        │  ╲__
        │     ‾‾‾‾───────
  floor └──────────────────→ Time
        |<-- one step -->|

Exponential decay is a constant per-sample ratio:

    ratio = (floor / peak) ^ (1 / samples)

After `samples` multiplications the level lands on the floor, and the note is
considered finished. The floor is not zero (an exponential never reaches
zero), it is ENVELOPE_FLOOR, about -60 dB.
*/

/// Level at which a decaying note counts as silent.
pub const ENVELOPE_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Decay,
}

#[derive(Debug, Clone, Copy)]
pub struct DecayEnvelope {
    stage: EnvelopeStage,
    level: f32,
    ratio: f32,
    remaining: u32,
}

impl Default for DecayEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl DecayEnvelope {
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            ratio: 1.0,
            remaining: 0,
        }
    }

    /// Start a decay from `peak` down to the floor over `duration` seconds.
    pub fn trigger(&mut self, peak: f32, duration: f32, sample_rate: f32) {
        if peak <= ENVELOPE_FLOOR || !duration.is_finite() || duration <= 0.0 {
            *self = Self::new();
            return;
        }

        let samples = (duration * sample_rate).round().max(1.0);
        self.ratio = (ENVELOPE_FLOOR / peak).powf(1.0 / samples);
        self.level = peak;
        self.remaining = samples as u32;
        self.stage = EnvelopeStage::Decay;
    }

    /// Current level, then advance by one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => 0.0,
            EnvelopeStage::Decay => {
                let out = self.level;
                self.level *= self.ratio;
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.stage = EnvelopeStage::Idle;
                    self.level = 0.0;
                }
                out
            }
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        self.stage == EnvelopeStage::Decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_from_peak_to_floor_in_one_duration() {
        let mut env = DecayEnvelope::new();
        env.trigger(0.8, 0.125, 1_000.0);

        let levels: Vec<f32> = (0..125).map(|_| env.next_sample()).collect();
        assert!((levels[0] - 0.8).abs() < 1e-6);
        assert!(levels.windows(2).all(|w| w[1] < w[0]));
        // One ratio short of the floor on the last sample.
        assert!(levels[124] < 0.002 && levels[124] > ENVELOPE_FLOOR);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn silent_gain_never_starts() {
        let mut env = DecayEnvelope::new();
        env.trigger(0.0, 0.1, 44_100.0);
        assert!(!env.is_active());
        env.trigger(0.5, 0.0, 44_100.0);
        assert!(!env.is_active());
    }

    #[test]
    fn retrigger_restarts_from_peak() {
        let mut env = DecayEnvelope::new();
        env.trigger(1.0, 0.01, 1_000.0);
        for _ in 0..5 {
            env.next_sample();
        }
        env.trigger(1.0, 0.01, 1_000.0);
        assert_eq!(env.next_sample(), 1.0);
    }
}
