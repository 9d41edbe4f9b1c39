use std::f32::consts::TAU;

/*
Era Output Filter
=================

A topology-preserving-transform state-variable filter, used only for its
lowpass response. Older tiers sit behind a darker cutoff, which both mimics
the hardware's reconstruction filter and tames the aliasing of the naive
oscillators.

  g    tan(pi * fc / fs), the prewarped integrator gain.
  k    2 - 2 * resonance. The chain runs at resonance 0 (k = 2, Butterworth-ish
       Q of 0.5) so the cutoff never rings.
  h    1 / (1 + g * (g + k)), the resolved feedback term.

The cutoff is clamped below 0.45 * fs: at Nyquist tan() blows up and the
filter goes unstable, which happens for the 18 kHz tier at low device rates.
*/

/// Fraction of the sample rate the cutoff may reach.
const MAX_CUTOFF_RATIO: f32 = 0.45;

#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,
    g: f32,
    k: f32,
}

impl SVFilter {
    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
            g: 0.0,
            k: 2.0,
        };
        filter.set_cutoff(cutoff_hz, sample_rate);
        filter
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    #[inline]
    fn compute_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let wd = TAU * cutoff_hz;
        let wa = (2.0 * sample_rate) * (wd / (2.0 * sample_rate)).tan();
        wa / (2.0 * sample_rate)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let h = 1.0 / (1.0 + self.g * (self.g + self.k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32, sample_rate: f32) {
        self.cutoff_hz = cutoff.clamp(1.0, sample_rate * MAX_CUTOFF_RATIO);
        self.g = Self::compute_g(self.cutoff_hz, sample_rate);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.99);
        self.k = 2.0 - 2.0 * self.resonance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{Oscillator, Timbre};

    fn sine_block(frequency: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        let mut osc = Oscillator::new();
        (0..len)
            .map(|_| osc.next_sample(Timbre::Sine, frequency, sample_rate))
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(32);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn test_lowpass_basic() {
        let mut filter = SVFilter::lowpass(500.0, 48_000.0);
        let mut buffer = vec![1.0; 128];

        filter.render(&mut buffer);

        assert!(buffer[127] > 0.99);
    }

    #[test]
    fn test_lowpass_filters_high_freq() {
        let sample_rate = 48_000.0;
        let mut filter = SVFilter::lowpass(500.0, sample_rate);
        let mut buffer = sine_block(5_000.0, sample_rate, 128); // 10x cutoff

        filter.render(&mut buffer);

        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(
            peak < 0.3,
            "Expected high freq attenuation, got peak: {}",
            peak
        );
    }

    #[test]
    fn test_set_cutoff_affects_filtering() {
        let sample_rate = 48_000.0;

        let mut filter = SVFilter::lowpass(200.0, sample_rate);
        let mut buffer1 = sine_block(1_000.0, sample_rate, 256);
        filter.render(&mut buffer1);
        let peak_low_cutoff = peak_after_transient(&buffer1);

        filter.reset();
        filter.set_cutoff(5_000.0, sample_rate);
        let mut buffer2 = sine_block(1_000.0, sample_rate, 256);
        filter.render(&mut buffer2);
        let peak_high_cutoff = peak_after_transient(&buffer2);

        assert!(
            peak_high_cutoff > peak_low_cutoff * 2.0,
            "High cutoff should pass more signal: high={}, low={}",
            peak_high_cutoff,
            peak_low_cutoff
        );
    }

    #[test]
    fn cutoff_is_clamped_below_nyquist() {
        let mut filter = SVFilter::lowpass(18_000.0, 22_050.0);
        assert!(filter.cutoff_hz() <= 22_050.0 * MAX_CUTOFF_RATIO);

        let mut buffer = sine_block(440.0, 22_050.0, 2048);
        filter.render(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() < 2.0));
    }
}
