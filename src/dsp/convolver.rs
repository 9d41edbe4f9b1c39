use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/*
Partitioned Convolution Reverb
==============================

A two-second impulse response is 88k taps at 44.1 kHz. Direct convolution
is out of the question, and one giant FFT would add seconds of latency.
Instead the IR is cut into blocks of B samples and each block is convolved
in the frequency domain (uniformly partitioned overlap-save):

  1. Collect B input samples.
  2. FFT the last 2B input samples (previous block + this block).
  3. Push that spectrum onto a frequency-domain delay line (FDL).
  4. Y = sum over p of FDL[p] * H[p], where H[p] is the spectrum of IR
     block p zero-padded to 2B, and FDL[p] is the input spectrum from p
     blocks ago.
  5. IFFT Y; the last B samples are valid output.

Output for a block is available once the block has been collected, so the
send carries B samples of latency. At B = 512 that is ~12 ms of pre-delay,
well inside what a reverb tail tolerates.

The synthetic IR is white noise under a polynomial fade,
(1 - i/len)^exponent, normalized to unit energy so the send neither
swells nor vanishes relative to the dry signal.
*/

/// Samples per partition (and per processed block).
pub const PARTITION_SIZE: usize = 512;
const FFT_SIZE: usize = PARTITION_SIZE * 2;
const IMPULSE_SEED: u64 = 0x7265_7665_7262;

pub struct PartitionedConvolver {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// IR block spectra, H[p].
    partitions: Vec<Vec<Complex<f32>>>,
    /// Ring of past input spectra; `head` is the newest.
    history: Vec<Vec<Complex<f32>>>,
    head: usize,
    /// Last 2B input samples, time domain.
    window: Vec<f32>,
    input: Vec<f32>,
    output: Vec<f32>,
    fill: usize,
    spectrum: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl PartitionedConvolver {
    pub fn new(impulse: &[f32]) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(FFT_SIZE);
        let inverse = planner.plan_fft_inverse(FFT_SIZE);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let count = impulse.len().div_ceil(PARTITION_SIZE).max(1);
        let partitions: Vec<Vec<Complex<f32>>> = (0..count)
            .map(|p| {
                let mut block = vec![Complex::default(); FFT_SIZE];
                let start = p * PARTITION_SIZE;
                let end = (start + PARTITION_SIZE).min(impulse.len());
                for (slot, &tap) in block.iter_mut().zip(impulse.get(start..end).unwrap_or(&[])) {
                    slot.re = tap;
                }
                forward.process_with_scratch(&mut block, &mut scratch);
                block
            })
            .collect();

        Self {
            forward,
            inverse,
            history: vec![vec![Complex::default(); FFT_SIZE]; count],
            partitions,
            head: 0,
            window: vec![0.0; FFT_SIZE],
            input: vec![0.0; PARTITION_SIZE],
            output: vec![0.0; PARTITION_SIZE],
            fill: 0,
            spectrum: vec![Complex::default(); FFT_SIZE],
            accum: vec![Complex::default(); FFT_SIZE],
            scratch,
        }
    }

    pub fn latency(&self) -> usize {
        PARTITION_SIZE
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let out = self.output[self.fill];
        self.input[self.fill] = sample;
        self.fill += 1;
        if self.fill == PARTITION_SIZE {
            self.process_block();
            self.fill = 0;
        }
        out
    }

    /// Write the wet signal for `input` into `output`.
    pub fn render(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.next_sample(x);
        }
    }

    fn process_block(&mut self) {
        self.window.copy_within(PARTITION_SIZE.., 0);
        self.window[PARTITION_SIZE..].copy_from_slice(&self.input);

        for (bin, &x) in self.spectrum.iter_mut().zip(&self.window) {
            *bin = Complex::new(x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let count = self.partitions.len();
        self.head = (self.head + count - 1) % count;
        self.history[self.head].copy_from_slice(&self.spectrum);

        self.accum.fill(Complex::default());
        for (p, h) in self.partitions.iter().enumerate() {
            let x = &self.history[(self.head + p) % count];
            for ((acc, &xv), &hv) in self.accum.iter_mut().zip(x).zip(h) {
                *acc += xv * hv;
            }
        }
        self.inverse
            .process_with_scratch(&mut self.accum, &mut self.scratch);

        let scale = 1.0 / FFT_SIZE as f32;
        for (out, bin) in self.output.iter_mut().zip(&self.accum[PARTITION_SIZE..]) {
            *out = bin.re * scale;
        }
    }

    pub fn reset(&mut self) {
        for spectrum in &mut self.history {
            spectrum.fill(Complex::default());
        }
        self.window.fill(0.0);
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.fill = 0;
        self.head = 0;
    }
}

/// Stereo decaying-noise impulse, one channel per side, each at unit energy.
pub fn synthetic_impulse(sample_rate: f32, seconds: f32, exponent: f32) -> [Vec<f32>; 2] {
    let len = ((sample_rate * seconds) as usize).max(1);
    let mut rng = Pcg32::seed_from_u64(IMPULSE_SEED);

    let mut channel = || {
        let mut taps: Vec<f32> = (0..len)
            .map(|i| {
                let fade = (1.0 - i as f32 / len as f32).powf(exponent);
                rng.random_range(-1.0f32..=1.0) * fade
            })
            .collect();
        let energy: f32 = taps.iter().map(|t| t * t).sum();
        if energy > 0.0 {
            let norm = energy.sqrt().recip();
            taps.iter_mut().for_each(|t| *t *= norm);
        }
        taps
    };

    let left = channel();
    let right = channel();
    [left, right]
}
