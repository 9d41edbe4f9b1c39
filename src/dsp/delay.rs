/// Echo send: a fixed-length ring buffer whose output is fed back into its
/// input at `feedback` gain.
///
/// `next_sample` returns only the wet signal; the caller mixes it onto the dry
/// path at its own wet level.
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl FeedbackDelay {
    pub fn new(delay_seconds: f32, feedback: f32, sample_rate: f32) -> Self {
        let len = ((delay_seconds * sample_rate).round() as usize).max(1);
        Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            feedback: feedback.clamp(0.0, 0.99),
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = sample + delayed * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed
    }

    /// Replace `buffer` with the wet output for it.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_repeats_with_feedback_decay() {
        let mut delay = FeedbackDelay::new(0.01, 0.5, 1_000.0);
        assert_eq!(delay.delay_samples(), 10);

        let mut buffer = vec![0.0; 40];
        buffer[0] = 1.0;
        delay.render(&mut buffer);

        assert_eq!(buffer[0], 0.0);
        assert!((buffer[10] - 1.0).abs() < 1e-6);
        assert!((buffer[20] - 0.5).abs() < 1e-6);
        assert!((buffer[30] - 0.25).abs() < 1e-6);
        assert_eq!(buffer[15], 0.0);
    }

    #[test]
    fn reset_clears_tail() {
        let mut delay = FeedbackDelay::new(0.005, 0.35, 1_000.0);
        delay.next_sample(1.0);
        delay.reset();
        let mut buffer = vec![0.0; 20];
        delay.render(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }
}
