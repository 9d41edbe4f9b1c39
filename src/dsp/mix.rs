/*
Bus Mixing
==========

The chain sums every sounding note into one mono bus, then splits that bus
into the dry path and the two effect sends before interleaving to stereo.

  sum      a[i] += b[i]. Used to add a note's block into the bus.

  scaled   a[i] += b[i] * gain. Used to add a wet send back onto the dry
           output at its wet level.

  gain     a[i] *= gain. Master bus attenuation and era make-up gain.
*/

#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());
    for (x, y) in a.iter_mut().zip(b) {
        *x += *y;
    }
}

#[inline]
pub fn add_scaled(a: &mut [f32], b: &[f32], gain: f32) {
    debug_assert_eq!(a.len(), b.len());
    for (x, y) in a.iter_mut().zip(b) {
        *x += *y * gain;
    }
}

#[inline]
pub fn apply_gain(signal: &mut [f32], gain: f32) {
    for sample in signal.iter_mut() {
        *sample *= gain;
    }
}

/// Write a mono block into both channels of an interleaved stereo buffer.
#[inline]
pub fn interleave_mono(mono: &[f32], stereo: &mut [f32]) {
    debug_assert_eq!(mono.len() * 2, stereo.len());
    for (frame, &sample) in stereo.chunks_exact_mut(2).zip(mono) {
        frame[0] = sample;
        frame[1] = sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_send_adds_wet_level() {
        let mut dry = vec![1.0; 4];
        let wet = vec![0.5; 4];
        add_scaled(&mut dry, &wet, 0.3);
        assert!(dry.iter().all(|&s| (s - 1.15).abs() < 1e-6));
    }

    #[test]
    fn interleave_duplicates_channels() {
        let mono = [0.1, 0.2, 0.3];
        let mut stereo = [0.0; 6];
        interleave_mono(&mono, &mut stereo);
        assert_eq!(stereo, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }
}
