/*
Amplitude Quantization
======================

Older hardware had coarse DACs. We imitate that by snapping every output
sample to one of 2Q+1 evenly spaced levels in [-1, 1]:

    q(x) = round(x * Q) / Q        (identity when Q = 0)

The chain does not evaluate that per sample. When a chain is built it bakes
the curve for every tier into a lookup table over [-1, 1] and indexes the
nearest entry. Every entry is itself an exact staircase level, so the table
is idempotent just like the formula: a level maps to an entry that holds the
same level. Samples outside [-1, 1] clamp to the table edges, which is where
an overdriven DAC would have clipped anyway.
*/

/// Entries in a baked curve.
pub const CURVE_SIZE: usize = 4096;

/// Direct form of the staircase.
#[inline]
pub fn quantize(x: f32, levels: u32) -> f32 {
    if levels == 0 {
        return x;
    }
    let q = levels as f32;
    (x * q).round() / q
}

#[derive(Debug, Clone)]
pub struct QuantizeCurve {
    levels: u32,
    table: Vec<f32>,
}

impl QuantizeCurve {
    pub fn new(levels: u32) -> Self {
        let table = if levels == 0 {
            Vec::new()
        } else {
            let last = (CURVE_SIZE - 1) as f32;
            (0..CURVE_SIZE)
                .map(|i| quantize(i as f32 / last * 2.0 - 1.0, levels))
                .collect()
        };
        Self { levels, table }
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn is_linear(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        if self.table.is_empty() {
            return x;
        }
        let last = (CURVE_SIZE - 1) as f32;
        let position = ((x.clamp(-1.0, 1.0) + 1.0) * 0.5 * last).round();
        self.table[position as usize]
    }

    pub fn process(&self, buffer: &mut [f32]) {
        if self.table.is_empty() {
            return;
        }
        for sample in buffer.iter_mut() {
            *sample = self.apply(*sample);
        }
    }
}
