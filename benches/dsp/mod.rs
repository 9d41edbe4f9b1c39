//! Benchmarks for low-level DSP primitives.

mod convolver;
mod effects;
mod oscillator;
mod quantize;

pub use convolver::bench_convolver;
pub use effects::bench_effects;
pub use oscillator::bench_oscillator;
pub use quantize::bench_quantize;
