//! Whole-system scenario benchmarks.
//!
//! These model what the live callback, the generate key and the export
//! worker actually do.

mod chain;
mod export;
mod generate;

pub use chain::bench_chain;
pub use export::bench_export;
pub use generate::bench_generate;
