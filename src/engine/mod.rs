//! Everything between the pattern store and the speaker.
//!
//! `scheduler` is the pure lookahead arithmetic, `transport` runs it on a
//! tick thread, `chain` is the era signal chain every consumer renders
//! through, and `live` adapts a chain to a realtime device callback.

pub mod chain;
pub mod live;
pub mod scheduler;
pub mod transport;

pub use chain::SignalChain;
pub use live::{FrameClock, LiveChain};
pub use scheduler::{ClockConfig, DueStep, StepClock, Tick};
pub use transport::{AudioClock, NoteSink, Transport, TransportConfig};
