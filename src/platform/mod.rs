//! Platform services that run beside the simulation
//!
//! The simulation thread only ever reads from these:
//! - Time (elapsed-time snapshot refreshed by a ticker thread)

pub mod clock;

pub use clock::{ClockReader, ElapsedClock};
