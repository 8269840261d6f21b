//! FG pulse counting
//!
//! The motor driver's frequency-generator output carries no direction, so
//! the count is a plain unsigned tally consumed by the motion logic.

pub mod counter;

pub use counter::PulseCounter;
