//! Motion control
//!
//! Slew-limited speed output plus the two winch operations built on it:
//! moving a distance and holding position against slip.

pub mod hold;
pub mod mover;
pub mod slew;
pub mod winch;

pub use hold::HoldReport;
pub use mover::{MoveError, MoveProfile, MoveReport};
pub use slew::{clamp_percent, SlewLimiter, MIN_RAMP_RATE};
pub use winch::Winch;
