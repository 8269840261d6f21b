//! Safety monitoring
//!
//! Detects a stalled drum from missing FG progress.

pub mod stall;

pub use stall::{StallMonitor, StallTrip};
