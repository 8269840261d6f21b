//! Board-agnostic motion control for an FG-pulse DC winch
//!
//! This crate contains all winch logic that does not depend on specific
//! hardware implementations:
//!
//! - Collaborator traits (speed output, direction line, edge gate, clock)
//! - FG pulse counter shared with the edge interrupt
//! - Configuration types and drum geometry
//! - Slew-rate limited speed control
//! - Move-by-distance and hold-position supervision
//! - Stall monitoring

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod config;
pub mod motion;
pub mod pulse;
pub mod safety;
pub mod traits;
