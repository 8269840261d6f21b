//! Windowed stall detection
//!
//! The FG line is trusted only as far as it shows progress. Every window
//! the pulses gained are compared against a minimum that depends on the
//! commanded speed (see [`StallBands`]). Too little progress while the
//! motor is commanded to move means it is stalled or the FG line is dead;
//! either way the move must stop.

use crate::config::StallBands;

/// Evidence for a stall, returned when a window closes short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StallTrip {
    /// Pulses gained in the window that tripped
    pub window_pulses: u32,
    /// Minimum required at the commanded speed
    pub min_pulses: u32,
}

/// Stall monitor for one move
#[derive(Debug, Clone, Copy)]
pub struct StallMonitor {
    window_us: u64,
    window_start_us: u64,
    window_start_pulses: u32,
}

impl StallMonitor {
    /// Start monitoring at `now_us` with the counter at `pulses`
    pub fn new(window_ms: u32, now_us: u64, pulses: u32) -> Self {
        Self {
            window_us: u64::from(window_ms) * 1_000,
            window_start_us: now_us,
            window_start_pulses: pulses,
        }
    }

    /// Check progress
    ///
    /// Call every loop iteration. Nothing is judged until a full window has
    /// elapsed; then the window restarts from the current count.
    pub fn check(
        &mut self,
        now_us: u64,
        pulses: u32,
        commanded_speed: f32,
        bands: &StallBands,
    ) -> Option<StallTrip> {
        if now_us.saturating_sub(self.window_start_us) < self.window_us {
            return None;
        }

        let window_pulses = pulses.saturating_sub(self.window_start_pulses);
        let min_pulses = bands.min_pulses_for(commanded_speed);

        self.window_start_us = now_us;
        self.window_start_pulses = pulses;

        if window_pulses < min_pulses {
            Some(StallTrip {
                window_pulses,
                min_pulses,
            })
        } else {
            None
        }
    }
}
