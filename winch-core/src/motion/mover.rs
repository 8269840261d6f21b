//! Move-by-distance
//!
//! A move converts a distance into an FG pulse target and runs the drum
//! until the counter reaches it. The speed profile is
//!
//! ```text
//! speed
//!   ^        ___________________
//!   |       /                   \
//!   |  ____/                     \____
//!   | /  padding     cruise     padding\
//!   +-----------------------------------> pulses
//! ```
//!
//! with slew-limited transitions. Every iteration checks three exits:
//! target reached (success), too little progress for the commanded speed
//! over a stall window, or the move timeout. Both failures brake on the
//! ramp before returning.

use crate::config::{DistanceScale, MoveConfig, StallBands};
use crate::safety::StallMonitor;
use crate::traits::{Clock, Direction, DirectionOutput, EdgeGate, SpeedOutput};

use super::winch::Winch;

/// Minimum change before a new speed command is issued (%)
///
/// Re-issuing an identical command every iteration would restart the ramp.
pub const SPEED_TOLERANCE: f32 = 0.5;

/// Why a move failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveError {
    /// Too few pulses in a stall window for the commanded speed
    Stall {
        /// Pulses counted in the move before the stall
        pulses: u32,
        /// Pulses gained in the window that tripped
        window_pulses: u32,
        /// Minimum required at the commanded speed
        min_pulses: u32,
    },
    /// The move exceeded its time budget
    Timeout {
        /// Pulses counted in the move before the timeout
        pulses: u32,
    },
}

impl MoveError {
    /// Pulses counted before the failure
    pub fn pulses(&self) -> u32 {
        match self {
            MoveError::Stall { pulses, .. } | MoveError::Timeout { pulses } => *pulses,
        }
    }
}

impl core::fmt::Display for MoveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MoveError::Stall {
                pulses,
                window_pulses,
                min_pulses,
            } => write!(
                f,
                "stalled after {} pulses ({} in window, {} required)",
                pulses, window_pulses, min_pulses
            ),
            MoveError::Timeout { pulses } => write!(f, "timed out after {} pulses", pulses),
        }
    }
}

/// Outcome of a successful move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    /// Pulse target of the move
    pub target_pulses: u32,
    /// Pulses counted when the target was reached
    pub pulses: u32,
    /// Time from start to reaching the target
    pub elapsed_ms: u32,
}

/// Everything one move needs, fixed for its duration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveProfile {
    /// Drum rotation
    pub direction: Direction,
    /// Pulses to travel
    pub target_pulses: u32,
    /// Speed between the padding zones (%)
    pub cruise_speed: f32,
    /// Pulses in each padding zone
    pub padding_pulses: u32,
    /// Speed inside the padding zones (%)
    pub padding_speed: f32,
    /// Time budget
    pub timeout_ms: u32,
    /// Stall check interval
    pub stall_window_ms: u32,
    /// Stall thresholds
    pub stall_bands: StallBands,
    /// Acceleration ramp (%/s)
    pub ramp_rate: f32,
    /// Braking ramp (%/s)
    pub brake_rate: f32,
    /// Dwell after braking
    pub settle_ms: u32,
}

impl MoveProfile {
    /// Derive a profile from a distance
    ///
    /// When the two padding zones would overlap, padding shrinks to half
    /// the target (rounded up) so the whole move runs at padding speed.
    /// Padding never runs faster than cruise.
    pub fn new(
        direction: Direction,
        distance_m: f32,
        config: &MoveConfig,
        scale: &DistanceScale,
    ) -> Self {
        let target_pulses = scale.pulses_for(distance_m);

        let mut padding_pulses = scale.pulses_for(config.padding_distance_m);
        if padding_pulses.saturating_mul(2) > target_pulses {
            padding_pulses = target_pulses.div_ceil(2);
        }

        let padding_speed = if config.padding_speed < config.cruise_speed {
            config.padding_speed
        } else {
            config.cruise_speed
        };

        Self {
            direction,
            target_pulses,
            cruise_speed: config.cruise_speed,
            padding_pulses,
            padding_speed,
            timeout_ms: config.timeout_ms,
            stall_window_ms: config.stall_window_ms,
            stall_bands: config.stall_bands.clone(),
            ramp_rate: config.ramp_rate,
            brake_rate: config.brake_rate,
            settle_ms: config.settle_ms,
        }
    }

    /// Check if the move needs no motion at all
    pub fn is_trivial(&self) -> bool {
        self.target_pulses == 0
    }

    /// Speed to command on the way out
    pub fn initial_speed(&self) -> f32 {
        if self.padding_pulses > 0 {
            self.padding_speed
        } else {
            self.cruise_speed
        }
    }

    /// Speed the profile calls for after `pulses` pulses
    pub fn speed_for(&self, pulses: u32) -> f32 {
        let remaining = self.target_pulses.saturating_sub(pulses);
        if pulses < self.padding_pulses || remaining <= self.padding_pulses {
            self.padding_speed
        } else {
            self.cruise_speed
        }
    }
}

impl<'a, S, D, G, C> Winch<'a, S, D, G, C>
where
    S: SpeedOutput,
    D: DirectionOutput,
    G: EdgeGate,
    C: Clock,
{
    /// Run a move to completion
    ///
    /// Returns once the pulse target is reached and the drum has braked to
    /// a stop, or with an error after a stall or timeout (also braked).
    pub fn move_distance(&mut self, profile: &MoveProfile) -> Result<MoveReport, MoveError> {
        if profile.is_trivial() {
            debug!("Move of zero pulses, nothing to do");
            return Ok(MoveReport::default());
        }

        self.begin();
        self.stop_before_reversal(profile.direction, profile.brake_rate);

        self.reset_pulses();
        self.set_direction(profile.direction);

        let mut commanded = profile.initial_speed();
        self.command_speed(commanded, profile.ramp_rate);

        info!(
            "Move: {} pulses, cruise {}%, padding {} pulses at {}%",
            profile.target_pulses,
            profile.cruise_speed,
            profile.padding_pulses,
            profile.padding_speed
        );

        let start_us = self.clock.now_us();
        let timeout_us = u64::from(profile.timeout_ms) * 1_000;
        let mut stall = StallMonitor::new(profile.stall_window_ms, start_us, 0);

        loop {
            self.tick();

            let pulses = self.pulses.count();
            if pulses >= profile.target_pulses {
                break;
            }

            let desired = profile.speed_for(pulses);
            let delta = desired - commanded;
            if delta > SPEED_TOLERANCE || -delta > SPEED_TOLERANCE {
                trace!("Move speed {}% -> {}% at {} pulses", commanded, desired, pulses);
                self.command_speed(desired, profile.ramp_rate);
                commanded = desired;
            }

            let now = self.clock.now_us();

            if let Some(trip) = stall.check(now, pulses, commanded, &profile.stall_bands) {
                warn!(
                    "Stall: {} pulses in window at {}% (need {}), {} of {} done",
                    trip.window_pulses,
                    commanded,
                    trip.min_pulses,
                    pulses,
                    profile.target_pulses
                );
                self.brake_to_stop(profile.brake_rate, profile.settle_ms);
                return Err(MoveError::Stall {
                    pulses,
                    window_pulses: trip.window_pulses,
                    min_pulses: trip.min_pulses,
                });
            }

            if now.saturating_sub(start_us) > timeout_us {
                warn!(
                    "Move timeout after {} ms, {} of {} pulses",
                    profile.timeout_ms,
                    pulses,
                    profile.target_pulses
                );
                self.brake_to_stop(profile.brake_rate, profile.settle_ms);
                return Err(MoveError::Timeout { pulses });
            }

            self.clock.idle();
        }

        let report = MoveReport {
            target_pulses: profile.target_pulses,
            pulses: self.pulses.count(),
            elapsed_ms: (self.clock.elapsed_us(start_us) / 1_000) as u32,
        };

        self.brake_to_stop(profile.brake_rate, profile.settle_ms);

        debug!(
            "Move complete: {} pulses in {} ms",
            report.pulses,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Move a distance in meters with the given tuning
    pub fn move_meters(
        &mut self,
        direction: Direction,
        meters: f32,
        config: &MoveConfig,
    ) -> Result<MoveReport, MoveError> {
        let profile = MoveProfile::new(direction, meters, config, self.scale());
        self.move_distance(&profile)
    }

    /// Reel the payload in
    pub fn wind(&mut self, meters: f32, config: &MoveConfig) -> Result<MoveReport, MoveError> {
        let dir = self.wind_direction();
        self.move_meters(dir, meters, config)
    }

    /// Pay the payload out
    pub fn unwind(&mut self, meters: f32, config: &MoveConfig) -> Result<MoveReport, MoveError> {
        let dir = self.wind_direction().opposite();
        self.move_meters(dir, meters, config)
    }
}
