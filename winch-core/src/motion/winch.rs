//! Winch motion controller
//!
//! Owns everything the control loop drives: the slew limiter (and through
//! it the PWM speed output), the direction line, the FG edge gate and the
//! clock. It lives for the whole program so the applied speed carries over
//! between operations and the output never jumps.
//!
//! The move and hold operations are implemented in [`super::mover`] and
//! [`super::hold`] as methods on this type.

use crate::config::DistanceScale;
use crate::pulse::PulseCounter;
use crate::traits::{Clock, Direction, DirectionOutput, EdgeGate, SpeedOutput};

use super::slew::SlewLimiter;

/// Speed below which the drum counts as stopped (%)
pub const STOPPED_EPSILON: f32 = 0.01;

/// Extra time allowed on top of the computed brake ramp
const BRAKE_MARGIN_US: u64 = 50_000;

/// Winch motion controller
pub struct Winch<'a, S, D, G, C> {
    pub(super) slew: SlewLimiter<S>,
    direction_out: D,
    gate: G,
    pub(super) clock: C,
    pub(super) pulses: &'a PulseCounter,
    scale: DistanceScale,
    direction: Direction,
    wind_direction: Direction,
}

impl<'a, S, D, G, C> Winch<'a, S, D, G, C>
where
    S: SpeedOutput,
    D: DirectionOutput,
    G: EdgeGate,
    C: Clock,
{
    /// Create a controller at rest
    ///
    /// Drives the speed output to zero and the direction line to the wind
    /// direction (clockwise).
    pub fn new(
        speed: S,
        direction: D,
        gate: G,
        clock: C,
        pulses: &'a PulseCounter,
        scale: DistanceScale,
    ) -> Self {
        let mut winch = Self {
            slew: SlewLimiter::new(speed),
            direction_out: direction,
            gate,
            clock,
            pulses,
            scale,
            direction: Direction::Clockwise,
            wind_direction: Direction::Clockwise,
        };
        winch.direction_out.set_direction(winch.direction);
        winch.tick();
        winch
    }

    /// Use a different drum rotation for reeling in
    pub fn with_wind_direction(mut self, dir: Direction) -> Self {
        self.wind_direction = dir;
        self
    }

    /// Run one slew update and apply it to the speed output
    ///
    /// Returns the applied speed.
    pub fn tick(&mut self) -> f32 {
        let now = self.clock.now_us();
        self.slew.update(now)
    }

    /// Ask for a new speed; the slew limiter ramps to it on later ticks
    pub fn command_speed(&mut self, speed: f32, rate: f32) {
        self.slew.set_target(speed, rate);
    }

    /// Drive the direction line
    pub fn set_direction(&mut self, dir: Direction) {
        if dir != self.direction {
            trace!("Direction -> {}", dir);
        }
        self.direction = dir;
        self.direction_out.set_direction(dir);
    }

    /// Capture and zero the pulse count with the edge source suspended
    pub fn reset_pulses(&mut self) -> u32 {
        self.pulses.read_and_reset(&mut self.gate)
    }

    /// Pulses counted since the last reset
    pub fn pulses(&self) -> u32 {
        self.pulses.count()
    }

    /// Ramp to zero at `brake_rate`, then dwell for `settle_ms`
    ///
    /// Returns with the applied speed exactly zero; the limiter snaps once
    /// the remaining gap is under one step. The ramp wait is bounded by the
    /// time the ramp needs at that rate.
    pub fn brake_to_stop(&mut self, brake_rate: f32, settle_ms: u32) {
        self.slew.set_target(0.0, brake_rate);

        let ramp_start = self.clock.now_us();
        let bound_us = self.slew.ramp_time_us() + BRAKE_MARGIN_US;
        while !self.slew.at_target(0.0) {
            if self.clock.elapsed_us(ramp_start) > bound_us {
                warn!("Brake ramp overran {} us", bound_us);
                break;
            }
            self.tick();
            self.clock.idle();
        }

        self.dwell(settle_ms);
    }

    /// Keep ticking for a fixed time
    ///
    /// Used for settle times and pauses so the limiter keeps running.
    pub fn dwell(&mut self, ms: u32) {
        let start = self.clock.now_us();
        let duration_us = u64::from(ms) * 1_000;
        while self.clock.elapsed_us(start) < duration_us {
            self.tick();
            self.clock.idle();
        }
    }

    /// Latch the slew timestamp before starting an operation
    ///
    /// The caller may have left the controller idle for a while. Ticking
    /// once with an unchanged target keeps that gap from being treated as
    /// ramp time.
    pub(crate) fn begin(&mut self) {
        self.tick();
    }

    /// Bring the drum to rest before reversing
    pub(crate) fn stop_before_reversal(&mut self, dir: Direction, brake_rate: f32) {
        if dir != self.direction && !self.is_stopped() {
            debug!("Direction change: stopping for reversal");
            self.brake_to_stop(brake_rate, 0);
        }
    }

    /// Check if the applied speed is zero
    pub fn is_stopped(&self) -> bool {
        self.slew.current() <= STOPPED_EPSILON
    }

    /// Current direction line state
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Drum rotation that reels the payload in
    pub fn wind_direction(&self) -> Direction {
        self.wind_direction
    }

    /// Distance conversion
    pub fn scale(&self) -> &DistanceScale {
        &self.scale
    }

    /// Get the slew limiter
    pub fn slew(&self) -> &SlewLimiter<S> {
        &self.slew
    }
}
