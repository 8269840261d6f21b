//! Slew-rate limited speed output
//!
//! Writing speed percentages straight to the PWM jerks the gearbox and
//! makes the FG line noisy. The limiter decouples "what speed do I want"
//! from "how fast can I get there": callers set a target and a ramp rate,
//! and the control loop calls [`SlewLimiter::update`] every iteration to
//! move the applied speed toward the target.
//!
//! The limiter owns the speed output and is the only thing that writes it,
//! so every caller's speed intent is smoothed.
//!
//! ```ignore
//! let mut slew = SlewLimiter::new(pwm);
//! slew.set_target(60.0, 100.0); // 60% at 100%/s
//!
//! loop {
//!     slew.update(clock.now_us());
//!     clock.idle();
//! }
//! ```

use crate::traits::SpeedOutput;

/// Ramp rate used when a caller passes a non-positive rate (%/s)
pub const MIN_RAMP_RATE: f32 = 1.0;

/// Clamp a speed to 0-100%, mapping NaN to 0
pub fn clamp_percent(speed: f32) -> f32 {
    if !(speed > 0.0) {
        0.0
    } else if speed > 100.0 {
        100.0
    } else {
        speed
    }
}

/// Ramped speed controller
pub struct SlewLimiter<S> {
    output: S,
    /// Applied speed (0-100%)
    current: f32,
    /// Requested speed (0-100%)
    target: f32,
    /// Ramp rate (%/s)
    rate: f32,
    /// Timestamp of the previous update
    last_update_us: u64,
    /// Whether `last_update_us` is meaningful yet
    initialized: bool,
}

impl<S: SpeedOutput> SlewLimiter<S> {
    /// Create a limiter at rest
    pub fn new(output: S) -> Self {
        Self {
            output,
            current: 0.0,
            target: 0.0,
            rate: MIN_RAMP_RATE,
            last_update_us: 0,
            initialized: false,
        }
    }

    /// Record a new target speed and ramp rate
    ///
    /// The speed is clamped to 0-100%. A non-positive rate is replaced with
    /// [`MIN_RAMP_RATE`].
    pub fn set_target(&mut self, speed: f32, rate: f32) {
        self.target = clamp_percent(speed);
        self.rate = if rate > 0.0 { rate } else { MIN_RAMP_RATE };
    }

    /// Advance the applied speed toward the target and write it out
    ///
    /// Returns the applied speed. The first call only latches the
    /// timestamp.
    pub fn update(&mut self, now_us: u64) -> f32 {
        let dt_us = if self.initialized {
            now_us.saturating_sub(self.last_update_us)
        } else {
            self.initialized = true;
            0
        };
        self.last_update_us = now_us;

        let max_step = self.rate * (dt_us as f32 / 1_000_000.0);
        let gap = self.target - self.current;

        if gap > max_step {
            self.current += max_step;
        } else if -gap > max_step {
            self.current -= max_step;
        } else {
            self.current = self.target;
        }
        self.current = clamp_percent(self.current);

        self.output.set_speed(self.current);
        self.current
    }

    /// Check if the applied speed is within `epsilon` of the target
    pub fn at_target(&self, epsilon: f32) -> bool {
        let gap = self.target - self.current;
        gap <= epsilon && -gap <= epsilon
    }

    /// Applied speed (%)
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Requested speed (%)
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Ramp rate (%/s)
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Worst-case time to ramp from the applied speed to the target (µs)
    pub fn ramp_time_us(&self) -> u64 {
        let gap = self.target - self.current;
        let gap = if gap < 0.0 { -gap } else { gap };
        (gap / self.rate * 1_000_000.0) as u64
    }

    /// Get the speed output
    pub fn output(&self) -> &S {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct LastSpeed {
        speed: Option<f32>,
        writes: u32,
    }

    impl SpeedOutput for LastSpeed {
        fn set_speed(&mut self, percent: f32) {
            self.speed = Some(percent);
            self.writes += 1;
        }
    }

    const MS: u64 = 1_000;

    #[test]
    fn test_initial_state() {
        let slew = SlewLimiter::new(LastSpeed::default());
        assert_eq!(slew.current(), 0.0);
        assert_eq!(slew.target(), 0.0);
        assert!(slew.at_target(0.0));
        assert!(slew.output().speed.is_none());
    }

    #[test]
    fn test_first_update_only_latches_time() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        slew.set_target(50.0, 100.0);

        assert_eq!(slew.update(1_000 * MS), 0.0);
        assert_eq!(slew.output().speed, Some(0.0));
    }

    #[test]
    fn test_ramps_at_rate() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        slew.set_target(50.0, 100.0); // 0.1% per ms
        slew.update(0);

        // 100ms at 100%/s is 10%
        let speed = slew.update(100 * MS);
        assert!(speed > 9.99 && speed < 10.01, "speed = {}", speed);
        assert!(!slew.at_target(0.1));

        // Another 400ms lands exactly on target
        assert_eq!(slew.update(500 * MS), 50.0);
        assert!(slew.at_target(0.0));
    }

    #[test]
    fn test_snaps_to_target_within_one_step() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        slew.set_target(10.0, 100.0);
        slew.update(0);

        // One 200ms step would overshoot 10%: snap
        assert_eq!(slew.update(200 * MS), 10.0);
    }

    #[test]
    fn test_ramps_down() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        slew.set_target(40.0, 1_000.0);
        slew.update(0);
        slew.update(100 * MS);
        assert_eq!(slew.current(), 40.0);

        slew.set_target(0.0, 100.0);
        let speed = slew.update(200 * MS);
        assert!(speed > 29.9 && speed < 30.1, "speed = {}", speed);

        slew.update(1_000 * MS);
        assert_eq!(slew.current(), 0.0);
        assert_eq!(slew.output().speed, Some(0.0));
    }

    #[test]
    fn test_target_is_clamped() {
        let mut slew = SlewLimiter::new(LastSpeed::default());

        slew.set_target(150.0, 10.0);
        assert_eq!(slew.target(), 100.0);

        slew.set_target(-20.0, 10.0);
        assert_eq!(slew.target(), 0.0);

        slew.set_target(f32::NAN, 10.0);
        assert_eq!(slew.target(), 0.0);
    }

    #[test]
    fn test_non_positive_rate_uses_minimum() {
        let mut slew = SlewLimiter::new(LastSpeed::default());

        slew.set_target(50.0, 0.0);
        assert_eq!(slew.rate(), MIN_RAMP_RATE);

        slew.set_target(50.0, -5.0);
        assert_eq!(slew.rate(), MIN_RAMP_RATE);

        slew.set_target(50.0, f32::NAN);
        assert_eq!(slew.rate(), MIN_RAMP_RATE);
    }

    #[test]
    fn test_every_update_writes_output() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        for t in 0..5 {
            slew.update(t * MS);
        }
        assert_eq!(slew.output().writes, 5);
    }

    #[test]
    fn test_clock_going_backwards_holds_speed() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        slew.set_target(50.0, 100.0);
        slew.update(100 * MS);
        slew.update(200 * MS);
        let before = slew.current();

        assert_eq!(slew.update(150 * MS), before);
    }

    #[test]
    fn test_ramp_time() {
        let mut slew = SlewLimiter::new(LastSpeed::default());
        slew.set_target(50.0, 100.0);
        assert_eq!(slew.ramp_time_us(), 500 * MS);
    }

    proptest! {
        #[test]
        fn prop_current_stays_in_range_and_rate_limited(
            steps in prop::collection::vec(
                (-50.0f32..150.0, -10.0f32..2_000.0, 0u64..50_000),
                1..64,
            )
        ) {
            let mut slew = SlewLimiter::new(LastSpeed::default());
            let mut now = 0u64;
            slew.update(now);

            for (speed, rate, dt) in steps {
                slew.set_target(speed, rate);
                let before = slew.current();
                now += dt;
                let after = slew.update(now);

                prop_assert!((0.0..=100.0).contains(&after));

                let allowed = slew.rate() * (dt as f32 / 1_000_000.0) + 1e-3;
                let moved = if after > before { after - before } else { before - after };
                prop_assert!(moved <= allowed, "moved {} allowed {}", moved, allowed);
            }
        }

        #[test]
        fn prop_reaches_any_target(target in 0.0f32..=100.0, rate in 1.0f32..1_000.0) {
            let mut slew = SlewLimiter::new(LastSpeed::default());
            slew.set_target(target, rate);
            slew.update(0);
            slew.update(slew.ramp_time_us() + 1_000);
            prop_assert!(slew.at_target(1e-3));
        }
    }
}
