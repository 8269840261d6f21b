//! PWM speed output
//!
//! Maps 0-100% onto the channel's duty range, rounding to the nearest
//! count. A channel with 6250 counts (20 kHz on the RP2040) puts 50% at
//! 3125.

use embedded_hal::pwm::SetDutyCycle;
use winch_core::motion::clamp_percent;
use winch_core::traits::SpeedOutput;

/// Speed output over an embedded-hal PWM channel
pub struct PwmSpeed<P> {
    pwm: P,
    /// Last duty written
    duty: u16,
    /// Writes the channel rejected
    write_errors: u32,
}

impl<P: SetDutyCycle> PwmSpeed<P> {
    /// Wrap a channel and drive it to 0%
    pub fn new(pwm: P) -> Self {
        let mut out = Self {
            pwm,
            duty: 0,
            write_errors: 0,
        };
        out.write(0);
        out
    }

    /// Duty value for a speed percentage
    pub fn duty_for(&self, percent: f32) -> u16 {
        let max = self.pwm.max_duty_cycle();
        let duty = clamp_percent(percent) / 100.0 * f32::from(max) + 0.5;
        if duty >= f32::from(max) {
            max
        } else {
            duty as u16
        }
    }

    /// Last duty written
    pub fn duty(&self) -> u16 {
        self.duty
    }

    /// Number of rejected writes
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    fn write(&mut self, duty: u16) {
        if self.pwm.set_duty_cycle(duty).is_ok() {
            self.duty = duty;
        } else {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}

impl<P: SetDutyCycle> SpeedOutput for PwmSpeed<P> {
    fn set_speed(&mut self, percent: f32) {
        let duty = self.duty_for(percent);
        if duty != self.duty {
            self.write(duty);
        }
    }
}
