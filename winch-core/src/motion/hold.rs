//! Hold position against slip
//!
//! While holding, the commanded speed is zero, so any FG activity means the
//! drum is moving on its own: the payload is backdriving the gearbox or the
//! line is slipping. The sensor cannot tell which way, so the response is
//! always the same: a short pull of a fixed pulse count in the tow-up
//! direction, then stop again. Nudges are rate-limited so the winch does
//! not chatter.
//!
//! A hold never fails. It runs for its full duration and reports what it
//! had to do.

use crate::config::HoldConfig;
use crate::traits::{Clock, DirectionOutput, EdgeGate, SpeedOutput};

use super::winch::Winch;

/// What happened during a hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HoldReport {
    /// Nudges that reached their pulse quota
    pub nudges: u32,
    /// Nudges abandoned at the nudge timeout
    pub nudge_timeouts: u32,
    /// Slip pulses seen before each nudge
    pub slip_pulses: u32,
}

impl<'a, S, D, G, C> Winch<'a, S, D, G, C>
where
    S: SpeedOutput,
    D: DirectionOutput,
    G: EdgeGate,
    C: Clock,
{
    /// Hold position for `config.duration_ms`
    pub fn hold(&mut self, config: &HoldConfig) -> HoldReport {
        self.begin();
        self.brake_to_stop(config.brake_rate, config.settle_ms);
        self.reset_pulses();

        info!(
            "Hold: {} ms, deadband {} pulses, nudge {} pulses at {}%",
            config.duration_ms,
            config.deadband_pulses,
            config.nudge_pulses,
            config.nudge_speed
        );

        let mut report = HoldReport::default();
        let start_us = self.clock.now_us();
        let duration_us = u64::from(config.duration_ms) * 1_000;
        let gap_us = u64::from(config.min_nudge_gap_ms) * 1_000;
        let mut last_nudge_us = start_us;

        while self.clock.elapsed_us(start_us) < duration_us {
            self.tick();

            if self.pulses.count() > config.deadband_pulses
                && self.clock.elapsed_us(last_nudge_us) > gap_us
            {
                let slip = self.reset_pulses();
                report.slip_pulses = report.slip_pulses.saturating_add(slip);
                debug!("Slip of {} pulses, nudging", slip);

                if self.nudge(config) {
                    report.nudges += 1;
                } else {
                    report.nudge_timeouts += 1;
                }
                last_nudge_us = self.clock.now_us();
            }

            self.clock.idle();
        }

        if report.nudges > 0 || report.nudge_timeouts > 0 {
            info!(
                "Hold done: {} nudges, {} timed out, {} slip pulses",
                report.nudges,
                report.nudge_timeouts,
                report.slip_pulses
            );
        }
        report
    }

    /// Pull `nudge_pulses` in the tow-up direction, then stop
    ///
    /// Returns false if the quota was not reached within the nudge timeout.
    fn nudge(&mut self, config: &HoldConfig) -> bool {
        self.set_direction(config.tow_up);
        self.command_speed(config.nudge_speed, config.nudge_ramp_rate);

        let start_us = self.clock.now_us();
        let timeout_us = u64::from(config.nudge_timeout_ms) * 1_000;

        let reached = loop {
            self.tick();

            let pulses = self.pulses.count();
            if pulses >= config.nudge_pulses {
                break true;
            }
            if self.clock.elapsed_us(start_us) > timeout_us {
                warn!(
                    "Nudge timeout: {} of {} pulses",
                    pulses,
                    config.nudge_pulses
                );
                break false;
            }

            self.clock.idle();
        };

        self.brake_to_stop(config.brake_rate, config.settle_ms);
        self.reset_pulses();
        reached
    }
}
