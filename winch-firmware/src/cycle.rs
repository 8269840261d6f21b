//! Demo cycle
//!
//! After a start-up delay, repeat forever: pay out, hold, reel in, pause.
//! A failed move is logged and the cycle carries on; the next move starts
//! from rest either way.

use defmt::*;

use winch_core::config::WinchConfig;
use winch_core::motion::Winch;
use winch_core::traits::{Clock, DirectionOutput, EdgeGate, SpeedOutput};

/// Run the cycle forever
pub fn run<S, D, G, C>(winch: &mut Winch<'_, S, D, G, C>, config: &WinchConfig) -> !
where
    S: SpeedOutput,
    D: DirectionOutput,
    G: EdgeGate,
    C: Clock,
{
    let cycle = &config.cycle;
    let unwind = config.unwind.clone().with_cruise(cycle.unwind_speed);
    let wind = config.wind.clone().with_cruise(cycle.wind_speed);

    info!("Starting cycle in {} ms", cycle.startup_delay_ms);
    winch.dwell(cycle.startup_delay_ms);

    let mut count: u32 = 0;
    loop {
        count = count.wrapping_add(1);
        info!("Cycle {}", count);

        match winch.unwind(cycle.unwind_m, &unwind) {
            Ok(report) => info!(
                "Unwound {} m in {} ms",
                winch.scale().meters_for(report.pulses),
                report.elapsed_ms
            ),
            Err(e) => warn!("Unwind failed: {}", e),
        }

        let hold = winch.hold(&config.hold);
        debug!("Hold: {}", hold);

        match winch.wind(cycle.wind_m, &wind) {
            Ok(report) => info!(
                "Wound {} m in {} ms",
                winch.scale().meters_for(report.pulses),
                report.elapsed_ms
            ),
            Err(e) => warn!("Wind failed: {}", e),
        }

        winch.dwell(cycle.pause_ms);
    }
}
