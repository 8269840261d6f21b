//! Embassy time source for the control loop

use embassy_time::{block_for, Duration, Instant};

use winch_core::traits::Clock;

/// Idle time per control loop iteration
const IDLE_US: u64 = 50;

/// Clock over the embassy time driver
///
/// `idle` spins for a short fixed time, which paces the control loop at
/// roughly 20 kHz.
#[derive(Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn idle(&mut self) {
        block_for(Duration::from_micros(IDLE_US));
    }
}
