//! FG pulse input
//!
//! The driver's FG output is open-collector, so the pin is pulled up and
//! each rising edge is one pulse. Counting happens in an async task on the
//! high-priority interrupt executor. Masking that executor's interrupt
//! defers edges to after the unmask instead of dropping them.

use defmt::*;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::interrupt::InterruptExt;
use embassy_rp::peripherals::PIN_16;
use embassy_rp::Peri;

use winch_core::pulse::PulseCounter;
use winch_core::traits::EdgeGate;

/// FG pulses since the last reset
pub static FG_PULSES: PulseCounter = PulseCounter::new();

/// Count rising edges on the FG pin
#[embassy_executor::task]
pub async fn fg_edge_task(pin: Peri<'static, PIN_16>) {
    let mut fg = Input::new(pin, Pull::Up);
    info!("FG edge task started");

    loop {
        fg.wait_for_rising_edge().await;
        FG_PULSES.increment();
    }
}

/// Masks the FG executor's interrupt around counter resets
pub struct FgGate<I> {
    irq: I,
}

impl<I: InterruptExt> FgGate<I> {
    /// Gate for the executor running [`fg_edge_task`]
    pub fn new(irq: I) -> Self {
        Self { irq }
    }
}

impl<I: InterruptExt> EdgeGate for FgGate<I> {
    fn suspend(&mut self) {
        self.irq.disable();
    }

    fn resume(&mut self) {
        // SAFETY: the handler only polls the edge executor, which holds no
        // state shared with a masked critical section.
        unsafe { self.irq.enable() };
    }
}
