//! Winch - FG-pulse DC winch firmware
//!
//! Drives a geared DC motor through a direction/PWM driver board and counts
//! the driver's frequency-generator pulses to pay out, reel in and hold a
//! payload. Runs the demo cycle from winch.toml forever.
//!
//! Two execution contexts:
//!
//! - The FG edge task runs on a high-priority interrupt executor and only
//!   increments the pulse counter.
//! - The control loop runs in thread mode and busy-polls: moves, holds and
//!   the slew limiter.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use {defmt_rtt as _, panic_probe as _};

use winch_core::motion::Winch;
use winch_drivers::motor::{DirectionPin, PwmSpeed};

use crate::clock::EmbassyClock;
use crate::fg::{FgGate, FG_PULSES};

mod clock;
mod config;
mod cycle;
mod fg;

/// PWM counter wrap for 20 kHz at 125 MHz
const PWM_TOP: u16 = 6_249;

/// Executor for the FG edge task
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Winch firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let (config, scale) = config::load();
    info!(
        "Configuration loaded: {} pulses/m, wind {}",
        scale.pulses_per_meter(),
        config.wind_direction
    );

    // Motor PWM on GPIO15 (slice 7, channel B), 0% at start
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = PWM_TOP;
    pwm_config.compare_b = 0;
    let pwm = Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, pwm_config);
    let (_, pwm_b) = pwm.split();
    let speed = PwmSpeed::new(unwrap!(pwm_b));

    // Direction on GPIO14, LOW = clockwise
    let direction = DirectionPin::low_is_clockwise(Output::new(p.PIN_14, Level::Low));

    info!("Motor outputs initialized");

    // FG input on GPIO16, counted by a task on the high-priority executor
    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner.spawn(fg::fg_edge_task(p.PIN_16)).unwrap();

    info!("FG counter running");

    let mut winch = Winch::new(
        speed,
        direction,
        FgGate::new(interrupt::SWI_IRQ_1),
        EmbassyClock::default(),
        &FG_PULSES,
        scale,
    )
    .with_wind_direction(config.wind_direction);

    // The control loop never yields; everything else runs on interrupts
    cycle::run(&mut winch, &config)
}
