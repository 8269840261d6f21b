//! Simulated winch rig for integration tests
//!
//! A motor plant turns the applied speed into FG pulses, the clock only
//! moves when the control loop idles, and scripted slip pulses can be
//! injected at fixed times.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use winch_core::config::{DistanceScale, WinchGeometry};
use winch_core::motion::Winch;
use winch_core::pulse::PulseCounter;
use winch_core::traits::{Clock, Direction, DirectionOutput, EdgeGate, SpeedOutput};

/// FG pulses per second at 100% speed (about 570 rpm at the drum)
pub const FULL_SPEED_PPS: f32 = 800.0;

/// Simulated time per control loop iteration
pub const STEP_US: u64 = 500;

pub const MS: u64 = 1_000;

pub struct Plant<'a> {
    counter: &'a PulseCounter,
    pub now_us: u64,
    pub speed: f32,
    pub direction: Direction,
    fraction: f32,
    /// Stop producing motion pulses after this many (jammed drum)
    pub motion_limit: Option<u32>,
    pub motion_pulses: u32,
    pub cw_pulses: u32,
    pub ccw_pulses: u32,
    /// (time, count) slip pulses still to inject
    pub injections: Vec<(u64, u32)>,
    pub suspended: bool,
    pub gate_cycles: u32,
    pub speed_writes: u32,
    pub largest_drop: f32,
    pub largest_rise: f32,
    pub peak_speed: f32,
    pub direction_changes_while_moving: u32,
}

impl<'a> Plant<'a> {
    pub fn new(counter: &'a PulseCounter) -> Self {
        Self {
            counter,
            now_us: 0,
            speed: 0.0,
            direction: Direction::Clockwise,
            fraction: 0.0,
            motion_limit: None,
            motion_pulses: 0,
            cw_pulses: 0,
            ccw_pulses: 0,
            injections: Vec::new(),
            suspended: false,
            gate_cycles: 0,
            speed_writes: 0,
            largest_drop: 0.0,
            largest_rise: 0.0,
            peak_speed: 0.0,
            direction_changes_while_moving: 0,
        }
    }

    fn edge(&mut self) {
        assert!(!self.suspended, "edge delivered while suspended");
        self.counter.increment();
    }

    fn advance(&mut self, step_us: u64) {
        self.now_us += step_us;

        let now = self.now_us;
        let mut due = 0;
        self.injections.retain(|&(at, count)| {
            if at <= now {
                due += count;
                false
            } else {
                true
            }
        });
        for _ in 0..due {
            self.edge();
        }

        self.fraction += self.speed / 100.0 * FULL_SPEED_PPS * (step_us as f32 / 1e6);
        while self.fraction >= 1.0 {
            self.fraction -= 1.0;
            if self.motion_limit.is_some_and(|limit| self.motion_pulses >= limit) {
                continue;
            }
            self.motion_pulses += 1;
            match self.direction {
                Direction::Clockwise => self.cw_pulses += 1,
                Direction::CounterClockwise => self.ccw_pulses += 1,
            }
            self.edge();
        }
    }
}

pub type SharedPlant<'a> = Rc<RefCell<Plant<'a>>>;

pub struct SimSpeed<'a>(pub SharedPlant<'a>);

impl SpeedOutput for SimSpeed<'_> {
    fn set_speed(&mut self, percent: f32) {
        let mut plant = self.0.borrow_mut();
        let change = percent - plant.speed;
        if -change > plant.largest_drop {
            plant.largest_drop = -change;
        }
        if change > plant.largest_rise {
            plant.largest_rise = change;
        }
        if percent > plant.peak_speed {
            plant.peak_speed = percent;
        }
        plant.speed = percent;
        plant.speed_writes += 1;
    }
}

pub struct SimDirection<'a>(pub SharedPlant<'a>);

impl DirectionOutput for SimDirection<'_> {
    fn set_direction(&mut self, dir: Direction) {
        let mut plant = self.0.borrow_mut();
        if dir != plant.direction && plant.speed > 0.01 {
            plant.direction_changes_while_moving += 1;
        }
        plant.direction = dir;
    }
}

pub struct SimGate<'a>(pub SharedPlant<'a>);

impl EdgeGate for SimGate<'_> {
    fn suspend(&mut self) {
        let mut plant = self.0.borrow_mut();
        assert!(!plant.suspended, "nested suspend");
        plant.suspended = true;
    }

    fn resume(&mut self) {
        let mut plant = self.0.borrow_mut();
        assert!(plant.suspended, "resume without suspend");
        plant.suspended = false;
        plant.gate_cycles += 1;
    }
}

pub struct SimClock<'a>(pub SharedPlant<'a>);

impl Clock for SimClock<'_> {
    fn now_us(&self) -> u64 {
        self.0.borrow().now_us
    }

    fn idle(&mut self) {
        self.0.borrow_mut().advance(STEP_US);
    }
}

pub type SimWinch<'a> = Winch<'a, SimSpeed<'a>, SimDirection<'a>, SimGate<'a>, SimClock<'a>>;

pub fn stock_scale() -> DistanceScale {
    WinchGeometry::default().scale().unwrap()
}

/// Build a winch wired to a fresh plant
pub fn rig(counter: &PulseCounter) -> (SimWinch<'_>, SharedPlant<'_>) {
    let plant = Rc::new(RefCell::new(Plant::new(counter)));
    let winch = Winch::new(
        SimSpeed(plant.clone()),
        SimDirection(plant.clone()),
        SimGate(plant.clone()),
        SimClock(plant.clone()),
        counter,
        stock_scale(),
    );
    (winch, plant)
}

/// Largest speed change one loop step may make at `rate` %/s
pub fn max_step(rate: f32) -> f32 {
    rate * (STEP_US as f32 / 1e6) + 1e-3
}
