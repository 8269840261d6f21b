//! Drive output traits
//!
//! A DC winch driver has two control lines: a PWM speed input and a
//! discrete direction input. The motion core writes the speed line only
//! through the slew limiter and the direction line only between moves.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Drum rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Clockwise rotation
    #[default]
    Clockwise,
    /// Counter-clockwise rotation
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Check if this is clockwise
    pub fn is_cw(self) -> bool {
        self == Direction::Clockwise
    }
}

/// PWM speed output
///
/// Implementations map a percentage to the hardware duty cycle. The
/// caller guarantees `percent` is already clamped to 0-100.
pub trait SpeedOutput {
    /// Apply a speed in percent (0.0 - 100.0)
    fn set_speed(&mut self, percent: f32);
}

/// Direction line output
pub trait DirectionOutput {
    /// Drive the direction line for the given rotation
    fn set_direction(&mut self, dir: Direction);
}

impl<T: SpeedOutput + ?Sized> SpeedOutput for &mut T {
    fn set_speed(&mut self, percent: f32) {
        (**self).set_speed(percent)
    }
}

impl<T: DirectionOutput + ?Sized> DirectionOutput for &mut T {
    fn set_direction(&mut self, dir: Direction) {
        (**self).set_direction(dir)
    }
}
