//! DC motor outputs for a direction/PWM style driver board
//!
//! The board takes a PWM input for speed and a single logic line for
//! rotation. Both are thin adapters: ramping lives in the core's slew
//! limiter, not here.

pub mod direction;
pub mod pwm;

pub use direction::{DirectionLevel, DirectionPin};
pub use pwm::PwmSpeed;
