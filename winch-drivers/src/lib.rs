//! Hardware driver implementations
//!
//! Implementations of the output traits defined in winch-core over
//! embedded-hal 1.0 peripherals:
//!
//! - PWM speed output ([`motor::PwmSpeed`])
//! - Direction line ([`motor::DirectionPin`])

#![no_std]
#![deny(unsafe_code)]

pub mod motor;
