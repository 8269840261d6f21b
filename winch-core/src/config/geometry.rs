//! Drum geometry and distance conversion
//!
//! The FG output gives a fixed number of pulses per motor revolution. The
//! gearbox multiplies that per drum revolution, and one drum revolution
//! pays out one circumference of line:
//!
//! ```text
//! pulses/m = gear_ratio * pulses_per_motor_rev / (PI * drum_diameter)
//! ```
//!
//! With the stock 14:1 gearbox, 6 FG pulses per motor revolution and a
//! 50 mm drum that is 84 pulses per 0.157 m, about 534.8 pulses/m.

use core::f32::consts::PI;

use super::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mechanical constants of the winch
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WinchGeometry {
    /// Gearbox reduction (motor revolutions per drum revolution)
    pub gear_ratio: f32,
    /// FG pulses per motor revolution (datasheet value)
    pub pulses_per_motor_rev: u32,
    /// Drum diameter in meters
    pub drum_diameter_m: f32,
}

impl Default for WinchGeometry {
    fn default() -> Self {
        Self {
            gear_ratio: 14.0,        // 24V 570RPM gearmotor
            pulses_per_motor_rev: 6, // FG = 6 pulses / motor rev
            drum_diameter_m: 0.050,  // 50mm drum
        }
    }
}

impl WinchGeometry {
    /// Check that every constant is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gear_ratio > 0.0) {
            return Err(ConfigError::InvalidGearRatio);
        }
        if self.pulses_per_motor_rev == 0 {
            return Err(ConfigError::InvalidPulsesPerRev);
        }
        if !(self.drum_diameter_m > 0.0) {
            return Err(ConfigError::InvalidDrumDiameter);
        }
        Ok(())
    }

    /// Drum circumference in meters (line paid out per drum revolution)
    pub fn drum_circumference_m(&self) -> f32 {
        PI * self.drum_diameter_m
    }

    /// FG pulses per drum revolution
    pub fn pulses_per_drum_rev(&self) -> f32 {
        self.gear_ratio * self.pulses_per_motor_rev as f32
    }

    /// Build the distance scale, computed once at startup
    pub fn scale(&self) -> Result<DistanceScale, ConfigError> {
        self.validate()?;
        Ok(DistanceScale {
            pulses_per_meter: self.pulses_per_drum_rev() / self.drum_circumference_m(),
        })
    }
}

/// Precomputed meters <-> pulses conversion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceScale {
    pulses_per_meter: f32,
}

impl DistanceScale {
    /// Create a scale from a known pulses-per-meter value
    pub fn from_pulses_per_meter(pulses_per_meter: f32) -> Result<Self, ConfigError> {
        if !(pulses_per_meter > 0.0) {
            return Err(ConfigError::InvalidDrumDiameter);
        }
        Ok(Self { pulses_per_meter })
    }

    /// Pulses per meter of line
    pub fn pulses_per_meter(&self) -> f32 {
        self.pulses_per_meter
    }

    /// Pulse count for a distance, rounded to nearest
    ///
    /// Non-positive and NaN distances map to zero pulses.
    pub fn pulses_for(&self, meters: f32) -> u32 {
        if !(meters > 0.0) {
            return 0;
        }
        (meters * self.pulses_per_meter + 0.5) as u32
    }

    /// Distance covered by a pulse count
    pub fn meters_for(&self, pulses: u32) -> f32 {
        pulses as f32 / self.pulses_per_meter
    }
}
