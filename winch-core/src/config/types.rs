//! Configuration type definitions
//!
//! Every tuning knob of the move and hold operations, with the defaults the
//! winch was commissioned with. Speeds are percent of full PWM duty, ramp
//! rates are percent per second, times are milliseconds.

use heapless::Vec;

use crate::traits::Direction;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::WinchGeometry;

/// Maximum number of stall bands
pub const MAX_STALL_BANDS: usize = 8;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Gear ratio must be positive
    InvalidGearRatio,
    /// Pulses per motor revolution must be non-zero
    InvalidPulsesPerRev,
    /// Drum diameter must be positive
    InvalidDrumDiameter,
    /// A speed is outside 0-100%
    InvalidSpeed,
    /// A ramp rate is not positive
    InvalidRampRate,
    /// A timeout, window or duration is zero
    InvalidDuration,
    /// Nudge pulse quota is zero
    InvalidNudgePulses,
    /// Padding distance is negative
    InvalidPadding,
    /// Stall bands are not sorted by ascending speed
    UnsortedStallBands,
    /// Too many stall bands
    TooManyStallBands,
}

/// One step of the stall threshold table
///
/// At or above `min_speed_pct` commanded speed, at least `min_pulses` must
/// arrive per stall window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StallBand {
    /// Lowest commanded speed this band applies to (%)
    pub min_speed_pct: f32,
    /// Minimum pulses per window in this band
    pub min_pulses: u32,
}

impl StallBand {
    /// Create a band
    pub const fn new(min_speed_pct: f32, min_pulses: u32) -> Self {
        Self {
            min_speed_pct,
            min_pulses,
        }
    }
}

/// Speed-scaled stall thresholds
///
/// Below the first band there is no minimum: the motor is allowed to creep
/// or sit still at low commanded speed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StallBands(Vec<StallBand, MAX_STALL_BANDS>);

impl Default for StallBands {
    fn default() -> Self {
        // Tuned on the bench; the bands are informal cutoffs, not a formula
        Self::from_slice(&[
            StallBand::new(15.0, 1),
            StallBand::new(35.0, 2),
            StallBand::new(60.0, 3),
            StallBand::new(85.0, 4),
        ])
        .unwrap_or_else(|_| Self::none())
    }
}

impl StallBands {
    /// No bands: stall detection never fires
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// Build bands from a slice (must be sorted by ascending speed)
    pub fn from_slice(bands: &[StallBand]) -> Result<Self, ConfigError> {
        let bands = Vec::from_slice(bands).map_err(|_| ConfigError::TooManyStallBands)?;
        let bands = Self(bands);
        bands.validate()?;
        Ok(bands)
    }

    /// Check ordering and speed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut last = f32::NEG_INFINITY;
        for band in self.0.iter() {
            if !(0.0..=100.0).contains(&band.min_speed_pct) {
                return Err(ConfigError::InvalidSpeed);
            }
            if band.min_speed_pct < last {
                return Err(ConfigError::UnsortedStallBands);
            }
            last = band.min_speed_pct;
        }
        Ok(())
    }

    /// Minimum pulses per window at a commanded speed
    pub fn min_pulses_for(&self, speed_pct: f32) -> u32 {
        self.0
            .iter()
            .take_while(|band| speed_pct >= band.min_speed_pct)
            .last()
            .map(|band| band.min_pulses)
            .unwrap_or(0)
    }

    /// Iterate over the bands
    pub fn iter(&self) -> impl Iterator<Item = &StallBand> {
        self.0.iter()
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no bands
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tuning for one move-by-distance operation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MoveConfig {
    /// Speed between the padding zones (%)
    pub cruise_speed: f32,
    /// Abort the move after this long
    pub timeout_ms: u32,
    /// Length of the slow zone at each end of the move (m, 0 = none)
    pub padding_distance_m: f32,
    /// Speed inside the padding zones (%)
    pub padding_speed: f32,
    /// Interval over which pulse progress is checked
    pub stall_window_ms: u32,
    /// Minimum progress per window by commanded speed
    pub stall_bands: StallBands,
    /// Acceleration ramp (%/s)
    pub ramp_rate: f32,
    /// Braking ramp (%/s)
    pub brake_rate: f32,
    /// Dwell after the brake ramp reaches zero
    pub settle_ms: u32,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            cruise_speed: 50.0,
            timeout_ms: 60_000,
            padding_distance_m: 0.03,
            padding_speed: 25.0,
            stall_window_ms: 300,
            stall_bands: StallBands::default(),
            ramp_rate: 100.0, // 1% per 10ms
            brake_rate: 100.0,
            settle_ms: 300,
        }
    }
}

impl MoveConfig {
    /// Defaults for reeling the payload in
    pub fn wind() -> Self {
        Self {
            cruise_speed: 60.0,
            ..Default::default()
        }
    }

    /// Defaults for paying the payload out
    pub fn unwind() -> Self {
        Self {
            cruise_speed: 40.0,
            ..Default::default()
        }
    }

    /// Same tuning at a different cruise speed
    pub fn with_cruise(mut self, speed: f32) -> Self {
        self.cruise_speed = speed;
        self
    }

    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_speed(self.cruise_speed)?;
        check_speed(self.padding_speed)?;
        check_rate(self.ramp_rate)?;
        check_rate(self.brake_rate)?;
        if self.timeout_ms == 0 || self.stall_window_ms == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        if !(self.padding_distance_m >= 0.0) {
            return Err(ConfigError::InvalidPadding);
        }
        self.stall_bands.validate()
    }
}

/// Tuning for one hold-position session
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HoldConfig {
    /// How long to hold
    pub duration_ms: u32,
    /// Direction that raises the payload
    pub tow_up: Direction,
    /// Speed of a corrective nudge (%)
    pub nudge_speed: f32,
    /// Pulses tolerated while stopped before reacting
    pub deadband_pulses: u32,
    /// Pulses per corrective nudge
    pub nudge_pulses: u32,
    /// Minimum time between nudges
    pub min_nudge_gap_ms: u32,
    /// Give up on a nudge that has not reached its quota after this long
    pub nudge_timeout_ms: u32,
    /// Nudge acceleration ramp (%/s)
    pub nudge_ramp_rate: f32,
    /// Braking ramp (%/s)
    pub brake_rate: f32,
    /// Dwell after each brake
    pub settle_ms: u32,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2_000,
            tow_up: Direction::Clockwise,
            nudge_speed: 50.0,
            deadband_pulses: 1,
            nudge_pulses: 80,
            min_nudge_gap_ms: 250,
            nudge_timeout_ms: 2_000,
            nudge_ramp_rate: 1_250.0, // 10% per 8ms
            brake_rate: 100.0,
            settle_ms: 200,
        }
    }
}

impl HoldConfig {
    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_speed(self.nudge_speed)?;
        check_rate(self.nudge_ramp_rate)?;
        check_rate(self.brake_rate)?;
        if self.nudge_pulses == 0 {
            return Err(ConfigError::InvalidNudgePulses);
        }
        if self.nudge_timeout_ms == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        Ok(())
    }
}

/// Operational cycle run by the firmware: unwind, hold, wind, pause
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CycleConfig {
    /// Delay before the first cycle
    pub startup_delay_ms: u32,
    /// Distance to pay out (m)
    pub unwind_m: f32,
    /// Cruise speed when paying out (%)
    pub unwind_speed: f32,
    /// Distance to reel in (m)
    pub wind_m: f32,
    /// Cruise speed when reeling in (%)
    pub wind_speed: f32,
    /// Pause between cycles
    pub pause_ms: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 5_000,
            unwind_m: 0.3,
            unwind_speed: 100.0,
            wind_m: 0.3,
            wind_speed: 100.0,
            pause_ms: 5_000,
        }
    }
}

impl CycleConfig {
    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_speed(self.unwind_speed)?;
        check_speed(self.wind_speed)
    }
}

/// Complete winch configuration
///
/// Deserializes through [`WinchConfigFile`], so a partial `wind` or
/// `unwind` section keeps that direction's defaults for the keys it omits.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "WinchConfigFile", into = "WinchConfigFile")
)]
pub struct WinchConfig {
    /// Drum rotation that reels the payload in
    pub wind_direction: Direction,
    /// Mechanical constants
    pub geometry: WinchGeometry,
    /// Reel-in tuning
    pub wind: MoveConfig,
    /// Pay-out tuning
    pub unwind: MoveConfig,
    /// Hold tuning
    pub hold: HoldConfig,
    /// Firmware cycle
    pub cycle: CycleConfig,
}

impl Default for WinchConfig {
    fn default() -> Self {
        Self {
            wind_direction: Direction::Clockwise,
            geometry: WinchGeometry::default(),
            wind: MoveConfig::wind(),
            unwind: MoveConfig::unwind(),
            hold: HoldConfig::default(),
            cycle: CycleConfig::default(),
        }
    }
}

impl WinchConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        self.wind.validate()?;
        self.unwind.validate()?;
        self.hold.validate()?;
        self.cycle.validate()
    }
}

/// Move tuning as written in a machine file: every key optional
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct MoveOverrides {
    cruise_speed: Option<f32>,
    timeout_ms: Option<u32>,
    padding_distance_m: Option<f32>,
    padding_speed: Option<f32>,
    stall_window_ms: Option<u32>,
    stall_bands: Option<StallBands>,
    ramp_rate: Option<f32>,
    brake_rate: Option<f32>,
    settle_ms: Option<u32>,
}

#[cfg(feature = "serde")]
impl MoveOverrides {
    /// Fill the keys that are present into `base`
    fn apply(self, base: MoveConfig) -> MoveConfig {
        MoveConfig {
            cruise_speed: self.cruise_speed.unwrap_or(base.cruise_speed),
            timeout_ms: self.timeout_ms.unwrap_or(base.timeout_ms),
            padding_distance_m: self.padding_distance_m.unwrap_or(base.padding_distance_m),
            padding_speed: self.padding_speed.unwrap_or(base.padding_speed),
            stall_window_ms: self.stall_window_ms.unwrap_or(base.stall_window_ms),
            stall_bands: self.stall_bands.unwrap_or(base.stall_bands),
            ramp_rate: self.ramp_rate.unwrap_or(base.ramp_rate),
            brake_rate: self.brake_rate.unwrap_or(base.brake_rate),
            settle_ms: self.settle_ms.unwrap_or(base.settle_ms),
        }
    }
}

#[cfg(feature = "serde")]
impl From<MoveConfig> for MoveOverrides {
    fn from(config: MoveConfig) -> Self {
        Self {
            cruise_speed: Some(config.cruise_speed),
            timeout_ms: Some(config.timeout_ms),
            padding_distance_m: Some(config.padding_distance_m),
            padding_speed: Some(config.padding_speed),
            stall_window_ms: Some(config.stall_window_ms),
            stall_bands: Some(config.stall_bands),
            ramp_rate: Some(config.ramp_rate),
            brake_rate: Some(config.brake_rate),
            settle_ms: Some(config.settle_ms),
        }
    }
}

/// Serialized form of [`WinchConfig`]
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct WinchConfigFile {
    wind_direction: Direction,
    geometry: WinchGeometry,
    wind: MoveOverrides,
    unwind: MoveOverrides,
    hold: HoldConfig,
    cycle: CycleConfig,
}

#[cfg(feature = "serde")]
impl From<WinchConfigFile> for WinchConfig {
    fn from(file: WinchConfigFile) -> Self {
        Self {
            wind_direction: file.wind_direction,
            geometry: file.geometry,
            wind: file.wind.apply(MoveConfig::wind()),
            unwind: file.unwind.apply(MoveConfig::unwind()),
            hold: file.hold,
            cycle: file.cycle,
        }
    }
}

#[cfg(feature = "serde")]
impl From<WinchConfig> for WinchConfigFile {
    fn from(config: WinchConfig) -> Self {
        Self {
            wind_direction: config.wind_direction,
            geometry: config.geometry,
            wind: config.wind.into(),
            unwind: config.unwind.into(),
            hold: config.hold,
            cycle: config.cycle,
        }
    }
}

fn check_speed(speed: f32) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&speed) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpeed)
    }
}

fn check_rate(rate: f32) -> Result<(), ConfigError> {
    if rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRampRate)
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config: WinchConfig = toml::from_str("").unwrap();
        assert_eq!(config, WinchConfig::default());
    }

    #[test]
    fn test_partial_move_sections_keep_direction_defaults() {
        let config: WinchConfig =
            toml::from_str("[unwind]\ntimeout_ms = 30000\n[wind]\nsettle_ms = 100\n").unwrap();

        assert_eq!(config.unwind.cruise_speed, 40.0);
        assert_eq!(config.unwind.timeout_ms, 30_000);
        assert_eq!(config.wind.cruise_speed, 60.0);
        assert_eq!(config.wind.settle_ms, 100);
        assert_eq!(config.wind.timeout_ms, 60_000);
    }

    #[test]
    fn test_stall_bands_from_file() {
        let config: WinchConfig = toml::from_str(
            "[[wind.stall_bands]]\nmin_speed_pct = 20.0\nmin_pulses = 2\n",
        )
        .unwrap();

        assert_eq!(config.wind.stall_bands.len(), 1);
        assert_eq!(config.wind.stall_bands.min_pulses_for(20.0), 2);
        assert_eq!(config.unwind.stall_bands, StallBands::default());
    }

    #[test]
    fn test_embedded_encoding_keeps_every_value() {
        let config = WinchConfig {
            wind_direction: Direction::CounterClockwise,
            wind: MoveConfig::wind().with_cruise(75.0),
            unwind: MoveConfig {
                stall_bands: StallBands::none(),
                ..MoveConfig::unwind()
            },
            ..Default::default()
        };

        let mut buf = [0u8; 512];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();
        let decoded: WinchConfig = postcard::from_bytes(bytes).unwrap();
        assert_eq!(decoded, config);
    }
}
