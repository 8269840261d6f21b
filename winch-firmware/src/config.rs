//! Build-time configuration
//!
//! build.rs validates winch.toml and serializes it with postcard; the bytes
//! are embedded here and decoded once at startup.

use defmt::*;

use winch_core::config::{ConfigError, DistanceScale, WinchConfig};

/// Validated winch.toml, postcard encoded
static CONFIG_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/winch_config.bin"));

/// Why the embedded configuration was not used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum LoadError {
    /// The bytes did not decode
    Decode,
    /// Decoded but out of range
    Invalid(ConfigError),
}

/// Decode and validate the embedded configuration
pub fn decode(bytes: &[u8]) -> Result<(WinchConfig, DistanceScale), LoadError> {
    let config: WinchConfig = postcard::from_bytes(bytes).map_err(|_| LoadError::Decode)?;
    config.validate().map_err(LoadError::Invalid)?;
    let scale = config.geometry.scale().map_err(LoadError::Invalid)?;
    Ok((config, scale))
}

/// Load the embedded configuration, or the defaults if it is unusable
pub fn load() -> (WinchConfig, DistanceScale) {
    match decode(CONFIG_BYTES) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!("Embedded configuration unusable ({}), using defaults", e);
            let config = WinchConfig::default();
            let scale = unwrap!(config.geometry.scale());
            (config, scale)
        }
    }
}
