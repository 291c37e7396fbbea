//! # Configuration Management
//!
//! Loads and validates the `prayer-config.toml` file, mapping the external
//! key-value representation (decimal strings, enum keys) into the typed
//! settings the calculation core consumes. This is the thin adapter between
//! whatever stores the configuration and the pure calculation modules; the
//! core itself never touches storage.
//!
//! ## Validation Policy
//!
//! A missing file yields the documented defaults. A file that is present
//! but malformed is a hard error naming the offending key and value: the
//! core must never guess about out-of-range or unparseable input, and a
//! silently substituted default could move an alarm by hours.

use crate::method::{CalculationMethod, PolarFallback, RoundingPolicy};
use crate::renderer::{DisplaySettings, TimeFormat};
use crate::schedule::CalculationSettings;
use crate::{GeoObservation, ObservationError};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Default configuration file location, resolved against the working
/// directory like the rest of the state files.
pub const DEFAULT_CONFIG_PATH: &str = "prayer-config.toml";

/// Errors surfaced while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed for a reason other than absence.
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid TOML for the expected shape.
    #[error("config parse: {0}")]
    Toml(#[from] toml::de::Error),

    /// Writing the config back out failed to serialize.
    #[error("config serialize: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A numeric field did not parse as a number.
    #[error("invalid number for {key}: {value:?}")]
    InvalidNumber {
        /// Dotted key of the offending field.
        key: &'static str,
        /// The raw value as found in the file.
        value: String,
    },

    /// A numeric field parsed but is out of range for an observation.
    #[error(transparent)]
    Observation(#[from] ObservationError),

    /// Unrecognized calculation-method key.
    #[error("unknown calculation method {0:?}")]
    UnknownMethod(String),

    /// Unrecognized rounding-policy key.
    #[error("unknown rounding policy {0:?} (expected \"none\", \"nearest\" or \"ceiling\")")]
    UnknownRounding(String),

    /// Unrecognized polar-fallback key.
    #[error("unknown polar fallback {0:?} (expected \"night-middle\" or \"seventh-of-night\")")]
    UnknownPolarFallback(String),

    /// Unrecognized time-format key.
    #[error("unknown time format {0:?} (expected \"12h\" or \"24h\")")]
    UnknownTimeFormat(String),

    /// Display UTC offset outside what a fixed offset can represent.
    #[error("display UTC offset {0} minutes is out of range")]
    UtcOffsetRange(i32),
}

/// Observer location and atmosphere, as stored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationSection {
    /// Latitude in decimal degrees, as a string (e.g. "43.67").
    pub latitude: String,
    /// Longitude in decimal degrees, as a string (e.g. "-79.417").
    pub longitude: String,
    /// Altitude in meters, as a string.
    pub altitude: String,
    /// Atmospheric pressure in hPa, as a string.
    pub pressure: String,
    /// Air temperature in °C, as a string.
    pub temperature: String,
}

/// Calculation choices, as stored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalculationSection {
    /// Calculation-method key; see [`CalculationMethod::from_key`].
    pub method: String,
    /// Rounding-policy key; see [`RoundingPolicy::from_key`].
    pub rounding: String,
    /// Uniform schedule offset in whole minutes, as a signed-integer string.
    pub offset_minutes: String,
    /// Optional high-latitude fallback key; absent means twilight failures
    /// surface as errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar_fallback: Option<String>,
}

/// Display-only preferences, as stored. Not consumed by the core.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplaySection {
    /// "12h" or "24h".
    pub time_format: String,
    /// Minutes east of UTC for rendering local clock times.
    pub utc_offset_minutes: String,
}

/// The raw configuration file, stringly-typed exactly as stored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Observer location and atmosphere.
    pub location: LocationSection,
    /// Calculation choices.
    pub calculation: CalculationSection,
    /// Display-only preferences.
    pub display: DisplaySection,
}

/// Fully validated settings: the calculation bundle plus display prefs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Inputs for the calculation core.
    pub calculation: CalculationSettings,
    /// Rendering preferences for the schedule/alarm output.
    pub display: DisplaySettings,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            location: LocationSection {
                latitude: "43.67".to_string(),
                longitude: "-79.417".to_string(),
                altitude: "0".to_string(),
                pressure: "1010".to_string(),
                temperature: "10".to_string(),
            },
            calculation: CalculationSection {
                method: "muslim-world-league".to_string(),
                rounding: "nearest".to_string(),
                offset_minutes: "0".to_string(),
                polar_fallback: None,
            },
            display: DisplaySection {
                time_format: "24h".to_string(),
                utc_offset_minutes: "0".to_string(),
            },
        }
    }
}

impl RawConfig {
    /// Load configuration from the default path.
    ///
    /// # Errors
    /// See [`RawConfig::load_from_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from the given path.
    ///
    /// A missing file yields [`RawConfig::default`]; any other read failure
    /// or a TOML parse failure is an error.
    ///
    /// # Errors
    /// [`ConfigError::Io`] / [`ConfigError::Toml`].
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    /// Save this configuration to the default path (handy for writing the
    /// initial template).
    ///
    /// # Errors
    /// [`ConfigError::Io`] or [`ConfigError::TomlSer`] on failure.
    pub fn save(&self) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(DEFAULT_CONFIG_PATH, contents)?;
        Ok(())
    }

    /// Validate every field and produce the typed [`Settings`].
    ///
    /// # Errors
    /// The first [`ConfigError`] encountered, naming key and value.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let latitude = parse_decimal("location.latitude", &self.location.latitude)?;
        let longitude = parse_decimal("location.longitude", &self.location.longitude)?;
        let altitude = parse_decimal("location.altitude", &self.location.altitude)?;
        let pressure = parse_decimal("location.pressure", &self.location.pressure)?;
        let temperature = parse_decimal("location.temperature", &self.location.temperature)?;
        let observation = GeoObservation::new(latitude, longitude, altitude, pressure, temperature)?;

        let method = CalculationMethod::from_key(&self.calculation.method)
            .ok_or_else(|| ConfigError::UnknownMethod(self.calculation.method.clone()))?;
        let rounding = RoundingPolicy::from_key(&self.calculation.rounding)
            .ok_or_else(|| ConfigError::UnknownRounding(self.calculation.rounding.clone()))?;
        let offset_minutes =
            parse_integer("calculation.offset_minutes", &self.calculation.offset_minutes)?;
        let polar_fallback = match &self.calculation.polar_fallback {
            Some(key) => Some(
                PolarFallback::from_key(key)
                    .ok_or_else(|| ConfigError::UnknownPolarFallback(key.clone()))?,
            ),
            None => None,
        };

        let time_format = TimeFormat::from_key(&self.display.time_format)
            .ok_or_else(|| ConfigError::UnknownTimeFormat(self.display.time_format.clone()))?;
        let utc_minutes =
            parse_integer("display.utc_offset_minutes", &self.display.utc_offset_minutes)?;
        let utc_offset = FixedOffset::east_opt(utc_minutes * 60)
            .ok_or(ConfigError::UtcOffsetRange(utc_minutes))?;

        Ok(Settings {
            calculation: CalculationSettings {
                observation,
                method,
                rounding,
                offset_minutes,
                polar_fallback,
            },
            display: DisplaySettings {
                time_format,
                utc_offset,
            },
        })
    }
}

fn parse_decimal(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

fn parse_integer(key: &'static str, value: &str) -> Result<i32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}
