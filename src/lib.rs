//! # Adhan Tracker Core Library
//!
//! This library computes the daily Islamic prayer schedule (Fajr, Sunrise,
//! Dhuhr, Asr, Maghrib, Isha) for an observer location and date, and plans
//! the single next alarm to arm with an external wake-up mechanism.
//!
//! ## Design Philosophy
//!
//! ### Pure Calculation Core
//! Everything in this library is a pure, synchronous function over its
//! inputs: the same (location, date, configuration, clock reading) always
//! produces the same schedule and the same next alarm. No module here
//! performs I/O, retries, or logging; those concerns belong to the caller
//! (see the `adhan-tracker` binary for the reference wiring).
//!
//! ### Data Flow
//! 1. **Astronomy**: [`astro::SolarDay`] converts location + date into solar
//!    noon, sunrise, sunset and arbitrary twilight crossings, corrected for
//!    atmospheric refraction via pressure/temperature.
//! 2. **Schedule**: [`schedule::compute_schedule`] applies a named
//!    [`method::CalculationMethod`], a [`method::RoundingPolicy`] and a
//!    fixed minute offset, producing an ordered [`PrayerSchedule`].
//! 3. **Selection**: [`schedule::next_event`] picks the first instant after
//!    "now"; exhaustion (all of today's times passed) is reported to the
//!    caller, never silently patched.
//! 4. **Planning**: [`planner::plan_next`] composes the above with the
//!    one-day rollover rule and yields a [`planner::NextAlarm`] ready to be
//!    handed to whatever arms the actual timer.
//!
//! ## Core Types
//!
//! The library root exports the data model shared by every module:
//! - [`PrayerName`]: the six solar-relative event names, in canonical order
//! - [`GeoObservation`]: a validated observer location with atmosphere
//! - [`PrayerSchedule`]: one calendar date's ordered schedule

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Module declarations
pub mod astro;
pub mod config;
pub mod method;
pub mod planner;
pub mod renderer;
pub mod schedule;

/// The six daily solar-relative events, in the fixed canonical order.
///
/// The order of the variants is the order the events occur within one
/// calendar day; [`PrayerName::ALL`] and [`PrayerName::index`] expose it for
/// iteration and for the compact index used in alarm payloads.
///
/// # Example
/// ```
/// use adhan_clock_lib::PrayerName;
///
/// assert_eq!(PrayerName::ALL[0], PrayerName::Fajr);
/// assert_eq!(PrayerName::Maghrib.index(), 4);
/// assert_eq!(PrayerName::Isha.to_string(), "Isha");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerName {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    /// All six events in schedule order.
    pub const ALL: [PrayerName; 6] = [
        PrayerName::Fajr,
        PrayerName::Sunrise,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    /// Position of this event within the daily schedule (0 = Fajr).
    pub const fn index(self) -> usize {
        match self {
            PrayerName::Fajr => 0,
            PrayerName::Sunrise => 1,
            PrayerName::Dhuhr => 2,
            PrayerName::Asr => 3,
            PrayerName::Maghrib => 4,
            PrayerName::Isha => 5,
        }
    }

    /// Human-readable event name.
    pub const fn label(self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Sunrise => "Sunrise",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }
}

impl fmt::Display for PrayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors produced when constructing a [`GeoObservation`] from raw values.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ObservationError {
    /// Latitude outside −90°..+90°.
    #[error("invalid latitude {0}° (must be between -90° and +90°)")]
    Latitude(f64),
    /// Longitude outside −180°..+180°.
    #[error("invalid longitude {0}° (must be between -180° and +180°)")]
    Longitude(f64),
    /// Altitude below the lowest land surface.
    #[error("invalid altitude {0} m (must be finite and at least -500 m)")]
    Altitude(f64),
    /// Out-of-range atmospheric pressure.
    #[error("invalid pressure {0} hPa (must be between 0 and 2000 hPa)")]
    Pressure(f64),
    /// Temperature below absolute zero or absurdly high.
    #[error("invalid temperature {0}°C (must be between -273.15°C and 100°C)")]
    Temperature(f64),
}

/// A validated observer location with atmospheric conditions.
///
/// Immutable per calculation: every schedule computation receives a complete
/// observation, so a location update from the outside world is a *new*
/// observation, never a partial merge. Construction is the only validation
/// point: once a `GeoObservation` exists its values are known to be in
/// range, and the astronomy code never re-checks them.
///
/// # Example
/// ```
/// use adhan_clock_lib::GeoObservation;
///
/// // Mecca, with typical spring conditions
/// let obs = GeoObservation::new(21.4225, 39.8262, 304.0, 1010.0, 25.0).unwrap();
/// assert_eq!(obs.latitude(), 21.4225);
///
/// // Out-of-range latitude is rejected at the boundary
/// assert!(GeoObservation::new(95.0, 0.0, 0.0, 1010.0, 10.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoObservation {
    latitude: f64,
    longitude: f64,
    altitude: f64,
    pressure: f64,
    temperature: f64,
}

impl GeoObservation {
    /// Build an observation, validating every field.
    ///
    /// # Errors
    /// Returns the first [`ObservationError`] for an out-of-range field.
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: f64,
        pressure: f64,
        temperature: f64,
    ) -> Result<Self, ObservationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ObservationError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ObservationError::Longitude(longitude));
        }
        if !altitude.is_finite() || altitude < -500.0 {
            return Err(ObservationError::Altitude(altitude));
        }
        if !pressure.is_finite() || pressure <= 0.0 || pressure > 2000.0 {
            return Err(ObservationError::Pressure(pressure));
        }
        if !(-273.15..=100.0).contains(&temperature) {
            return Err(ObservationError::Temperature(temperature));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
            pressure,
            temperature,
        })
    }

    /// Observer latitude in degrees (−90..+90).
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Observer longitude in degrees (−180..+180).
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Observer altitude above sea level in meters.
    pub const fn altitude(&self) -> f64 {
        self.altitude
    }

    /// Atmospheric pressure in hPa.
    pub const fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Air temperature in °C.
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// One calendar date's ordered prayer schedule.
///
/// Holds exactly six timezone-aware instants, one per [`PrayerName`], in
/// canonical order. Produced fresh per date by
/// [`schedule::compute_schedule`]; never mutated, only recomputed.
///
/// For any valid non-polar location/date the instants are strictly
/// increasing in schedule order; [`PrayerSchedule::is_strictly_ordered`]
/// exists so tests can assert that invariant rather than the code silently
/// repairing a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerSchedule {
    /// The calendar date the schedule was computed for.
    pub date: NaiveDate,
    times: [DateTime<Utc>; 6],
}

impl PrayerSchedule {
    /// Assemble a schedule from the six instants in canonical order.
    pub const fn new(date: NaiveDate, times: [DateTime<Utc>; 6]) -> Self {
        Self { date, times }
    }

    /// The instant of a named event.
    pub fn time(&self, name: PrayerName) -> DateTime<Utc> {
        self.times[name.index()]
    }

    /// Iterate `(name, instant)` pairs in schedule order.
    pub fn iter(&self) -> impl Iterator<Item = (PrayerName, DateTime<Utc>)> + '_ {
        PrayerName::ALL.iter().map(|&name| (name, self.time(name)))
    }

    /// Whether the six instants are strictly increasing in schedule order.
    pub fn is_strictly_ordered(&self) -> bool {
        self.times.windows(2).all(|w| w[0] < w[1])
    }
}
