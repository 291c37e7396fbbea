//! Daily schedule computation and next-event selection
//!
//! [`compute_schedule`] turns one (observation, date, method, rounding,
//! offset) tuple into the ordered six-event schedule; [`next_event`] scans a
//! schedule for the first instant after "now". Both are pure functions: the
//! day-rollover rule (recompute for tomorrow when today is exhausted) lives
//! one level up in [`crate::planner`], because the selector has no calendar
//! knowledge of its own.

use crate::astro::{Crossing, NoSolarEvent, SolarDay};
use crate::method::{CalculationMethod, IshaRule, PolarFallback, RoundingPolicy};
use crate::{GeoObservation, PrayerName, PrayerSchedule};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Seconds after transit before Dhuhr, letting the sun pass the zenith.
const ZENITH_CLEARANCE_SECS: i64 = 65;

/// Safety margin on the horizon events: sunrise reported early, Maghrib
/// late, the conservative direction for fasting use.
const RISE_SET_SAFETY_SECS: i64 = 30;

/// Everything a schedule computation needs besides the date.
///
/// Bundles the validated observation with the user's calculation choices so
/// the planner and the binary can pass one value around. Plain data; the
/// caller rebuilds it wholesale when configuration or location changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationSettings {
    /// Observer location and atmosphere.
    pub observation: GeoObservation,
    /// Selected scholarly convention.
    pub method: CalculationMethod,
    /// Minute-snapping policy.
    pub rounding: RoundingPolicy,
    /// Uniform user adjustment in whole minutes.
    pub offset_minutes: i32,
    /// Optional high-latitude twilight substitution.
    pub polar_fallback: Option<PolarFallback>,
}

impl CalculationSettings {
    /// Compute the schedule for one date with these settings.
    ///
    /// # Errors
    /// See [`compute_schedule`].
    pub fn compute_for(&self, date: NaiveDate) -> Result<PrayerSchedule, NoSolarEvent> {
        compute_schedule(
            self.observation,
            date,
            self.method,
            self.rounding,
            self.offset_minutes,
            self.polar_fallback,
        )
    }
}

/// Compute the six prayer instants for one calendar date.
///
/// Event composition, in order:
/// - Dhuhr: transit plus a fixed zenith clearance
/// - Asr: dusk-side crossing of the shadow-ratio altitude
/// - Fajr / Isha: twilight crossings at the method's depression angles
///   (or Maghrib plus a fixed interval for interval-based Isha)
/// - Sunrise / Maghrib: horizon events with the safety margin, Maghrib
///   delayed further only if the method says so
///
/// The rounding policy is applied uniformly, then the whole-minute offset;
/// the two commute for whole-minute offsets, so every instant shifts by
/// exactly the offset.
///
/// # Errors
/// [`NoSolarEvent`] when the sun never crosses a required altitude on this
/// date. A configured [`PolarFallback`] substitutes the night-fraction rule
/// for unreachable *twilight* angles only; if sunrise/sunset themselves do
/// not exist (full polar day/night) there is no night to divide and the
/// error always surfaces.
pub fn compute_schedule(
    observation: GeoObservation,
    date: NaiveDate,
    method: CalculationMethod,
    rounding: RoundingPolicy,
    offset_minutes: i32,
    polar_fallback: Option<PolarFallback>,
) -> Result<PrayerSchedule, NoSolarEvent> {
    let day = SolarDay::new(observation, date);
    let params = method.parameters();
    let safety = Duration::seconds(RISE_SET_SAFETY_SECS);

    let transit = day.transit_utc();
    let sunrise_astro = day.sunrise()?;
    let sunset_astro = day.sunset()?;
    // Night spans sunset to the (approximately equal) next sunrise
    let night = sunrise_astro + Duration::days(1) - sunset_astro;

    let dhuhr = transit + Duration::seconds(ZENITH_CLEARANCE_SECS);
    let sunrise = sunrise_astro - safety;
    let maghrib = sunset_astro + safety + Duration::minutes(params.maghrib_delay_minutes);

    let fajr = match day.time_at_altitude(-params.fajr_angle, Crossing::Dawnward) {
        Ok(instant) => instant,
        Err(err) => night_portion(polar_fallback, err, sunrise_astro, -1, night)?,
    };

    let asr_altitude = asr_altitude(
        params.asr_shadow_ratio,
        observation.latitude(),
        day.transit_declination(),
    );
    let asr = day.time_at_altitude(asr_altitude, Crossing::Duskward)?;

    let isha = match params.isha {
        IshaRule::AfterMaghrib(minutes) => maghrib + Duration::minutes(minutes),
        IshaRule::TwilightAngle(angle) => match day.time_at_altitude(-angle, Crossing::Duskward) {
            Ok(instant) => instant,
            Err(err) => night_portion(polar_fallback, err, sunset_astro, 1, night)?,
        },
    };

    let offset = Duration::minutes(i64::from(offset_minutes));
    let finalize = |instant: DateTime<Utc>| rounding.apply(instant) + offset;

    Ok(PrayerSchedule::new(
        date,
        [
            finalize(fajr),
            finalize(sunrise),
            finalize(dhuhr),
            finalize(asr),
            finalize(maghrib),
            finalize(isha),
        ],
    ))
}

/// First scheduled instant strictly after `now`, or `None` when the whole
/// day has passed. Deterministic and stateless; the caller owns the
/// advance-one-day retry.
pub fn next_event(
    schedule: &PrayerSchedule,
    now: DateTime<Utc>,
) -> Option<(PrayerName, DateTime<Utc>)> {
    schedule.iter().find(|&(_, instant)| instant > now)
}

/// Substitute an unreachable twilight with a fraction of the night, when a
/// fallback rule is configured; otherwise surface the original failure.
fn night_portion(
    fallback: Option<PolarFallback>,
    err: NoSolarEvent,
    anchor: DateTime<Utc>,
    direction: i64,
    night: Duration,
) -> Result<DateTime<Utc>, NoSolarEvent> {
    let rule = fallback.ok_or(err)?;
    let portion = (night.num_seconds() as f64 * rule.night_fraction()).round() as i64;
    Ok(anchor + Duration::seconds(direction * portion))
}

/// Sun altitude at which an object's shadow reaches `shadow_ratio` times
/// its height: `alt = arctan(1 / (ratio + tan|φ − δ|))`.
fn asr_altitude(shadow_ratio: f64, latitude_deg: f64, declination_deg: f64) -> f64 {
    let noon_spread = (latitude_deg - declination_deg).abs().to_radians();
    (1.0 / (shadow_ratio + noon_spread.tan())).atan().to_degrees()
}
