//! Low-precision solar ephemeris & daily event times
//!
//! Implements the standard low-precision solar-position series (declination
//! and equation of time, per the approximations in Meeus' *Astronomical
//! Algorithms*) and derives sunrise, sunset, solar noon and arbitrary
//! twilight crossings for one observer location and date.
//!
//! Accuracy: derived event times agree with reference tables to within about
//! a minute at non-extreme latitudes, which is the precision prayer-time use
//! requires. Each event gets one refinement pass (the sun position is
//! re-evaluated at the first-pass estimate) so the declination drift across
//! the day does not leak into morning/evening events.
//!
//! Atmospheric refraction at the horizon scales the standard 34′ value by
//! pressure and temperature; observer altitude adds the usual horizon-dip
//! term. Twilight angles are geometric depressions and take no refraction.

use crate::GeoObservation;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// Apparent solar radius plus mean refraction margin folded into the sun's
/// upper-limb definition (deg).
const SUN_SEMIDIAMETER_DEG: f64 = 0.2667;

/// Mean atmospheric refraction at the horizon under 1010 hPa / 10 °C (deg).
const HORIZON_REFRACTION_DEG: f64 = 0.5667;

/// Hour-angle that the required altitude never reaches on the given date.
///
/// Raised for polar day/night (sunrise or sunset unreachable) and for
/// twilight depressions that stay above/below the sun's diurnal arc at high
/// latitudes. The caller decides the fallback policy; this module only
/// reports the condition.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("sun never reaches {altitude_deg:.2}° on {date} at latitude {latitude:.4}°")]
pub struct NoSolarEvent {
    /// The unreachable target altitude in degrees.
    pub altitude_deg: f64,
    /// Observer latitude in degrees.
    pub latitude: f64,
    /// The calendar date of the failed computation.
    pub date: NaiveDate,
}

/// Which side of solar noon an altitude crossing is looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Morning crossing (before transit): dawn twilight, sunrise.
    Dawnward,
    /// Evening crossing (after transit): sunset, dusk twilight.
    Duskward,
}

/// Solar declination and equation of time for one instant.
#[derive(Debug, Clone, Copy)]
pub struct SunPosition {
    /// Declination of the sun in degrees.
    pub declination_deg: f64,
    /// Equation of time (apparent − mean solar time) in hours.
    pub equation_of_time_hours: f64,
}

impl SunPosition {
    /// Evaluate the low-precision solar series at a Julian day.
    pub fn at(julian_day: f64) -> Self {
        // ---------- 1. Days since J2000.0 ---------------------------------
        let d = julian_day - 2_451_545.0;

        // ---------- 2. Mean anomaly & mean longitude (deg) ----------------
        let g = normalize_deg(357.529 + 0.985_600_28 * d);
        let q = normalize_deg(280.459 + 0.985_647_36 * d);

        // ---------- 3. Ecliptic longitude & obliquity ---------------------
        let l = normalize_deg(q + 1.915 * sind(g) + 0.020 * sind(2.0 * g));
        let e = 23.439 - 0.000_000_36 * d;

        // ---------- 4. Right ascension (hours) & declination (deg) -------
        let ra_deg = normalize_deg(atan2d(cosd(e) * sind(l), cosd(l)));
        let ra_hours = ra_deg / 15.0;
        let declination_deg = asind(sind(e) * sind(l));

        // Equation of time folded into (-12, +12] hours
        let equation_of_time_hours = wrap_hours(q / 15.0 - ra_hours);

        Self {
            declination_deg,
            equation_of_time_hours,
        }
    }
}

/// Solar geometry for one observer location and calendar date.
///
/// Precomputes the Julian day once; every event lookup is then a pure
/// function of the stored inputs. The struct retains no other state.
#[derive(Debug, Clone, Copy)]
pub struct SolarDay {
    observation: GeoObservation,
    date: NaiveDate,
    jd0: f64, // Julian day at 0h UT of `date`
}

impl SolarDay {
    /// Bind an observation to a calendar date.
    pub fn new(observation: GeoObservation, date: NaiveDate) -> Self {
        Self {
            observation,
            date,
            jd0: julian_day(date),
        }
    }

    /// The date this day was computed for.
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Solar noon (meridian transit) as a UTC instant.
    pub fn transit_utc(&self) -> DateTime<Utc> {
        self.instant(self.transit_hours())
    }

    /// Solar declination evaluated at transit (deg).
    pub fn transit_declination(&self) -> f64 {
        self.position_at(self.transit_hours()).declination_deg
    }

    /// Time from transit to the given altitude crossing, as a duration.
    ///
    /// This is the hour-angle contract used for twilight depressions: the
    /// Fajr instant is `transit − hour_angle_for_altitude(−fajr_angle)` and
    /// Isha is the mirror image on the dusk side.
    ///
    /// # Errors
    /// [`NoSolarEvent`] when the sun's diurnal arc never touches the
    /// altitude on this date.
    pub fn hour_angle_for_altitude(&self, altitude_deg: f64) -> Result<Duration, NoSolarEvent> {
        let declination = self.transit_declination();
        let hours = self.hour_angle_hours(altitude_deg, declination)?;
        Ok(duration_from_hours(hours))
    }

    /// UTC instant at which the sun crosses `altitude_deg` on the given
    /// side of noon, with one refinement pass.
    ///
    /// # Errors
    /// [`NoSolarEvent`] when the altitude is unreachable on this date.
    pub fn time_at_altitude(
        &self,
        altitude_deg: f64,
        crossing: Crossing,
    ) -> Result<DateTime<Utc>, NoSolarEvent> {
        // First pass: hour angle from the transit-time declination
        let t0 = self.transit_hours();
        let h0 = self.hour_angle_hours(altitude_deg, self.position_at(t0).declination_deg)?;
        let estimate = match crossing {
            Crossing::Dawnward => t0 - h0,
            Crossing::Duskward => t0 + h0,
        };

        // Refinement: re-evaluate the sun at the estimated event time
        let sun = self.position_at(estimate);
        let h1 = self.hour_angle_hours(altitude_deg, sun.declination_deg)?;
        let transit =
            12.0 - self.observation.longitude() / 15.0 - sun.equation_of_time_hours;
        let hours = match crossing {
            Crossing::Dawnward => transit - h1,
            Crossing::Duskward => transit + h1,
        };
        Ok(self.instant(hours))
    }

    /// Astronomical sunrise (upper limb, refraction- and dip-corrected).
    ///
    /// # Errors
    /// [`NoSolarEvent`] during polar day/night.
    pub fn sunrise(&self) -> Result<DateTime<Utc>, NoSolarEvent> {
        self.time_at_altitude(self.horizon_altitude(), Crossing::Dawnward)
    }

    /// Astronomical sunset (upper limb, refraction- and dip-corrected).
    ///
    /// # Errors
    /// [`NoSolarEvent`] during polar day/night.
    pub fn sunset(&self) -> Result<DateTime<Utc>, NoSolarEvent> {
        self.time_at_altitude(self.horizon_altitude(), Crossing::Duskward)
    }

    /// Target altitude for sunrise/sunset: solar semidiameter plus
    /// pressure/temperature-scaled refraction plus horizon dip, all below
    /// the geometric horizon.
    pub fn horizon_altitude(&self) -> f64 {
        let obs = &self.observation;
        let refraction = HORIZON_REFRACTION_DEG * (obs.pressure() / 1010.0)
            * (283.0 / (273.0 + obs.temperature()));
        let dip = 0.0347 * obs.altitude().max(0.0).sqrt();
        -(SUN_SEMIDIAMETER_DEG + refraction + dip)
    }

    // -- Private implementation --

    /// Transit in UTC hours from midnight, refined once via the equation of
    /// time evaluated near mean noon.
    fn transit_hours(&self) -> f64 {
        let mean_noon = 12.0 - self.observation.longitude() / 15.0;
        let sun = self.position_at(mean_noon);
        mean_noon - sun.equation_of_time_hours
    }

    /// Sun position at `hours` UTC of this date.
    fn position_at(&self, hours: f64) -> SunPosition {
        SunPosition::at(self.jd0 + hours / 24.0)
    }

    /// Hour angle (in hours) at which the sun sits at `altitude_deg`, for a
    /// given declination. `|cos H| > 1` means the altitude is never reached.
    fn hour_angle_hours(
        &self,
        altitude_deg: f64,
        declination_deg: f64,
    ) -> Result<f64, NoSolarEvent> {
        let lat = self.observation.latitude();
        let cos_h = (sind(altitude_deg) - sind(lat) * sind(declination_deg))
            / (cosd(lat) * cosd(declination_deg));
        if !(-1.0..=1.0).contains(&cos_h) {
            return Err(NoSolarEvent {
                altitude_deg,
                latitude: lat,
                date: self.date,
            });
        }
        Ok(acosd(cos_h) / 15.0)
    }

    /// UTC instant at fractional `hours` from this date's midnight.
    fn instant(&self, hours: f64) -> DateTime<Utc> {
        let midnight = Utc.from_utc_datetime(&self.date.and_time(NaiveTime::MIN));
        midnight + duration_from_hours(hours)
    }
}

/// Julian day at 0h UT for a proleptic-Gregorian calendar date.
fn julian_day(date: NaiveDate) -> f64 {
    let (mut y, mut m) = (date.year(), date.month() as i32);
    let d = f64::from(date.day());
    if m <= 2 {
        y -= 1;
        m += 12;
    }
    let a = (f64::from(y) / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (f64::from(y) + 4716.0)).floor() + (30.6001 * f64::from(m + 1)).floor() + d + b
        - 1524.5
}

fn duration_from_hours(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

// Degree-flavored trigonometry keeps the series readable
fn sind(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cosd(deg: f64) -> f64 {
    deg.to_radians().cos()
}

fn asind(x: f64) -> f64 {
    x.asin().to_degrees()
}

fn acosd(x: f64) -> f64 {
    x.acos().to_degrees()
}

fn atan2d(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}

/// Fold an angle into [0, 360).
fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Fold an hour value into (−12, +12].
fn wrap_hours(hours: f64) -> f64 {
    let h = hours.rem_euclid(24.0);
    if h > 12.0 {
        h - 24.0
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn mecca() -> GeoObservation {
        GeoObservation::new(21.4225, 39.8262, 304.0, 1010.0, 25.0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn julian_day_reference_epoch() {
        // J2000.0 epoch: 2000-01-01 12:00 TT is JD 2451545.0, so midnight
        // of that date is JD 2451544.5
        assert!((julian_day(date(2000, 1, 1)) - 2_451_544.5).abs() < 1e-9);
    }

    #[test]
    fn declination_tracks_the_seasons() {
        let equinox = SunPosition::at(julian_day(date(2024, 3, 20)));
        assert!(
            equinox.declination_deg.abs() < 1.0,
            "equinox declination {} should be near zero",
            equinox.declination_deg
        );

        let solstice = SunPosition::at(julian_day(date(2024, 6, 21)));
        assert!(
            (23.0..=23.6).contains(&solstice.declination_deg),
            "June solstice declination {} should be near +23.44°",
            solstice.declination_deg
        );

        let winter = SunPosition::at(julian_day(date(2024, 12, 21)));
        assert!(
            (-23.6..=-23.0).contains(&winter.declination_deg),
            "December solstice declination {} should be near -23.44°",
            winter.declination_deg
        );
    }

    #[test]
    fn equation_of_time_matches_reference_extremes() {
        // Late October / early November: the sun runs ~16.5 min fast
        let november = SunPosition::at(julian_day(date(2024, 11, 3)));
        let minutes = november.equation_of_time_hours * 60.0;
        assert!(
            (15.0..=18.0).contains(&minutes),
            "early-November equation of time {minutes} min should be ≈ +16.5"
        );

        // Mid-February: the sun runs ~14 min slow
        let february = SunPosition::at(julian_day(date(2024, 2, 12)));
        let minutes = february.equation_of_time_hours * 60.0;
        assert!(
            (-16.0..=-12.5).contains(&minutes),
            "mid-February equation of time {minutes} min should be ≈ -14"
        );
    }

    #[test]
    fn equatorial_half_day_is_six_hours() {
        let obs = GeoObservation::new(0.0, 0.0, 0.0, 1013.25, 15.0).unwrap();
        let day = SolarDay::new(obs, date(2024, 3, 20));
        let h = day.hour_angle_for_altitude(0.0).unwrap();
        let hours = h.num_seconds() as f64 / 3600.0;
        assert!(
            (hours - 6.0).abs() < 0.05,
            "geometric half-day at the equator on the equinox is {hours} h, expected ≈ 6"
        );
    }

    #[test]
    fn mecca_equinox_transit_matches_reference() {
        let day = SolarDay::new(mecca(), date(2024, 3, 20));
        let transit = day.transit_utc();
        // NOAA solar noon for Mecca on 2024-03-20 is 09:28 UTC (12:28 +03)
        let minutes = f64::from(transit.hour()) * 60.0
            + f64::from(transit.minute())
            + f64::from(transit.second()) / 60.0;
        assert!(
            (9.0 * 60.0 + 25.0..=9.0 * 60.0 + 31.0).contains(&minutes),
            "Mecca transit {transit} should fall between 09:25 and 09:31 UTC"
        );
    }

    #[test]
    fn mecca_equinox_sunrise_and_sunset_bracket_transit() {
        let day = SolarDay::new(mecca(), date(2024, 3, 20));
        let sunrise = day.sunrise().unwrap();
        let sunset = day.sunset().unwrap();
        let transit = day.transit_utc();
        assert!(sunrise < transit && transit < sunset);

        // Day length on the equinox is close to 12h, stretched slightly by
        // refraction and the 304 m horizon dip
        let day_len_hours = (sunset - sunrise).num_seconds() as f64 / 3600.0;
        assert!(
            (12.0..=12.5).contains(&day_len_hours),
            "equinox day length {day_len_hours} h should be a little over 12"
        );
    }

    #[test]
    fn polar_latitude_reports_no_solar_event() {
        let obs = GeoObservation::new(80.0, 0.0, 0.0, 1010.0, -10.0).unwrap();
        let day = SolarDay::new(obs, date(2024, 6, 21));

        // Midnight sun: the horizon altitude is never crossed
        let err = day.sunrise().unwrap_err();
        assert_eq!(err.latitude, 80.0);
        assert_eq!(err.date, date(2024, 6, 21));

        // And an 18° dawn depression is equally unreachable
        assert!(day.time_at_altitude(-18.0, Crossing::Dawnward).is_err());
    }

    #[test]
    fn higher_pressure_depresses_the_horizon() {
        let thin = GeoObservation::new(45.0, 0.0, 0.0, 900.0, 10.0).unwrap();
        let thick = GeoObservation::new(45.0, 0.0, 0.0, 1050.0, 10.0).unwrap();
        let d = date(2024, 3, 20);
        let h_thin = SolarDay::new(thin, d).horizon_altitude();
        let h_thick = SolarDay::new(thick, d).horizon_altitude();
        assert!(
            h_thick < h_thin,
            "denser air refracts more: {h_thick} should sit below {h_thin}"
        );
    }

    #[test]
    fn sun_position_is_deterministic() {
        let jd = julian_day(date(2025, 8, 7));
        let a = SunPosition::at(jd);
        let b = SunPosition::at(jd);
        assert_eq!(a.declination_deg, b.declination_deg);
        assert_eq!(a.equation_of_time_hours, b.equation_of_time_hours);
    }
}
