//! End-to-end properties of the schedule/planner pipeline.
//!
//! These tests exercise the library the way the binary does: build settings
//! (from defaults or a config file), compute schedules, select and plan the
//! next alarm, persist and reload it. Pure-function unit behavior lives in
//! the per-module `#[cfg(test)]` suites; this file covers the seams.

use adhan_clock_lib::config::RawConfig;
use adhan_clock_lib::method::{CalculationMethod, PolarFallback, RoundingPolicy};
use adhan_clock_lib::planner::{self, RearmReason};
use adhan_clock_lib::renderer;
use adhan_clock_lib::schedule::{next_event, CalculationSettings};
use adhan_clock_lib::{GeoObservation, PrayerName};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

fn settings_for(latitude: f64, longitude: f64) -> CalculationSettings {
    CalculationSettings {
        observation: GeoObservation::new(latitude, longitude, 0.0, 1010.0, 10.0).unwrap(),
        method: CalculationMethod::MuslimWorldLeague,
        rounding: RoundingPolicy::Nearest,
        offset_minutes: 0,
        polar_fallback: None,
    }
}

fn mecca_settings() -> CalculationSettings {
    CalculationSettings {
        observation: GeoObservation::new(21.4225, 39.8262, 304.0, 1010.0, 25.0).unwrap(),
        method: CalculationMethod::MuslimWorldLeague,
        rounding: RoundingPolicy::None,
        offset_minutes: 0,
        polar_fallback: None,
    }
}

fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap()))
}

/// Dhuhr tracks local solar noon: on the equinox at Mecca it sits just past
/// the meridian transit, i.e. within the zenith-clearance margin.
#[test]
fn mecca_dhuhr_sits_on_local_solar_noon() {
    use adhan_clock_lib::astro::SolarDay;

    let settings = mecca_settings();
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let schedule = settings.compute_for(date).unwrap();

    let transit = SolarDay::new(settings.observation, date).transit_utc();
    let delta = schedule.time(PrayerName::Dhuhr) - transit;
    assert!(
        delta > Duration::zero() && delta <= Duration::minutes(2),
        "Dhuhr should trail solar noon by the small zenith clearance, got {delta}"
    );

    // And the longitude-based zone arithmetic holds up: at UTC+3 the local
    // wall-clock Dhuhr lands in the 12:2x range, not near 09:00 or 15:00
    let local = schedule.time(PrayerName::Dhuhr) + Duration::hours(3);
    let minutes_past_noon =
        (local.time() - NaiveTime::from_hms_opt(12, 0, 0).unwrap()).num_minutes();
    assert!(
        (0..=45).contains(&minutes_past_noon),
        "local Dhuhr {local} should fall shortly after 12:00 local"
    );
}

/// Mid-day "now" selects Asr; an exhausted day makes the planner recompute
/// for the next date and come back with its Fajr.
#[test]
fn selection_and_rollover_walk_through() {
    let settings = mecca_settings();
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let schedule = settings.compute_for(date).unwrap();

    // Just after Dhuhr, the next event is Asr
    let just_after_dhuhr = schedule.time(PrayerName::Dhuhr) + Duration::minutes(1);
    let (name, instant) = next_event(&schedule, just_after_dhuhr).unwrap();
    assert_eq!(name, PrayerName::Asr);
    assert_eq!(instant, schedule.time(PrayerName::Asr));

    // Past Isha the selector is exhausted; the planner owns the calendar
    let late = at(date, 20, 0);
    assert_eq!(next_event(&schedule, late), None);

    let alarm = planner::plan_next(&settings, date, late).unwrap();
    assert_eq!(alarm.prayer, PrayerName::Fajr);
    assert_eq!(alarm.computed_for, date.succ_opt().unwrap());
}

/// Ordering holds across latitudes and seasons (away from polar edge
/// cases), for angle- and interval-based methods alike.
#[test]
fn schedules_stay_ordered_across_cities_and_months() {
    let cities = [
        ("Toronto", settings_for(43.67, -79.417)),
        ("Jakarta", settings_for(-6.2, 106.82)),
        (
            "Mecca",
            CalculationSettings {
                method: CalculationMethod::UmmAlQura,
                ..mecca_settings()
            },
        ),
    ];

    for (city, settings) in cities {
        for month in 1..=12 {
            let date = NaiveDate::from_ymd_opt(2024, month, 15).unwrap();
            let schedule = settings
                .compute_for(date)
                .unwrap_or_else(|e| panic!("{city} {date}: {e}"));
            assert!(
                schedule.is_strictly_ordered(),
                "{city} {date}: schedule out of order"
            );

            // A full day's schedule always spans several hours
            let span = schedule.time(PrayerName::Isha) - schedule.time(PrayerName::Fajr);
            assert!(
                span > Duration::hours(10) && span < Duration::hours(24),
                "{city} {date}: implausible Fajr→Isha span {span}"
            );
        }
    }
}

/// The uniform offset shifts the planned alarm exactly as it shifts the
/// schedule, independent of rounding.
#[test]
fn offset_propagates_through_planning() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let now = at(date, 1, 0);

    let base = planner::plan_next(&mecca_settings(), date, now).unwrap();
    let shifted_settings = CalculationSettings {
        offset_minutes: 12,
        ..mecca_settings()
    };
    let shifted = planner::plan_next(&shifted_settings, date, now).unwrap();

    assert_eq!(shifted.prayer, base.prayer);
    assert_eq!(shifted.instant - base.instant, Duration::minutes(12));
}

/// Default configuration renders a complete schedule end to end, the way
/// the one-shot binary path does.
#[test]
fn default_config_drives_the_one_shot_path() {
    let settings = RawConfig::default().into_settings().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 9, 22).unwrap();

    let schedule = settings.calculation.compute_for(date).unwrap();
    assert!(schedule.is_strictly_ordered());

    let rendered = renderer::render_schedule(&schedule, &settings.display);
    for name in PrayerName::ALL {
        assert!(rendered.contains(name.label()), "missing {name} row:\n{rendered}");
    }

    let alarm = planner::plan_next(&settings.calculation, date, at(date, 0, 30)).unwrap();
    let line = renderer::render_next_alarm(&alarm, &settings.display);
    assert!(line.contains("Fajr"), "pre-dawn alarm should be Fajr: {line}");
}

/// The chain the watch loop runs: plan, persist, fire, rearm, persist,
/// with the state file always holding exactly the latest alarm.
#[test]
fn fire_and_rearm_chain_with_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("armed.json");

    let settings = mecca_settings();
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let mut now = at(date, 1, 0);

    let mut armed = planner::plan_next(&settings, date, now).unwrap();
    planner::save_armed(&armed, &state).unwrap();

    // Walk the whole day: each firing plans the next event
    let mut fired = Vec::new();
    for _ in 0..6 {
        now = armed.instant;
        fired.push(armed.prayer);
        armed = planner::rearm(Some(&armed), RearmReason::AlarmFired, &settings, now).unwrap();
        planner::save_armed(&armed, &state).unwrap();
        assert_eq!(planner::load_armed(&state).unwrap(), armed);
    }

    assert_eq!(fired, PrayerName::ALL.to_vec(), "a full day fires each prayer once");

    // After Isha the chain has rolled into the next date
    assert_eq!(armed.prayer, PrayerName::Fajr);
    assert_eq!(armed.computed_for, date.succ_opt().unwrap());
}

/// A location update is a complete new observation; rearming for it
/// supersedes the armed alarm when (and only when) the schedule moves.
#[test]
fn location_update_supersedes_when_it_matters() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let now = at(date, 1, 0);
    let toronto = settings_for(43.67, -79.417);

    let armed = planner::plan_next(&toronto, date, now).unwrap();

    // Same coordinates delivered again: nothing to do
    let unchanged =
        planner::rearm(Some(&armed), RearmReason::LocationChanged, &toronto, now).unwrap();
    assert_eq!(unchanged, armed);

    // A real move recomputes against the new observation
    let jakarta = settings_for(-6.2, 106.82);
    let moved = planner::rearm(Some(&armed), RearmReason::LocationChanged, &jakarta, now).unwrap();
    assert_ne!(moved.instant, armed.instant);
    assert_eq!(moved.longitude, 106.82);
}

/// High-latitude summer with a configured fallback still plans alarms; the
/// same sky without one is a visible error, never a wrong instant.
#[test]
fn polar_policy_is_explicit_at_the_planning_level() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
    let now = at(date, 0, 30);
    let bare = settings_for(62.0, 25.0);

    assert!(planner::plan_next(&bare, date, now).is_err());

    let with_fallback = CalculationSettings {
        polar_fallback: Some(PolarFallback::NightMiddle),
        ..bare
    };
    let alarm = planner::plan_next(&with_fallback, date, now).unwrap();
    assert!(alarm.instant > now);
}
