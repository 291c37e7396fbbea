//! Next-alarm planning & the self-perpetuating rearm cycle
//!
//! The planner composes the astronomy and schedule modules with the one-day
//! rollover rule: compute today's schedule, pick the first future event, and
//! if the whole day has passed recompute for tomorrow, exactly once, since
//! any valid non-polar date yields a next event. The result is a single
//! [`NextAlarm`] carrying the absolute trigger instant (epoch milliseconds
//! for the external arming collaborator) plus the inputs it was computed
//! from, so staleness is detectable when the clock, location or settings
//! change before it fires.
//!
//! The external wake-up mechanism is expected to call [`rearm`] when the
//! alarm fires or configuration changes; each call produces the following
//! alarm from then-current inputs, which is how the chain perpetuates
//! without the planner ever holding a timer. Arming is modeled as replacing
//! the one persisted alarm state: supersede, never stack.

use crate::astro::NoSolarEvent;
use crate::method::{CalculationMethod, RoundingPolicy};
use crate::schedule::{next_event, CalculationSettings};
use crate::PrayerName;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from alarm planning and armed-state persistence.
#[derive(Error, Debug)]
pub enum PlanError {
    /// The astronomy below refused: required solar altitude unreachable.
    #[error("cannot compute schedule: {0}")]
    Astronomy(#[from] NoSolarEvent),

    /// No upcoming event found even after advancing one day. A valid
    /// non-polar date always has a next event, so this is an internal
    /// invariant violation, not a recoverable condition.
    #[error("no upcoming prayer found on {date} or the following day")]
    RolloverExhausted {
        /// Last date that was searched.
        date: NaiveDate,
    },

    /// Reading or writing the armed-alarm state file failed.
    #[error("alarm state IO: {0}")]
    State(#[from] std::io::Error),

    /// Encoding or decoding the armed-alarm state failed.
    #[error("alarm state encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Why the planning cycle is being re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RearmReason {
    /// The armed alarm fired; plan the one after it.
    AlarmFired,
    /// Calculation settings changed in a schedule-affecting way.
    ConfigChanged,
    /// A fresh location fix arrived (a complete new observation).
    LocationChanged,
}

/// The one upcoming alarm, ready to hand to the external arming collaborator.
///
/// Besides the event itself, the alarm records the date and inputs it was
/// computed from. A persisted alarm that no longer matches the current
/// settings, or whose instant has passed, is stale and must be superseded
/// rather than fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAlarm {
    /// Which prayer the alarm announces.
    pub prayer: PrayerName,
    /// Absolute trigger instant.
    pub instant: DateTime<Utc>,
    /// The calendar date the schedule was computed for (may be tomorrow
    /// after a rollover).
    pub computed_for: NaiveDate,
    /// Observer latitude the schedule was computed with.
    pub latitude: f64,
    /// Observer longitude the schedule was computed with.
    pub longitude: f64,
    /// Calculation method in force at computation time.
    pub method: CalculationMethod,
    /// Rounding policy in force at computation time.
    pub rounding: RoundingPolicy,
    /// Minute offset in force at computation time.
    pub offset_minutes: i32,
}

impl NextAlarm {
    fn from_parts(
        settings: &CalculationSettings,
        computed_for: NaiveDate,
        prayer: PrayerName,
        instant: DateTime<Utc>,
    ) -> Self {
        Self {
            prayer,
            instant,
            computed_for,
            latitude: settings.observation.latitude(),
            longitude: settings.observation.longitude(),
            method: settings.method,
            rounding: settings.rounding,
            offset_minutes: settings.offset_minutes,
        }
    }

    /// Absolute trigger instant as epoch milliseconds, the form the
    /// external one-shot arming interface takes.
    pub fn trigger_at_millis(&self) -> i64 {
        self.instant.timestamp_millis()
    }

    /// Opaque JSON payload identifying the prayer, included in the armed
    /// wake-up and echoed back in the fired signal.
    ///
    /// # Errors
    /// [`PlanError::Encoding`] if serialization fails.
    pub fn payload(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether this alarm can no longer be trusted: its instant has passed,
    /// or the location/settings it was computed from have changed.
    pub fn is_stale(&self, now: DateTime<Utc>, settings: &CalculationSettings) -> bool {
        self.instant <= now
            || self.latitude != settings.observation.latitude()
            || self.longitude != settings.observation.longitude()
            || self.method != settings.method
            || self.rounding != settings.rounding
            || self.offset_minutes != settings.offset_minutes
    }
}

/// Plan the next alarm from a schedule date and the current instant.
///
/// Computes the schedule for `date` and selects the first event after
/// `now`; when the day is exhausted, advances one day and retries exactly
/// once.
///
/// # Errors
/// [`PlanError::Astronomy`] if either day's schedule cannot be computed;
/// [`PlanError::RolloverExhausted`] if the retry also finds nothing (an
/// internal invariant violation outside polar conditions).
pub fn plan_next(
    settings: &CalculationSettings,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<NextAlarm, PlanError> {
    let today = settings.compute_for(date)?;
    if let Some((prayer, instant)) = next_event(&today, now) {
        return Ok(NextAlarm::from_parts(settings, date, prayer, instant));
    }

    // Day rollover: every event has passed, so tomorrow's schedule holds
    // the next one. One retry is enough by construction.
    let tomorrow = date
        .succ_opt()
        .ok_or(PlanError::RolloverExhausted { date })?;
    let schedule = settings.compute_for(tomorrow)?;
    next_event(&schedule, now)
        .map(|(prayer, instant)| NextAlarm::from_parts(settings, tomorrow, prayer, instant))
        .ok_or(PlanError::RolloverExhausted { date: tomorrow })
}

/// Re-enter the planning cycle after an external trigger.
///
/// For [`RearmReason::ConfigChanged`] and [`RearmReason::LocationChanged`],
/// a previously armed alarm that is still valid under the new settings is
/// returned unchanged, so a no-op settings write does not churn the armed
/// timer. [`RearmReason::AlarmFired`] always plans the following event.
///
/// # Errors
/// Propagates [`plan_next`] failures.
pub fn rearm(
    previous: Option<&NextAlarm>,
    reason: RearmReason,
    settings: &CalculationSettings,
    now: DateTime<Utc>,
) -> Result<NextAlarm, PlanError> {
    if matches!(
        reason,
        RearmReason::ConfigChanged | RearmReason::LocationChanged
    ) {
        if let Some(prev) = previous {
            if !prev.is_stale(now, settings) {
                return Ok(prev.clone());
            }
        }
    }
    plan_next(settings, now.date_naive(), now)
}

/// Persist the armed alarm, replacing any previous state.
///
/// Write failures are real errors here; whether they are fatal is the
/// caller's policy (the reference binary logs and continues, since the
/// in-process timer still fires).
///
/// # Errors
/// [`PlanError::State`] / [`PlanError::Encoding`] on IO or serialization
/// failure.
pub fn save_armed<P: AsRef<Path>>(alarm: &NextAlarm, path: P) -> Result<(), PlanError> {
    let data = serde_json::to_vec(alarm)?;
    fs::write(path, data)?;
    Ok(())
}

/// Load the previously armed alarm, if any was persisted.
///
/// # Errors
/// [`PlanError::State`] when the file is missing or unreadable,
/// [`PlanError::Encoding`] when its contents do not parse. Callers treat
/// both as "nothing armed".
pub fn load_armed<P: AsRef<Path>>(path: P) -> Result<NextAlarm, PlanError> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}
