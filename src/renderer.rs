//! # Schedule Rendering
//!
//! Plain-text rendering of a computed schedule and the planned next alarm,
//! for terminal output and logs. The core computes in UTC; this module is
//! where the display-only preferences (12/24-hour clock, fixed UTC offset)
//! are applied. Nothing here feeds back into the calculation.

use crate::planner::NextAlarm;
use crate::PrayerSchedule;
use chrono::{DateTime, FixedOffset, Utc};

/// Clock convention for rendered times. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// 12-hour clock with AM/PM.
    TwelveHour,
    /// 24-hour clock.
    TwentyFourHour,
}

impl TimeFormat {
    /// Stable configuration key for this format.
    pub const fn key(self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }

    /// Look a format up by its configuration key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "12h" => Some(TimeFormat::TwelveHour),
            "24h" => Some(TimeFormat::TwentyFourHour),
            _ => None,
        }
    }
}

/// Validated display preferences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    /// Clock convention.
    pub time_format: TimeFormat,
    /// Offset applied to UTC instants for local rendering.
    pub utc_offset: FixedOffset,
}

/// Render the six-row schedule table.
pub fn render_schedule(schedule: &PrayerSchedule, display: &DisplaySettings) -> String {
    let mut out = format!("Prayer schedule for {}\n", schedule.date);
    for (name, instant) in schedule.iter() {
        out.push_str(&format!(
            "  {:<8} {}\n",
            name.label(),
            format_instant(instant, display)
        ));
    }
    out
}

/// Render the next-alarm summary line.
pub fn render_next_alarm(alarm: &NextAlarm, display: &DisplaySettings) -> String {
    format!(
        "Next: {} at {} (schedule of {})",
        alarm.prayer,
        format_instant(alarm.instant, display),
        alarm.computed_for
    )
}

/// One instant in the configured local clock convention.
fn format_instant(instant: DateTime<Utc>, display: &DisplaySettings) -> String {
    let local = instant.with_timezone(&display.utc_offset);
    match display.time_format {
        TimeFormat::TwentyFourHour => local.format("%H:%M:%S").to_string(),
        TimeFormat::TwelveHour => local.format("%-I:%M:%S %p").to_string(),
    }
}
