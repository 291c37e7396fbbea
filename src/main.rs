//! # Adhan Tracker Application Entry Point
//!
//! Coordinates the pure calculation library with the outside world: loads
//! configuration, prints the day's schedule and the planned next alarm, and
//! in watch mode runs the self-perpetuating rearm loop with an in-process
//! sleep-until timer standing in for an OS alarm service. SIGHUP reloads
//! the configuration and rearms; that is the "settings changed" trigger.

// Test modules
#[cfg(test)]
mod tests;

use adhan_clock_lib::config::{RawConfig, Settings};
use adhan_clock_lib::planner::{self, NextAlarm, RearmReason};
use adhan_clock_lib::renderer;
use anyhow::Context;
use chrono::Utc;
use std::env;

/// Armed-alarm state file. Lives in /tmp so a reboot clears it; the watch
/// loop re-arms from scratch on startup anyway.
const ARMED_STATE_PATH: &str = "/tmp/adhan_armed_alarm.json";

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Watch mode keeps running and rearms after every firing; the default
    // is a one-shot print of today's schedule and the next alarm.
    let watch_mode = env::args().any(|arg| arg == "--watch");

    let settings = RawConfig::load()
        .context("loading prayer-config.toml")?
        .into_settings()
        .context("validating configuration")?;

    let now = Utc::now();
    let schedule = settings
        .calculation
        .compute_for(now.date_naive())
        .context("computing today's prayer schedule")?;
    print!("{}", renderer::render_schedule(&schedule, &settings.display));

    let alarm = planner::plan_next(&settings.calculation, now.date_naive(), now)
        .context("planning the next alarm")?;
    println!("{}", renderer::render_next_alarm(&alarm, &settings.display));

    if !watch_mode {
        return Ok(());
    }

    // Create Tokio runtime for the timer/signal loop
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(watch_loop(settings, alarm))
}

/// The self-perpetuating alarm cycle: persist and announce the armed alarm,
/// sleep until it fires, then immediately plan and arm the following one.
#[cfg(unix)]
async fn watch_loop(mut settings: Settings, mut alarm: NextAlarm) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;

    loop {
        // Arming = replacing the single persisted state. A write failure is
        // logged and tolerated; the in-process timer below still fires.
        if let Err(error) = planner::save_armed(&alarm, ARMED_STATE_PATH) {
            eprintln!("Warning: could not persist armed alarm: {error}");
        }
        eprintln!(
            "{} [epoch {} ms]",
            renderer::render_next_alarm(&alarm, &settings.display),
            alarm.trigger_at_millis()
        );

        let wait = (alarm.instant - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                println!("It is time for {}", alarm.prayer);
                alarm = planner::rearm(
                    Some(&alarm),
                    RearmReason::AlarmFired,
                    &settings.calculation,
                    Utc::now(),
                )
                .context("rearming after the alarm fired")?;
            }
            _ = hangup.recv() => {
                eprintln!("SIGHUP received, reloading configuration");
                match RawConfig::load().and_then(RawConfig::into_settings) {
                    Ok(reloaded) => settings = reloaded,
                    // Keep running on the previous settings; a broken edit
                    // should not kill the armed chain
                    Err(error) => eprintln!("Warning: keeping previous configuration: {error}"),
                }
                alarm = planner::rearm(
                    Some(&alarm),
                    RearmReason::ConfigChanged,
                    &settings.calculation,
                    Utc::now(),
                )
                .context("rearming after configuration change")?;
            }
        }
    }
}

#[cfg(not(unix))]
async fn watch_loop(_settings: Settings, _alarm: NextAlarm) -> anyhow::Result<()> {
    anyhow::bail!("watch mode requires a Unix host (SIGHUP drives configuration reload)")
}
