//! `pilgrim track`: replay a recorded sensor feed through the compass.

use std::path::Path;

use clap::ValueEnum;
use tracing::warn;

use crate::compass::Compass;
use crate::config::Config;
use crate::model::{LocationTarget, Reading, Transition};
use crate::sensors::{Feed, Permission, PermissionGate, Step};
use crate::track::Tracker;

use super::format::{format_reading, format_target};

/// How the replayed platform gates orientation events.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PermissionArg {
    /// Events flow without asking.
    NotRequired,
    /// Asking is required and the user allows it.
    Granted,
    /// Asking is required and the user refuses.
    Denied,
    /// Asking is required and the request itself fails.
    Failing,
}

impl PermissionArg {
    fn to_gate(self) -> PermissionGate {
        match self {
            Self::NotRequired => PermissionGate::NotRequired,
            Self::Granted => PermissionGate::Grant,
            Self::Denied => PermissionGate::Deny,
            Self::Failing => PermissionGate::Fail,
        }
    }
}

/// Options for a replay, straight from the command line.
pub(super) struct TrackOptions<'a> {
    pub feed: &'a Path,
    pub json: bool,
    pub absolute: bool,
    pub permission: PermissionArg,
    pub skip_permission: bool,
}

pub(super) fn cmd_track(
    config: &Config,
    target: LocationTarget,
    options: &TrackOptions<'_>,
) -> Result<(), String> {
    let mut feed = Feed::open(options.feed)
        .map_err(|e| format!("failed to load feed {}: {e}", options.feed.display()))?;
    if feed.is_empty() {
        return Err(format!("feed {} has no lines", options.feed.display()));
    }

    let calculator = config.calculator();
    let mut compass = Compass::new(target, calculator);
    eprintln!(
        "Tracking {} (aligned within {}\u{00b0})",
        format_target(compass.target()),
        calculator.threshold()
    );

    let json = options.json;
    let mut last_error: Option<String> = None;
    compass.observe(move |reading| print_reading(reading, json, &mut last_error));

    let mut tracker = Tracker::start(
        compass,
        feed.location(),
        feed.orientation(options.absolute, options.permission.to_gate()),
        &config.watch_options(),
    );
    tracker.pump();

    // Stands in for the user tapping "enable compass".
    if !options.skip_permission {
        tracker.request_permission();
    }

    let session = tracker.session();
    if !session.is_watching() {
        warn!("replaying without a location watch");
    }
    if session.listening_on().is_none() {
        let why = match session.permission() {
            Some(Permission::Denied) => "permission denied",
            Some(Permission::Granted) => "orientation unavailable",
            None if options.skip_permission => "permission not requested",
            None => "permission request failed",
        };
        eprintln!("Compass inactive ({why}); heading stays at its last value");
    }

    let mut applied = 0;
    while let Some(step) = feed.step() {
        if let Step::Retarget(target) = step {
            eprintln!("Retargeting to {}", format_target(&target));
            tracker.compass_mut().set_target(target);
        }
        applied += tracker.pump();
    }

    let compass = tracker.stop();
    eprintln!("Replayed {} line(s), {applied} event(s) applied", feed.len());
    if compass.reading().coords.is_none() {
        eprintln!("No location fix received");
    } else {
        eprintln!("Final heading {:.1}\u{00b0}", compass.heading());
    }

    Ok(())
}

fn print_reading(reading: &Reading, json: bool, last_error: &mut Option<String>) {
    if json {
        match serde_json::to_string(reading) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "failed to serialize reading"),
        }
        return;
    }

    if reading.error != *last_error {
        if let Some(error) = &reading.error {
            eprintln!("! {error}");
        }
        last_error.clone_from(&reading.error);
    }

    println!("{}", format_reading(reading));

    match reading.transition {
        Some(Transition::Entered) => println!("  aligned with target"),
        Some(Transition::Left) => println!("  lost alignment"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    #[test]
    fn replays_feed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("walk.jsonl");
        fs::write(
            &path,
            "{\"kind\":\"location\",\"latitude\":12.0,\"longitude\":76.0}\n\
             {\"kind\":\"orientation\",\"alpha\":300.0}\n",
        )
        .unwrap();

        let options = TrackOptions {
            feed: &path,
            json: true,
            absolute: false,
            permission: PermissionArg::NotRequired,
            skip_permission: false,
        };
        cmd_track(&Config::default(), LocationTarget::default(), &options).unwrap();
    }

    #[test]
    fn missing_feed_is_an_error() {
        let dir = TempDir::new().unwrap();
        let options = TrackOptions {
            feed: &dir.path().join("missing.jsonl"),
            json: false,
            absolute: false,
            permission: PermissionArg::Granted,
            skip_permission: true,
        };
        let err = cmd_track(&Config::default(), LocationTarget::default(), &options).unwrap_err();
        assert!(err.starts_with("failed to load feed"));
    }
}
