//! CLI interface for Pilgrim.
//!
//! Each subcommand is non-interactive: arguments in, readings out.
//!
//! - `pilgrim bearing` — one-shot bearing from a position and heading.
//! - `pilgrim heading` — normalize a raw orientation sample.
//! - `pilgrim track` — replay a recorded sensor feed through the compass.
//! - `pilgrim target` — manage saved targets.
//!
//! Without `--to` or `--target`, the compass points at the selected saved
//! target, or the configured default when none is selected.

mod format;
mod target;
mod track;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::compass::Compass;
use crate::config::Config;
use crate::heading;
use crate::model::{Coordinates, LocationTarget, OrientationSample};
use crate::storage::Storage;

use format::{format_degrees, format_distance, format_guidance, format_target};
use target::{TargetChoice, TargetCommand};
use track::{PermissionArg, TrackOptions};

/// Pilgrim — which way to turn.
#[derive(Debug, Parser)]
#[command(name = "pilgrim", after_long_help = FEED_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const FEED_HELP: &str = r#"Feed format (one JSON object per line, in arrival order):
  {"kind":"location","latitude":12.30,"longitude":76.64}
  {"kind":"location-error","message":"Timeout expired"}
  {"kind":"orientation","channel":"absolute","alpha":270.0}
  {"kind":"orientation","compass-heading":88.5}
  {"kind":"target","name":"Kashi","latitude":25.3109,"longitude":83.0107}

Examples:
  pilgrim bearing --from 12.31,76.65 --heading 200
  pilgrim target add Kashi 25.3109,83.0107 --description "Varanasi"
  pilgrim target select Kashi
  pilgrim track walk.jsonl --absolute
  pilgrim track walk.jsonl --target Kashi --permission granted --json"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute bearing, distance and alignment from one position.
    Bearing {
        /// Current position as `LAT,LON`.
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinates,

        /// Target position as `LAT,LON`. Defaults to the selected target.
        #[arg(long, allow_hyphen_values = true)]
        to: Option<Coordinates>,

        /// Saved target to aim at, by name.
        #[arg(long, conflicts_with = "to")]
        target: Option<String>,

        /// Device heading in degrees, 0 = north, clockwise.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        heading: f64,

        /// Print the reading as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Normalize a raw orientation sample into a compass heading.
    ///
    /// A compass heading takes precedence over alpha when both are given.
    Heading {
        /// Dedicated magnetic compass heading, in degrees.
        #[arg(long, allow_hyphen_values = true)]
        compass: Option<f64>,

        /// Raw alpha rotation, in degrees.
        #[arg(long, allow_hyphen_values = true)]
        alpha: Option<f64>,
    },

    /// Replay a recorded sensor feed and print a reading per update.
    Track {
        /// JSONL feed file.
        feed: PathBuf,

        /// Target position as `LAT,LON`. Defaults to the selected target.
        #[arg(long, allow_hyphen_values = true)]
        to: Option<Coordinates>,

        /// Saved target to aim at, by name.
        #[arg(long, conflicts_with = "to")]
        target: Option<String>,

        /// Print readings as JSON lines.
        #[arg(long)]
        json: bool,

        /// Replay a platform that offers absolute orientation.
        #[arg(long)]
        absolute: bool,

        /// How the replayed platform gates orientation events.
        #[arg(long, value_enum, default_value = "not-required")]
        permission: PermissionArg,

        /// Never ask for orientation permission, as if the user ignored the prompt.
        #[arg(long)]
        skip_permission: bool,
    },

    /// Manage saved targets.
    Target {
        #[command(subcommand)]
        command: TargetCommand,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Bearing {
            from,
            to,
            target: name,
            heading,
            json,
        } => {
            let target = target::resolve_target(config, storage, TargetChoice { to, name })?;
            cmd_bearing(config, target, from, heading, json)
        }
        Command::Heading { compass, alpha } => cmd_heading(compass, alpha),
        Command::Track {
            feed,
            to,
            target: name,
            json,
            absolute,
            permission,
            skip_permission,
        } => {
            let target = target::resolve_target(config, storage, TargetChoice { to, name })?;
            let options = TrackOptions {
                feed: &feed,
                json,
                absolute,
                permission,
                skip_permission,
            };
            track::cmd_track(config, target, &options)
        }
        Command::Target { command } => target::run(config, storage, command),
    }
}

fn cmd_bearing(
    config: &Config,
    target: LocationTarget,
    from: Coordinates,
    heading: f64,
    json: bool,
) -> Result<(), String> {
    let summary = format_target(&target);

    let mut compass = Compass::new(target, config.calculator());
    compass.update_orientation(&OrientationSample::Compass { heading });
    let reading = compass.update_location(from);

    if json {
        let json = serde_json::to_string_pretty(&reading)
            .map_err(|e| format!("failed to serialize reading: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let result = reading.result;
    println!("Target:    {summary}");
    println!("From:      {from}");
    println!("Bearing:   {}", format_degrees(result.bearing));
    println!("Distance:  {}", format_distance(result.distance_km));
    println!("Heading:   {}", format_degrees(reading.heading));
    println!(
        "Turn:      {} ({:+.0}\u{00b0})",
        format_guidance(reading.guidance),
        result.angle_diff
    );

    Ok(())
}

fn cmd_heading(compass: Option<f64>, alpha: Option<f64>) -> Result<(), String> {
    let sample = OrientationSample::from_fields(compass, alpha);
    let heading = heading::normalize(&sample)
        .ok_or("no usable orientation signal: pass --compass or --alpha")?;
    println!("{heading:.1}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "pilgrim", "bearing", "--from", "-33.86,151.21", "--to", "-34.0,-58.4",
        ])
        .unwrap();
        match cli.command {
            Command::Bearing { from, to, .. } => {
                assert_eq!(from, Coordinates::new(-33.86, 151.21));
                assert_eq!(to, Some(Coordinates::new(-34.0, -58.4)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn to_and_target_conflict() {
        let result = Cli::try_parse_from([
            "pilgrim", "bearing", "--from", "0,0", "--to", "1,1", "--target", "Kashi",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn heading_needs_a_signal() {
        let err = cmd_heading(None, None).unwrap_err();
        assert!(err.starts_with("no usable orientation signal"));
        assert!(cmd_heading(None, Some(0.0)).is_ok());
    }

    #[test]
    fn bearing_runs_against_explicit_target() {
        let target = LocationTarget {
            name: "East".into(),
            coords: Coordinates::new(0.0, 90.0),
            description: None,
        };
        let from = Coordinates::new(0.0, 0.0);
        cmd_bearing(&Config::default(), target, from, 355.0, true).unwrap();
    }
}
