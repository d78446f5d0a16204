//! Saved target commands: list, add, remove, select.

use clap::Subcommand;

use crate::config::Config;
use crate::model::{Coordinates, LocationTarget};
use crate::storage::Storage;

use super::format::format_target;

#[derive(Debug, Subcommand)]
pub enum TargetCommand {
    /// List saved targets. The selected one is marked with `*`.
    List,

    /// Save a new target.
    Add {
        /// Display name, unique among saved targets.
        name: String,

        /// Position as `LAT,LON` in degrees.
        #[arg(allow_hyphen_values = true)]
        coords: Coordinates,

        /// Short description shown next to the name.
        #[arg(long)]
        description: Option<String>,
    },

    /// Forget a saved target.
    Remove {
        /// Name of the saved target (case-insensitive).
        name: String,
    },

    /// Point the compass at a saved target.
    Select {
        /// Name of the saved target (case-insensitive).
        name: String,
    },
}

pub(super) fn run(
    config: &Config,
    storage: &Storage,
    command: TargetCommand,
) -> Result<(), String> {
    match command {
        TargetCommand::List => cmd_list(config, storage),
        TargetCommand::Add {
            name,
            coords,
            description,
        } => cmd_add(storage, name, coords, description),
        TargetCommand::Remove { name } => cmd_remove(storage, &name),
        TargetCommand::Select { name } => cmd_select(storage, &name),
    }
}

/// Where to point, as given on the command line.
#[derive(Debug, Default)]
pub(super) struct TargetChoice {
    /// Explicit coordinates (`--to`).
    pub to: Option<Coordinates>,
    /// A saved target by name (`--target`).
    pub name: Option<String>,
}

/// The target the compass points at: `--to` wins, then `--target`, then
/// the selected saved target, then the configured default.
pub(super) fn resolve_target(
    config: &Config,
    storage: &Storage,
    choice: TargetChoice,
) -> Result<LocationTarget, String> {
    if let Some(coords) = choice.to {
        return Ok(LocationTarget {
            name: coords.to_string(),
            coords,
            description: None,
        });
    }

    if let Some(name) = choice.name {
        return storage
            .load_target(&name)
            .map_err(|e| format!("failed to load target: {e}"));
    }

    let selected = storage
        .selected_target()
        .map_err(|e| format!("failed to load selected target: {e}"))?;

    Ok(selected.unwrap_or_else(|| config.default_target()))
}

fn cmd_list(config: &Config, storage: &Storage) -> Result<(), String> {
    let targets = storage
        .list_targets()
        .map_err(|e| format!("failed to list targets: {e}"))?;
    let selected = storage
        .selected_target()
        .map_err(|e| format!("failed to load selected target: {e}"))?;

    if targets.is_empty() {
        println!("No saved targets");
        println!("Default: {}", format_target(&config.default_target()));
        return Ok(());
    }

    for target in &targets {
        let marker = if selected.as_ref().is_some_and(|s| s.name == target.name) {
            '*'
        } else {
            ' '
        };
        println!("{marker} {}", format_target(target));
    }

    Ok(())
}

fn cmd_add(
    storage: &Storage,
    name: String,
    coords: Coordinates,
    description: Option<String>,
) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("target name cannot be empty".to_string());
    }

    let target = LocationTarget {
        name,
        coords,
        description,
    };
    let summary = format_target(&target);

    storage
        .add_target(target)
        .map_err(|e| format!("failed to add target: {e}"))?;

    eprintln!("Saved {summary}");
    Ok(())
}

fn cmd_remove(storage: &Storage, name: &str) -> Result<(), String> {
    let removed = storage
        .remove_target(name)
        .map_err(|e| format!("failed to remove target: {e}"))?;
    eprintln!("Removed {}", removed.name);
    Ok(())
}

fn cmd_select(storage: &Storage, name: &str) -> Result<(), String> {
    let target = storage
        .select_target(name)
        .map_err(|e| format!("failed to select target: {e}"))?;
    eprintln!("Compass now points at {}", format_target(&target));
    Ok(())
}
