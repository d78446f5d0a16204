//! Output formatting for CLI display.

use crate::model::{Guidance, LocationTarget, Reading};

/// Distance for display: meters below one kilometer, otherwise kilometers
/// to two decimals.
pub(super) fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", (km * 1000.0).round())
    } else {
        format!("{km:.2} km")
    }
}

pub(super) fn format_guidance(guidance: Guidance) -> &'static str {
    match guidance {
        Guidance::Aligned => "GO FORWARD",
        Guidance::TurnRight => "TURN RIGHT",
        Guidance::TurnLeft => "TURN LEFT",
    }
}

/// Whole degrees with a degree sign.
pub(super) fn format_degrees(deg: f64) -> String {
    format!("{:.0}\u{00b0}", deg.round())
}

pub(super) fn format_target(target: &LocationTarget) -> String {
    match &target.description {
        Some(description) => format!("{} ({})  {description}", target.name, target.coords),
        None => format!("{} ({})", target.name, target.coords),
    }
}

/// One-line summary of a reading, as printed while tracking.
pub(super) fn format_reading(reading: &Reading) -> String {
    if reading.coords.is_none() {
        return format!(
            "heading {:>4}  waiting for location",
            format_degrees(reading.heading)
        );
    }
    format!(
        "heading {:>4}  bearing {:>4}  {:>10}  {} ({:+.0}\u{00b0})",
        format_degrees(reading.heading),
        format_degrees(reading.result.bearing),
        format_distance(reading.result.distance_km),
        format_guidance(reading.guidance),
        reading.result.angle_diff,
    )
}
