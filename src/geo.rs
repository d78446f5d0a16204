//! Great-circle math and the bearing calculator.
//!
//! Everything here is a pure function of its inputs. Degenerate input
//! (identical points) yields defined values, and NaN propagates as NaN.

use crate::model::{BearingResult, Coordinates};

/// Mean earth radius in kilometers (spherical model).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default alignment tolerance in degrees. The comparison is strict (`<`).
pub const ALIGNMENT_THRESHOLD: f64 = 10.0;

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing (forward azimuth) from `from` to `to`, in [0, 360).
///
/// Identical points give `atan2(0, 0)`, which is 0°.
pub fn initial_bearing(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Fold any angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = ((deg % 360.0) + 360.0) % 360.0;
    // -1e-14 % 360 + 360 rounds to exactly 360.0.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `heading` to `bearing`, in (-180, 180].
pub fn angle_diff(bearing: f64, heading: f64) -> f64 {
    let mut diff = (bearing - heading) % 360.0;
    if !diff.is_finite() {
        return diff;
    }
    while diff <= -180.0 {
        diff += 360.0;
    }
    while diff > 180.0 {
        diff -= 360.0;
    }
    diff
}

/// Computes bearing, distance and alignment against a fixed tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingCalculator {
    threshold: f64,
}

impl Default for BearingCalculator {
    fn default() -> Self {
        Self::new(ALIGNMENT_THRESHOLD)
    }
}

impl BearingCalculator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute the result for a device at `current` pointing at `heading`.
    ///
    /// Returns `None` while the current position is unknown.
    pub fn calculate(
        &self,
        current: Option<Coordinates>,
        target: Coordinates,
        heading: f64,
    ) -> Option<BearingResult> {
        let current = current?;

        let bearing = initial_bearing(current, target);
        let distance_km = haversine_distance_km(current, target);
        let angle_diff = angle_diff(bearing, heading);

        Some(BearingResult {
            bearing,
            distance_km,
            is_aligned: angle_diff.abs() < self.threshold,
            angle_diff,
        })
    }
}
