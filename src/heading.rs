//! Heading normalization: one canonical compass heading from any orientation sample.
//!
//! The canonical convention is 0° = north, increasing clockwise, in [0, 360).

use crate::geo::normalize_degrees;
use crate::model::OrientationSample;

/// Derive a heading from a single sample.
///
/// Returns `None` when the sample carries no usable signal, in which case
/// the caller keeps its previous heading. The variant is inspected per
/// sample; nothing is remembered between calls.
///
/// The alpha fallback inverts the counter-clockwise alpha axis. When the
/// platform only reports relative orientation this is an approximation,
/// not a magnetically true heading.
pub fn normalize(sample: &OrientationSample) -> Option<f64> {
    match *sample {
        OrientationSample::Compass { heading } => Some(normalize_degrees(heading)),
        OrientationSample::Rotation { alpha: Some(alpha) } => {
            Some(normalize_degrees(360.0 - alpha))
        }
        OrientationSample::Rotation { alpha: None } | OrientationSample::Blank => None,
    }
}
