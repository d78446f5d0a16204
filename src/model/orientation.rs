//! Raw orientation samples, as delivered by a platform's orientation sensor.

use serde::{Deserialize, Serialize};

/// One orientation event, tagged by which signal it carries.
///
/// Platforms differ: some expose a dedicated magnetic compass heading,
/// most expose only the raw alpha rotation around the vertical axis,
/// and some deliver events with neither populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "kebab-case")]
pub enum OrientationSample {
    /// A magnetic compass heading: 0 = north, increasing clockwise.
    Compass { heading: f64 },

    /// A raw alpha rotation, increasing counter-clockwise from a
    /// device-dependent zero. `None` means the platform reported no value.
    Rotation { alpha: Option<f64> },

    /// An event with no usable signal.
    Blank,
}

impl OrientationSample {
    /// Classify an event from its raw optional fields.
    ///
    /// A compass heading takes precedence over alpha when both are present.
    pub fn from_fields(compass_heading: Option<f64>, alpha: Option<f64>) -> Self {
        match (compass_heading, alpha) {
            (Some(heading), _) => Self::Compass { heading },
            (None, Some(alpha)) => Self::Rotation { alpha: Some(alpha) },
            (None, None) => Self::Blank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_heading_wins_over_alpha() {
        let sample = OrientationSample::from_fields(Some(42.0), Some(90.0));
        assert_eq!(sample, OrientationSample::Compass { heading: 42.0 });
    }

    #[test]
    fn alpha_zero_is_a_value() {
        let sample = OrientationSample::from_fields(None, Some(0.0));
        assert_eq!(sample, OrientationSample::Rotation { alpha: Some(0.0) });
    }

    #[test]
    fn no_fields_is_blank() {
        assert_eq!(
            OrientationSample::from_fields(None, None),
            OrientationSample::Blank
        );
    }
}
