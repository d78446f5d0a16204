//! Compass output: bearing results, guidance, and the snapshot handed to presentation.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Bearing, distance and alignment relative to a target.
///
/// `angle_diff` is the signed shortest rotation from heading to bearing,
/// always in (-180, 180]. Positive means the target is clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearingResult {
    pub bearing: f64,
    pub distance_km: f64,
    pub is_aligned: bool,
    pub angle_diff: f64,
}

impl BearingResult {
    pub fn guidance(&self) -> Guidance {
        if self.is_aligned {
            Guidance::Aligned
        } else if self.angle_diff > 0.0 {
            Guidance::TurnRight
        } else {
            Guidance::TurnLeft
        }
    }
}

/// Which way to turn toward the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Guidance {
    Aligned,
    TurnRight,
    TurnLeft,
}

/// An alignment edge: the recomputation that produced this reading
/// flipped `is_aligned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    Entered,
    Left,
}

/// Everything presentation needs after one recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub heading: f64,
    pub coords: Option<Coordinates>,
    #[serde(flatten)]
    pub result: BearingResult,
    pub guidance: Guidance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    pub at: Timestamp,
}
