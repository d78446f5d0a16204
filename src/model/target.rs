//! Targets: the places a compass can point at.

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// A named place to navigate toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationTarget {
    pub name: String,
    pub coords: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for LocationTarget {
    /// Avadhoota Datta Peetham, Mysore.
    fn default() -> Self {
        Self {
            name: "Avadhoota Datta Peetham, Mysore".to_string(),
            coords: Coordinates::new(12.2958, 76.6394),
            description: Some("Sri Ganapathy Sachidananda Ashrama".to_string()),
        }
    }
}
