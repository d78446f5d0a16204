//! Pilgrim configuration.
//!
//! Loaded from `~/.pilgrim/config.toml`. Every key is optional; a missing
//! file means all defaults.
//!
//! ```toml
//! alignment-threshold = 10.0
//!
//! [location]
//! high-accuracy = true
//! timeout-ms = 10000
//! maximum-age-ms = 1000
//!
//! [default-target]
//! name = "Avadhoota Datta Peetham, Mysore"
//! latitude = 12.2958
//! longitude = 76.6394
//! description = "Sri Ganapathy Sachidananda Ashrama"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::geo::{ALIGNMENT_THRESHOLD, BearingCalculator};
use crate::model::{Coordinates, LocationTarget};
use crate::sensors::WatchOptions;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Pilgrim configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Degrees either side of the bearing that count as aligned.
    pub alignment_threshold: f64,

    pub location: LocationConfig,

    /// Where the compass points when no saved target is selected.
    pub default_target: TargetConfig,
}

/// Location watch settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LocationConfig {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

/// A target spelled out flat, as it reads best in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alignment_threshold: ALIGNMENT_THRESHOLD,
            location: LocationConfig::default(),
            default_target: TargetConfig::default(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        let options = WatchOptions::default();
        Self {
            high_accuracy: options.high_accuracy,
            timeout_ms: duration_ms(options.timeout),
            maximum_age_ms: duration_ms(options.maximum_age),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        let target = LocationTarget::default();
        Self {
            name: target.name,
            latitude: target.coords.latitude,
            longitude: target.coords.longitude,
            description: target.description,
        }
    }
}

impl Config {
    /// Load config from `~/.pilgrim/config.toml`, falling back to defaults
    /// when there is no home directory or no file.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no home directory; using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;

        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// The config file path: `~/.pilgrim/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pilgrim").join("config.toml"))
    }

    pub fn calculator(&self) -> BearingCalculator {
        BearingCalculator::new(self.alignment_threshold)
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.location.high_accuracy,
            timeout: Duration::from_millis(self.location.timeout_ms),
            maximum_age: Duration::from_millis(self.location.maximum_age_ms),
        }
    }

    pub fn default_target(&self) -> LocationTarget {
        let t = &self.default_target;
        LocationTarget {
            name: t.name.clone(),
            coords: Coordinates::new(t.latitude, t.longitude),
            description: t.description.clone(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let threshold = self.alignment_threshold;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 180.0 {
            return Err(format!(
                "alignment-threshold must be within (0, 180], got {threshold}"
            ));
        }

        let t = &self.default_target;
        if t.name.trim().is_empty() {
            return Err("default-target name cannot be empty".to_string());
        }
        if !(-90.0..=90.0).contains(&t.latitude) || !(-180.0..=180.0).contains(&t.longitude) {
            return Err(format!(
                "default-target coordinates out of range: {}, {}",
                t.latitude, t.longitude
            ));
        }

        Ok(())
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.alignment_threshold, 10.0);
        assert_eq!(config.default_target(), LocationTarget::default());
    }

    #[test]
    fn default_watch_options_match_provider_defaults() {
        assert_eq!(Config::default().watch_options(), WatchOptions::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let (_dir, path) = write_config("alignment-threshold = 15.0\n");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.alignment_threshold, 15.0);
        assert_eq!(config.calculator().threshold(), 15.0);
        assert_eq!(config.location, LocationConfig::default());
    }

    #[test]
    fn reads_all_sections() {
        let (_dir, path) = write_config(
            r#"
alignment-threshold = 5.0

[location]
high-accuracy = false
timeout-ms = 2500
maximum-age-ms = 0

[default-target]
name = "Kashi Vishwanath"
latitude = 25.3109
longitude = 83.0107
"#,
        );
        let config = Config::load_from(&path).unwrap();

        let options = config.watch_options();
        assert!(!options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_millis(2500));
        assert_eq!(options.maximum_age, Duration::ZERO);

        let target = config.default_target();
        assert_eq!(target.name, "Kashi Vishwanath");
        assert_eq!(target.coords, Coordinates::new(25.3109, 83.0107));
        assert_eq!(target.description, None);
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let (_dir, path) = write_config("alignment-threshold = 0.0\n");
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("alignment-threshold"));
    }

    #[test]
    fn rejects_out_of_range_target() {
        let (_dir, path) = write_config(
            "[default-target]\nname = \"Nowhere\"\nlatitude = 95.0\nlongitude = 0.0\n",
        );
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let (_dir, path) = write_config("alignment-threshold = \n");
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
