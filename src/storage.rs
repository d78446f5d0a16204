//! Local persistence for saved targets.
//!
//! Everything lives in one JSON file under the storage root:
//!
//! ```text
//! <root>/
//!   targets.json   # Saved targets and the selected one
//! ```

use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::LocationTarget;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("target already exists: {0}")]
    TargetAlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TargetFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected: Option<String>,
    #[serde(default)]
    targets: Vec<LocationTarget>,
}

/// Local file-based storage for saved targets.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.pilgrim/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pilgrim"))
    }

    /// Lists saved targets in the order they were added.
    pub fn list_targets(&self) -> Result<Vec<LocationTarget>> {
        Ok(self.read()?.targets)
    }

    /// Saves a new target. Names are unique, compared case-insensitively.
    pub fn add_target(&self, target: LocationTarget) -> Result<()> {
        let mut file = self.read()?;
        if find(&file.targets, &target.name).is_some() {
            return Err(StorageError::TargetAlreadyExists(target.name));
        }
        file.targets.push(target);
        self.write(&file)
    }

    /// Removes a saved target, clearing the selection if it pointed there.
    pub fn remove_target(&self, name: &str) -> Result<LocationTarget> {
        let mut file = self.read()?;
        let index = find(&file.targets, name)
            .ok_or_else(|| StorageError::TargetNotFound(name.to_string()))?;
        let removed = file.targets.remove(index);
        if file
            .selected
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(&removed.name))
        {
            file.selected = None;
        }
        self.write(&file)?;
        Ok(removed)
    }

    /// Makes a saved target the one the compass points at.
    pub fn select_target(&self, name: &str) -> Result<LocationTarget> {
        let mut file = self.read()?;
        let index = find(&file.targets, name)
            .ok_or_else(|| StorageError::TargetNotFound(name.to_string()))?;
        let target = file.targets[index].clone();
        file.selected = Some(target.name.clone());
        self.write(&file)?;
        Ok(target)
    }

    /// Loads a saved target by name.
    pub fn load_target(&self, name: &str) -> Result<LocationTarget> {
        let file = self.read()?;
        find(&file.targets, name)
            .map(|i| file.targets[i].clone())
            .ok_or_else(|| StorageError::TargetNotFound(name.to_string()))
    }

    /// The selected target, if one is selected and still saved.
    pub fn selected_target(&self) -> Result<Option<LocationTarget>> {
        let file = self.read()?;
        Ok(file
            .selected
            .as_deref()
            .and_then(|name| find(&file.targets, name))
            .map(|i| file.targets[i].clone()))
    }

    fn read(&self) -> Result<TargetFile> {
        let json = match fs::read_to_string(self.path()) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TargetFile::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, file: &TargetFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)?;
        fs::write(self.path(), json)?;
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.root.join("targets.json")
    }
}

fn find(targets: &[LocationTarget], name: &str) -> Option<usize> {
    targets.iter().position(|t| t.name.eq_ignore_ascii_case(name))
}
