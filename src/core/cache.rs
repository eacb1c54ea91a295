//! On-disk cache of fetch results
//!
//! A warm cache lets a rerun skip the whole fetch pipeline: resolved
//! buildings land in `buildings.json`, still-unresolved ids in
//! `errors.json`. Pretty-printed JSON so the files stay inspectable.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::core::error::Result;
use crate::core::model::Building;

const BUILDINGS_FILE: &str = "buildings.json";
const ERRORS_FILE: &str = "errors.json";

/// Cache directory holding the persisted fetch outcome
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn buildings_path(&self) -> PathBuf {
        self.root.join(BUILDINGS_FILE)
    }

    pub fn errors_path(&self) -> PathBuf {
        self.root.join(ERRORS_FILE)
    }

    /// True when a previous run left a building set behind
    pub fn has_buildings(&self) -> bool {
        self.buildings_path().exists()
    }

    /// Persist a fetch outcome, creating the directory if needed. When
    /// nothing is left unresolved the errors file is removed outright, so a
    /// stale one never outlives the errors it described.
    pub fn save(&self, buildings: &[Building], unresolved: &BTreeSet<u64>) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(
            self.buildings_path(),
            serde_json::to_string_pretty(buildings)?,
        )?;

        if unresolved.is_empty() {
            self.clear_errors()?;
        } else {
            fs::write(
                self.errors_path(),
                serde_json::to_string_pretty(unresolved)?,
            )?;
        }

        debug!(
            "cached {} buildings, {} unresolved ids under {}",
            buildings.len(),
            unresolved.len(),
            self.root.display()
        );
        Ok(())
    }

    pub fn load_buildings(&self) -> Result<Vec<Building>> {
        let raw = fs::read_to_string(self.buildings_path())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Unresolved ids from the previous run; a missing file means none
    pub fn load_errors(&self) -> Result<BTreeSet<u64>> {
        if !self.errors_path().exists() {
            return Ok(BTreeSet::new());
        }
        let raw = fs::read_to_string(self.errors_path())?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn clear_errors(&self) -> Result<()> {
        match fs::remove_file(self.errors_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
