//! Schedule settings store.
//!
//! The dashboard-writable settings document. The scheduler re-reads it every
//! tick, so edits take effect from the next tick. A corrupt document never
//! crashes the loop — [`ConfigStore::load_or_default`] falls back to the
//! built-in safe defaults (one post per day, all days allowed).

use std::path::PathBuf;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::types::ScheduleSettings;

use crate::file::write_atomic;

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the settings document. A missing file is seeded with defaults;
    /// an unparsable one is `ConfigCorrupt`.
    pub fn load(&self) -> Result<ScheduleSettings> {
        if !self.path.exists() {
            let settings = ScheduleSettings::default();
            self.write(&settings)?;
            return Ok(settings);
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            PostforgeError::ConfigCorrupt(format!("{}: {e}", self.path.display()))
        })
    }

    /// Load, falling back to defaults when the persisted form is corrupt.
    /// The bad file is left in place for the operator to inspect.
    pub fn load_or_default(&self) -> ScheduleSettings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Falling back to default schedule settings: {e}");
                ScheduleSettings::default()
            }
        }
    }

    /// Validate and persist. An invalid document is rejected with
    /// `InvalidConfig` and the previous file is retained untouched.
    pub fn save(&self, settings: &ScheduleSettings) -> Result<()> {
        settings.validate()?;
        self.write(settings)
    }

    fn write(&self, settings: &ScheduleSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        write_atomic(&self.path, &json)
    }
}
