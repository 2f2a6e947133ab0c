//! UI settings persisted as `settings.yaml` in the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use shared::{ThemePalette, UiSettings};

use super::errors::DomainResult;
use super::localization::palette;

#[derive(Debug, Clone)]
pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or the defaults when nothing has been saved yet
    pub fn load(&self) -> DomainResult<UiSettings> {
        if !self.path.exists() {
            debug!("No settings file at {:?}, using defaults", self.path);
            return Ok(UiSettings::default());
        }
        let yaml_content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        let settings: UiSettings = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse {:?}", self.path))?;
        Ok(settings)
    }

    pub fn save(&self, settings: &UiSettings) -> DomainResult<UiSettings> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create settings directory")?;
            }
        }
        let yaml_content = serde_yaml::to_string(settings).context("Failed to encode settings")?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, yaml_content).context("Failed to write settings")?;
        fs::rename(&temp_path, &self.path).context("Failed to replace settings file")?;

        info!("Saved settings: theme {}, language {}", settings.theme, settings.language);
        Ok(settings.clone())
    }

    /// Colors of the currently saved theme
    pub fn palette(&self) -> DomainResult<ThemePalette> {
        Ok(palette(self.load()?.theme))
    }
}
