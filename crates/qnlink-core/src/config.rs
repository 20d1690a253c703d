//! Settings persistence (a single JSON file)

use crate::error::QnlinkError;
use qnlink_types::Settings;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const SETTINGS_FILE: &str = "settings.json";

/// Default location: `<config dir>/qnlink/settings.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("qnlink"))
        .unwrap_or_else(|| PathBuf::from(".qnlink"))
        .join(SETTINGS_FILE)
}

/// Reads and writes [`Settings`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub async fn load(&self) -> Result<Settings, QnlinkError> {
        if !fs::try_exists(&self.path).await? {
            debug!("No settings at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content).map_err(|e| QnlinkError::Serialization(e.to_string()))
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), QnlinkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| QnlinkError::Serialization(e.to_string()))?;
        fs::write(&self.path, content).await?;

        Ok(())
    }

    pub async fn reset(&self) -> Result<Settings, QnlinkError> {
        let settings = Settings::default();
        self.save(&settings).await?;
        Ok(settings)
    }
}
