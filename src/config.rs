use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PUSH_ENDPOINT: &str = "http://localhost:3001/api/pushToDB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub push_endpoint: String,
    pub push_timeout_secs: u64,
    pub output_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            push_endpoint: DEFAULT_PUSH_ENDPOINT.to_string(),
            push_timeout_secs: 30,
            output_dir: None,
        }
    }
}

impl Settings {
    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs.max(1))
    }
}

pub fn default_settings_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "leadbook", "leadbook")
        .ok_or_else(|| anyhow!("unable to resolve config directory"))?;
    Ok(project_dirs.config_dir().join("settings.toml"))
}

/// Reads settings from `path`; a missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse settings: {}", path.display()))
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(settings).context("failed to serialize settings")?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write settings: {}", path.display()))?;
    Ok(())
}
