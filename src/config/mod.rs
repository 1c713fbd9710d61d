use crate::invoker::DEFAULT_TOOL_PATH;
use crate::scheduler::RefreshInterval;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted user settings (`berth.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the runtime tool binary.
    #[serde(default = "default_tool_path")]
    pub tool_path: PathBuf,

    /// Cadence of the observational refresh batch.
    #[serde(default)]
    pub refresh_interval: RefreshInterval,

    /// Release feed queried for application updates.
    #[serde(default)]
    pub releases_endpoint: Option<String>,
}

fn default_tool_path() -> PathBuf {
    PathBuf::from(DEFAULT_TOOL_PATH)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool_path: default_tool_path(),
            refresh_interval: RefreshInterval::default(),
            releases_endpoint: None,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings at {:?}", path.as_ref()))?;

        let settings: Settings =
            toml::from_str(&content).with_context(|| "Failed to parse settings")?;

        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize settings")?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write settings at {:?}", path.as_ref()))?;

        Ok(())
    }
}

/// Berth configuration for runtime operations
#[derive(Debug, Clone, Default)]
pub struct BerthConfig {
    pub config_dir: PathBuf,
    pub settings_path: PathBuf,
    pub settings: Settings,
    pub verbose: bool,
}

impl BerthConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("berth");

        let settings_path = config_dir.join("berth.toml");

        let mut settings = if settings_path.exists() {
            Settings::load(&settings_path)?
        } else {
            debug!("No settings file at {:?}, using defaults", settings_path);
            Settings::default()
        };

        // BERTH_TOOL overrides the persisted tool path.
        if let Ok(tool) = std::env::var("BERTH_TOOL") {
            if !tool.trim().is_empty() {
                settings.tool_path = PathBuf::from(tool);
            }
        }

        Ok(Self {
            config_dir,
            settings_path,
            settings,
            verbose: false,
        })
    }

    pub fn save_settings(&self) -> Result<()> {
        self.settings.save(&self.settings_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn settings_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("berth.toml");

        let settings = Settings {
            tool_path: PathBuf::from("/opt/container/bin/container"),
            refresh_interval: RefreshInterval::Slow,
            releases_endpoint: Some("https://example.test/releases".to_string()),
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.tool_path, settings.tool_path);
        assert_eq!(loaded.refresh_interval, RefreshInterval::Slow);
        assert_eq!(loaded.releases_endpoint, settings.releases_endpoint);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.tool_path, PathBuf::from(DEFAULT_TOOL_PATH));
        assert_eq!(settings.refresh_interval, RefreshInterval::Standard);
        assert!(settings.releases_endpoint.is_none());
    }
}
