use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::day::ReportZone;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Image bytes live in the database
    Inline,
    /// Image bytes live under `photos_dir`, the database keeps the path
    #[default]
    Files,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,

    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,
}

fn default_photos_dir() -> PathBuf {
    data_dir().join("photos")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            photos_dir: default_photos_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Zone that decides which day a photo belongs to: "local", "utc" or
    /// a fixed offset such as "+02:00".
    #[serde(default)]
    pub zone: ReportZone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub output_dir: PathBuf,
}

fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_export_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Record this installation's device id on every photo.
    #[serde(default = "default_record_device_id")]
    pub record_device_id: bool,
}

fn default_record_device_id() -> bool {
    true
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            record_device_id: default_record_device_id(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasklog")
}

fn default_db_path() -> PathBuf {
    data_dir().join("tasklog.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage: StorageConfig::default(),
            report: ReportConfig::default(),
            export: ExportConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Config {
    /// Load from `TASKLOG_CONFIG` if set, otherwise from the default
    /// location, writing a default config there on first run.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os("TASKLOG_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasklog")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/var/lib/tasklog/log.db"

            [report]
            zone = "+02:00"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/tasklog/log.db"));
        assert_eq!(config.report.zone, "+02:00".parse().unwrap());
        assert_eq!(config.storage.mode, StorageMode::Files);
        assert!(config.capture.record_device_id);
    }

    #[test]
    fn test_invalid_zone_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[report]\nzone = \"Mars/Olympus\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let mut config = Config::default();
        config.storage.mode = StorageMode::Inline;
        config.report.zone = ReportZone::utc();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage.mode, StorageMode::Inline);
        assert_eq!(loaded.report.zone, ReportZone::utc());
        assert_eq!(loaded.db_path, config.db_path);
    }
}
