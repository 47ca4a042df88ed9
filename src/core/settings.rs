//! Launcher settings management

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Name of the wrapper's data directory below the user data dir
pub const APP_DIR_NAME: &str = "HatariWrapper";

/// Tunables of the launcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    // Directories
    /// Where the emulator is unpacked and run (default: data dir)
    pub work_directory: Option<PathBuf>,
    /// Bundled emulator archives, TOS images and disk templates
    pub resources_directory: Option<PathBuf>,
    /// GEMDOS drive below the work directory
    pub mount_dir_name: String,

    // Window matching
    /// Title prefix of the emulator's main window
    pub window_title_prefix: String,
    /// How long to look for the emulator window
    pub match_timeout_ms: u64,
    /// Pause between two window list polls
    pub poll_interval_ms: u64,
    /// Wait after spawning when windows cannot be enumerated
    pub unverified_grace_ms: u64,

    // Logs
    pub stdout_log: String,
    pub stderr_log: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            work_directory: None,
            resources_directory: None,
            mount_dir_name: "drivec".to_string(),

            window_title_prefix: "Hatari v".to_string(),
            match_timeout_ms: 5000,
            poll_interval_ms: 50,
            unverified_grace_ms: 5000,

            stdout_log: "output.log".to_string(),
            stderr_log: "error.log".to_string(),
        }
    }
}

impl LauncherSettings {
    /// Base data directory of the wrapper
    pub fn get_data_directory() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Get the work directory, using default if not set
    pub fn get_work_directory(&self) -> PathBuf {
        self.work_directory
            .clone()
            .unwrap_or_else(|| Self::get_data_directory().join("hatari"))
    }

    /// Get the resources directory, using default if not set
    pub fn get_resources_directory(&self) -> PathBuf {
        self.resources_directory
            .clone()
            .unwrap_or_else(|| Self::get_data_directory().join("resources"))
    }

    pub fn match_timeout(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn unverified_grace(&self) -> Duration {
        Duration::from_millis(self.unverified_grace_ms)
    }

    pub fn with_work_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_directory = Some(dir.into());
        self
    }

    pub fn with_resources_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_directory = Some(dir.into());
        self
    }

    /// Validate settings and fix any invalid values
    pub fn validate(&mut self) {
        self.poll_interval_ms = self.poll_interval_ms.clamp(10, 1000);
        self.match_timeout_ms = self.match_timeout_ms.clamp(self.poll_interval_ms, 120_000);
        self.unverified_grace_ms = self.unverified_grace_ms.min(60_000);

        let defaults = Self::default();
        if self.window_title_prefix.is_empty() {
            self.window_title_prefix = defaults.window_title_prefix;
        }
        if self.mount_dir_name.trim().is_empty() {
            self.mount_dir_name = defaults.mount_dir_name;
        }
        if self.stdout_log.trim().is_empty() {
            self.stdout_log = defaults.stdout_log;
        }
        if self.stderr_log.trim().is_empty() {
            self.stderr_log = defaults.stderr_log;
        }
    }

    /// Load settings from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let mut settings: Self =
            serde_json::from_str(&json).context("Failed to deserialize settings")?;
        settings.validate();
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Settings saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = LauncherSettings::default();
        assert_eq!(settings.window_title_prefix, "Hatari v");
        assert_eq!(settings.match_timeout(), Duration::from_secs(5));
        assert_eq!(settings.poll_interval(), Duration::from_millis(50));
        assert!(settings.get_work_directory().ends_with("HatariWrapper/hatari"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config/settings.json");
        let settings = LauncherSettings {
            match_timeout_ms: 8000,
            ..LauncherSettings::default().with_resources_directory("/opt/hatari")
        };

        settings.save(&path).unwrap();
        let loaded = LauncherSettings::load(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = LauncherSettings::load(&temp.path().join("missing.json")).unwrap();
        assert_eq!(loaded, LauncherSettings::default());
    }

    #[test]
    fn test_load_clamps_invalid_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(
            &path,
            r#"{"poll_interval_ms": 0, "match_timeout_ms": 1, "window_title_prefix": ""}"#,
        )
        .unwrap();

        let loaded = LauncherSettings::load(&path).unwrap();

        assert_eq!(loaded.poll_interval_ms, 10);
        assert_eq!(loaded.match_timeout_ms, 10);
        assert_eq!(loaded.window_title_prefix, "Hatari v");
        assert_eq!(loaded.stdout_log, "output.log");
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(LauncherSettings::load(&path).is_err());
    }
}
