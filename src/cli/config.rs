//! Configuration management for OutbreakCast
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.outbreakcast/config.toml

use crate::errors::{OutbreakError, Result};
use crate::risk::BandThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for OutbreakCast
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub banding: BandingConfig,
    pub display: DisplayConfig,
    pub fetch: FetchConfig,
    pub trend: TrendConfig,
    pub paths: PathsConfig,
}

/// Default input sources (paths or URLs)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub forecasts: Option<String>,
    pub risk_bands: Option<String>,
    pub history: Option<String>,
}

/// Quantile levels for Amber and Red
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandingConfig {
    pub amber_quantile: f64,
    pub red_quantile: f64,
}

/// Terminal output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_verbosity: String,
    pub color_output: bool,
    pub table_limit: usize,
}

/// Remote source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_sec: u64,
}

/// District trend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub history_window: usize,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: String,
    pub export_dir: String,
}

impl Default for BandingConfig {
    fn default() -> Self {
        let t = BandThresholds::default();
        Self {
            amber_quantile: t.amber,
            red_quantile: t.red,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            color_output: true,
            table_limit: 50,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_sec: 30 }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            history_window: crate::dashboard::DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "~/.outbreakcast".to_string(),
            export_dir: ".".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| OutbreakError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| OutbreakError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Config::default())
    }

    /// `~/.outbreakcast/config.toml`, when a home directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".outbreakcast").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.thresholds()
            .map_err(|e| OutbreakError::ConfigError(format!("[banding] {}", e)))?;

        if self.fetch.timeout_sec == 0 {
            return Err(OutbreakError::ConfigError(
                "timeout_sec must be greater than 0".to_string(),
            ));
        }

        if self.trend.history_window == 0 {
            return Err(OutbreakError::ConfigError(
                "history_window must be greater than 0".to_string(),
            ));
        }

        match self.display.default_verbosity.as_str() {
            "quiet" | "normal" | "verbose" | "very_verbose" => {}
            _ => {
                return Err(OutbreakError::ConfigError(format!(
                    "Invalid verbosity level: {}",
                    self.display.default_verbosity
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| OutbreakError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OutbreakError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| OutbreakError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Banding thresholds from the `[banding]` section
    pub fn thresholds(&self) -> Result<BandThresholds> {
        BandThresholds::new(self.banding.amber_quantile, self.banding.red_quantile)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_sec)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }

    /// Readline history of the interactive dashboard
    pub fn repl_history_path(&self) -> PathBuf {
        Self::expand_path("~/.outbreakcast_history")
    }

    /// Directory exports land in when no path is given
    pub fn export_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.export_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.banding.amber_quantile, 0.75);
        assert_eq!(config.banding.red_quantile, 0.90);
        assert_eq!(config.trend.history_window, 40);
        assert!(config.data.forecasts.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_band_order() {
        let mut config = Config::default();
        config.banding.amber_quantile = 0.95;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[banding]"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.fetch.timeout_sec = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_verbosity() {
        let mut config = Config::default();
        config.display.default_verbosity = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let contents = "[banding]\nred_quantile = 0.95\n\n\
                        [data]\nforecasts = \"out/forecasts.csv\"\n";
        std::fs::write(&path, contents).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.banding.red_quantile, 0.95);
        assert_eq!(config.banding.amber_quantile, 0.75);
        assert_eq!(config.data.forecasts.as_deref(), Some("out/forecasts.csv"));
        assert_eq!(config.display.table_limit, 50);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.trend.history_window = 12;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.trend.history_window, 12);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/.outbreakcast");
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = "/absolute/path";
        assert_eq!(Config::expand_path(path).to_string_lossy(), path);
    }
}
