//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::resample::ResampleSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resample: ResampleSettingsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resample engine policy
#[derive(Debug, Clone, Deserialize)]
pub struct ResampleSettingsConfig {
    #[serde(default = "default_target_buckets")]
    pub target_time_buckets: usize,

    #[serde(default = "default_numeric_bins")]
    pub numeric_bin_count: usize,
}

fn default_target_buckets() -> usize {
    ResampleSettings::DEFAULT_TARGET_TIME_BUCKETS
}

fn default_numeric_bins() -> usize {
    ResampleSettings::DEFAULT_NUMERIC_BIN_COUNT
}

impl Default for ResampleSettingsConfig {
    fn default() -> Self {
        Self {
            target_time_buckets: default_target_buckets(),
            numeric_bin_count: default_numeric_bins(),
        }
    }
}

impl ResampleSettingsConfig {
    /// Engine settings; zero counts are raised to one
    pub fn settings(&self) -> ResampleSettings {
        ResampleSettings {
            target_time_buckets: self.target_time_buckets.max(1),
            numeric_bin_count: self.numeric_bin_count.max(1),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let loaded = Self::discover();
        loaded.log();
        loaded.config
    }

    /// Load from default locations, reporting which file was used
    ///
    /// Nothing is logged; call [`LoadedConfig::log`] once a subscriber is
    /// installed.
    pub fn discover() -> LoadedConfig {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("batchscope").join("config.toml")),
            Some(PathBuf::from("/etc/batchscope/config.toml")),
            Some(PathBuf::from("./batchscope.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::discover_in(&config_paths)
    }

    /// First candidate that exists and parses wins
    fn discover_in(paths: &[PathBuf]) -> LoadedConfig {
        let mut failures = Vec::new();

        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::load_with_env(path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: Some(path.clone()),
                        failures,
                    }
                }
                Err(e) => failures.push(e),
            }
        }

        LoadedConfig {
            config: Self::from_env(),
            source: None,
            failures,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = lookup("BATCHSCOPE_TARGET_BUCKETS").and_then(|v| v.parse().ok()) {
            self.resample.target_time_buckets = n;
        }
        if let Some(n) = lookup("BATCHSCOPE_NUMERIC_BINS").and_then(|v| v.parse().ok()) {
            self.resample.numeric_bin_count = n;
        }

        if let Some(level) = lookup("BATCHSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("BATCHSCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Outcome of searching the default config locations
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config came from; `None` means defaults plus environment
    pub source: Option<PathBuf>,
    /// Candidates that existed but failed to load
    pub failures: Vec<ConfigError>,
}

impl LoadedConfig {
    pub fn log(&self) {
        for e in &self.failures {
            tracing::warn!("Failed to load config: {}", e);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::debug!("Using default config with environment overrides"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Batchscope Configuration
#
# Environment variables override these settings:
# - BATCHSCOPE_TARGET_BUCKETS
# - BATCHSCOPE_NUMERIC_BINS
# - BATCHSCOPE_LOG_LEVEL
# - BATCHSCOPE_LOG_FORMAT

[resample]
# Bucket count the automatic time granularity aims for
target_time_buckets = 24

# Bin count for numeric dimensions without hints
numeric_bin_count = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for terminals) or json (for pipelines)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.resample.target_time_buckets, 24);
        assert_eq!(config.resample.numeric_bin_count, 10);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.resample.settings(), ResampleSettings::default());
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();

        assert_eq!(config.resample.target_time_buckets, 24);
        assert_eq!(config.resample.numeric_bin_count, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[resample]\nnumeric_bin_count = 0\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.resample.numeric_bin_count, 0);
        assert_eq!(config.resample.target_time_buckets, 24);
        assert_eq!(config.resample.settings().numeric_bin_count, 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[resample\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_discover_reports_source_and_failures() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        let good = dir.path().join("good.toml");
        std::fs::write(&bad, "[resample\n").unwrap();
        std::fs::write(&good, "[logging]\nlevel = \"debug\"\n").unwrap();

        let candidates = vec![dir.path().join("missing.toml"), bad, good.clone()];
        let loaded = Config::discover_in(&candidates);

        assert_eq!(loaded.source, Some(good));
        assert_eq!(loaded.failures.len(), 1);
        assert!(matches!(loaded.failures[0], ConfigError::Parse { .. }));

        let none = Config::discover_in(&[dir.path().join("missing.toml")]);
        assert!(none.source.is_none());
        assert!(none.failures.is_empty());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BATCHSCOPE_TARGET_BUCKETS", "12"),
            ("BATCHSCOPE_NUMERIC_BINS", "not a number"),
            ("BATCHSCOPE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.resample.target_time_buckets, 12);
        assert_eq!(config.resample.numeric_bin_count, 10);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
    }
}
