//! Configuration management for the organizer engine.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/organizer/config.toml`.
//!
//! The system-directory deny-list lives here as data, keyed by platform,
//! rather than as code branches inside the validator.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("max_rename_attempts must be between 1 and 9999, got {0}")]
    InvalidMaxRenameAttempts(u32),

    #[error("system deny-list entry must be an absolute path, got {0}")]
    RelativeDenyListEntry(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Hard upper bound on counter-based rename probes.
pub const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Main configuration structure for the organizer engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Session behavior configuration.
    pub session: SessionConfig,

    /// Safety settings, including the system-directory deny-list.
    pub safety: SafetyConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for session logs and audit streams.
    pub log_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Session behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum counter-based rename probes before the timestamp fallback.
    pub max_rename_attempts: u32,
}

/// Safety settings.
///
/// The deny-list is a platform-keyed table; the validator consults whichever
/// side matches the running platform and never touches paths under it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    /// Protected system directories on Unix-like platforms.
    pub unix_system_dirs: Vec<PathBuf>,

    /// Protected system directories on Windows.
    pub windows_system_dirs: Vec<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rename_attempts: MAX_RENAME_ATTEMPTS,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            unix_system_dirs: [
                "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/etc", "/sys", "/proc", "/dev", "/boot",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            windows_system_dirs: [
                "C:\\Windows",
                "C:\\Program Files",
                "C:\\Program Files (x86)",
                "C:\\System32",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

impl SafetyConfig {
    /// The deny-list for the running platform.
    pub fn platform_deny_list(&self) -> &[PathBuf] {
        if cfg!(windows) {
            &self.windows_system_dirs
        } else {
            &self.unix_system_dirs
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("organizer")
        .join("config.toml")
}

/// Returns the default log directory path.
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("organizer")
        .join("logs")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - ORGANIZER_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    /// - ORGANIZER_LOG_DIR: Override the log directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("ORGANIZER_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.logging.log_level = level;
            }
        }

        if let Ok(dir) = std::env::var("ORGANIZER_LOG_DIR") {
            if !dir.is_empty() {
                tracing::info!("Overriding log_dir from environment: {}", dir);
                self.logging.log_dir = PathBuf::from(dir);
            }
        }
    }

    /// Validate the configuration values.
    ///
    /// Returns an error if any configuration value is outside the valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.log_level.clone()));
        }

        let attempts = self.session.max_rename_attempts;
        if attempts < 1 || attempts > MAX_RENAME_ATTEMPTS {
            return Err(ConfigError::InvalidMaxRenameAttempts(attempts));
        }

        // Relative deny-list entries would never match a canonical path.
        for entry in self
            .safety
            .unix_system_dirs
            .iter()
            .chain(self.safety.windows_system_dirs.iter())
        {
            if entry.is_relative() {
                return Err(ConfigError::RelativeDenyListEntry(
                    entry.display().to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", e.message()))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.session.max_rename_attempts, 9999);
        assert!(config
            .safety
            .unix_system_dirs
            .contains(&PathBuf::from("/etc")));
        assert!(config
            .safety
            .windows_system_dirs
            .contains(&PathBuf::from("C:\\Windows")));
    }

    #[test]
    fn test_platform_deny_list_nonempty() {
        let config = SafetyConfig::default();
        assert!(!config.platform_deny_list().is_empty());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[logging]
log_level = "debug"

[session]
max_rename_attempts = 50
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.session.max_rename_attempts, 50);
        // Other values should be defaults
        assert!(!config.safety.unix_system_dirs.is_empty());
    }

    #[test]
    fn test_from_toml_custom_deny_list() {
        let toml = r#"
[safety]
unix_system_dirs = ["/etc", "/opt/locked"]
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(
            config.safety.unix_system_dirs,
            vec![PathBuf::from("/etc"), PathBuf::from("/opt/locked")]
        );
        // Windows side keeps its defaults
        assert!(!config.safety.windows_system_dirs.is_empty());
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let result = Config::from_toml("[logging\nlog_level = \"debug\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut original = Config::default();
        original.logging.log_level = "warn".to_string();
        original.session.max_rename_attempts = 42;

        let toml = original.to_toml().unwrap();
        let loaded = Config::from_toml(&toml).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.logging.log_level = "debug".to_string();

        original.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let result = Config::load(&config_path);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_log_level_invalid() {
        let mut config = Config::default();
        config.logging.log_level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    fn test_validate_log_level_case_insensitive() {
        let mut config = Config::default();
        config.logging.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_rename_attempts_zero() {
        let mut config = Config::default();
        config.session.max_rename_attempts = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidMaxRenameAttempts(0))
        );
    }

    #[test]
    fn test_validate_max_rename_attempts_too_high() {
        let mut config = Config::default();
        config.session.max_rename_attempts = 10000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidMaxRenameAttempts(10000))
        );
    }

    #[test]
    fn test_validate_relative_deny_list_entry() {
        let mut config = Config::default();
        config.safety.unix_system_dirs.push(PathBuf::from("etc"));
        assert_eq!(
            config.validate(),
            Err(ConfigError::RelativeDenyListEntry("etc".to_string()))
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("organizer"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    #[serial]
    fn test_env_override_log_level() {
        std::env::set_var("ORGANIZER_LOG_LEVEL", "debug");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.logging.log_level, "debug");

        std::env::remove_var("ORGANIZER_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        std::env::set_var("ORGANIZER_LOG_LEVEL", "");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.logging.log_level, "info");

        std::env::remove_var("ORGANIZER_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_env_override_log_dir() {
        std::env::set_var("ORGANIZER_LOG_DIR", "/tmp/organizer-test-logs");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(
            config.logging.log_dir,
            PathBuf::from("/tmp/organizer-test-logs")
        );

        std::env::remove_var("ORGANIZER_LOG_DIR");
    }
}
