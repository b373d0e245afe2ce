//! Configuration management for SLPKit.
//!
//! This module provides the application configuration:
//! - Loading from YAML files
//! - Environment variable overrides (`SLPKIT__SECTION__FIELD`)
//! - Validation of all settings
//! - Discovery and logging settings

use crate::discovery_config::DiscoveryConfig;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::Level;

/// Main application configuration.
///
/// # Examples
///
/// ```no_run
/// use slpkit_core::config::AppConfig;
///
/// let config = AppConfig::from_file("slpkit.yaml").unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Discovery engine and agent settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate, layering
    /// `SLPKIT__*` environment variables over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or merged.
    pub fn from_config_builder<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("SLPKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<()> {
        self.discovery
            .validate()
            .map_err(|reason| ConfigError::invalid_value("discovery", reason))?;

        self.logging.parse_level()?;

        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Whether to include file/line info
    #[serde(default)]
    pub file_line: bool,

    /// Per-module log levels
    #[serde(default)]
    pub module_levels: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
            file_line: false,
            module_levels: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Invalid log level: {}", self.level),
            }
            .into()
        })
    }

    /// Builds an env-filter directive such as `info,slpkit_discovery=debug`.
    pub fn filter_directive(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();

        let mut directive = self.level.clone();
        for (module, level) in modules {
            directive.push(',');
            directive.push_str(module);
            directive.push('=');
            directive.push_str(level);
        }
        directive
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
discovery:
  slptool_path: /usr/bin/slptool
  default_scope: DEFAULT
  resolve_hostnames: false
  lookup_concurrency: 2
logging:
  level: debug
  format: json
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.discovery.slptool_path,
            std::path::PathBuf::from("/usr/bin/slptool")
        );
        assert_eq!(config.discovery.default_scope, "DEFAULT");
        assert!(!config.discovery.resolve_hostnames);
        assert_eq!(config.discovery.lookup_concurrency, 2);
        assert_eq!(config.discovery.naming_authority, "*");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(AppConfig::from_yaml("discovery: [not, a, map]").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_discovery() {
        let mut config = AppConfig::default();
        config.discovery.lookup_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logging:\n  level: warn").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");

        let layered = AppConfig::from_config_builder(file.path()).unwrap();
        assert_eq!(layered.logging.level, "warn");
        assert_eq!(layered.discovery.lookup_concurrency, 8);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/slpkit.yaml").unwrap_err();
        assert!(format!("{}", err).contains("/nonexistent/slpkit.yaml"));
    }

    #[test]
    fn test_logging_parse_level() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        assert!(logging.parse_level().is_ok());

        let invalid = LoggingConfig {
            level: "invalid".to_string(),
            ..Default::default()
        };
        assert!(invalid.parse_level().is_err());
    }

    #[test]
    fn test_filter_directive() {
        let mut logging = LoggingConfig::default();
        logging
            .module_levels
            .insert("slpkit_discovery".to_string(), "trace".to_string());
        assert_eq!(logging.filter_directive(), "info,slpkit_discovery=trace");
    }
}
