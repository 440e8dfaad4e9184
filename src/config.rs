//! Configuration management for ecs-scope.
//!
//! This module handles loading configuration from a TOML file located at
//! `~/.ecs-scope/config.toml`. Configuration includes AWS settings, display
//! preferences and logging.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for ecs-scope.
///
/// All configuration options are optional and will fall back to sensible defaults
/// if not specified in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// AWS-specific configuration options
    #[serde(default)]
    pub aws: AwsConfig,

    /// UI and display configuration
    #[serde(default)]
    pub ui: UiConfig,

    /// Log file configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// AWS SDK configuration options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AwsConfig {
    /// Default AWS region (e.g., "us-east-1")
    /// If not specified, will use AWS SDK's default resolution (env vars, profile, etc.)
    pub region: Option<String>,

    /// AWS profile name to use from ~/.aws/credentials
    /// If not specified, will use the default profile
    pub profile: Option<String>,
}

/// UI configuration options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// Width in cells of the CPU/memory meters in the cluster table
    #[serde(default = "default_cluster_meter_width")]
    pub cluster_meter_width: usize,

    /// Width in cells of the CPU/memory meters on the instances page
    #[serde(default = "default_instance_meter_width")]
    pub instance_meter_width: usize,

    /// Compare instance agent versions against the latest ECS agent release
    #[serde(default = "default_true")]
    pub check_agent_version: bool,
}

/// Logging configuration options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset (e.g. "info", "ecs_scope=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; defaults to ~/.ecs-scope/ecs-scope.log
    pub file: Option<PathBuf>,
}

fn default_cluster_meter_width() -> usize {
    10
}

fn default_instance_meter_width() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            cluster_meter_width: default_cluster_meter_width(),
            instance_meter_width: default_instance_meter_width(),
            check_agent_version: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

const DEFAULT_CONFIG_TOML: &str = r#"# ecs-scope configuration file
# This file is automatically generated with default values.

[aws]
# Default AWS region to use (optional)
# If not specified, uses AWS SDK's default resolution (env vars, ~/.aws/config, etc.)
# region = "us-east-1"

# AWS profile to use from ~/.aws/credentials (optional)
# profile = "default"

[ui]
# Meter widths in terminal cells
cluster_meter_width = 10
instance_meter_width = 5

# Look up the latest ECS agent release to flag outdated instances
check_agent_version = true

[logging]
# Used when RUST_LOG is not set
level = "info"

# Log file (optional), defaults to ~/.ecs-scope/ecs-scope.log
# file = "/tmp/ecs-scope.log"
"#;

impl Config {
    /// Returns the path to the configuration directory (~/.ecs-scope/)
    pub fn config_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(".ecs-scope"))
    }

    /// Returns the path to the configuration file (~/.ecs-scope/config.toml)
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Log file to write to, from config or the default location.
    pub fn log_file_path(&self) -> Result<PathBuf> {
        match &self.logging.file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("ecs-scope.log")),
        }
    }

    /// Loads configuration from the default location, creating it with
    /// commented defaults if it doesn't exist.
    ///
    /// # Errors
    /// This function will return an error if:
    /// - Home directory cannot be determined
    /// - File I/O operations fail
    /// - TOML parsing fails
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let default_config = Config::default();
            Self::create_default_config(&config_path)?;
            Ok(default_config)
        }
    }

    /// Loads configuration from an explicit path, which must exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {config_path:?}"))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Writes the commented default configuration to `config_path`.
    ///
    /// # Errors
    /// This function will return an error if:
    /// - Directory creation fails
    /// - File write operations fail
    pub fn create_default_config(config_path: &Path) -> Result<()> {
        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).with_context(|| {
                    format!("Failed to create config directory: {config_dir:?}")
                })?;
            }
        }

        fs::write(config_path, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("Failed to write config file: {config_path:?}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.ui.cluster_meter_width, 10);
        assert_eq!(config.ui.instance_meter_width, 5);
        assert!(config.ui.check_agent_version);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert!(config.aws.region.is_none());
        assert!(config.aws.profile.is_none());
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let config = Config::parse(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[aws]
region = "us-west-2"
profile = "production"

[ui]
cluster_meter_width = 20
check_agent_version = false

[logging]
level = "ecs_scope=debug"
file = "/tmp/scope.log"
"#;

        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.aws.region, Some("us-west-2".to_string()));
        assert_eq!(config.aws.profile, Some("production".to_string()));
        assert_eq!(config.ui.cluster_meter_width, 20);
        assert_eq!(config.ui.instance_meter_width, 5);
        assert!(!config.ui.check_agent_version);
        assert_eq!(config.logging.level, "ecs_scope=debug");
        assert_eq!(
            config.log_file_path().unwrap(),
            PathBuf::from("/tmp/scope.log")
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[aws]
region = "eu-west-1"
"#;

        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.aws.region, Some("eu-west-1".to_string()));
        assert_eq!(config.aws.profile, None);
        assert_eq!(config.ui, UiConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(Config::parse("[ui]\ncluster_meter_width = \"wide\"").is_err());
    }
}
