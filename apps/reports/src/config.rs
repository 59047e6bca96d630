//! # Report Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --db ./fixbay.db --format json --branch main                       │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     FIXBAY_DB_PATH, FIXBAY_BRANCH_ID, FIXBAY_OUTPUT_FORMAT             │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/fixbay-erp/reports.toml (Linux)                          │
//! │     ~/Library/Application Support/com.fixbay.erp/reports.toml (macOS)  │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/fixbay/fixbay.db"
//! max_connections = 5
//!
//! [report]
//! branch_id = "main"
//! output_format = "table"   # table | json
//! include_zero_stock = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use fixbay_core::validation::validate_identifier;

use crate::render::OutputFormat;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file holding the read models.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "fixbay", "erp")
        .map(|dirs| dirs.data_dir().join("fixbay.db"))
        .unwrap_or_else(|| PathBuf::from("./fixbay.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Branch used by `valuation`, `margins` and `layers` when `--branch`
    /// is absent or blank. `None` reports across all branches.
    #[serde(default)]
    pub branch_id: Option<String>,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Show zero-quantity rows in the valuation report.
    #[serde(default)]
    pub include_zero_stock: bool,
}

// =============================================================================
// Report Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub report: ReportSettings,
}

impl ReportConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (reports.toml)
    /// 3. Environment variables
    ///
    /// An explicitly given path must exist; the default path may not.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading report config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else if explicit {
                return Err(ConfigError::Invalid(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if let Some(branch) = &self.report.branch_id {
            validate_identifier("report.branch_id", branch)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Applies `FIXBAY_*` overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("FIXBAY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(branch) = lookup("FIXBAY_BRANCH_ID") {
            debug!(branch_id = %branch, "Overriding branch from environment");
            self.report.branch_id = Some(branch).filter(|b| !b.trim().is_empty());
        }

        if let Some(format) = lookup("FIXBAY_OUTPUT_FORMAT") {
            match format.parse() {
                Ok(parsed) => self.report.output_format = parsed,
                Err(_) => warn!(format = %format, "Unknown output format in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "fixbay", "erp")
            .map(|dirs| dirs.config_dir().join("reports.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.report.output_format, OutputFormat::Table);
        assert_eq!(config.report.branch_id, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections_are_optional() {
        let config = ReportConfig::from_toml(
            r#"
            [report]
            branch_id = "north"
            output_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.report.branch_id.as_deref(), Some("north"));
        assert_eq!(config.report.output_format, OutputFormat::Json);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = ReportConfig::from_toml("[report\nbranch_id = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ReportConfig::default();
        config.apply_env_overrides(env(&[
            ("FIXBAY_DB_PATH", "/tmp/reports.db"),
            ("FIXBAY_BRANCH_ID", "main"),
            ("FIXBAY_OUTPUT_FORMAT", "json"),
        ]));

        assert_eq!(config.database.path, PathBuf::from("/tmp/reports.db"));
        assert_eq!(config.report.branch_id.as_deref(), Some("main"));
        assert_eq!(config.report.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_env_format_is_ignored() {
        let mut config = ReportConfig::default();
        config.apply_env_overrides(env(&[("FIXBAY_OUTPUT_FORMAT", "xml")]));
        assert_eq!(config.report.output_format, OutputFormat::Table);
    }

    #[test]
    fn test_validation() {
        let mut config = ReportConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = ReportConfig::default();
        config.report.branch_id = Some("x".repeat(65));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ReportConfig::load(Some(PathBuf::from("/nonexistent/reports.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
