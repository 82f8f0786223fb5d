//! CLI configuration

use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use sleeper_engine::MonitorConfig;
use std::path::PathBuf;

/// CLI configuration
///
/// Engine settings sit at the top level of the file:
///
/// ```toml
/// profile = "search"
/// ordering = "allow_gaps"
///
/// [thresholds]
/// explosion_multiplier = 1.6
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    /// Output format used when `--output` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,

    /// Decision engine settings
    #[serde(flatten)]
    pub monitor: MonitorConfig,
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: CliConfig =
                toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            Ok(CliConfig::default())
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Get the default configuration file path
    fn default_config_path() -> CliResult<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("sleeper").join("config.toml"))
    }
}
