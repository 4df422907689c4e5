use serde::{Deserialize, Serialize};

use super::dialer::DialerConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

const LOCAL_CONFIG_PATH: &str = "tunnel-dialer.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/tunnel-dialer/config.toml";

/// Main configuration structure for tunnel-dialer
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub dialer: DialerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. tunnel-dialer.toml in current directory
    /// 3. /etc/tunnel-dialer/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.prefer_ipv6 {
            self.dialer.prefer_ipv6 = true;
        }
        if let Some(mark) = overrides.fwmark {
            self.dialer.fwmark = Some(mark);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dialer.max_resolve_attempts == 0 {
            return Err(ConfigError::Validation(
                "max_resolve_attempts must be at least 1".to_string(),
            ));
        }

        if self.dialer.resolve_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "resolve_timeout_secs cannot be 0".to_string(),
            ));
        }

        if self.dialer.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_secs cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Some(LOCAL_CONFIG_PATH.to_string())
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Some(SYSTEM_CONFIG_PATH.to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub prefer_ipv6: bool,
    pub fwmark: Option<u32>,
}
