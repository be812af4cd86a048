//! Configuration management for rentledger
//!
//! Loads and validates the YAML configuration. Every field has a default, so an
//! empty file (or no file at all) yields a usable configuration.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Tax settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Rate applied when a calculation does not supply one (percent)
    #[serde(default = "default_tax_rate")]
    pub default_rate_percent: f64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            default_rate_percent: default_tax_rate(),
        }
    }
}

fn default_tax_rate() -> f64 {
    25.0
}

/// Currency and rounding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency code shown alongside amounts
    #[serde(default = "default_currency")]
    pub code: String,
    /// Decimal places derived amounts are rounded to
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Change-triggered recompute settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeConfig {
    /// Recompute summaries when payment status changes
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Pending change events held before publishers start dropping
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Number of stale-summary reports kept for operators
    #[serde(default = "default_failure_log_size")]
    pub failure_log_size: usize,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
            failure_log_size: default_failure_log_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    256
}

fn default_failure_log_size() -> usize {
    100
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// JSON seed file with payments and expenses
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tax: TaxConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub recompute: RecomputeConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
                message: e.to_string(),
            })?
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let rate = self.tax.default_rate_percent;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "tax.default_rate_percent".to_string(),
                reason: "Tax rate must be a non-negative finite percentage".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if self.recompute.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recompute.queue_capacity".to_string(),
                reason: "Queue capacity must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Default configuration file contents
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
