use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Monitor daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sweeps: SweepConfig,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Remote identifier of the target country. Fixed pair with
    /// `target_service`; not user-configurable at runtime.
    #[serde(default = "default_target_country")]
    pub target_country: String,
    #[serde(default = "default_target_service")]
    pub target_service: String,
    /// Human-readable labels stored on order records.
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Price estimate used when the price endpoint fails.
    #[serde(default = "default_fallback_price")]
    pub fallback_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Rental TTL assumed when the purchase response does not quote one.
    #[serde(default = "default_order_ttl")]
    pub order_ttl_secs: u64,
    /// Delay between entities inside one sweep, to respect upstream rate
    /// limits.
    #[serde(default = "default_entity_delay")]
    pub entity_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://api.smspool.net".to_string()
}

fn default_target_country() -> String {
    "157".to_string()
}

fn default_target_service() -> String {
    "1552".to_string()
}

fn default_country_code() -> String {
    "jp".to_string()
}

fn default_service_name() -> String {
    "Pokemon Center".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_fallback_price() -> f64 {
    4.80
}

fn default_database_path() -> String {
    "rental.db".to_string()
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_order_ttl() -> u64 {
    600
}

fn default_entity_delay() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            target_country: default_target_country(),
            target_service: default_target_service(),
            country_code: default_country_code(),
            service_name: default_service_name(),
            request_timeout_secs: default_request_timeout(),
            fallback_price: default_fallback_price(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            order_ttl_secs: default_order_ttl(),
            entity_delay_ms: default_entity_delay(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            sweeps: SweepConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from YAML file, then apply environment overrides
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: MonitorConfig = serde_yaml::from_str(&yaml_content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("SMSPOOL_API_BASE") {
            info!("Overriding API base URL from environment variable");
            self.api.base_url = base_url;
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            info!("Overriding database path from environment variable");
            self.database.path = path;
        }

        if let Ok(interval) = std::env::var("MONITORING_INTERVAL") {
            match interval.parse() {
                Ok(secs) => self.sweeps.sweep_interval_secs = secs,
                Err(_) => warn!("Ignoring invalid MONITORING_INTERVAL: {}", interval),
            }
        }

        if let Ok(ttl) = std::env::var("SMS_TIMEOUT") {
            match ttl.parse() {
                Ok(secs) => self.sweeps.order_ttl_secs = secs,
                Err(_) => warn!("Ignoring invalid SMS_TIMEOUT: {}", ttl),
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }

        if self.database.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path must not be empty".to_string(),
            ));
        }

        if self.sweeps.sweep_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sweeps.sweep_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.sweeps.order_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sweeps.order_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  API base URL: {}", self.api.base_url);
        info!(
            "  Target country/service: {}/{}",
            self.api.target_country, self.api.target_service
        );
        info!("  Sweep interval: {} seconds", self.sweeps.sweep_interval_secs);
        info!("  Order TTL: {} seconds", self.sweeps.order_ttl_secs);
        info!("  Database path: {}", self.database.path);
        info!("  Log level: {}", self.log_level);
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweeps.sweep_interval_secs)
    }

    pub fn order_ttl(&self) -> Duration {
        Duration::from_secs(self.sweeps.order_ttl_secs)
    }

    pub fn entity_delay(&self) -> Duration {
        Duration::from_millis(self.sweeps.entity_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}
