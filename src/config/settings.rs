//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub group_buy: GroupBuyConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; stdout only when unset
    pub directory: Option<String>,
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub json: bool,
}

/// Which price the tier discount is applied to on each join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBase {
    /// The group's current unit price, so discounts compound across joins
    UnitPrice,
    /// The base price captured when the group was created
    BasePrice,
}

/// Group buy rules
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupBuyConfig {
    pub pricing_base: PricingBase,
    pub enforce_deadline: bool,
    pub invite_code_attempts: u32,
    pub default_listing_limit: i64,
}

/// Realtime change feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Must match the database's `farmpool.notify_channel` setting
    pub channel: String,
    pub buffer_size: usize,
}

fn default_acquire_timeout_seconds() -> u64 {
    30
}

fn default_log_file_name() -> String {
    "farmpool.log".to_string()
}

impl Default for GroupBuyConfig {
    fn default() -> Self {
        Self {
            pricing_base: PricingBase::UnitPrice,
            enforce_deadline: true,
            invite_code_attempts: 5,
            default_listing_limit: 20,
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel: "group_buy_changes".to_string(),
            buffer_size: 256,
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    ///
    /// Environment keys use `FARMPOOL` as prefix and `__` between sections,
    /// e.g. `FARMPOOL_DATABASE__URL`.
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("FARMPOOL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::FarmPoolError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/farmpool".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: default_acquire_timeout_seconds(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
                file_name: default_log_file_name(),
                json: false,
            },
            group_buy: GroupBuyConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}
