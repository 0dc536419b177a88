//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{FarmPoolError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_group_buy_config(&settings.group_buy)?;
    validate_realtime_config(&settings.realtime)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(FarmPoolError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(FarmPoolError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(FarmPoolError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(FarmPoolError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(FarmPoolError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.directory.is_some() && config.file_name.is_empty() {
        return Err(FarmPoolError::Config(
            "Log file name is required when a log directory is set".to_string()
        ));
    }

    Ok(())
}

/// Validate group buy rules
fn validate_group_buy_config(config: &super::GroupBuyConfig) -> Result<()> {
    if config.invite_code_attempts == 0 {
        return Err(FarmPoolError::Config(
            "Invite code attempts must be greater than 0".to_string()
        ));
    }

    if config.default_listing_limit <= 0 {
        return Err(FarmPoolError::Config(
            "Default listing limit must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate realtime configuration
fn validate_realtime_config(config: &super::RealtimeConfig) -> Result<()> {
    // NOTIFY channels are plain identifiers
    let valid_channel = !config.channel.is_empty()
        && config.channel.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid_channel {
        return Err(FarmPoolError::Config(
            format!("Invalid realtime channel name: {:?}", config.channel)
        ));
    }

    if config.buffer_size == 0 {
        return Err(FarmPoolError::Config(
            "Realtime buffer size must be greater than 0".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(FarmPoolError::Config(_)));

        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        assert_matches!(validate_settings(&settings), Err(FarmPoolError::Config(_)));

        let mut settings = Settings::default();
        settings.group_buy.invite_code_attempts = 0;
        assert_matches!(validate_settings(&settings), Err(FarmPoolError::Config(_)));

        let mut settings = Settings::default();
        settings.realtime.channel = "group-buys; DROP".to_string();
        assert_matches!(validate_settings(&settings), Err(FarmPoolError::Config(_)));
    }
}
