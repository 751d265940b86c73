// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive capacity limits and well-formed URLs.

use crate::diagnostic::ConfigError;
use crate::model::ParlorConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParlorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty and looks like an IP or hostname
    let host = config.service.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("service.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate directory api_url is http(s) when configured
    let api_url = config.directory.api_url.trim();
    if !api_url.is_empty() && !api_url.starts_with("http://") && !api_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("directory.api_url `{api_url}` must start with http:// or https://"),
        });
    }

    if config.directory.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "directory.timeout_secs must be at least 1".to_string(),
        });
    }

    // Validate allocation limits
    if config.allocation.max_customers < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "allocation.max_customers must be at least 1, got {}",
                config.allocation.max_customers
            ),
        });
    }

    if config.allocation.debounce_window_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "allocation.debounce_window_ms must be at least 1".to_string(),
        });
    }

    if config.allocation.guard_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: "allocation.guard_attempts must be at least 1".to_string(),
        });
    }

    if config.allocation.candidate_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: "allocation.candidate_attempts must be at least 1".to_string(),
        });
    }

    if config.allocation.rescan_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "allocation.rescan_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ParlorConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ParlorConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_capacity_fails_validation() {
        let mut config = ParlorConfig::default();
        config.allocation.max_customers = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_customers"))));
    }

    #[test]
    fn bad_api_url_scheme_fails_validation() {
        let mut config = ParlorConfig::default();
        config.directory.api_url = "ftp://directory.example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("api_url"))));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = ParlorConfig::default();
        config.service.host = "0.0.0.0".to_string();
        config.directory.api_url = "https://directory.example.com/api".to_string();
        config.allocation.max_customers = 4;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = ParlorConfig::default();
        config.allocation.max_customers = 0;
        config.allocation.guard_attempts = 0;
        config.storage.database_path = " ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
