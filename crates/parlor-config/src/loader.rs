// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parlor.toml` > `~/.config/parlor/parlor.toml` > `/etc/parlor/parlor.toml`
//! with environment variable overrides via `PARLOR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParlorConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parlor/parlor.toml` (system-wide)
/// 3. `~/.config/parlor/parlor.toml` (user XDG config)
/// 4. `./parlor.toml` (local directory)
/// 5. `PARLOR_*` environment variables
pub fn load_config() -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::file("/etc/parlor/parlor.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parlor/parlor.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("parlor.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PARLOR_DIRECTORY_SECRET_KEY`
/// must map to `directory.secret_key`, not `directory.secret.key`.
fn env_provider() -> Env {
    Env::prefixed("PARLOR_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PARLOR_ALLOCATION_MAX_CUSTOMERS -> "allocation_max_customers"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("directory_", "directory.", 1)
            .replacen("allocation_", "allocation.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_extracts_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.allocation.max_customers, 2);
        assert_eq!(config.directory.timeout_secs, 10);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[allocation]
max_customers = 5

[directory]
api_url = "https://directory.example.com/api"
division_id = 12
"#,
        )
        .unwrap();
        assert_eq!(config.allocation.max_customers, 5);
        assert_eq!(config.directory.api_url, "https://directory.example.com/api");
        assert_eq!(config.directory.division_id, 12);
        // Untouched sections keep defaults.
        assert_eq!(config.service.port, 8350);
    }

    #[test]
    #[serial_test::serial]
    fn env_var_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLOR_ALLOCATION_MAX_CUSTOMERS", "7");
            jail.set_env("PARLOR_DIRECTORY_SECRET_KEY", "s3cr3t");
            let config: ParlorConfig = Figment::new()
                .merge(Serialized::defaults(ParlorConfig::default()))
                .merge(Toml::string("[allocation]\nmax_customers = 3"))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.allocation.max_customers, 7);
            assert_eq!(config.directory.secret_key, "s3cr3t");
            Ok(())
        });
    }
}
