// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parlor allocation service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Parlor configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParlorConfig {
    /// HTTP service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// External agent directory settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Allocation engine settings.
    #[serde(default)]
    pub allocation: AllocationConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bearer token for the admin routes. `None` leaves them open
    /// (webhook senders cannot authenticate).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8350
}

fn default_log_level() -> String {
    "info".to_string()
}

/// External agent directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Base URL of the directory API. Empty disables the live client
    /// (only useful for tests).
    #[serde(default)]
    pub api_url: String,

    /// Application id sent in the `X-App-Id` header.
    #[serde(default)]
    pub app_id: String,

    /// Secret key sent in the `X-Secret-Key` header.
    #[serde(default)]
    pub secret_key: String,

    /// Division whose agents serve inbound rooms.
    #[serde(default)]
    pub division_id: i64,

    /// Per-request timeout for directory calls, in seconds.
    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            app_id: String::new(),
            secret_key: String::new(),
            division_id: 0,
            timeout_secs: default_directory_timeout_secs(),
        }
    }
}

fn default_directory_timeout_secs() -> u64 {
    10
}

/// Allocation engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AllocationConfig {
    /// Maximum concurrent rooms one agent may hold in HANDLED state.
    #[serde(default = "default_max_customers")]
    pub max_customers: i64,

    /// Coalescing window for queue re-scan triggers, in milliseconds.
    #[serde(default = "default_debounce_window_ms")]
    pub debounce_window_ms: u64,

    /// Attempts when acquiring the re-scan guard.
    #[serde(default = "default_guard_attempts")]
    pub guard_attempts: u32,

    /// Base backoff between guard attempts, in milliseconds (linear).
    #[serde(default = "default_guard_backoff_ms")]
    pub guard_backoff_ms: u64,

    /// Attempts when the directory reports no candidates for a room.
    #[serde(default = "default_candidate_attempts")]
    pub candidate_attempts: u32,

    /// Base backoff between candidate attempts, in milliseconds (linear).
    #[serde(default = "default_candidate_backoff_ms")]
    pub candidate_backoff_ms: u64,

    /// Upper bound on one background queue re-scan, in seconds.
    #[serde(default = "default_rescan_timeout_secs")]
    pub rescan_timeout_secs: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_customers: default_max_customers(),
            debounce_window_ms: default_debounce_window_ms(),
            guard_attempts: default_guard_attempts(),
            guard_backoff_ms: default_guard_backoff_ms(),
            candidate_attempts: default_candidate_attempts(),
            candidate_backoff_ms: default_candidate_backoff_ms(),
            rescan_timeout_secs: default_rescan_timeout_secs(),
        }
    }
}

fn default_max_customers() -> i64 {
    2
}

fn default_debounce_window_ms() -> u64 {
    3000
}

fn default_guard_attempts() -> u32 {
    3
}

fn default_guard_backoff_ms() -> u64 {
    100
}

fn default_candidate_attempts() -> u32 {
    3
}

fn default_candidate_backoff_ms() -> u64 {
    250
}

fn default_rescan_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "parlor.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}
