//! Configuration schema definitions.
//!
//! This module defines the complete settings structure for the service.
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the configuration API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Location of the managed PgBouncer configuration.
    pub pgbouncer: PgBouncerConfig,

    /// How to ask PgBouncer to reload.
    pub reload: ReloadConfig,

    /// HTTP Basic credentials. Auth is off when both are blank.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:6488").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:6488".to_string(),
        }
    }
}

/// Paths of the managed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PgBouncerConfig {
    /// Directory holding pgbouncer.ini; uploaded files are placed here too.
    pub conf_dir: PathBuf,

    /// Explicit ini path. Defaults to `<conf_dir>/pgbouncer.ini`.
    pub ini_file: Option<PathBuf>,
}

impl PgBouncerConfig {
    /// Resolved path of the ini file.
    pub fn ini_path(&self) -> PathBuf {
        self.ini_file
            .clone()
            .unwrap_or_else(|| self.conf_dir.join("pgbouncer.ini"))
    }
}

impl Default for PgBouncerConfig {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from("/opt/bitnami/pgbouncer/conf"),
            ini_file: None,
        }
    }
}

/// Reload command configuration.
///
/// The command must print `RELOAD` on success. The confirmation token is
/// fixed and not configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Program to execute.
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Admin console directive written to the program's stdin.
    pub directive: String,

    /// Deadline for the whole reload exchange in seconds.
    pub timeout_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            program: "su".to_string(),
            args: vec![
                "-c".to_string(),
                "\"/opt/bitnami/postgresql/bin/psql\" -p 6432 pgbouncer".to_string(),
                "pgbouncer".to_string(),
            ],
            directive: "RELOAD".to_string(),
            timeout_secs: 10,
        }
    }
}

/// HTTP Basic authentication.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.username.trim().is_empty() || !self.password.trim().is_empty()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes (uploads included).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
