//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener.bind_address `{0}`")]
    BindAddress(String),

    #[error("invalid observability.metrics_address `{0}`")]
    MetricsAddress(String),

    #[error("reload.program must not be empty")]
    EmptyReloadProgram,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("pgbouncer.conf_dir must not be empty")]
    EmptyConfDir,

    #[error("timeouts.request_secs ({request}) must exceed reload.timeout_secs ({reload})")]
    RequestTimeoutTooShort { request: u64, reload: u64 },
}

/// Check a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.reload.program.trim().is_empty() {
        errors.push(ValidationError::EmptyReloadProgram);
    }
    if config.reload.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("reload.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    } else if config.timeouts.request_secs <= config.reload.timeout_secs {
        // A request must outlive its own reload.
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: config.timeouts.request_secs,
            reload: config.reload.timeout_secs,
        });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }
    if config.pgbouncer.conf_dir.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyConfDir);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
