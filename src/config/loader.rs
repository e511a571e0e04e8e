//! Configuration loading from disk and the process environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::fs;
use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { name: String, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { name, reason } => write!(f, "Invalid {}: {}", name, reason),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML settings file without validating it.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the startup configuration: optional file, then environment, then validation.
pub fn load_startup_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => read_config(p)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Layer environment variables over `config`.
///
/// | variable | effect |
/// |---|---|
/// | `API_PORT` | port of `listener.bind_address` |
/// | `API_USERNAME`, `API_PASSWORD` | Basic auth credentials |
/// | `DEBUG=true` | log level `debug` |
/// | `PGBOUNCER_CONF_DIR` | `pgbouncer.conf_dir` |
///
/// Credentials may also be given as `<NAME>_FILE`, a path whose trimmed
/// contents are used.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| -> Result<Option<String>, ConfigError> {
        if let Some(v) = env(name).filter(|v| !v.trim().is_empty()) {
            return Ok(Some(v));
        }
        let file_var = format!("{}_FILE", name);
        match env(&file_var).filter(|v| !v.trim().is_empty()) {
            Some(p) => fs::read_to_string(PathBuf::from(p.trim()))
                .map(|s| Some(s.trim().to_string()))
                .map_err(|e| ConfigError::Env { name: file_var, reason: e.to_string() }),
            None => Ok(None),
        }
    };

    if let Some(port) = lookup("API_PORT")? {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            name: "API_PORT".into(),
            reason: format!("`{}` is not a port number", port),
        })?;
        let mut addr: SocketAddr = config.listener.bind_address.parse().map_err(|_| ConfigError::Env {
            name: "API_PORT".into(),
            reason: format!("bind address `{}` is invalid", config.listener.bind_address),
        })?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    if let Some(username) = lookup("API_USERNAME")? {
        config.auth.username = username;
    }
    if let Some(password) = lookup("API_PASSWORD")? {
        config.auth.password = password;
    }
    if lookup("DEBUG")?.is_some_and(|v| v.trim().eq_ignore_ascii_case("true")) {
        config.observability.log_level = "debug".into();
    }
    if let Some(dir) = lookup("PGBOUNCER_CONF_DIR")? {
        config.pgbouncer.conf_dir = PathBuf::from(dir.trim());
    }
    Ok(())
}
