//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::ValidationError;

/// Database connection string override.
pub const ENV_DB: &str = "EP_DB";
/// Listen port override.
pub const ENV_PORT: &str = "EP_PORT";
/// Static file root override.
pub const ENV_WEB_ROOT: &str = "EP_WEB_ROOT";

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load a TOML file. Validation runs later, once env and CLI overrides
/// have been applied.
pub fn read_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply `EP_DB`, `EP_PORT` and `EP_WEB_ROOT` from the process environment.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup. Empty values are ignored, and so
/// is a port that does not parse.
pub fn apply_overrides_from<F>(config: &mut ServerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(db) = lookup(ENV_DB) {
        config.storage.connection_string = db;
    }
    if let Some(port) = lookup(ENV_PORT) {
        match port.trim().parse::<u16>() {
            Ok(port) => config.listener.set_port(port),
            Err(_) => tracing::warn!(value = %port, "Ignoring unparseable {ENV_PORT}"),
        }
    }
    if let Some(root) = lookup(ENV_WEB_ROOT) {
        config.assets.web_root = root;
    }
}
