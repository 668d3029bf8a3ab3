//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, limits and the storage connection string
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Smallest accepted request-head buffer.
pub const MIN_HEADER_BYTES: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.max_connections must be at least 1")]
    ZeroConnections,

    #[error("listener.max_header_bytes must be at least {min}, got {0}", min = MIN_HEADER_BYTES)]
    HeaderBufferTooSmall(usize),

    #[error("storage.connection_string must start with 'sqlite:', got {0:?}")]
    UnsupportedStorage(String),

    #[error("assets.web_root must not be empty")]
    EmptyWebRoot,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }
    if config.listener.max_header_bytes < MIN_HEADER_BYTES {
        errors.push(ValidationError::HeaderBufferTooSmall(config.listener.max_header_bytes));
    }
    if !config.storage.connection_string.starts_with("sqlite:") {
        errors.push(ValidationError::UnsupportedStorage(config.storage.connection_string.clone()));
    }
    if config.assets.web_root.trim().is_empty() {
        errors.push(ValidationError::EmptyWebRoot);
    }
    if !matches!(
        config.observability.log_level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }
    if config.observability.prometheus_enabled
        && config.observability.prometheus_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.prometheus_address",
            value: config.observability.prometheus_address.clone(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
