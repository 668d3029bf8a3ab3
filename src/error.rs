//! Top-level error type for server startup and the accept loop.
//!
//! Per-request failures never reach this type: the router converts them into
//! `4xx` responses and storage failures into empty results.

use thiserror::Error;

use crate::config::ConfigError;
use crate::net::listener::ListenerError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
