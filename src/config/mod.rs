//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (EP_DB / EP_PORT / EP_WEB_ROOT overrides)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, read_config, ConfigError};
pub use schema::{
    AssetConfig, ListenerConfig, LogFormat, ObservabilityConfig, SearchConfig, ServerConfig,
    StorageConfig,
};
pub use validation::{validate_config, ValidationError};
