//! Layered configuration for pghub.
//!
//! Priority, lowest first: `default.toml`, `{environment}.toml`,
//! `local.toml`, then `PGHUB_*` environment variables.

pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{DatabaseConfig, Environment, ServerConfig, Settings, StorageBackend};
