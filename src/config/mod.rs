//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions, loading and environment overrides
//! - [`defaults`]: serde default values
//! - [`validation`]: startup checks that collect every problem at once

mod defaults;
mod types;
pub mod validation;

pub use defaults::DEFAULT_CONFIG_PATH;
pub use types::{
    AssistantConfig, Config, ConfigError, DatabaseConfig, ENV_LOG_DESTINATION, ENV_MEDIA_API_KEY,
    ENV_OWNER_ID, LoggingConfig, MediaConfig, OwnerConfig, PropagationConfig,
};
