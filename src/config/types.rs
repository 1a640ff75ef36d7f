//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use super::defaults::{default_database_path, default_room_delay_ms, default_start_delay_ms};
use crate::model::ParticipantId;
use crate::platform::Destination;

/// Environment variable overriding `owner.id`.
pub const ENV_OWNER_ID: &str = "ROOMWARDEN_OWNER_ID";
/// Environment variable overriding `media.api_key`.
pub const ENV_MEDIA_API_KEY: &str = "ROOMWARDEN_MEDIA_API_KEY";
/// Environment variable overriding `logging.destination`.
pub const ENV_LOG_DESTINATION: &str = "ROOMWARDEN_LOG_DESTINATION";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{name} is not a valid identity: {value:?}")]
    Env { name: &'static str, value: String },
}

/// Assistant configuration. Immutable once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// The fixed owner identity.
    #[serde(default)]
    pub owner: OwnerConfig,
    /// The assistant's own identity on the platform.
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// External media search (optional feature).
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Unban sweep pacing.
    #[serde(default)]
    pub propagation: PropagationConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `ROOMWARDEN_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// An unparseable owner id is an error. An unparseable log destination
    /// is logged and discarded, so operational logs go to the owner.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var(ENV_OWNER_ID) {
            let id = value.trim().parse().map_err(|_| ConfigError::Env {
                name: ENV_OWNER_ID,
                value: value.clone(),
            })?;
            self.owner.id = Some(id);
        }

        if let Some(value) = var(ENV_MEDIA_API_KEY)
            && !value.trim().is_empty()
        {
            self.media.api_key = Some(value);
        }

        if let Some(value) = var(ENV_LOG_DESTINATION) {
            match value.trim().parse() {
                Ok(destination) => self.logging.destination = Some(destination),
                Err(_) => {
                    error!(
                        value = %value,
                        "{} is not a valid identity, falling back to the owner", ENV_LOG_DESTINATION
                    );
                    self.logging.destination = None;
                }
            }
        }

        Ok(())
    }

    /// Owner identity. Only meaningful after validation.
    pub fn owner_id(&self) -> ParticipantId {
        self.owner.id.unwrap_or_default()
    }

    /// The assistant's own identity. Only meaningful after validation.
    pub fn assistant_id(&self) -> ParticipantId {
        self.assistant.id.unwrap_or_default()
    }

    /// Where operational logs go: the configured destination, else the owner.
    pub fn log_destination(&self) -> Destination {
        match self.logging.destination {
            Some(destination) => destination,
            None => self.owner_id(),
        }
    }

    /// Media API key, if the feature is enabled.
    pub fn media_api_key(&self) -> Option<&str> {
        self.media.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Log the optional features this configuration leaves disabled.
    pub fn log_disabled_features(&self) {
        if self.media_api_key().is_none() {
            info!("media.api_key not set, media commands disabled");
        }
        if self.logging.destination.is_none() {
            info!(owner = self.owner_id(), "logging.destination not set, operational logs go to the owner");
        }
    }
}

/// Owner identity configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerConfig {
    pub id: Option<ParticipantId>,
}

/// Assistant identity configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantConfig {
    pub id: Option<ParticipantId>,
    /// Handle without the leading `@`, used to recognize `/cmd@handle`.
    pub handle: Option<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// External media configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaConfig {
    pub api_key: Option<String>,
}

/// Operational log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Room or participant receiving operational logs.
    pub destination: Option<Destination>,
}

/// Unban sweep pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct PropagationConfig {
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    #[serde(default = "default_room_delay_ms")]
    pub room_delay_ms: u64,
}

impl PropagationConfig {
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn room_delay(&self) -> Duration {
        Duration::from_millis(self.room_delay_ms)
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: default_start_delay_ms(),
            room_delay_ms: default_room_delay_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [owner]
            id = 1001

            [assistant]
            id = 2002
            handle = "warden_bot"

            [database]
            path = "/var/lib/roomwarden/state.db"

            [media]
            api_key = "k-123"

            [logging]
            destination = -1009

            [propagation]
            start_delay_ms = 50
            room_delay_ms = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.owner_id(), 1001);
        assert_eq!(config.assistant.handle.as_deref(), Some("warden_bot"));
        assert_eq!(config.log_destination(), -1009);
        assert_eq!(config.media_api_key(), Some("k-123"));
        assert_eq!(config.propagation.room_delay(), Duration::from_millis(5));
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = Config::parse("[owner]\nid = 7\n").unwrap();
        assert_eq!(config.database.path, "roomwarden.db");
        assert_eq!(config.propagation.start_delay_ms, 1000);
        assert_eq!(config.propagation.room_delay_ms, 200);
        assert_eq!(config.log_destination(), 7);
        assert!(config.media_api_key().is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::parse("[owner]\nid = 7\n").unwrap();
        config
            .apply_overrides(env(&[
                (ENV_OWNER_ID, "99"),
                (ENV_MEDIA_API_KEY, "abc"),
                (ENV_LOG_DESTINATION, "-500"),
            ]))
            .unwrap();

        assert_eq!(config.owner_id(), 99);
        assert_eq!(config.media_api_key(), Some("abc"));
        assert_eq!(config.log_destination(), -500);
    }

    #[test]
    fn bad_log_destination_falls_back_to_owner() {
        let mut config = Config::parse("[owner]\nid = 7\n[logging]\ndestination = -5\n").unwrap();
        config
            .apply_overrides(env(&[(ENV_LOG_DESTINATION, "not-a-chat")]))
            .unwrap();
        assert_eq!(config.log_destination(), 7);
    }

    #[test]
    fn bad_owner_env_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[(ENV_OWNER_ID, "owner")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: ENV_OWNER_ID, .. }));
    }
}
