//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("owner.id is required")]
    MissingOwner,
    #[error("owner.id must be a positive identity, got {0}")]
    InvalidOwner(i64),
    #[error("assistant.id is required")]
    MissingAssistant,
    #[error("assistant.id must be a positive identity, got {0}")]
    InvalidAssistant(i64),
    #[error("assistant.id must differ from owner.id")]
    AssistantIsOwner,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("logging.destination must not be 0")]
    InvalidLogDestination,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Identities
    match config.owner.id {
        None => errors.push(ValidationError::MissingOwner),
        Some(id) if id <= 0 => errors.push(ValidationError::InvalidOwner(id)),
        Some(_) => {}
    }
    match config.assistant.id {
        None => errors.push(ValidationError::MissingAssistant),
        Some(id) if id <= 0 => errors.push(ValidationError::InvalidAssistant(id)),
        Some(id) if Some(id) == config.owner.id => errors.push(ValidationError::AssistantIsOwner),
        Some(_) => {}
    }

    if config.logging.destination == Some(0) {
        errors.push(ValidationError::InvalidLogDestination);
    }

    // Database path validation
    if config.database.path != ":memory:" {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_passes() {
        let config = Config::parse("[owner]\nid = 1\n[assistant]\nid = 2\n").unwrap();
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let config = Config::parse(
            "[owner]\nid = -4\n[database]\npath = \"/definitely/not/here/x.db\"\n",
        )
        .unwrap();
        let errors = validate(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::InvalidOwner(-4)));
        assert!(errors.contains(&ValidationError::MissingAssistant));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
    }

    #[test]
    fn missing_owner_is_reported() {
        let config = Config::parse("[assistant]\nid = 2\n").unwrap();
        assert_eq!(validate(&config), Err(vec![ValidationError::MissingOwner]));
    }

    #[test]
    fn memory_database_skips_path_check() {
        let config =
            Config::parse("[owner]\nid = 1\n[assistant]\nid = 2\n[database]\npath = \":memory:\"\n")
                .unwrap();
        assert_eq!(validate(&config), Ok(()));
    }
}
