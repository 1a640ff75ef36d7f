//! Unified error handling for command processing.
//!
//! Every failure a command can end in is a [`CommandError`]. Each variant
//! carries enough for the driver to render a reply, and a static code for
//! log labeling.

use crate::authority::{Action, Denial};
use crate::db::DbError;
use crate::platform::PlatformError;
use crate::resolve::ResolveError;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad argument shape; carries the usage line.
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Room-scoped command used in a private conversation.
    #[error("this command can only be used in rooms")]
    PrivateRoom,

    #[error("could not identify target: {0}")]
    Unresolved(ResolveError),

    #[error("{action} denied: {denial}")]
    Denied { action: Action, denial: Denial },

    /// The assistant's own role in the room does not allow the action.
    #[error("the assistant lacks the rights to {0} in this room")]
    AssistantLacksRights(Action),

    #[error("storage failure: {0}")]
    Persistence(#[from] DbError),

    #[error("platform failure: {0}")]
    Platform(#[from] PlatformError),

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl CommandError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::PrivateRoom => "private_room",
            Self::Unresolved(_) => "unresolved",
            Self::Denied { denial, .. } => match denial {
                Denial::NotPrivileged => "not_privileged",
                Denial::TargetProtected(_) => "target_protected",
                Denial::CannotVerify => "cannot_verify_permissions",
            },
            Self::AssistantLacksRights(_) => "assistant_lacks_rights",
            Self::Persistence(_) => "persistence",
            Self::Platform(_) => "platform",
            Self::UnknownCommand(_) => "unknown_command",
        }
    }

    /// Validation errors leave no trace beyond the reply.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Usage(_)
                | Self::InvalidIdentifier(_)
                | Self::InvalidArgument(_)
                | Self::PrivateRoom
                | Self::UnknownCommand(_)
        )
    }
}

impl From<ResolveError> for CommandError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidIdentifier(token) => Self::InvalidIdentifier(token),
            other => Self::Unresolved(other),
        }
    }
}

/// Result type for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::Protection;

    #[test]
    fn denial_codes_follow_reason_class() {
        let err = CommandError::Denied {
            action: Action::Blacklist,
            denial: Denial::TargetProtected(Protection::Operator),
        };
        assert_eq!(err.error_code(), "target_protected");
        assert!(!err.is_validation());
    }

    #[test]
    fn malformed_identifier_is_validation() {
        let err = CommandError::from(ResolveError::InvalidIdentifier("x1".to_string()));
        assert_eq!(err.error_code(), "invalid_identifier");
        assert!(err.is_validation());

        let err = CommandError::from(ResolveError::Missing);
        assert_eq!(err.error_code(), "unresolved");
    }
}
