//! Operational audit log.
//!
//! Privileged state changes are reported as typed [`OpsEvent`]s to a
//! configured destination. Delivery problems are logged and never change a
//! command's outcome.

use crate::model::{Participant, ParticipantId, Room};
use crate::platform::{Destination, Notice, Platform};
use std::fmt;
use tracing::{error, info};

/// An auditable change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpsEvent {
    Blacklisted {
        target: Participant,
        reason: String,
        issued_by: ParticipantId,
    },
    Unblacklisted {
        target: Participant,
        issued_by: ParticipantId,
    },
    GlobalBanned {
        target: Participant,
        reason: String,
        issued_by: ParticipantId,
    },
    GlobalUnbanned {
        target: Participant,
        issued_by: ParticipantId,
    },
    OperatorGranted {
        target: Participant,
        granted_by: ParticipantId,
    },
    OperatorRevoked {
        target: Participant,
        revoked_by: ParticipantId,
    },
    AddedToRoom {
        room: Room,
    },
}

impl OpsEvent {
    /// Short tag used as the first line of the rendered entry.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Blacklisted { .. } => "#BLACKLIST",
            Self::Unblacklisted { .. } => "#UNBLACKLIST",
            Self::GlobalBanned { .. } => "#GBAN",
            Self::GlobalUnbanned { .. } => "#UNGBAN",
            Self::OperatorGranted { .. } => "#OPERATOR",
            Self::OperatorRevoked { .. } => "#UNOPERATOR",
            Self::AddedToRoom { .. } => "#ADDEDTOROOM",
        }
    }
}

impl fmt::Display for OpsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.tag())?;
        match self {
            Self::Blacklisted {
                target,
                reason,
                issued_by,
            }
            | Self::GlobalBanned {
                target,
                reason,
                issued_by,
            } => write!(f, "user {} by {}, reason: {}", target, issued_by, reason),
            Self::Unblacklisted { target, issued_by }
            | Self::GlobalUnbanned { target, issued_by } => {
                write!(f, "user {} by {}", target, issued_by)
            }
            Self::OperatorGranted { target, granted_by } => {
                write!(f, "user {} by {}", target, granted_by)
            }
            Self::OperatorRevoked { target, revoked_by } => {
                write!(f, "user {} by {}", target, revoked_by)
            }
            Self::AddedToRoom { room } => write!(f, "{} ({})", room.display_title(), room.id),
        }
    }
}

/// Sends [`OpsEvent`]s to the log destination, falling back to the owner.
#[derive(Debug, Clone, Copy)]
pub struct OpsLog {
    destination: Destination,
    owner: ParticipantId,
}

impl OpsLog {
    pub fn new(destination: Destination, owner: ParticipantId) -> Self {
        Self { destination, owner }
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Deliver an event. Retries once to the owner when the primary
    /// destination is a separate log room and delivery to it failed.
    pub async fn emit(&self, platform: &dyn Platform, event: OpsEvent) {
        let tag = event.tag();
        let primary = platform
            .send_notice(
                self.destination,
                Notice::Ops {
                    event: event.clone(),
                    fallback: false,
                },
            )
            .await;

        let err = match primary {
            Ok(()) => {
                info!(destination = self.destination, event = tag, "operational log sent");
                return;
            }
            Err(err) => err,
        };

        error!(
            destination = self.destination,
            event = tag,
            error = %err,
            "failed to send operational log"
        );

        if self.destination == self.owner {
            return;
        }

        match platform
            .send_notice(self.owner, Notice::Ops { event, fallback: true })
            .await
        {
            Ok(()) => info!(owner = self.owner, event = tag, "operational log sent to owner as fallback"),
            Err(err) => error!(
                owner = self.owner,
                event = tag,
                error = %err,
                "fallback operational log to owner failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::LocalPlatform;

    fn event() -> OpsEvent {
        OpsEvent::Blacklisted {
            target: Participant::new(5, "Mallory"),
            reason: "spam".to_string(),
            issued_by: 1,
        }
    }

    #[tokio::test]
    async fn delivers_to_destination() {
        let platform = LocalPlatform::new(99);
        OpsLog::new(-500, 1).emit(&platform, event()).await;

        let notices = platform.notices_to(-500);
        assert_eq!(notices.len(), 1);
        assert!(platform.notices_to(1).is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_owner_once() {
        let platform = LocalPlatform::new(99);
        platform.fail_destination(-500);
        OpsLog::new(-500, 1).emit(&platform, event()).await;

        let owner = platform.notices_to(1);
        assert_eq!(owner.len(), 1);
        assert!(matches!(owner[0], Notice::Ops { fallback: true, .. }));
    }

    #[tokio::test]
    async fn no_retry_when_destination_is_owner() {
        let platform = LocalPlatform::new(99);
        platform.fail_destination(1);
        OpsLog::new(1, 1).emit(&platform, event()).await;

        assert!(platform.notices().is_empty());
    }

    #[test]
    fn renders_tag_first() {
        assert!(event().to_string().starts_with("#BLACKLIST user Mallory (5)"));
    }
}
