//! Messaging platform boundary.
//!
//! The engine never speaks the transport protocol itself. Everything it needs
//! from the platform (directory lookups, live roles, room administration
//! primitives, outbound notices) goes through the [`Platform`] trait.
//! [`LocalPlatform`] is the in-memory implementation used by the console
//! driver and the test suite.

mod local;
mod role;

pub use local::{LocalPlatform, PlatformCall};
pub use role::{AdminCapability, RoomRole};

use crate::model::{Entity, ParticipantId, RoomId};
use crate::opslog::OpsEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Where a notice is delivered. Private conversations share the
/// participant's identity, so a participant id is also a valid destination.
pub type Destination = i64;

/// A directory lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Id(i64),
    /// Handle without the leading `@`.
    Handle(String),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Handle(handle) => write!(f, "@{}", handle),
        }
    }
}

/// Collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("participant {participant} is not a member of room {room}")]
    NotMember { room: RoomId, participant: ParticipantId },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl PlatformError {
    /// Static label for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::NotMember { .. } => "not_member",
            Self::Forbidden(_) => "forbidden",
            Self::Transport(_) => "transport",
        }
    }
}

/// Outbound message the engine asks the platform to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A globally banned participant was removed from a room.
    GlobalBanEnforced {
        participant: ParticipantId,
        display: String,
        reason: String,
    },
    /// The owner joined a room the assistant is in.
    OwnerWelcome { owner: ParticipantId },
    /// Sent privately to a newly granted operator.
    OperatorWelcome { granted_by: ParticipantId },
    /// Result of an unban sweep.
    PropagationSummary {
        target: ParticipantId,
        rooms_affected: usize,
    },
    PropagationNoRooms { target: ParticipantId },
    PropagationFailed { target: ParticipantId },
    /// Operational log entry. `fallback` marks a redelivery to the owner.
    Ops { event: OpsEvent, fallback: bool },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GlobalBanEnforced { display, reason, .. } => write!(
                f,
                "{} was removed because they are globally banned. Reason: {}",
                display, reason
            ),
            Self::OwnerWelcome { owner } => write!(f, "Welcome, owner {}!", owner),
            Self::OperatorWelcome { granted_by } => write!(
                f,
                "You have been granted operator privileges by {}.",
                granted_by
            ),
            Self::PropagationSummary {
                target,
                rooms_affected,
            } => write!(f, "Unbanned {} in {} rooms.", target, rooms_affected),
            Self::PropagationNoRooms { target } => write!(
                f,
                "No known rooms to propagate the unban of {} to.",
                target
            ),
            Self::PropagationFailed { target } => write!(
                f,
                "Could not load the room list to propagate the unban of {}.",
                target
            ),
            Self::Ops { event, fallback } => {
                if *fallback {
                    f.write_str("[fallback] ")?;
                }
                write!(f, "{}", event)
            }
        }
    }
}

/// Everything the engine requires from the messaging platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The assistant's own participant identity.
    fn assistant_id(&self) -> ParticipantId;

    /// Resolve an identifier or handle through the external directory.
    async fn lookup(&self, key: &EntityRef) -> Result<Entity, PlatformError>;

    /// Live role of a participant in a room.
    async fn member_role(
        &self,
        room: RoomId,
        participant: ParticipantId,
    ) -> Result<RoomRole, PlatformError>;

    /// Ban from a room, until the given instant or permanently.
    async fn ban_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError>;

    async fn unban_member(&self, room: RoomId, participant: ParticipantId)
    -> Result<(), PlatformError>;

    /// Revoke the right to send messages.
    async fn restrict_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError>;

    async fn unrestrict_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
    ) -> Result<(), PlatformError>;

    /// Remove from a room without a lasting ban.
    async fn kick_member(&self, room: RoomId, participant: ParticipantId)
    -> Result<(), PlatformError>;

    /// Promote (`true`) or demote (`false`). The title only applies on promotion.
    async fn set_admin(
        &self,
        room: RoomId,
        participant: ParticipantId,
        admin: bool,
        title: Option<&str>,
    ) -> Result<(), PlatformError>;

    async fn delete_message(&self, room: RoomId, message_id: i64) -> Result<(), PlatformError>;

    /// The assistant leaves the room.
    async fn leave_room(&self, room: RoomId) -> Result<(), PlatformError>;

    async fn send_notice(&self, destination: Destination, notice: Notice)
    -> Result<(), PlatformError>;
}
