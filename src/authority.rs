//! Privilege resolution.
//!
//! [`PrivilegeResolver`] is the only place that decides whether an actor may
//! perform an [`Action`]. A successful decision yields a [`Grant`], which
//! handlers hold before mutating any state. Every decision is logged.

use crate::model::{ParticipantId, RoomId};
use crate::platform::{AdminCapability, Platform, PlatformError, RoomRole};
use crate::store::Store;
use std::fmt;
use tracing::{debug, trace, warn};

/// Where an action applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One room; the live role is consulted.
    Room,
    /// Every room the assistant knows.
    Installation,
    /// Reserved to the owner.
    Owner,
}

/// What a live room role must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Anyone,
    Capability(AdminCapability),
    Creator,
    /// No live-role fallback exists.
    Unavailable,
}

/// Every privileged operation the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Ban,
    Unban,
    Mute,
    Unmute,
    Kick,
    KickSelf,
    Promote,
    Demote,
    SetEnforcement,
    Blacklist,
    Unblacklist,
    GlobalBan,
    GlobalUnban,
    Status,
    GrantOperator,
    RevokeOperator,
    ListOperators,
    LeaveRoom,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Kick => "kick",
            Self::KickSelf => "kick-self",
            Self::Promote => "promote",
            Self::Demote => "demote",
            Self::SetEnforcement => "set-room-enforcement",
            Self::Blacklist => "blacklist-add",
            Self::Unblacklist => "blacklist-remove",
            Self::GlobalBan => "globalban-add",
            Self::GlobalUnban => "globalban-remove",
            Self::Status => "status",
            Self::GrantOperator => "grant-operator",
            Self::RevokeOperator => "revoke-operator",
            Self::ListOperators => "list-operators",
            Self::LeaveRoom => "leave-room",
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            Self::Ban
            | Self::Unban
            | Self::Mute
            | Self::Unmute
            | Self::Kick
            | Self::KickSelf
            | Self::Promote
            | Self::Demote
            | Self::SetEnforcement => Scope::Room,
            Self::Blacklist
            | Self::Unblacklist
            | Self::GlobalBan
            | Self::GlobalUnban
            | Self::Status => Scope::Installation,
            Self::GrantOperator
            | Self::RevokeOperator
            | Self::ListOperators
            | Self::LeaveRoom => Scope::Owner,
        }
    }

    pub fn requirement(self) -> Requirement {
        match self {
            Self::Ban | Self::Unban | Self::Mute | Self::Unmute | Self::Kick => {
                Requirement::Capability(AdminCapability::RestrictMembers)
            }
            Self::KickSelf => Requirement::Anyone,
            Self::Promote | Self::Demote => {
                Requirement::Capability(AdminCapability::PromoteMembers)
            }
            Self::SetEnforcement => Requirement::Creator,
            _ => Requirement::Unavailable,
        }
    }

    /// Whether an operator grant alone authorizes the action.
    pub fn operator_override(self) -> bool {
        match self.scope() {
            Scope::Owner => false,
            Scope::Installation => true,
            Scope::Room => !matches!(self, Self::Promote | Self::Demote | Self::SetEnforcement),
        }
    }

    /// Actions that harm their target; owner and assistant targets are refused.
    pub fn protects_target(self) -> bool {
        matches!(
            self,
            Self::Ban | Self::Mute | Self::Kick | Self::Demote | Self::Blacklist | Self::GlobalBan
        )
    }

    /// Destructive actions an actor may not aim at themself.
    pub fn forbids_self_target(self) -> bool {
        matches!(
            self,
            Self::Ban | Self::Mute | Self::Kick | Self::Blacklist | Self::GlobalBan
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an authorization rested on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    Owner,
    Operator,
    Creator,
    Administrator,
    Anyone,
}

/// Proof that an actor was authorized for one action.
///
/// Only [`PrivilegeResolver`] constructs grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    action: Action,
    actor: ParticipantId,
    basis: Basis,
}

impl Grant {
    pub fn action(&self) -> Action {
        self.action
    }

    pub fn actor(&self) -> ParticipantId {
        self.actor
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }
}

/// Why a target may not be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Owner,
    Assistant,
    SelfTarget,
    RoomCreator,
    RoomAdministrator,
    Operator,
    /// The owner must revoke the target's operator grant first.
    OperatorGrantHeld,
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owner => "the owner cannot be targeted",
            Self::Assistant => "the assistant cannot target itself",
            Self::SelfTarget => "you cannot target yourself",
            Self::RoomCreator => "the room creator cannot be targeted",
            Self::RoomAdministrator => {
                "only the room creator or the owner can target an administrator"
            }
            Self::Operator => "operators cannot be targeted",
            Self::OperatorGrantHeld => "revoke the operator grant first",
        })
    }
}

/// Denial reason classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotPrivileged,
    TargetProtected(Protection),
    CannotVerify,
}

impl Denial {
    pub fn class(&self) -> &'static str {
        match self {
            Self::NotPrivileged => "not-privileged",
            Self::TargetProtected(_) => "target-protected",
            Self::CannotVerify => "cannot-verify-permissions",
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetProtected(protection) => write!(f, "{}: {}", self.class(), protection),
            _ => f.write_str(self.class()),
        }
    }
}

/// Decides actor authorization and target protection.
pub struct PrivilegeResolver<'a> {
    owner: ParticipantId,
    privileges: &'a dyn Store,
    platform: &'a dyn Platform,
}

impl<'a> PrivilegeResolver<'a> {
    pub fn new(
        owner: ParticipantId,
        privileges: &'a dyn Store,
        platform: &'a dyn Platform,
    ) -> Self {
        Self {
            owner,
            privileges,
            platform,
        }
    }

    /// Owner or operator.
    pub async fn is_privileged(&self, participant: ParticipantId) -> bool {
        if participant == self.owner {
            return true;
        }
        match self.privileges.is_operator(participant).await {
            Ok(is_operator) => is_operator,
            Err(e) => {
                warn!(participant_id = participant, error = %e, "operator lookup failed");
                false
            }
        }
    }

    /// May `actor` perform `action` (in `room`, for room-scoped actions)?
    pub async fn authorize(
        &self,
        actor: ParticipantId,
        action: Action,
        room: Option<RoomId>,
    ) -> Result<Grant, Denial> {
        let result = self.decide(actor, action, room).await;
        match &result {
            Ok(grant) => self.log_grant(grant, room),
            Err(denial) => self.log_denial(actor, action, room, denial),
        }
        result
    }

    async fn decide(
        &self,
        actor: ParticipantId,
        action: Action,
        room: Option<RoomId>,
    ) -> Result<Grant, Denial> {
        let grant = |basis| Grant {
            action,
            actor,
            basis,
        };

        if actor == self.owner {
            return Ok(grant(Basis::Owner));
        }

        if action.scope() == Scope::Owner {
            return Err(Denial::NotPrivileged);
        }

        if action.operator_override() {
            match self.privileges.is_operator(actor).await {
                Ok(true) => return Ok(grant(Basis::Operator)),
                Ok(false) => {}
                Err(e) => {
                    warn!(actor, action = %action, error = %e, "operator lookup failed");
                    return Err(Denial::CannotVerify);
                }
            }
        }

        let requirement = action.requirement();
        if requirement == Requirement::Anyone {
            return Ok(grant(Basis::Anyone));
        }
        if requirement == Requirement::Unavailable {
            return Err(Denial::NotPrivileged);
        }

        let Some(room) = room else {
            return Err(Denial::NotPrivileged);
        };

        let role = match self.platform.member_role(room, actor).await {
            Ok(role) => role,
            Err(PlatformError::NotMember { .. }) => return Err(Denial::NotPrivileged),
            Err(e) => {
                warn!(actor, room_id = room, error = %e, "could not verify actor role");
                return Err(Denial::CannotVerify);
            }
        };

        match (requirement, &role) {
            (_, RoomRole::Creator) => Ok(grant(Basis::Creator)),
            (Requirement::Capability(cap), RoomRole::Administrator { .. }) if role.has(cap) => {
                Ok(grant(Basis::Administrator))
            }
            _ => Err(Denial::NotPrivileged),
        }
    }

    /// Target-side guards. Runs before the actor check.
    pub async fn check_target(
        &self,
        actor: ParticipantId,
        target: ParticipantId,
        action: Action,
        room: Option<RoomId>,
    ) -> Result<(), Denial> {
        if !action.protects_target() {
            return Ok(());
        }

        let protected = |p: Protection| {
            debug!(actor, target, action = %action, protection = ?p, "target protected");
            Err(Denial::TargetProtected(p))
        };

        if target == self.owner {
            return protected(Protection::Owner);
        }
        if target == self.platform.assistant_id() {
            return protected(Protection::Assistant);
        }
        if target == actor && action.forbids_self_target() {
            return protected(Protection::SelfTarget);
        }

        match action.scope() {
            Scope::Installation => match self.privileges.is_operator(target).await {
                Ok(true) if actor == self.owner => protected(Protection::OperatorGrantHeld),
                Ok(true) => protected(Protection::Operator),
                Ok(false) => Ok(()),
                Err(e) => {
                    warn!(target, error = %e, "operator lookup failed for target");
                    Err(Denial::CannotVerify)
                }
            },
            Scope::Room => {
                let Some(room) = room else { return Ok(()) };
                self.check_room_target(actor, target, room).await
            }
            Scope::Owner => Ok(()),
        }
    }

    async fn check_room_target(
        &self,
        actor: ParticipantId,
        target: ParticipantId,
        room: RoomId,
    ) -> Result<(), Denial> {
        let role = match self.platform.member_role(room, target).await {
            Ok(role) => role,
            Err(e) => {
                debug!(target, room_id = room, error = %e, "target role unavailable, proceeding");
                return Ok(());
            }
        };

        match role {
            RoomRole::Creator => Err(Denial::TargetProtected(Protection::RoomCreator)),
            RoomRole::Administrator { .. } => {
                if actor == self.owner {
                    return Ok(());
                }
                match self.platform.member_role(room, actor).await {
                    Ok(RoomRole::Creator) => Ok(()),
                    Ok(_) | Err(PlatformError::NotMember { .. }) => {
                        Err(Denial::TargetProtected(Protection::RoomAdministrator))
                    }
                    Err(e) => {
                        warn!(actor, room_id = room, error = %e, "could not verify actor role");
                        Err(Denial::CannotVerify)
                    }
                }
            }
            RoomRole::Member | RoomRole::Left | RoomRole::Banned | RoomRole::Restricted => Ok(()),
        }
    }

    fn log_grant(&self, grant: &Grant, room: Option<RoomId>) {
        debug!(
            action = %grant.action,
            actor = grant.actor,
            basis = ?grant.basis,
            room_id = ?room,
            "privilege granted"
        );
    }

    fn log_denial(&self, actor: ParticipantId, action: Action, room: Option<RoomId>, denial: &Denial) {
        trace!(
            action = %action,
            actor,
            room_id = ?room,
            denial = denial.class(),
            "privilege denied"
        );
    }
}
