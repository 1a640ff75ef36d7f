//! Room moderation commands.
//!
//! Every command here is room-scoped: refused in private conversations, and
//! refused outright when the assistant itself lacks the platform right the
//! command needs.

use super::{
    Handler, Invocation, Outcome, authorize, require_assistant_right, require_group,
    resolve_participant,
};
use crate::authority::{Action, Grant};
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::model::{Participant, RoomId};
use crate::platform::{AdminCapability, PlatformError, RoomRole};
use crate::resolve::{ModArgs, format_duration, parse_mod_args, parse_reason, parse_text};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Longest administrator title the platform accepts.
const MAX_TITLE_CHARS: usize = 16;
const DEFAULT_TITLE: &str = "Admin";

/// A target that passed every check for one moderation action.
struct Cleared<'a> {
    room: RoomId,
    target: Participant,
    /// Arguments left after the target.
    rest: &'a [String],
    grant: Grant,
}

/// Room, assistant rights, target, then the actor.
async fn clear<'a>(
    engine: &Engine,
    inv: &'a Invocation,
    action: Action,
    capability: AdminCapability,
    usage: &'static str,
) -> CommandResult<Cleared<'a>> {
    let room = require_group(inv)?;
    require_assistant_right(engine, room, action, capability).await?;

    let resolved = resolve_participant(engine, inv, usage).await?;
    let grant = authorize(engine, inv, action, Some(resolved.target.id)).await?;

    Ok(Cleared {
        room,
        target: resolved.target,
        rest: &inv.args[resolved.consumed..],
        grant,
    })
}

fn log_action(cleared: &Cleared<'_>) {
    info!(
        action = %cleared.grant.action(),
        actor = cleared.grant.actor(),
        basis = ?cleared.grant.basis(),
        target_id = cleared.target.id,
        room_id = cleared.room,
        "moderation action"
    );
}

/// Absolute end of a temporary restriction; durations past the calendar are refused.
fn expiry(args: &ModArgs) -> CommandResult<Option<DateTime<Utc>>> {
    let Some(duration) = args.duration else {
        return Ok(None);
    };
    Utc::now()
        .checked_add_signed(duration)
        .map(Some)
        .ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "duration {} is too long",
                args.duration_token.as_deref().unwrap_or_default()
            ))
        })
}

pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Ban,
            AdminCapability::RestrictMembers,
            "/ban <@handle|id> [duration] [reason] (or reply)",
        )
        .await?;

        let args = parse_mod_args(cleared.rest);
        let until = expiry(&args)?;

        engine
            .platform()
            .ban_member(cleared.room, cleared.target.id, until)
            .await?;
        log_action(&cleared);

        Ok(Outcome::Banned {
            target: cleared.target,
            until,
            duration: args.duration.map(format_duration),
            reason: args.reason,
        })
    }
}

pub struct UnbanHandler;

#[async_trait]
impl Handler for UnbanHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Unban,
            AdminCapability::RestrictMembers,
            "/unban <@handle|id> (or reply)",
        )
        .await?;

        engine
            .platform()
            .unban_member(cleared.room, cleared.target.id)
            .await?;
        log_action(&cleared);

        Ok(Outcome::Unbanned(cleared.target))
    }
}

pub struct MuteHandler;

#[async_trait]
impl Handler for MuteHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Mute,
            AdminCapability::RestrictMembers,
            "/mute <@handle|id> [duration] [reason] (or reply)",
        )
        .await?;

        let args = parse_mod_args(cleared.rest);
        let until = expiry(&args)?;

        engine
            .platform()
            .restrict_member(cleared.room, cleared.target.id, until)
            .await?;
        log_action(&cleared);

        Ok(Outcome::Muted {
            target: cleared.target,
            until,
            duration: args.duration.map(format_duration),
            reason: args.reason,
        })
    }
}

pub struct UnmuteHandler;

#[async_trait]
impl Handler for UnmuteHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Unmute,
            AdminCapability::RestrictMembers,
            "/unmute <@handle|id> (or reply)",
        )
        .await?;

        engine
            .platform()
            .unrestrict_member(cleared.room, cleared.target.id)
            .await?;
        log_action(&cleared);

        Ok(Outcome::Unmuted(cleared.target))
    }
}

pub struct KickHandler;

#[async_trait]
impl Handler for KickHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Kick,
            AdminCapability::RestrictMembers,
            "/kick <@handle|id> [reason] (or reply)",
        )
        .await?;

        let reason = parse_reason(cleared.rest);
        engine
            .platform()
            .kick_member(cleared.room, cleared.target.id)
            .await?;
        log_action(&cleared);

        Ok(Outcome::Kicked {
            target: cleared.target,
            reason,
        })
    }
}

/// Leave the room through the assistant. Room staff are refused.
pub struct KickSelfHandler;

#[async_trait]
impl Handler for KickSelfHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let room = require_group(inv)?;
        require_assistant_right(engine, room, Action::KickSelf, AdminCapability::RestrictMembers)
            .await?;
        let grant = authorize(engine, inv, Action::KickSelf, None).await?;

        let platform = engine.platform();
        let role = platform.member_role(room, inv.actor.id).await?;
        if role.is_staff() {
            return Err(CommandError::InvalidArgument(format!(
                "a room {} must leave through the platform",
                role
            )));
        }

        platform.kick_member(room, inv.actor.id).await?;
        info!(actor = grant.actor(), room_id = room, "participant kicked themself");

        Ok(Outcome::LeftRoom(inv.actor.clone()))
    }
}

pub struct PromoteHandler;

#[async_trait]
impl Handler for PromoteHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Promote,
            AdminCapability::PromoteMembers,
            "/promote <@handle|id> [title] (or reply)",
        )
        .await?;
        let target_id = cleared.target.id;

        if target_id == engine.assistant_id() || cleared.target.is_automated {
            return Err(CommandError::InvalidArgument(
                "automated accounts are not promoted through commands".to_string(),
            ));
        }

        let requested: Option<String> =
            parse_text(cleared.rest).map(|t| t.chars().take(MAX_TITLE_CHARS).collect());
        let platform = engine.platform();

        match platform.member_role(cleared.room, target_id).await {
            Ok(RoomRole::Creator) => return Ok(Outcome::AlreadyCreator(cleared.target)),
            Ok(RoomRole::Administrator { .. }) => {
                let Some(title) = requested else {
                    return Ok(Outcome::AlreadyAdministrator(cleared.target));
                };
                platform
                    .set_admin(cleared.room, target_id, true, Some(&title))
                    .await?;
                log_action(&cleared);
                return Ok(Outcome::TitleUpdated {
                    target: cleared.target,
                    title,
                });
            }
            Ok(_) => {}
            Err(e) => debug!(target_id, error = %e, "target role unavailable, promoting anyway"),
        }

        let title = requested.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        platform
            .set_admin(cleared.room, target_id, true, Some(&title))
            .await?;
        log_action(&cleared);

        Ok(Outcome::Promoted {
            target: cleared.target,
            title,
        })
    }
}

pub struct DemoteHandler;

#[async_trait]
impl Handler for DemoteHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let cleared = clear(
            engine,
            inv,
            Action::Demote,
            AdminCapability::PromoteMembers,
            "/demote <@handle|id> (or reply)",
        )
        .await?;
        let platform = engine.platform();

        match platform.member_role(cleared.room, cleared.target.id).await {
            Ok(RoomRole::Administrator { .. }) => {}
            Ok(_) | Err(PlatformError::NotMember { .. }) => {
                return Ok(Outcome::NotAdministrator(cleared.target));
            }
            Err(e) => return Err(e.into()),
        }

        platform
            .set_admin(cleared.room, cleared.target.id, false, None)
            .await?;
        log_action(&cleared);

        Ok(Outcome::Demoted(cleared.target))
    }
}
