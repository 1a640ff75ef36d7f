//! Command handlers.
//!
//! Each handler resolves its target once, asks the privilege resolver once,
//! then mutates a store or calls the platform. Handlers return a typed
//! [`Outcome`]; rendering it for people is the driver's business.

mod blacklist;
mod enforcement;
mod globalban;
mod moderation;
mod operators;
mod outcome;
mod rooms;
mod registry;
mod status;

pub use outcome::{OperatorEntry, Outcome};
pub use registry::Registry;

use crate::authority::{Action, Grant};
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::model::{Entity, Participant, ParticipantId, Room, RoomId};
use crate::platform::{AdminCapability, PlatformError};
use crate::resolve::{ResolveError, Resolved};
use async_trait::async_trait;
use tracing::warn;

/// A parsed command invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub actor: Participant,
    pub room: Room,
    pub message_id: Option<i64>,
    /// The entity whose message the command replies to.
    pub reply_to: Option<Entity>,
    /// Lowercase name without the leading `/`.
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn replying_to(mut self, entity: Entity) -> Self {
        self.reply_to = Some(entity);
        self
    }

    /// Build from a text line such as `/ban@warden_bot @mallory 1h spam`.
    ///
    /// Returns `None` for non-command text and for commands addressed to a
    /// different handle.
    pub fn parse(
        actor: Participant,
        room: Room,
        text: &str,
        assistant_handle: Option<&str>,
    ) -> Option<Self> {
        let (command, args) = parse_command_line(text, assistant_handle)?;
        Some(Self {
            actor,
            room,
            message_id: None,
            reply_to: None,
            command,
            args,
        })
    }
}

/// Split a command line into a lowercase name and its arguments.
pub fn parse_command_line(text: &str, assistant_handle: Option<&str>) -> Option<(String, Vec<String>)> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next()?.strip_prefix('/')?;

    let name = match head.split_once('@') {
        Some((name, addressed)) => {
            let ours = assistant_handle
                .map(|h| h.trim_start_matches('@').eq_ignore_ascii_case(addressed))
                .unwrap_or(false);
            if !ours {
                return None;
            }
            name
        }
        None => head,
    };

    if name.is_empty() {
        return None;
    }

    Some((
        name.to_ascii_lowercase(),
        tokens.map(str::to_string).collect(),
    ))
}

/// A command implementation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome>;
}

// ============================================================================
// Shared handler steps
// ============================================================================

/// Room-scoped commands are refused in private conversations.
pub(crate) fn require_group(inv: &Invocation) -> CommandResult<RoomId> {
    if inv.room.is_private() {
        return Err(CommandError::PrivateRoom);
    }
    Ok(inv.room.id)
}

/// Resolve the invocation's participant target, mapping a missing target to usage.
pub(crate) async fn resolve_participant(
    engine: &Engine,
    inv: &Invocation,
    usage: &'static str,
) -> CommandResult<Resolved<Participant>> {
    engine
        .targets()
        .resolve_participant(inv.reply_to.as_ref(), &inv.args)
        .await
        .map_err(|e| match e {
            ResolveError::Missing => CommandError::Usage(usage),
            other => other.into(),
        })
}

/// Target guards, then actor authorization.
pub(crate) async fn authorize(
    engine: &Engine,
    inv: &Invocation,
    action: Action,
    target: Option<ParticipantId>,
) -> CommandResult<Grant> {
    let room = (!inv.room.is_private()).then_some(inv.room.id);
    let privileges = engine.privileges();

    if let Some(target) = target {
        privileges
            .check_target(inv.actor.id, target, action, room)
            .await
            .map_err(|denial| CommandError::Denied { action, denial })?;
    }

    privileges
        .authorize(inv.actor.id, action, room)
        .await
        .map_err(|denial| CommandError::Denied { action, denial })
}

/// The assistant itself must hold `capability` in the room.
pub(crate) async fn require_assistant_right(
    engine: &Engine,
    room: RoomId,
    action: Action,
    capability: AdminCapability,
) -> CommandResult<()> {
    match engine
        .platform()
        .member_role(room, engine.assistant_id())
        .await
    {
        Ok(role) if role.has(capability) => Ok(()),
        Ok(_) | Err(PlatformError::NotMember { .. }) => {
            Err(CommandError::AssistantLacksRights(action))
        }
        Err(e) => {
            warn!(room_id = room, error = %e, "could not verify assistant rights");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_command() {
        let (name, args) = parse_command_line("/BAN @mallory 1h spam", None).unwrap();
        assert_eq!(name, "ban");
        assert_eq!(args, vec!["@mallory", "1h", "spam"]);
    }

    #[test]
    fn addressed_to_us() {
        let (name, _) = parse_command_line("/gban@Warden_Bot 42", Some("warden_bot")).unwrap();
        assert_eq!(name, "gban");
    }

    #[test]
    fn addressed_elsewhere_or_not_a_command() {
        assert!(parse_command_line("/gban@other_bot 42", Some("warden_bot")).is_none());
        assert!(parse_command_line("hello there", None).is_none());
        assert!(parse_command_line("/", None).is_none());
        assert!(parse_command_line("", None).is_none());
    }
}
