//! The standard guards.

use super::{Flow, Guard, Interaction};
use crate::engine::Engine;
use crate::model::Entity;
use crate::platform::Notice;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Records the actor, the replied-to participant, and unknown group rooms.
/// Never stops an interaction.
pub struct ObserveGuard;

#[async_trait]
impl Guard for ObserveGuard {
    fn name(&self) -> &'static str {
        "observe"
    }

    async fn check(&self, engine: &Engine, interaction: &Interaction) -> Flow {
        let store = engine.store();

        if let Err(e) = store.upsert_participant(&interaction.actor).await {
            warn!(participant_id = interaction.actor.id, error = %e, "failed to record actor");
        }

        if let Some(Entity::Participant(replied)) = &interaction.reply_to
            && let Err(e) = store.upsert_participant(replied).await
        {
            warn!(participant_id = replied.id, error = %e, "failed to record replied-to participant");
        }

        let room = &interaction.room;
        let known_rooms = engine.known_rooms();
        if !room.is_private() && !known_rooms.contains(store, room.id).await {
            match store.record_room(room).await {
                Ok(()) => {
                    info!(room_id = room.id, title = %room.display_title(), "room discovered");
                    known_rooms.insert(room.id);
                }
                Err(e) => warn!(room_id = room.id, error = %e, "failed to record room"),
            }
        }

        Flow::Continue
    }
}

/// Drops all interaction from blacklisted participants. The owner is exempt.
pub struct BlacklistGuard;

#[async_trait]
impl Guard for BlacklistGuard {
    fn name(&self) -> &'static str {
        "blacklist"
    }

    async fn check(&self, engine: &Engine, interaction: &Interaction) -> Flow {
        let actor = interaction.actor.id;
        if engine.is_owner(actor) {
            return Flow::Continue;
        }

        match engine.store().local_reason(actor).await {
            Ok(Some(reason)) => {
                info!(participant_id = actor, reason = %reason, "ignoring blacklisted participant");
                Flow::Stop
            }
            Ok(None) => Flow::Continue,
            Err(e) => {
                warn!(participant_id = actor, error = %e, "blacklist lookup failed");
                Flow::Continue
            }
        }
    }
}

/// Removes globally banned participants who speak in enforcing rooms.
pub struct GlobalBanGuard;

#[async_trait]
impl Guard for GlobalBanGuard {
    fn name(&self) -> &'static str {
        "global-ban"
    }

    async fn check(&self, engine: &Engine, interaction: &Interaction) -> Flow {
        let room = &interaction.room;
        if room.is_private() {
            return Flow::Continue;
        }

        let store = engine.store();
        let enforced = store.is_enforced(room.id).await.unwrap_or_else(|e| {
            warn!(room_id = room.id, error = %e, "enforcement lookup failed, assuming enforced");
            true
        });
        if !enforced {
            return Flow::Continue;
        }

        let actor = &interaction.actor;
        if engine.privileges().is_privileged(actor.id).await {
            return Flow::Continue;
        }

        let reason = match store.global_reason(actor.id).await {
            Ok(Some(reason)) => reason,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                warn!(participant_id = actor.id, error = %e, "global ban lookup failed");
                return Flow::Continue;
            }
        };

        let platform = engine.platform();
        match platform.member_role(room.id, actor.id).await {
            Ok(role) if role.is_staff() => {
                debug!(participant_id = actor.id, room_id = room.id, role = %role, "globally banned staff left alone");
                return Flow::Continue;
            }
            Ok(_) => {}
            Err(e) => debug!(participant_id = actor.id, room_id = room.id, error = %e, "role unavailable"),
        }

        info!(participant_id = actor.id, room_id = room.id, "enforcing global ban");

        let banned = match platform.ban_member(room.id, actor.id, None).await {
            Ok(()) => true,
            Err(e) => {
                warn!(participant_id = actor.id, room_id = room.id, error = %e, "failed to enforce global ban");
                false
            }
        };
        if let Some(message_id) = interaction.message_id
            && let Err(e) = platform.delete_message(room.id, message_id).await
        {
            warn!(room_id = room.id, message_id, error = %e, "failed to delete message");
        }
        // Announce only bans that took effect.
        if !banned {
            return Flow::Stop;
        }
        let notice = Notice::GlobalBanEnforced {
            participant: actor.id,
            display: actor.to_string(),
            reason,
        };
        if let Err(e) = platform.send_notice(room.id, notice).await {
            warn!(room_id = room.id, error = %e, "failed to post global ban notice");
        }

        Flow::Stop
    }
}
