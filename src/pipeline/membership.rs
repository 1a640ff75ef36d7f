//! Join and leave events.

use crate::engine::Engine;
use crate::model::{Participant, Room};
use crate::opslog::OpsEvent;
use crate::platform::Notice;
use tracing::{error, info, warn};

/// A membership change in a room.
#[derive(Debug, Clone)]
pub enum MembershipEvent {
    Joined { room: Room, members: Vec<Participant> },
    Left { room: Room, member: Participant },
}

/// Room discovery and departure, plus global-ban enforcement on join.
#[derive(Default)]
pub struct MembershipHandler;

impl MembershipHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, engine: &Engine, event: &MembershipEvent) {
        match event {
            MembershipEvent::Joined { room, members } => self.joined(engine, room, members).await,
            MembershipEvent::Left { room, member } => self.left(engine, room, member).await,
        }
    }

    async fn joined(&self, engine: &Engine, room: &Room, members: &[Participant]) {
        let store = engine.store();
        let platform = engine.platform();
        let assistant = engine.assistant_id();

        if members.iter().any(|m| m.id == assistant) {
            info!(room_id = room.id, title = %room.display_title(), "assistant added to room");
            match store.record_room(room).await {
                Ok(()) => engine.known_rooms().insert(room.id),
                Err(e) => error!(room_id = room.id, error = %e, "failed to record room"),
            }
            engine
                .ops_log()
                .emit(platform, OpsEvent::AddedToRoom { room: room.clone() })
                .await;
        }

        let enforced = store.is_enforced(room.id).await.unwrap_or_else(|e| {
            warn!(room_id = room.id, error = %e, "enforcement lookup failed, assuming enforced");
            true
        });
        if !enforced {
            return;
        }

        for member in members.iter().filter(|m| m.id != assistant) {
            if engine.is_owner(member.id) {
                if let Err(e) = platform
                    .send_notice(room.id, Notice::OwnerWelcome { owner: member.id })
                    .await
                {
                    warn!(room_id = room.id, error = %e, "failed to welcome owner");
                }
                continue;
            }

            let reason = match store.global_reason(member.id).await {
                Ok(Some(reason)) => reason,
                Ok(None) => continue,
                Err(e) => {
                    warn!(participant_id = member.id, error = %e, "global ban lookup failed");
                    continue;
                }
            };

            info!(participant_id = member.id, room_id = room.id, "globally banned participant joined, removing");
            if let Err(e) = platform.ban_member(room.id, member.id, None).await {
                error!(participant_id = member.id, room_id = room.id, error = %e, "failed to enforce global ban on join");
                continue;
            }
            let notice = Notice::GlobalBanEnforced {
                participant: member.id,
                display: member.to_string(),
                reason,
            };
            if let Err(e) = platform.send_notice(room.id, notice).await {
                warn!(room_id = room.id, error = %e, "failed to post global ban notice");
            }
        }
    }

    async fn left(&self, engine: &Engine, room: &Room, member: &Participant) {
        if member.id != engine.assistant_id() {
            return;
        }
        info!(room_id = room.id, "assistant removed from room");
        engine.known_rooms().remove(room.id);
        if let Err(e) = engine.store().forget_room(room.id).await {
            error!(room_id = room.id, error = %e, "failed to forget room");
        }
    }
}
