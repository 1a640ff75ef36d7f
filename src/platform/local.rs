//! In-memory platform.
//!
//! Holds a directory of participants and rooms plus a role table, applies
//! administration calls to that table, and records every call and notice so
//! callers can inspect what the engine did.

use super::{AdminCapability, Destination, EntityRef, Notice, Platform, PlatformError, RoomRole};
use crate::model::{Entity, Participant, ParticipantId, Room, RoomId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A state-changing call made against the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Ban {
        room: RoomId,
        participant: ParticipantId,
        until: Option<DateTime<Utc>>,
    },
    Unban {
        room: RoomId,
        participant: ParticipantId,
    },
    Restrict {
        room: RoomId,
        participant: ParticipantId,
        until: Option<DateTime<Utc>>,
    },
    Unrestrict {
        room: RoomId,
        participant: ParticipantId,
    },
    Kick {
        room: RoomId,
        participant: ParticipantId,
    },
    SetAdmin {
        room: RoomId,
        participant: ParticipantId,
        admin: bool,
        title: Option<String>,
    },
    DeleteMessage {
        room: RoomId,
        message_id: i64,
    },
    Leave {
        room: RoomId,
    },
}

/// In-memory [`Platform`].
pub struct LocalPlatform {
    assistant: ParticipantId,
    directory: DashMap<i64, Entity>,
    /// Lowercased handle -> participant id.
    handles: DashMap<String, ParticipantId>,
    roles: DashMap<(RoomId, ParticipantId), RoomRole>,
    failing_rooms: DashSet<RoomId>,
    failing_destinations: DashSet<Destination>,
    lookups_fail: AtomicBool,
    calls: Mutex<Vec<PlatformCall>>,
    notices: Mutex<Vec<(Destination, Notice)>>,
}

impl LocalPlatform {
    pub fn new(assistant: ParticipantId) -> Self {
        Self {
            assistant,
            directory: DashMap::new(),
            handles: DashMap::new(),
            roles: DashMap::new(),
            failing_rooms: DashSet::new(),
            failing_destinations: DashSet::new(),
            lookups_fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// Make a participant resolvable through the directory.
    pub fn add_participant(&self, participant: Participant) {
        if let Some(handle) = &participant.handle {
            self.handles
                .insert(handle.to_ascii_lowercase(), participant.id);
        }
        self.directory
            .insert(participant.id, Entity::Participant(participant));
    }

    /// Make a room resolvable through the directory.
    pub fn add_room(&self, room: Room) {
        self.directory.insert(room.id, Entity::Room(room));
    }

    /// A participant registered in the directory.
    pub fn participant(&self, id: ParticipantId) -> Option<Participant> {
        match self.directory.get(&id).as_deref() {
            Some(Entity::Participant(p)) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn set_role(&self, room: RoomId, participant: ParticipantId, role: RoomRole) {
        self.roles.insert((room, participant), role);
    }

    pub fn role(&self, room: RoomId, participant: ParticipantId) -> Option<RoomRole> {
        self.roles.get(&(room, participant)).map(|r| r.value().clone())
    }

    /// Every call touching this room fails with a transport error.
    pub fn fail_room(&self, room: RoomId) {
        self.failing_rooms.insert(room);
    }

    /// Notices to this destination fail with a transport error.
    pub fn fail_destination(&self, destination: Destination) {
        self.failing_destinations.insert(destination);
    }

    pub fn set_lookups_failing(&self, failing: bool) {
        self.lookups_fail.store(failing, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    pub fn notices(&self) -> Vec<(Destination, Notice)> {
        self.notices.lock().clone()
    }

    /// Remove and return every recorded notice.
    pub fn take_notices(&self) -> Vec<(Destination, Notice)> {
        std::mem::take(&mut *self.notices.lock())
    }

    /// Notices delivered to one destination, in order.
    pub fn notices_to(&self, destination: Destination) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|(dest, _)| *dest == destination)
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    fn check_room(&self, room: RoomId) -> Result<(), PlatformError> {
        if self.failing_rooms.contains(&room) {
            return Err(PlatformError::Transport(format!("room {} unreachable", room)));
        }
        Ok(())
    }

    fn apply(&self, call: PlatformCall, room: RoomId, participant: ParticipantId, role: RoomRole) {
        self.roles.insert((room, participant), role);
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Platform for LocalPlatform {
    fn assistant_id(&self) -> ParticipantId {
        self.assistant
    }

    async fn lookup(&self, key: &EntityRef) -> Result<Entity, PlatformError> {
        if self.lookups_fail.load(Ordering::Relaxed) {
            return Err(PlatformError::Transport("directory unavailable".to_string()));
        }

        let id = match key {
            EntityRef::Id(id) => *id,
            EntityRef::Handle(handle) => *self
                .handles
                .get(&handle.trim_start_matches('@').to_ascii_lowercase())
                .ok_or_else(|| PlatformError::NotFound(key.to_string()))?
                .value(),
        };

        self.directory
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| PlatformError::NotFound(key.to_string()))
    }

    async fn member_role(
        &self,
        room: RoomId,
        participant: ParticipantId,
    ) -> Result<RoomRole, PlatformError> {
        self.check_room(room)?;
        self.role(room, participant)
            .ok_or(PlatformError::NotMember { room, participant })
    }

    async fn ban_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        self.check_room(room)?;
        debug!(room_id = room, participant_id = participant, "local ban");
        self.apply(
            PlatformCall::Ban {
                room,
                participant,
                until,
            },
            room,
            participant,
            RoomRole::Banned,
        );
        Ok(())
    }

    async fn unban_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
    ) -> Result<(), PlatformError> {
        self.check_room(room)?;
        self.apply(
            PlatformCall::Unban { room, participant },
            room,
            participant,
            RoomRole::Left,
        );
        Ok(())
    }

    async fn restrict_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        self.check_room(room)?;
        self.apply(
            PlatformCall::Restrict {
                room,
                participant,
                until,
            },
            room,
            participant,
            RoomRole::Restricted,
        );
        Ok(())
    }

    async fn unrestrict_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
    ) -> Result<(), PlatformError> {
        self.check_room(room)?;
        self.apply(
            PlatformCall::Unrestrict { room, participant },
            room,
            participant,
            RoomRole::Member,
        );
        Ok(())
    }

    async fn kick_member(
        &self,
        room: RoomId,
        participant: ParticipantId,
    ) -> Result<(), PlatformError> {
        self.check_room(room)?;
        self.apply(
            PlatformCall::Kick { room, participant },
            room,
            participant,
            RoomRole::Left,
        );
        Ok(())
    }

    async fn set_admin(
        &self,
        room: RoomId,
        participant: ParticipantId,
        admin: bool,
        title: Option<&str>,
    ) -> Result<(), PlatformError> {
        self.check_room(room)?;
        let role = if admin {
            RoomRole::admin_with([
                AdminCapability::RestrictMembers,
                AdminCapability::DeleteMessages,
                AdminCapability::PinMessages,
                AdminCapability::InviteUsers,
            ])
        } else {
            RoomRole::Member
        };
        self.apply(
            PlatformCall::SetAdmin {
                room,
                participant,
                admin,
                title: title.map(str::to_string),
            },
            room,
            participant,
            role,
        );
        Ok(())
    }

    async fn delete_message(&self, room: RoomId, message_id: i64) -> Result<(), PlatformError> {
        self.check_room(room)?;
        self.calls
            .lock()
            .push(PlatformCall::DeleteMessage { room, message_id });
        Ok(())
    }

    async fn leave_room(&self, room: RoomId) -> Result<(), PlatformError> {
        self.check_room(room)?;
        debug!(room_id = room, "local leave");
        self.apply(
            PlatformCall::Leave { room },
            room,
            self.assistant,
            RoomRole::Left,
        );
        Ok(())
    }

    async fn send_notice(
        &self,
        destination: Destination,
        notice: Notice,
    ) -> Result<(), PlatformError> {
        if self.failing_destinations.contains(&destination) {
            return Err(PlatformError::Transport(format!(
                "cannot deliver to {}",
                destination
            )));
        }
        debug!(destination, notice = %notice, "notice delivered");
        self.notices.lock().push((destination, notice));
        Ok(())
    }
}
